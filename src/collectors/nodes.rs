use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Collector;
use crate::clients::ClusterApi;
use crate::error::CollectionError;
use crate::helpers::{age_hours, node_roles};
use crate::models::k8s::Node;
use crate::models::overview::{NamespaceSet, ResourceKind};
use crate::models::views::{NodeRecord, NodeSummary, Readiness};

/// Nodes are cluster-scoped: one list call, no per-namespace breakdown.
pub struct NodeCollector;

#[async_trait]
impl Collector for NodeCollector {
    const KIND: ResourceKind = ResourceKind::Node;
    type Summary = NodeSummary;

    async fn collect(
        &self,
        client: &dyn ClusterApi,
        _namespaces: &NamespaceSet,
    ) -> Result<NodeSummary, CollectionError> {
        let nodes = client
            .list_nodes()
            .await
            .map_err(|e| CollectionError::new(Self::KIND, None, e))?;

        let now = Utc::now();
        let records: Vec<NodeRecord> = nodes.iter().map(|n| node_record(n, now)).collect();
        let running = records.iter().filter(|r| r.status.is_ready()).count();

        Ok(NodeSummary {
            total: records.len(),
            running,
            nodes: records,
        })
    }
}

fn node_record(node: &Node, now: DateTime<Utc>) -> NodeRecord {
    let status = &node.status;
    let allocatable = |key: &str| status.allocatable.get(key).cloned().unwrap_or_default();

    NodeRecord {
        name: node.metadata.name.clone(),
        status: Readiness::from_conditions(&status.conditions),
        roles: node_roles(&node.metadata.labels),
        age: age_hours(node.metadata.creation_timestamp.as_deref(), now),
        version: status.node_info.kubelet_version.clone(),
        ip: status
            .addresses
            .iter()
            .find(|a| a.address_type == "InternalIP")
            .map(|a| a.address.clone())
            .unwrap_or_default(),
        os_image: status.node_info.os_image.clone(),
        kernel_version: status.node_info.kernel_version.clone(),
        runtime: status.node_info.container_runtime_version.clone(),
        cpu_capacity: allocatable("cpu"),
        memory_capacity: allocatable("memory"),
        pods_capacity: allocatable("pods"),
    }
}
