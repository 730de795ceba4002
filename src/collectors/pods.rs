use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Collector, Tally, zeroed};
use crate::clients::ClusterApi;
use crate::error::CollectionError;
use crate::helpers::age_hours;
use crate::models::k8s::Pod;
use crate::models::overview::{NamespaceSet, ResourceKind};
use crate::models::views::{ContainerRecord, PodRecord, PodSummary, PortRecord, Readiness};

pub struct PodCollector;

#[async_trait]
impl Collector for PodCollector {
    const KIND: ResourceKind = ResourceKind::Pod;
    type Summary = PodSummary;

    async fn collect(
        &self,
        client: &dyn ClusterApi,
        namespaces: &NamespaceSet,
    ) -> Result<PodSummary, CollectionError> {
        let now = Utc::now();
        let mut tally = Tally::new(namespaces);
        let mut running = zeroed(namespaces);

        for ns in namespaces.iter() {
            let pods = client
                .list_pods(ns)
                .await
                .map_err(|e| CollectionError::new(Self::KIND, Some(ns), e))?;

            let records: Vec<PodRecord> = pods.iter().map(|p| pod_record(p, ns, now)).collect();
            running.insert(
                ns.to_string(),
                records.iter().filter(|r| r.status.is_ready()).count(),
            );
            tally.record(ns, records);
        }

        Ok(PodSummary {
            total: tally.total,
            running,
            pods: tally.items,
        })
    }
}

fn pod_record(pod: &Pod, namespace: &str, now: DateTime<Utc>) -> PodRecord {
    let statuses = &pod.status.container_statuses;

    let containers = pod
        .spec
        .containers
        .iter()
        .map(|c| ContainerRecord {
            name: c.name.clone(),
            image: c.image.clone(),
            ports: c
                .ports
                .iter()
                .map(|p| PortRecord {
                    port: p.container_port,
                    target_port: None,
                    protocol: p.protocol.clone(),
                })
                .collect(),
        })
        .collect();

    PodRecord {
        name: pod.metadata.name.clone(),
        namespace: namespace.to_string(),
        status: Readiness::from_conditions(&pod.status.conditions),
        phase: pod.status.phase.clone(),
        restarts: statuses.iter().map(|s| s.restart_count).sum(),
        age: age_hours(pod.metadata.creation_timestamp.as_deref(), now),
        node: pod.spec.node_name.clone(),
        ip: pod.status.pod_ip.clone(),
        containers,
        ready_containers: statuses.iter().filter(|s| s.ready).count(),
        total_containers: statuses.len(),
    }
}
