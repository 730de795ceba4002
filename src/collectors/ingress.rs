use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{Collector, Tally};
use crate::clients::ClusterApi;
use crate::error::CollectionError;
use crate::helpers::age_hours;
use crate::models::k8s::{HttpIngressPath, Ingress, IngressStatus};
use crate::models::overview::{NamespaceSet, ResourceKind};
use crate::models::views::{
    BackendRecord, IngressPathRecord, IngressRecord, IngressRuleRecord, IngressSummary,
};

pub struct IngressCollector;

#[async_trait]
impl Collector for IngressCollector {
    const KIND: ResourceKind = ResourceKind::Ingress;
    type Summary = IngressSummary;

    async fn collect(
        &self,
        client: &dyn ClusterApi,
        namespaces: &NamespaceSet,
    ) -> Result<IngressSummary, CollectionError> {
        let now = Utc::now();
        let mut tally = Tally::new(namespaces);

        for ns in namespaces.iter() {
            let items = client
                .list_ingresses(ns)
                .await
                .map_err(|e| CollectionError::new(Self::KIND, Some(ns), e))?;
            tally.record(ns, items.iter().map(|i| ingress_record(i, ns, now)));
        }

        Ok(IngressSummary {
            total: tally.total,
            ingress: tally.items,
        })
    }
}

fn ingress_record(ing: &Ingress, namespace: &str, now: DateTime<Utc>) -> IngressRecord {
    let rules: Vec<IngressRuleRecord> = ing
        .spec
        .rules
        .iter()
        .map(|rule| IngressRuleRecord {
            host: rule.host.clone(),
            paths: rule
                .http
                .as_ref()
                .map(|http| http.paths.iter().map(path_record).collect())
                .unwrap_or_default(),
        })
        .collect();

    let address = load_balancer_address(&ing.status);
    if address.is_none() {
        debug!(namespace, ingress = %ing.metadata.name, "no load balancer address assigned");
    }

    IngressRecord {
        name: ing.metadata.name.clone(),
        namespace: namespace.to_string(),
        hosts: rules.iter().map(|r| r.host.clone()).collect(),
        address,
        age: age_hours(ing.metadata.creation_timestamp.as_deref(), now),
        rules,
    }
}

fn path_record(path: &HttpIngressPath) -> IngressPathRecord {
    IngressPathRecord {
        path: path.path.clone(),
        path_type: path.path_type.clone().unwrap_or_default(),
        backend: path.backend.service.as_ref().map(|svc| BackendRecord {
            name: svc.name.clone(),
            port: svc.port.number,
            port_name: svc.port.name.clone(),
        }),
    }
}

/// First load-balancer entry, IP preferred over hostname. `None` when the
/// list is empty or the entry carries neither.
fn load_balancer_address(status: &IngressStatus) -> Option<String> {
    let first = status.load_balancer.ingress.first()?;
    [&first.ip, &first.hostname]
        .into_iter()
        .find(|s| !s.is_empty())
        .cloned()
}
