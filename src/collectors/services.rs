use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Collector, Tally};
use crate::clients::ClusterApi;
use crate::error::CollectionError;
use crate::helpers::age_hours;
use crate::models::k8s::Service;
use crate::models::overview::{NamespaceSet, ResourceKind};
use crate::models::views::{PortRecord, ServiceRecord, ServiceSummary};

pub struct ServiceCollector;

#[async_trait]
impl Collector for ServiceCollector {
    const KIND: ResourceKind = ResourceKind::Service;
    type Summary = ServiceSummary;

    async fn collect(
        &self,
        client: &dyn ClusterApi,
        namespaces: &NamespaceSet,
    ) -> Result<ServiceSummary, CollectionError> {
        let now = Utc::now();
        let mut tally = Tally::new(namespaces);

        for ns in namespaces.iter() {
            let services = client
                .list_services(ns)
                .await
                .map_err(|e| CollectionError::new(Self::KIND, Some(ns), e))?;
            tally.record(ns, services.iter().map(|s| service_record(s, ns, now)));
        }

        Ok(ServiceSummary {
            total: tally.total,
            services: tally.items,
        })
    }
}

fn service_record(svc: &Service, namespace: &str, now: DateTime<Utc>) -> ServiceRecord {
    ServiceRecord {
        name: svc.metadata.name.clone(),
        namespace: namespace.to_string(),
        service_type: svc.spec.service_type.clone(),
        selector: svc.spec.selector.clone(),
        cluster_ips: svc.spec.cluster_ips.clone(),
        external_ips: svc.spec.external_ips.clone(),
        ports: svc
            .spec
            .ports
            .iter()
            .map(|p| PortRecord {
                port: p.port,
                target_port: p.target_port.clone(),
                protocol: p.protocol.clone(),
            })
            .collect(),
        age: age_hours(svc.metadata.creation_timestamp.as_deref(), now),
    }
}
