use async_trait::async_trait;
use chrono::Utc;

use super::{Collector, Tally};
use crate::clients::ClusterApi;
use crate::error::CollectionError;
use crate::helpers::age_hours;
use crate::models::overview::{NamespaceSet, ResourceKind};
use crate::models::views::{ConfigMapRecord, ConfigMapSummary};

pub struct ConfigMapCollector;

#[async_trait]
impl Collector for ConfigMapCollector {
    const KIND: ResourceKind = ResourceKind::ConfigMap;
    type Summary = ConfigMapSummary;

    async fn collect(
        &self,
        client: &dyn ClusterApi,
        namespaces: &NamespaceSet,
    ) -> Result<ConfigMapSummary, CollectionError> {
        let now = Utc::now();
        let mut tally = Tally::new(namespaces);

        for ns in namespaces.iter() {
            let maps = client
                .list_config_maps(ns)
                .await
                .map_err(|e| CollectionError::new(Self::KIND, Some(ns), e))?;
            tally.record(
                ns,
                maps.iter().map(|m| ConfigMapRecord {
                    name: m.metadata.name.clone(),
                    namespace: ns.to_string(),
                    data_count: m.data.len(),
                    age: age_hours(m.metadata.creation_timestamp.as_deref(), now),
                }),
            );
        }

        Ok(ConfigMapSummary {
            total: tally.total,
            config_maps: tally.items,
        })
    }
}
