use async_trait::async_trait;
use chrono::Utc;

use super::{Collector, Tally};
use crate::clients::ClusterApi;
use crate::error::CollectionError;
use crate::helpers::age_hours;
use crate::models::overview::{NamespaceSet, ResourceKind};
use crate::models::views::{SecretRecord, SecretSummary};

/// Only names, types and key counts leave this collector; values are dropped.
pub struct SecretCollector;

#[async_trait]
impl Collector for SecretCollector {
    const KIND: ResourceKind = ResourceKind::Secret;
    type Summary = SecretSummary;

    async fn collect(
        &self,
        client: &dyn ClusterApi,
        namespaces: &NamespaceSet,
    ) -> Result<SecretSummary, CollectionError> {
        let now = Utc::now();
        let mut tally = Tally::new(namespaces);

        for ns in namespaces.iter() {
            let secrets = client
                .list_secrets(ns)
                .await
                .map_err(|e| CollectionError::new(Self::KIND, Some(ns), e))?;
            tally.record(
                ns,
                secrets.iter().map(|s| SecretRecord {
                    name: s.metadata.name.clone(),
                    namespace: ns.to_string(),
                    secret_type: s.secret_type.clone(),
                    data_count: s.data.len(),
                    age: age_hours(s.metadata.creation_timestamp.as_deref(), now),
                }),
            );
        }

        Ok(SecretSummary {
            total: tally.total,
            secrets: tally.items,
        })
    }
}
