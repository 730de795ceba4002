use chrono::Utc;
use tracing::{debug, warn};

use crate::clients::ClusterApi;
use crate::error::OverviewError;
use crate::helpers::age_hours;
use crate::models::overview::NamespaceSet;
use crate::models::views::{NamespaceRecord, NamespaceSummary};

/// List every namespace once. Failure here is fatal for the whole aggregation.
pub async fn enumerate(
    client: &dyn ClusterApi,
) -> Result<(NamespaceSet, NamespaceSummary), OverviewError> {
    let namespaces = client.list_namespaces().await.map_err(|e| {
        warn!("listing namespaces failed: {}", e);
        OverviewError::UpstreamUnavailable(e)
    })?;

    let now = Utc::now();
    let records: Vec<NamespaceRecord> = namespaces
        .iter()
        .map(|ns| NamespaceRecord {
            name: ns.metadata.name.clone(),
            phase: ns.status.phase.clone(),
            age: age_hours(ns.metadata.creation_timestamp.as_deref(), now),
        })
        .collect();
    let names: Vec<String> = records.iter().map(|r| r.name.clone()).collect();

    debug!(count = names.len(), "enumerated namespaces");

    Ok((
        NamespaceSet::new(names.clone()),
        NamespaceSummary {
            total: records.len(),
            names,
            namespaces: records,
        },
    ))
}
