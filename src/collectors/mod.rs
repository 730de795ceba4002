//! Per-kind resource collectors.
//!
//! Each collector lists one resource kind and normalizes it into a dashboard
//! summary. Namespaced collectors issue one list call per namespace, in order,
//! and stop at the first failing call.

pub mod configmaps;
pub mod ingress;
pub mod namespaces;
pub mod nodes;
pub mod pods;
pub mod secrets;
pub mod services;

use async_trait::async_trait;

use crate::clients::ClusterApi;
use crate::error::CollectionError;
use crate::models::overview::{NamespaceSet, ResourceKind};
use crate::models::views::NamespaceCounts;

pub use configmaps::ConfigMapCollector;
pub use ingress::IngressCollector;
pub use nodes::NodeCollector;
pub use pods::PodCollector;
pub use secrets::SecretCollector;
pub use services::ServiceCollector;

#[async_trait]
pub trait Collector: Send + Sync + 'static {
    const KIND: ResourceKind;
    type Summary: Send + 'static;

    async fn collect(
        &self,
        client: &dyn ClusterApi,
        namespaces: &NamespaceSet,
    ) -> Result<Self::Summary, CollectionError>;
}

/// A count map with a zero entry for every namespace in the set.
pub fn zeroed(namespaces: &NamespaceSet) -> NamespaceCounts {
    namespaces.iter().map(|ns| (ns.to_string(), 0)).collect()
}

/// Per-namespace counts plus the flat record list of a namespaced kind.
pub struct Tally<R> {
    pub total: NamespaceCounts,
    pub items: Vec<R>,
}

impl<R> Tally<R> {
    pub fn new(namespaces: &NamespaceSet) -> Self {
        Self {
            total: zeroed(namespaces),
            items: Vec::new(),
        }
    }

    pub fn record(&mut self, namespace: &str, records: impl IntoIterator<Item = R>) {
        let before = self.items.len();
        self.items.extend(records);
        *self.total.entry(namespace.to_string()).or_default() += self.items.len() - before;
    }
}
