use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use super::views::{
    ConfigMapSummary, IngressSummary, NamespaceSummary, NodeSummary, PodSummary, SecretSummary,
    ServiceSummary,
};
use crate::error::CollectionError;

/// Resource kinds collected in parallel. Declaration order is the tie-break
/// order used when several collectors fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Node,
    Pod,
    Service,
    Ingress,
    Secret,
    ConfigMap,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Node => "nodes",
            ResourceKind::Pod => "pods",
            ResourceKind::Service => "services",
            ResourceKind::Ingress => "ingresses",
            ResourceKind::Secret => "secrets",
            ResourceKind::ConfigMap => "configmaps",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered namespace names for one aggregation call. Immutable once built and
/// shared read-only by every namespaced collector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamespaceSet(Vec<String>);

impl NamespaceSet {
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// Snapshot produced by one aggregation pass. A summary is `None` only when
/// its collector failed, in which case `errors` names the failure.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub namespaces: NamespaceSummary,
    pub nodes: Option<NodeSummary>,
    pub pods: Option<PodSummary>,
    pub services: Option<ServiceSummary>,
    pub ingress: Option<IngressSummary>,
    pub secrets: Option<SecretSummary>,
    #[serde(rename = "configmaps")]
    pub config_maps: Option<ConfigMapSummary>,
    pub errors: Vec<CollectionError>,
    pub collected_at: DateTime<Utc>,
}
