use serde::Serialize;
use std::collections::BTreeMap;

use super::k8s::{Condition, IntOrString};

/// Binary readiness collapsed from upstream conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Readiness {
    Ready,
    NotReady,
}

impl Readiness {
    /// Ready only when a `Ready` condition is present with status `True`.
    /// Absent, false and unknown all collapse to `NotReady`.
    pub fn from_conditions(conditions: &[Condition]) -> Self {
        let ready = conditions
            .iter()
            .any(|c| c.condition_type == "Ready" && c.status == "True");
        if ready {
            Readiness::Ready
        } else {
            Readiness::NotReady
        }
    }

    pub fn is_ready(self) -> bool {
        self == Readiness::Ready
    }
}

/// Per-namespace count map. Keys are exactly the namespaces of one aggregation.
pub type NamespaceCounts = BTreeMap<String, usize>;

// --- Namespaces ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct NamespaceSummary {
    pub total: usize,
    #[serde(rename = "namespacelist")]
    pub names: Vec<String>,
    pub namespaces: Vec<NamespaceRecord>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NamespaceRecord {
    pub name: String,
    pub phase: String,
    pub age: String,
}

// --- Nodes ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeSummary {
    pub total: usize,
    pub running: usize,
    pub nodes: Vec<NodeRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeRecord {
    pub name: String,
    pub status: Readiness,
    pub roles: String,
    pub age: String,
    pub version: String,
    pub ip: String,
    #[serde(rename = "osimage")]
    pub os_image: String,
    #[serde(rename = "kernelversion")]
    pub kernel_version: String,
    pub runtime: String,
    #[serde(rename = "cpucapacity")]
    pub cpu_capacity: String,
    #[serde(rename = "memorycapacity")]
    pub memory_capacity: String,
    #[serde(rename = "podscapacity")]
    pub pods_capacity: String,
}

// --- Pods ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct PodSummary {
    pub total: NamespaceCounts,
    pub running: NamespaceCounts,
    pub pods: Vec<PodRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PodRecord {
    pub name: String,
    pub namespace: String,
    pub status: Readiness,
    pub phase: String,
    pub restarts: i32,
    pub age: String,
    pub node: String,
    pub ip: String,
    #[serde(rename = "container")]
    pub containers: Vec<ContainerRecord>,
    #[serde(rename = "readycontainer")]
    pub ready_containers: usize,
    #[serde(rename = "totalcontainer")]
    pub total_containers: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerRecord {
    pub name: String,
    pub image: String,
    pub ports: Vec<PortRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortRecord {
    pub port: i32,
    #[serde(rename = "targetport", skip_serializing_if = "Option::is_none")]
    pub target_port: Option<IntOrString>,
    pub protocol: String,
}

// --- Services ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceSummary {
    pub total: NamespaceCounts,
    pub services: Vec<ServiceRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceRecord {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub selector: BTreeMap<String, String>,
    #[serde(rename = "clusterip")]
    pub cluster_ips: Vec<String>,
    #[serde(rename = "externalip")]
    pub external_ips: Vec<String>,
    pub ports: Vec<PortRecord>,
    pub age: String,
}

// --- Ingress ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngressSummary {
    pub total: NamespaceCounts,
    pub ingress: Vec<IngressRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngressRecord {
    pub name: String,
    pub namespace: String,
    pub hosts: Vec<String>,
    /// First load-balancer address; `None` while the controller has not assigned one.
    pub address: Option<String>,
    pub age: String,
    pub rules: Vec<IngressRuleRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngressRuleRecord {
    pub host: String,
    pub paths: Vec<IngressPathRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngressPathRecord {
    pub path: String,
    #[serde(rename = "pathtype")]
    pub path_type: String,
    pub backend: Option<BackendRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendRecord {
    pub name: String,
    #[serde(rename = "ports")]
    pub port: Option<i32>,
    #[serde(rename = "portname", skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
}

// --- Secrets ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct SecretSummary {
    pub total: NamespaceCounts,
    pub secrets: Vec<SecretRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecretRecord {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub secret_type: String,
    #[serde(rename = "datacount")]
    pub data_count: usize,
    pub age: String,
}

// --- ConfigMaps ---

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigMapSummary {
    pub total: NamespaceCounts,
    #[serde(rename = "confs")]
    pub config_maps: Vec<ConfigMapRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigMapRecord {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "datacount")]
    pub data_count: usize,
    pub age: String,
}
