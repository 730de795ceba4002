//! In-memory cluster used by tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::ClusterApi;
use crate::error::ClientError;
use crate::models::k8s::*;
use crate::models::overview::ResourceKind;

pub const CREATED: &str = "2024-01-01T00:00:00Z";

#[derive(Default)]
pub struct FakeCluster {
    pub namespaces: Vec<String>,
    pub nodes: Vec<Node>,
    pub pods: BTreeMap<String, Vec<Pod>>,
    pub services: BTreeMap<String, Vec<Service>>,
    pub ingresses: BTreeMap<String, Vec<Ingress>>,
    pub secrets: BTreeMap<String, Vec<Secret>>,
    pub config_maps: BTreeMap<String, Vec<ConfigMap>>,
    pub fail_namespaces: bool,
    pub failing: HashSet<ResourceKind>,
    pub panicking: Option<ResourceKind>,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

fn forbidden(path: String) -> ClientError {
    ClientError::Status {
        path,
        status: 403,
        body: "forbidden".to_string(),
    }
}

fn meta(name: &str) -> ObjectMeta {
    ObjectMeta {
        name: name.to_string(),
        creation_timestamp: Some(CREATED.to_string()),
        ..Default::default()
    }
}

fn ready_condition(ready: bool) -> Vec<Condition> {
    vec![Condition {
        condition_type: "Ready".to_string(),
        status: if ready { "True" } else { "False" }.to_string(),
    }]
}

pub fn node(name: &str, ready: bool) -> Node {
    Node {
        metadata: meta(name),
        status: NodeStatus {
            conditions: ready_condition(ready),
            ..Default::default()
        },
    }
}

pub fn pod(name: &str, ready: bool) -> Pod {
    Pod {
        metadata: meta(name),
        spec: PodSpec {
            node_name: "node-1".to_string(),
            containers: vec![Container {
                name: "app".to_string(),
                image: "nginx:1.25".to_string(),
                ports: vec![ContainerPort {
                    container_port: 80,
                    protocol: "TCP".to_string(),
                }],
            }],
        },
        status: PodStatus {
            phase: "Running".to_string(),
            pod_ip: "10.1.0.5".to_string(),
            conditions: ready_condition(ready),
            container_statuses: vec![ContainerStatus {
                name: "app".to_string(),
                ready,
                restart_count: 1,
            }],
        },
    }
}

pub fn service(name: &str) -> Service {
    Service {
        metadata: meta(name),
        spec: ServiceSpec {
            service_type: "ClusterIP".to_string(),
            cluster_ips: vec!["10.96.0.10".to_string()],
            ports: vec![ServicePort {
                port: 80,
                target_port: Some(IntOrString::Int(8080)),
                protocol: "TCP".to_string(),
            }],
            ..Default::default()
        },
    }
}

pub fn ingress(name: &str, address: Option<&str>) -> Ingress {
    Ingress {
        metadata: meta(name),
        spec: IngressSpec {
            rules: vec![IngressRule {
                host: "app.example".to_string(),
                http: Some(HttpIngressRuleValue {
                    paths: vec![HttpIngressPath {
                        path: "/".to_string(),
                        path_type: Some("Prefix".to_string()),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: "web".to_string(),
                                port: ServiceBackendPort {
                                    number: Some(80),
                                    name: None,
                                },
                            }),
                        },
                    }],
                }),
            }],
        },
        status: IngressStatus {
            load_balancer: LoadBalancerStatus {
                ingress: address
                    .map(|ip| {
                        vec![LoadBalancerIngress {
                            ip: ip.to_string(),
                            hostname: String::new(),
                        }]
                    })
                    .unwrap_or_default(),
            },
        },
    }
}

pub fn secret(name: &str, keys: usize) -> Secret {
    Secret {
        metadata: meta(name),
        secret_type: "Opaque".to_string(),
        data: (0..keys).map(|i| (format!("k{i}"), "dmFsdWU=".to_string())).collect(),
    }
}

pub fn config_map(name: &str, keys: usize) -> ConfigMap {
    ConfigMap {
        metadata: meta(name),
        data: (0..keys).map(|i| (format!("k{i}"), "v".to_string())).collect(),
    }
}

impl FakeCluster {
    /// Two namespaces: `default` with 3 pods (2 ready) and `kube-system` with
    /// 1 ready pod, on a single ready node.
    pub fn two_namespaces() -> Self {
        let mut cluster = FakeCluster {
            namespaces: vec!["default".to_string(), "kube-system".to_string()],
            nodes: vec![node("node-1", true)],
            ..Default::default()
        };
        cluster.pods.insert(
            "default".to_string(),
            vec![
                pod("web-1", true),
                pod("web-2", true),
                pod("worker-1", false),
            ],
        );
        cluster.pods.insert(
            "kube-system".to_string(),
            vec![pod("coredns-1", true)],
        );
        cluster
            .services
            .insert("default".to_string(), vec![service("web")]);
        cluster.ingresses.insert(
            "default".to_string(),
            vec![ingress("web", Some("203.0.113.7"))],
        );
        cluster.secrets.insert(
            "kube-system".to_string(),
            vec![secret("bootstrap-token", 3)],
        );
        cluster.config_maps.insert(
            "default".to_string(),
            vec![config_map("settings", 2)],
        );
        cluster
    }

    pub fn failing(mut self, kind: ResourceKind) -> Self {
        self.failing.insert(kind);
        self
    }

    pub fn panicking(mut self, kind: ResourceKind) -> Self {
        self.panicking = Some(kind);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, kind: ResourceKind, path: String) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panicking == Some(kind) {
            panic!("{kind} lister blew up");
        }
        if self.failing.contains(&kind) {
            return Err(forbidden(path));
        }
        Ok(())
    }

    fn namespaced<T: Clone>(map: &BTreeMap<String, Vec<T>>, namespace: &str) -> Vec<T> {
        map.get(namespace).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ClusterApi for FakeCluster {
    async fn validate(&self) -> Result<(), ClientError> {
        if self.fail_namespaces {
            return Err(forbidden("/api/v1/namespaces?limit=1".to_string()));
        }
        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_namespaces {
            return Err(forbidden("/api/v1/namespaces".to_string()));
        }
        Ok(self
            .namespaces
            .iter()
            .map(|n| Namespace {
                metadata: meta(n),
                status: NamespaceStatus {
                    phase: "Active".to_string(),
                },
            })
            .collect())
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, ClientError> {
        self.enter(ResourceKind::Node, "/api/v1/nodes".to_string())
            .await?;
        Ok(self.nodes.clone())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClientError> {
        self.enter(ResourceKind::Pod, format!("/api/v1/namespaces/{namespace}/pods"))
            .await?;
        Ok(Self::namespaced(&self.pods, namespace))
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<Service>, ClientError> {
        self.enter(
            ResourceKind::Service,
            format!("/api/v1/namespaces/{namespace}/services"),
        )
        .await?;
        Ok(Self::namespaced(&self.services, namespace))
    }

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>, ClientError> {
        self.enter(
            ResourceKind::Ingress,
            format!("/apis/networking.k8s.io/v1/namespaces/{namespace}/ingresses"),
        )
        .await?;
        Ok(Self::namespaced(&self.ingresses, namespace))
    }

    async fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, ClientError> {
        self.enter(
            ResourceKind::Secret,
            format!("/api/v1/namespaces/{namespace}/secrets"),
        )
        .await?;
        Ok(Self::namespaced(&self.secrets, namespace))
    }

    async fn list_config_maps(&self, namespace: &str) -> Result<Vec<ConfigMap>, ClientError> {
        self.enter(
            ResourceKind::ConfigMap,
            format!("/api/v1/namespaces/{namespace}/configmaps"),
        )
        .await?;
        Ok(Self::namespaced(&self.config_maps, namespace))
    }
}
