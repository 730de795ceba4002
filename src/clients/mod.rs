pub mod aggregator;
pub mod kubeconfig;

#[cfg(test)]
pub mod fixture;

use async_trait::async_trait;
use http::Request;
use http::header::ACCEPT;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::error::ClientError;
use crate::models::k8s::{ConfigMap, Ingress, List, Namespace, Node, Pod, Secret, Service};

/// Read-only view of one cluster. Every method is a single list call.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// Cheap probe used to check credentials before a session is created.
    async fn validate(&self) -> Result<(), ClientError>;

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClientError>;

    async fn list_nodes(&self) -> Result<Vec<Node>, ClientError>;

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClientError>;

    async fn list_services(&self, namespace: &str) -> Result<Vec<Service>, ClientError>;

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>, ClientError>;

    async fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, ClientError>;

    async fn list_config_maps(&self, namespace: &str) -> Result<Vec<ConfigMap>, ClientError>;
}

/// kube client bound to one API server and one set of credentials.
pub struct ClusterClient {
    pub server: String,
    pub context: String,
    client: kube::Client,
}

impl ClusterClient {
    pub fn new(client: kube::Client, server: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            context: context.into(),
            client,
        }
    }

    /// Build a client from uploaded kubeconfig text using its current context.
    pub async fn from_kubeconfig(yaml: &str, timeout: Duration) -> Result<Self, ClientError> {
        let target = kubeconfig::load(yaml, timeout).await?;
        let client = kube::Client::try_from(target.config).map_err(|e| {
            ClientError::InvalidKubeconfig(format!("building client: {}", e))
        })?;
        Ok(Self::new(client, target.server, target.context))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!(server = %self.server, path, "GET");
        let req = Request::get(path)
            .header(ACCEPT, "application/json")
            .body(Vec::new())?;

        self.client.request::<T>(req).await.map_err(|e| match e {
            kube::Error::Api(resp) => ClientError::Status {
                path: path.to_string(),
                status: resp.code,
                body: resp.message,
            },
            other => ClientError::Request(other),
        })
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
        let list: List<T> = self.get_json(path).await?;
        Ok(list.items)
    }
}

#[async_trait]
impl ClusterApi for ClusterClient {
    async fn validate(&self) -> Result<(), ClientError> {
        self.list::<Namespace>("/api/v1/namespaces?limit=1")
            .await
            .map(|_| ())
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClientError> {
        self.list("/api/v1/namespaces").await
    }

    async fn list_nodes(&self) -> Result<Vec<Node>, ClientError> {
        self.list("/api/v1/nodes").await
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClientError> {
        self.list(&format!("/api/v1/namespaces/{}/pods", namespace))
            .await
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<Service>, ClientError> {
        self.list(&format!("/api/v1/namespaces/{}/services", namespace))
            .await
    }

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<Ingress>, ClientError> {
        self.list(&format!(
            "/apis/networking.k8s.io/v1/namespaces/{}/ingresses",
            namespace
        ))
        .await
    }

    async fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, ClientError> {
        self.list(&format!("/api/v1/namespaces/{}/secrets", namespace))
            .await
    }

    async fn list_config_maps(&self, namespace: &str) -> Result<Vec<ConfigMap>, ClientError> {
        self.list(&format!("/api/v1/namespaces/{}/configmaps", namespace))
            .await
    }
}
