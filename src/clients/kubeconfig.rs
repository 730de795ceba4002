//! Kubeconfig loading.
//!
//! Parsing and credential resolution are left to `kube::config`, so every
//! user form kubectl accepts works here too: tokens, token files, client
//! certificates, exec plugins and auth providers.

use kube::config::{KubeConfigOptions, Kubeconfig};
use std::fmt::Display;
use std::time::Duration;

use crate::error::ClientError;

/// A kubeconfig resolved against its current context.
pub struct Target {
    pub context: String,
    pub server: String,
    pub config: kube::Config,
}

/// Resolve uploaded kubeconfig text using its `current-context`.
pub async fn load(yaml: &str, timeout: Duration) -> Result<Target, ClientError> {
    let kubeconfig = Kubeconfig::from_yaml(yaml).map_err(|e| invalid("parsing kubeconfig", e))?;
    let context = current_context(&kubeconfig)?;

    let mut config = kube::Config::from_custom_kubeconfig(
        kubeconfig,
        &KubeConfigOptions {
            context: Some(context.clone()),
            ..Default::default()
        },
    )
    .await
    .map_err(|e| invalid(&format!("loading context {:?}", context), e))?;

    config.connect_timeout = Some(timeout);
    config.read_timeout = Some(timeout);

    Ok(Target {
        server: config.cluster_url.to_string().trim_end_matches('/').to_string(),
        context,
        config,
    })
}

fn current_context(kubeconfig: &Kubeconfig) -> Result<String, ClientError> {
    let name = kubeconfig
        .current_context
        .clone()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ClientError::InvalidKubeconfig("no current-context set".to_string()))?;

    if !kubeconfig.contexts.iter().any(|c| c.name == name) {
        return Err(ClientError::InvalidKubeconfig(format!(
            "context {:?} not found",
            name
        )));
    }
    Ok(name)
}

fn invalid(what: &str, err: impl Display) -> ClientError {
    ClientError::InvalidKubeconfig(format!("{}: {}", what, err))
}
