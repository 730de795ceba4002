use axum::{
    Json,
    extract::{Multipart, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use super::session::{SessionCookie, session_cookie};
use crate::AppState;
use crate::clients::{ClusterApi, ClusterClient};
use crate::error::{ApiError, CollectionError, OverviewError, Result};
use crate::models::overview::{Overview, ResourceKind};
use crate::session::SessionStore;

/// One kind's summary plus the namespace list the dashboard filters by.
#[derive(Serialize)]
struct KindView<'a, T: Serialize> {
    #[serde(flatten)]
    summary: &'a T,
    #[serde(rename = "namespacelist")]
    namespaces: &'a [String],
}

fn kind_summary<'a, T>(
    overview: &'a Overview,
    kind: ResourceKind,
    summary: &'a Option<T>,
) -> Result<&'a T> {
    summary.as_ref().ok_or_else(|| {
        let err = overview
            .errors
            .iter()
            .find(|e| e.kind == kind)
            .cloned()
            .unwrap_or_else(|| CollectionError::new(kind, None, "not collected"));
        ApiError::Overview(OverviewError::CollectionFailed(err))
    })
}

fn kind_json<T: Serialize>(overview: &Overview, key: &str, summary: &T) -> Json<Value> {
    let view = KindView {
        summary,
        namespaces: &overview.namespaces.names,
    };
    Json(json!({ key: view }))
}

/// Accepts a kubeconfig as pasted text (`pasted`) or an uploaded file (`file`).
pub async fn handle_upload_config(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut pasted = String::new();
    let mut file = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pasted" => {
                pasted = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            }
            "file" => {
                file = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?
                    .to_vec();
            }
            _ => {}
        }
    }

    let kubeconfig = if !pasted.trim().is_empty() {
        pasted
    } else if !file.is_empty() {
        String::from_utf8(file)
            .map_err(|_| ApiError::BadRequest("kubeconfig is not valid UTF-8".to_string()))?
    } else {
        return Err(ApiError::BadRequest(
            "expected a `pasted` or `file` field".to_string(),
        ));
    };

    let client =
        ClusterClient::from_kubeconfig(&kubeconfig, state.config.request_timeout()).await?;
    client.validate().await.map_err(|e| {
        warn!(server = %client.server, "cluster rejected connection: {}", e);
        ApiError::Unauthorized(format!("error connecting to cluster: {}", e))
    })?;
    info!(server = %client.server, context = %client.context, "cluster connected");

    let client: Arc<dyn ClusterApi> = Arc::new(client);
    let overview = state.aggregator.aggregate(client.clone()).await?;

    let session_id = SessionStore::new_session_id();
    state.sessions.put(&session_id, client).await;
    let overview = state.sessions.put_overview(&session_id, overview).await?;

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, session_cookie(&session_id, state.config.session_ttl()))],
        Json(json!({
            "message": "cluster connected",
            "errors": overview.errors,
        })),
    )
        .into_response())
}

pub async fn handle_refresh(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Result<Json<Value>> {
    let client = state.sessions.get(&session_id).await?;
    let overview = state.aggregator.aggregate(client).await?;
    let overview = state.sessions.put_overview(&session_id, overview).await?;

    Ok(Json(json!({
        "message": "overview refreshed",
        "errors": overview.errors,
    })))
}

pub async fn handle_overview(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Result<Json<Value>> {
    let ov = state.sessions.get_overview(&session_id).await?;

    Ok(Json(json!({
        "totalNodes": ov.nodes.as_ref().map(|n| n.total),
        "runningNodes": ov.nodes.as_ref().map(|n| n.running),
        "pods": ov.pods,
        "namespaces": ov.namespaces,
        "services": ov.services,
        "totalIngress": ov.ingress,
        "totalSecrets": ov.secrets,
        "totalConfigMaps": ov.config_maps,
        "errors": ov.errors,
        "collectedAt": ov.collected_at,
    })))
}

pub async fn handle_nodes(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Result<Json<Value>> {
    let ov = state.sessions.get_overview(&session_id).await?;
    let nodes = kind_summary(&ov, ResourceKind::Node, &ov.nodes)?;
    Ok(Json(json!({ "nodes": nodes })))
}

pub async fn handle_pods(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Result<Json<Value>> {
    let ov = state.sessions.get_overview(&session_id).await?;
    let pods = kind_summary(&ov, ResourceKind::Pod, &ov.pods)?;
    Ok(kind_json(&ov, "pods", pods))
}

pub async fn handle_services(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Result<Json<Value>> {
    let ov = state.sessions.get_overview(&session_id).await?;
    let services = kind_summary(&ov, ResourceKind::Service, &ov.services)?;
    Ok(kind_json(&ov, "services", services))
}

pub async fn handle_ingress(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Result<Json<Value>> {
    let ov = state.sessions.get_overview(&session_id).await?;
    let ingress = kind_summary(&ov, ResourceKind::Ingress, &ov.ingress)?;
    Ok(kind_json(&ov, "ingress", ingress))
}

pub async fn handle_secrets(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Result<Json<Value>> {
    let ov = state.sessions.get_overview(&session_id).await?;
    let secrets = kind_summary(&ov, ResourceKind::Secret, &ov.secrets)?;
    Ok(kind_json(&ov, "secrets", secrets))
}

pub async fn handle_config_maps(
    State(state): State<AppState>,
    SessionCookie(session_id): SessionCookie,
) -> Result<Json<Value>> {
    let ov = state.sessions.get_overview(&session_id).await?;
    let config_maps = kind_summary(&ov, ResourceKind::ConfigMap, &ov.config_maps)?;
    Ok(kind_json(&ov, "configmap", config_maps))
}

pub async fn handle_healthz() -> &'static str {
    "ok\n"
}
