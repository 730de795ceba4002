use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::models::overview::ResourceKind;

/// Failures talking to one cluster's API server.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid kubeconfig: {0}")]
    InvalidKubeconfig(String),
    #[error("building request: {0}")]
    Http(#[from] http::Error),
    #[error("request failed: {0}")]
    Request(kube::Error),
    #[error("GET {path} returned {status}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
}

impl ClientError {
    /// Credentials were presented but refused.
    pub fn is_rejected(&self) -> bool {
        matches!(self, ClientError::Status { status: 401 | 403, .. })
    }
}

/// One collector's list call failed. Recorded at fan-in, never cancels siblings.
#[derive(Debug, Clone, Error, Serialize)]
#[error("collecting {kind}{}: {cause}", scope(.namespace))]
pub struct CollectionError {
    pub kind: ResourceKind,
    pub namespace: Option<String>,
    pub cause: String,
}

fn scope(namespace: &Option<String>) -> String {
    namespace
        .as_deref()
        .map(|ns| format!(" in namespace {ns}"))
        .unwrap_or_default()
}

impl CollectionError {
    pub fn new(kind: ResourceKind, namespace: Option<&str>, cause: impl ToString) -> Self {
        Self {
            kind,
            namespace: namespace.map(str::to_string),
            cause: cause.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OverviewError {
    #[error("cluster unavailable: {0}")]
    UpstreamUnavailable(#[source] ClientError),
    #[error(transparent)]
    CollectionFailed(#[from] CollectionError),
    #[error("aggregation did not finish within {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(String),
    #[error("no overview collected for session {0}")]
    NoOverview(String),
}

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Overview(#[from] OverviewError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) | ApiError::Session(_) => StatusCode::UNAUTHORIZED,
            ApiError::Client(ClientError::InvalidKubeconfig(_)) => StatusCode::BAD_REQUEST,
            ApiError::Client(e) if e.is_rejected() => StatusCode::UNAUTHORIZED,
            ApiError::Client(_) => StatusCode::BAD_GATEWAY,
            ApiError::Overview(OverviewError::UpstreamUnavailable(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Overview(OverviewError::TimedOut(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Overview(OverviewError::CollectionFailed(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
