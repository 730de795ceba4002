use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use std::time::Duration;

use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "k8s-config-session";

/// Session id taken from the request's cookie. Requests without one are
/// rejected with 401 so the dashboard sends the user back to upload.
pub struct SessionCookie(pub String);

impl<S: Send + Sync> FromRequestParts<S> for SessionCookie {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|header| find_cookie(header, SESSION_COOKIE))
            .map(SessionCookie)
            .ok_or_else(|| ApiError::Unauthorized("no session, upload a kubeconfig first".to_string()))
    }
}

pub fn find_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}

pub fn session_cookie(session_id: &str, max_age: Duration) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        session_id,
        max_age.as_secs()
    )
}
