pub mod api;
pub mod session;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        // Credentials
        .route("/config", post(api::handle_upload_config))
        .route("/refresh", get(api::handle_refresh))
        // Dashboard views
        .route("/overview", get(api::handle_overview))
        .route("/nodes", get(api::handle_nodes))
        .route("/pods", get(api::handle_pods))
        .route("/services", get(api::handle_services))
        .route("/ingress", get(api::handle_ingress))
        .route("/secrets", get(api::handle_secrets))
        .route("/configmap", get(api::handle_config_maps))
        // Health
        .route("/healthz", get(api::handle_healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
