mod clients;
mod collectors;
mod config;
mod error;
mod helpers;
mod models;
mod routes;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use clients::aggregator::Aggregator;
use session::SessionStore;

const DEFAULT_CONFIG_PATH: &str = "/etc/kube-overview/config.yaml";

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub sessions: Arc<SessionStore>,
    pub config: Arc<config::Config>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kube_overview=info,tower_http=info".into()),
        )
        .init();

    let explicit_path = std::env::args()
        .skip(1)
        .zip(std::env::args().skip(2))
        .find_map(|(k, v)| {
            if k == "-config" || k == "--config" {
                Some(v)
            } else {
                None
            }
        })
        .or_else(|| std::env::args().nth(1).filter(|a| !a.starts_with('-')));

    let required = explicit_path.is_some();
    let config_path = explicit_path.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let cfg = config::Config::load(&PathBuf::from(&config_path), required).unwrap_or_else(|e| {
        eprintln!("error loading config: {}", e);
        std::process::exit(1);
    });
    let cfg = Arc::new(cfg);

    info!(
        policy = ?cfg.failure_policy,
        request_timeout = ?cfg.request_timeout(),
        aggregation_timeout = ?cfg.aggregation_timeout(),
        "configuration loaded"
    );

    let aggregator = Arc::new(Aggregator::new(
        cfg.failure_policy,
        cfg.aggregation_timeout(),
    ));
    let sessions = Arc::new(SessionStore::new(cfg.session_ttl()));

    // Shutdown signal
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());

    // Start expired-session sweeper
    tokio::spawn(sessions.clone().run_sweeper(cfg.sweep_interval(), shutdown_rx));

    let state = AppState {
        aggregator,
        sessions,
        config: cfg.clone(),
    };

    let router = routes::build_router(state);

    let listen_addr = cfg.listen_addr();
    let listener = TcpListener::bind(&listen_addr).await.unwrap_or_else(|e| {
        eprintln!("failed to bind {}: {}", listen_addr, e);
        std::process::exit(1);
    });

    info!("kube-overview listening on {}", listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(());
        })
        .await
        .unwrap_or_else(|e| {
            eprintln!("server error: {}", e);
            std::process::exit(1);
        });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
