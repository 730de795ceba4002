//! Per-session cluster clients and their latest overview.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clients::ClusterApi;
use crate::error::SessionError;
use crate::models::overview::Overview;

struct Entry {
    client: Arc<dyn ClusterApi>,
    overview: Option<Arc<Overview>>,
    expires_at: Instant,
}

/// Keyed store of session state. Every write pushes the entry's expiry out by
/// the TTL; reads never extend it.
pub struct SessionStore {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Bind a client to a session, dropping any overview computed with the
    /// previous client.
    pub async fn put(&self, session_id: &str, client: Arc<dyn ClusterApi>) {
        let mut entries = self.entries.write().await;
        entries.insert(
            session_id.to_string(),
            Entry {
                client,
                overview: None,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    pub async fn get(&self, session_id: &str) -> Result<Arc<dyn ClusterApi>, SessionError> {
        let entries = self.entries.read().await;
        match entries.get(session_id) {
            Some(e) if e.expires_at > Instant::now() => Ok(e.client.clone()),
            _ => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    /// Replace the session's overview wholesale.
    pub async fn put_overview(
        &self,
        session_id: &str,
        overview: Overview,
    ) -> Result<Arc<Overview>, SessionError> {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        match entries.get_mut(session_id) {
            Some(e) if e.expires_at > now => {
                let overview = Arc::new(overview);
                e.overview = Some(overview.clone());
                e.expires_at = now + self.ttl;
                Ok(overview)
            }
            _ => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    pub async fn get_overview(&self, session_id: &str) -> Result<Arc<Overview>, SessionError> {
        let entries = self.entries.read().await;
        match entries.get(session_id) {
            Some(e) if e.expires_at > Instant::now() => e
                .overview
                .clone()
                .ok_or_else(|| SessionError::NoOverview(session_id.to_string())),
            _ => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop expired entries, returning how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub async fn run_sweeper(
        self: Arc<Self>,
        every: Duration,
        mut shutdown: watch::Receiver<()>,
    ) {
        let mut interval = time::interval(every);
        interval.tick().await; // skip first immediate tick

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let evicted = self.evict_expired().await;
                    if evicted > 0 {
                        let remaining = self.len().await;
                        debug!(evicted, remaining, "expired sessions removed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("session sweeper shutting down");
                    return;
                }
            }
        }
    }
}
