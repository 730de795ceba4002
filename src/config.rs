use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::clients::aggregator::FailurePolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Per-request timeout enforced by the cluster client.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound for one whole aggregation; unbounded when absent.
    #[serde(default)]
    pub aggregation_timeout_secs: Option<u64>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_listen_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_session_ttl_secs() -> u64 {
    7 * 24 * 3600
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:80".to_string(),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            request_timeout_secs: default_request_timeout_secs(),
            aggregation_timeout_secs: None,
            failure_policy: FailurePolicy::default(),
            session_ttl_secs: default_session_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Config {
    /// Load from `path`. A missing file is only tolerated when `required` is false.
    pub fn load(path: &Path, required: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let mut cfg = match std::fs::read_to_string(path) {
            Ok(data) => Self::parse(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Config::default(),
            Err(e) => return Err(format!("reading config {}: {}", path.display(), e).into()),
        };

        // Extra dashboard origin, as deployed behind an ingress
        if let Ok(origin) = std::env::var("CLIENT_IP") {
            if !origin.is_empty() && !cfg.allowed_origins.contains(&origin) {
                cfg.allowed_origins.push(origin);
            }
        }

        Ok(cfg)
    }

    pub fn parse(data: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let cfg: Config =
            serde_yaml::from_str(data).map_err(|e| format!("parsing config: {}", e))?;

        if cfg.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".into());
        }
        if cfg.session_ttl_secs == 0 {
            return Err("session_ttl_secs must be greater than zero".into());
        }
        if cfg.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than zero".into());
        }

        Ok(cfg)
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn aggregation_timeout(&self) -> Option<Duration> {
        self.aggregation_timeout_secs.map(Duration::from_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
