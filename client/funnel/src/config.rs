//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use crate::errors::{FunnelError, Result};

/// Transport timeout used when `FUNNEL_HTTP_TIMEOUT_SECS` is unset.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend origin (e.g. https://tickets.example.org), without trailing slash
    pub base_url: String,
    /// Directory holding the progress store slots
    pub state_dir: PathBuf,
    /// Transport timeout applied to every backend request
    pub http_timeout_secs: u64,
    /// Send an `Idempotency-Key` header with registration submissions
    pub idempotency_keys: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            base_url: env_var("FUNNEL_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            state_dir: env_var("FUNNEL_STATE_DIR")
                .unwrap_or_else(|_| "./.funnel".to_string())
                .into(),
            http_timeout_secs: env_var("FUNNEL_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| FunnelError::Config("Invalid FUNNEL_HTTP_TIMEOUT_SECS".to_string()))?,
            idempotency_keys: env_var("FUNNEL_IDEMPOTENCY_KEYS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .map_err(|_| FunnelError::Config("Invalid FUNNEL_IDEMPOTENCY_KEYS".to_string()))?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| FunnelError::Config(format!("Missing env var: {key}")))
}
