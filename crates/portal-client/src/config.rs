//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PortalError, Result};

/// Backend used when the origin is a local development host.
const LOCAL_BACKEND_URL: &str = "http://localhost:8000";

/// Portal client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Resolved backend base URL (no trailing slash).
    pub base_url: String,

    /// HTTP request timeout.
    pub request_timeout: Duration,

    /// Number of directory entries revealed per "load more".
    pub page_size: usize,

    /// Pacing delay applied to "load more".
    pub reveal_delay: Duration,

    /// Interval between notification polls.
    pub notification_interval: Duration,

    /// Number of notifications fetched per poll.
    pub notification_limit: u32,

    /// Path of the persisted session file.
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let override_url = std::env::var("PORTAL_BACKEND_URL").ok();
        let origin = std::env::var("PORTAL_ORIGIN")
            .unwrap_or_else(|_| "http://localhost".to_string());
        let base_url = resolve_base_url(override_url.as_deref(), &origin)?;

        let timeout_secs: u64 = std::env::var("PORTAL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let page_size: usize = std::env::var("PORTAL_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(8);

        let reveal_delay_ms: u64 = std::env::var("PORTAL_REVEAL_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(300);

        let notification_secs: u64 = std::env::var("PORTAL_NOTIFICATION_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(30);

        let session_file = match std::env::var("PORTAL_SESSION_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_session_file()?,
        };

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            page_size,
            reveal_delay: Duration::from_millis(reveal_delay_ms),
            notification_interval: Duration::from_secs(notification_secs),
            notification_limit: 5,
            session_file,
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: LOCAL_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            page_size: 8,
            reveal_delay: Duration::from_millis(300),
            notification_interval: Duration::from_secs(30),
            notification_limit: 5,
            session_file: PathBuf::from(".alumni-portal").join("session.yaml"),
        }
    }
}

/// Resolve the backend base URL.
///
/// An explicit override wins. Otherwise a `localhost` origin talks to the
/// local development backend and any other origin to `<origin>/api`.
pub fn resolve_base_url(override_url: Option<&str>, origin: &str) -> Result<String> {
    if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(url.trim_end_matches('/').to_string());
    }

    let parsed = url::Url::parse(origin)
        .map_err(|e| PortalError::Config(format!("invalid origin '{}': {}", origin, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| PortalError::Config(format!("origin '{}' has no host", origin)))?;

    if host == "localhost" {
        return Ok(LOCAL_BACKEND_URL.to_string());
    }

    let authority = match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    Ok(format!("{}://{}/api", parsed.scheme(), authority))
}

fn default_session_file() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PortalError::Config("Could not find home directory".to_string()))?;
    Ok(home.join(".alumni-portal").join("session.yaml"))
}
