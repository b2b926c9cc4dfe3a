//! Client error types.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the portal client.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The backend rejected the credential. The session has already been
    /// cleared by the time a caller sees this.
    #[error("Session expired or not authenticated")]
    Unauthorized,

    /// Non-auth error status; `detail` is the backend's message verbatim.
    #[error("Request failed with status {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    /// Network or transport failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Session store persistence error.
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PortalError {
    /// Returns true if this error invalidated the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PortalError::Unauthorized)
    }

    /// Message suitable for an inline form error.
    pub fn detail(&self) -> String {
        match self {
            PortalError::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        PortalError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(e: serde_json::Error) -> Self {
        PortalError::Decode(e.to_string())
    }
}

impl From<serde_yaml::Error> for PortalError {
    fn from(e: serde_yaml::Error) -> Self {
        PortalError::Store(e.to_string())
    }
}

impl From<std::io::Error> for PortalError {
    fn from(e: std::io::Error) -> Self {
        PortalError::Store(e.to_string())
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, PortalError>;
