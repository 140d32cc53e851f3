use serde::Serialize;
use thiserror::Error;

/// Failure kinds of the credential lifecycle and the remote append path.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SyncError {
    /// Missing or malformed credential material, invalid assertion lifetime.
    /// Disables remote sync for the rest of the process.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token endpoint rejected the assertion.
    #[error("token endpoint rejected assertion ({status}): {error}: {description}")]
    Auth {
        status: u16,
        error: String,
        description: String,
    },

    /// Transport failure or timeout on either network call.
    #[error("network error: {0}")]
    Network(String),

    /// Append endpoint returned a structured error.
    #[error("remote api error ({status} {api_status}): {message}")]
    RemoteApi {
        status: u16,
        api_status: String,
        message: String,
    },

    #[error("invalid append request: {0}")]
    InvalidRequest(String),

    #[error("unknown destination '{0}'")]
    UnknownDestination(String),
}

impl SyncError {
    /// Short label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            SyncError::Configuration(_) => "configuration",
            SyncError::Auth { .. } => "auth",
            SyncError::Network(_) => "network",
            SyncError::RemoteApi { .. } => "remote_api",
            SyncError::InvalidRequest(_) => "invalid_request",
            SyncError::UnknownDestination(_) => "unknown_destination",
        }
    }

    /// True for errors raised before anything was sent over the wire.
    pub fn is_rejected_locally(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidRequest(_) | SyncError::UnknownDestination(_)
        )
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Network(format!("request timed out: {err}"))
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
