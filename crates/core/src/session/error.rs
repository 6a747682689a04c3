//! Error types for the session module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by an automation session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An operation did not finish in time.
    #[error("Session operation '{operation}' timed out after {timeout_ms} ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// The automation backend could not be reached.
    #[error("Failed to connect to automation backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// The backend answered with an error.
    #[error("Automation backend error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The page offers nowhere to upload the image.
    #[error("Upload target not found: {reason}")]
    UploadTargetMissing { reason: String },

    /// The backend answered with something we could not interpret.
    #[error("Invalid response from automation backend: {reason}")]
    InvalidResponse { reason: String },

    /// An operation was attempted before `open` succeeded.
    #[error("Session is not open")]
    NotOpen,

    /// The image to upload could not be read.
    #[error("Failed to read asset {path}: {source}")]
    AssetUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// Creates an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(reason: impl ToString) -> Self {
        Self::InvalidResponse {
            reason: reason.to_string(),
        }
    }

    /// Whether the failure is transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ConnectionFailed { .. })
    }
}
