//! Error types for the download module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching a generated video.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server answered with a non-success status.
    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// The request failed before a complete body arrived.
    #[error("Transfer of {url} failed: {reason}")]
    Transfer { url: String, reason: String },

    /// The attempt exceeded its timeout.
    #[error("Download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Received byte count disagrees with the declared length.
    #[error("Length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    /// The file is smaller than any plausible video.
    #[error("File too small: {actual} bytes, need at least {minimum}")]
    TooSmall { actual: u64, minimum: u64 },

    /// The header matches no known video container.
    #[error("Unrecognized container signature: {header}")]
    InvalidSignature { header: String },

    /// The destination could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every attempt failed.
    #[error("Download failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<DownloadError>,
    },

    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// The run was cancelled.
    #[error("Download cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Creates a write error.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Cancelled | Self::Client(_) | Self::RetriesExhausted { .. }
        )
    }
}
