//! Error types for the scanner module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating the scan root.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Root directory does not exist.
    #[error("Root directory not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Root path exists but is not a directory.
    #[error("Root path is not a directory: {path}")]
    RootNotDirectory { path: PathBuf },

    /// Root path was left empty in the configuration.
    #[error("Root directory is not configured")]
    RootNotConfigured,
}
