//! Download validator: turns an artifact locator into a verified local file.
//!
//! Each attempt streams the body to `<name>.part`, then checks
//!
//! - the byte count against the declared `Content-Length`, or against a
//!   minimum size when the server declares none
//! - the first bytes against the MP4, WebM/Matroska and AVI signatures
//!
//! and only then renames the file into place. Failed attempts delete the
//! partial file and are retried with backoff through [`retry_with_backoff`].
//!
//! # Example
//!
//! ```ignore
//! use framecast_core::download::{DownloadConfig, DownloadValidator};
//!
//! let validator = DownloadValidator::new(DownloadConfig::default())?;
//! let name = validator.file_name_for(item.sequence, &item.prompt);
//! let artifact = validator.fetch_and_verify(&locator, &group.directory, &name, &cancel).await?;
//! ```

mod config;
mod error;
mod naming;
mod retry;
mod signature;
mod types;
mod validator;

pub use config::DownloadConfig;
pub use error::DownloadError;
pub use naming::{artifact_file_name, sanitize_prompt};
pub use retry::{retry_with_backoff, Retried, RetryError, RetryPolicy};
pub use signature::{detect_container, HEADER_LEN};
pub use types::{ContainerKind, DownloadedArtifact};
pub use validator::DownloadValidator;
