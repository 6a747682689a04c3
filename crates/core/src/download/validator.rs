//! Fetches generated videos and verifies them before they count as saved.

use std::path::Path;
use std::time::Instant;

use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::session::ArtifactLocator;

use super::config::DownloadConfig;
use super::error::DownloadError;
use super::naming::artifact_file_name;
use super::retry::{retry_with_backoff, Retried, RetryError, RetryPolicy};
use super::signature::{detect_container, hex_preview, HEADER_LEN};
use super::types::{ContainerKind, DownloadedArtifact};

/// Downloads an artifact to `<name>.part`, verifies it and renames it.
pub struct DownloadValidator {
    client: Client,
    config: DownloadConfig,
    policy: RetryPolicy,
}

impl DownloadValidator {
    /// Create a new validator.
    pub fn new(config: DownloadConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DownloadError::Client(e.to_string()))?;
        let policy = RetryPolicy::from_config(&config);

        Ok(Self {
            client,
            config,
            policy,
        })
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// File name for the video of item `sequence`.
    pub fn file_name_for(&self, sequence: u32, prompt: &str) -> String {
        artifact_file_name(
            sequence,
            prompt,
            self.config.prompt_slice_chars,
            &self.config.extension,
        )
    }

    /// Fetches `locator` into `destination_dir/file_name`.
    ///
    /// Nothing is left behind on failure: partial files are removed after
    /// every failed attempt and on cancellation.
    pub async fn fetch_and_verify(
        &self,
        locator: &ArtifactLocator,
        destination_dir: &Path,
        file_name: &str,
        cancel: &CancellationToken,
    ) -> Result<DownloadedArtifact, DownloadError> {
        let final_path = destination_dir.join(file_name);
        let part_path = destination_dir.join(format!("{}.part", file_name));
        let part = part_path.as_path();
        let started = Instant::now();

        info!("Downloading {} to {}", locator, final_path.display());

        let result = retry_with_backoff(
            &self.policy,
            cancel,
            DownloadError::is_retryable,
            |attempt| self.attempt(locator, part, attempt, cancel),
        )
        .await;

        let Retried {
            value: (size_bytes, container),
            attempts,
        } = match result {
            Ok(retried) => retried,
            Err(e) => {
                remove_partial(part).await;
                metrics::DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
                return Err(match e {
                    RetryError::Exhausted {
                        attempts,
                        last_error,
                    } => DownloadError::RetriesExhausted {
                        attempts,
                        last_error: Box::new(last_error),
                    },
                    RetryError::Fatal { error, .. } => error,
                    RetryError::Cancelled { .. } => DownloadError::Cancelled,
                });
            }
        };

        if let Err(e) = fs::rename(part, &final_path).await {
            remove_partial(part).await;
            metrics::DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
            return Err(DownloadError::write(&final_path, e));
        }

        metrics::DOWNLOADS_TOTAL.with_label_values(&["success"]).inc();
        metrics::DOWNLOAD_DURATION.observe(started.elapsed().as_secs_f64());
        info!(
            "Saved {} ({} bytes, {}, attempt {})",
            final_path.display(),
            size_bytes,
            container,
            attempts
        );

        Ok(DownloadedArtifact {
            path: final_path,
            size_bytes,
            container,
            attempts,
        })
    }

    async fn attempt(
        &self,
        locator: &ArtifactLocator,
        part: &Path,
        attempt: u32,
        cancel: &CancellationToken,
    ) -> Result<(u64, ContainerKind), DownloadError> {
        debug!("Download attempt {} for {}", attempt, locator);
        metrics::DOWNLOAD_ATTEMPTS.inc();

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(DownloadError::Cancelled),
            result = self.fetch_once(locator.as_str(), part) => result,
        };

        if let Err(e) = &result {
            warn!("Download attempt {} failed: {}", attempt, e);
            remove_partial(part).await;
        }
        result
    }

    async fn fetch_once(&self, url: &str, part: &Path) -> Result<(u64, ContainerKind), DownloadError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transfer_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let declared = response.content_length();

        let mut file = fs::File::create(part)
            .await
            .map_err(|e| DownloadError::write(part, e))?;
        let mut header = Vec::with_capacity(HEADER_LEN);
        let mut written: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.transfer_error(url, e))?
        {
            if header.len() < HEADER_LEN {
                let take = (HEADER_LEN - header.len()).min(chunk.len());
                header.extend_from_slice(&chunk[..take]);
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::write(part, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| DownloadError::write(part, e))?;
        drop(file);

        let container = verify(&header, written, declared, self.config.min_size_bytes)?;
        Ok((written, container))
    }

    fn transfer_error(&self, url: &str, e: reqwest::Error) -> DownloadError {
        if e.is_timeout() {
            DownloadError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }
        } else {
            DownloadError::Transfer {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Checks size and container signature of a finished transfer.
pub(crate) fn verify(
    header: &[u8],
    written: u64,
    declared: Option<u64>,
    min_size_bytes: u64,
) -> Result<ContainerKind, DownloadError> {
    match declared {
        Some(expected) if expected != written => {
            return Err(DownloadError::LengthMismatch {
                expected,
                actual: written,
            })
        }
        None if written < min_size_bytes => {
            return Err(DownloadError::TooSmall {
                actual: written,
                minimum: min_size_bytes,
            })
        }
        _ => {}
    }

    detect_container(header).ok_or_else(|| DownloadError::InvalidSignature {
        header: hex_preview(header),
    })
}

async fn remove_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {}", path.display(), e),
    }
}
