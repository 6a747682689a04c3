//! Configuration for the download validator.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fetch, verification and retry settings for generated videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Timeout of a single download attempt in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per artifact, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Factor applied to the delay after each retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound of the retry delay in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Smallest acceptable file when the server declares no length.
    #[serde(default = "default_min_size_bytes")]
    pub min_size_bytes: u64,

    /// Characters of the sanitized prompt kept in the file name.
    #[serde(default = "default_prompt_slice_chars")]
    pub prompt_slice_chars: usize,

    /// Extension of the saved videos.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_min_size_bytes() -> u64 {
    1024
}

fn default_prompt_slice_chars() -> usize {
    10
}

fn default_extension() -> String {
    "mp4".to_string()
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
            min_size_bytes: default_min_size_bytes(),
            prompt_slice_chars: default_prompt_slice_chars(),
            extension: default_extension(),
        }
    }
}

impl DownloadConfig {
    /// Sets the attempt budget.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the initial backoff.
    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = backoff_ms;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the minimum accepted size.
    pub fn with_min_size_bytes(mut self, bytes: u64) -> Self {
        self.min_size_bytes = bytes;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
