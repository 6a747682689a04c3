use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::download::DownloadConfig;
use crate::ledger::LedgerConfig;
use crate::poller::PollerConfig;
use crate::session::{GenerationOptions, SessionConfig, SmartDelayConfig};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Directory whose subdirectories are the task groups.
    #[serde(default)]
    pub root_directory: Option<PathBuf>,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub generation: GenerationOptions,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub smart_delay: SmartDelayConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

impl Config {
    /// Sets the root directory.
    pub fn with_root_directory(mut self, root: impl Into<PathBuf>) -> Self {
        self.root_directory = Some(root.into());
        self
    }
}
