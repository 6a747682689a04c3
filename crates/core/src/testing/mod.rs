//! Testing utilities and mock implementations.
//!
//! This module provides a scripted automation session and fixture helpers,
//! allowing end-to-end runs without a browser or a remote generator.
//!
//! # Example
//!
//! ```rust,ignore
//! use framecast_core::testing::{fixtures, ScriptStep, ScriptedSession};
//!
//! let session = ScriptedSession::new();
//! session
//!     .push_script(vec![ScriptStep::in_progress(), ScriptStep::succeeded(url)])
//!     .await;
//!
//! let orchestrator = TaskOrchestrator::new(fixtures::fast_config(), Arc::new(session.clone()))?;
//! ```

mod mock_session;

pub use mock_session::{RecordedSubmission, ScriptStep, ScriptedSession};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::fs;
    use std::path::Path;

    use crate::config::Config;
    use crate::download::DownloadConfig;
    use crate::poller::PollerConfig;
    use crate::session::SmartDelayConfig;

    /// Header written by [`write_csv_ledger`]: prompt in column 3, status in 5.
    pub const LEDGER_HEADER: [&str; 5] = ["id", "name", "prompt", "notes", "status"];

    /// Config with default ledger layout and every delay shortened.
    pub fn fast_config() -> Config {
        let mut config = Config::default();
        config.session.browser_id = "test-profile".to_string();
        config.smart_delay = SmartDelayConfig::none();
        config.poller = PollerConfig::default()
            .with_poll_interval_ms(10)
            .with_generation_timeout_ms(2_000)
            .with_settle_delay_ms(0);
        config.download = DownloadConfig::default()
            .with_backoff_ms(0)
            .with_timeout_secs(5);
        config
    }

    /// A payload that passes MP4 signature checks, `len` bytes long.
    pub fn mp4_payload(len: usize) -> Vec<u8> {
        let mut payload = b"\x00\x00\x00\x18ftypmp42".to_vec();
        payload.resize(len.max(payload.len()), 0);
        payload
    }

    /// Writes a CSV ledger with one pending row per prompt.
    pub fn write_csv_ledger(path: &Path, prompts: &[&str]) -> Result<(), csv::Error> {
        let rows: Vec<(&str, &str)> = prompts.iter().map(|p| (*p, "")).collect();
        write_csv_ledger_with_status(path, &rows)
    }

    /// Writes a CSV ledger from `(prompt, status)` pairs.
    pub fn write_csv_ledger_with_status(path: &Path, rows: &[(&str, &str)]) -> Result<(), csv::Error> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(LEDGER_HEADER)?;
        for (idx, (prompt, status)) in rows.iter().enumerate() {
            let id = (idx + 1).to_string();
            let name = format!("item{}", idx + 1);
            writer.write_record([id.as_str(), name.as_str(), *prompt, "", *status])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Creates a small placeholder image, including parent directories.
    pub fn touch_image(path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, b"\x89PNG\r\n\x1a\n")
    }
}
