//! Configuration for the ledger store.

use serde::{Deserialize, Serialize};

/// Column layout and completion marker of the spreadsheet ledgers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// 1-based column holding the prompt text.
    #[serde(default = "default_prompt_column")]
    pub prompt_column: usize,

    /// 1-based column holding the row status.
    #[serde(default = "default_status_column")]
    pub status_column: usize,

    /// Status text written once a row's video has been saved.
    /// Rows carrying exactly this text are never processed again.
    #[serde(default = "default_completed_marker")]
    pub completed_marker: String,
}

fn default_prompt_column() -> usize {
    3
}

fn default_status_column() -> usize {
    5
}

fn default_completed_marker() -> String {
    "已生成视频".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            prompt_column: default_prompt_column(),
            status_column: default_status_column(),
            completed_marker: default_completed_marker(),
        }
    }
}

impl LedgerConfig {
    /// Sets the prompt column (1-based).
    pub fn with_prompt_column(mut self, column: usize) -> Self {
        self.prompt_column = column;
        self
    }

    /// Sets the status column (1-based).
    pub fn with_status_column(mut self, column: usize) -> Self {
        self.status_column = column;
        self
    }

    /// Sets the completed marker.
    pub fn with_completed_marker(mut self, marker: impl Into<String>) -> Self {
        self.completed_marker = marker.into();
        self
    }

    /// 0-based index of the prompt column.
    pub(crate) fn prompt_index(&self) -> usize {
        self.prompt_column.saturating_sub(1)
    }

    /// 0-based index of the status column.
    pub(crate) fn status_index(&self) -> usize {
        self.status_column.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.prompt_column, 3);
        assert_eq!(config.status_column, 5);
        assert_eq!(config.completed_marker, "已生成视频");
        assert_eq!(config.prompt_index(), 2);
        assert_eq!(config.status_index(), 4);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            status_column = 2
            completed_marker = "done"
        "#;
        let config: LedgerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.prompt_column, 3);
        assert_eq!(config.status_column, 2);
        assert_eq!(config.completed_marker, "done");
    }
}
