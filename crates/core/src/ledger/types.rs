//! Types for the ledger module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// On-disk format of a ledger file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerFormat {
    /// Comma separated values.
    Csv,
    /// Office Open XML workbook (first worksheet is used).
    Xlsx,
}

impl LedgerFormat {
    /// Detects the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }
}

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Builds a cell from raw text, mapping blank strings to `Empty`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Self::Empty
        } else {
            Self::Text(text)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            // Integral values render without a trailing ".0"
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One eligible ledger row joined with its image asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// 0-based data row index (the header row is not counted).
    pub row: usize,
    /// Asset sequence number, always `row + 1`.
    pub sequence: u32,
    /// Trimmed prompt text.
    pub prompt: String,
    /// Image uploaded for this row.
    pub asset_path: PathBuf,
    /// Status cell as read, empty when absent.
    pub status: String,
}

impl WorkItem {
    /// Short prompt preview for log lines.
    pub fn prompt_preview(&self) -> String {
        const PREVIEW_CHARS: usize = 50;
        if self.prompt.chars().count() > PREVIEW_CHARS {
            let head: String = self.prompt.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.prompt.clone()
        }
    }
}
