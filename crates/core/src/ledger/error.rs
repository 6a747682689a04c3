//! Error types for the ledger module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing a ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Ledger file does not exist.
    #[error("Ledger not found: {path}")]
    NotFound { path: PathBuf },

    /// File extension is not a supported ledger format.
    #[error("Unsupported ledger format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Spreadsheet could not be parsed.
    #[error("Malformed ledger {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// Row index is past the last data row.
    #[error("Row {row} out of range for {path} ({rows} data rows)")]
    RowOutOfRange {
        path: PathBuf,
        row: usize,
        rows: usize,
    },

    /// Writing the ledger back to disk failed.
    #[error("Failed to write ledger {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    /// CSV reader/writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// Creates a malformed ledger error.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a write failure error.
    pub fn write_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::WriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LedgerError::RowOutOfRange {
            path: PathBuf::from("/tasks/a/tasks.csv"),
            row: 7,
            rows: 3,
        };
        assert_eq!(
            err.to_string(),
            "Row 7 out of range for /tasks/a/tasks.csv (3 data rows)"
        );

        let err = LedgerError::malformed("/tasks/a/tasks.xlsx", "zip error");
        assert_eq!(err.to_string(), "Malformed ledger /tasks/a/tasks.xlsx: zip error");
    }
}
