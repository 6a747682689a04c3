//! Types for the task orchestrator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::download::{DownloadError, DownloadedArtifact};
use crate::scanner::ScanError;
use crate::session::SessionError;

/// Errors that abort a whole run.
///
/// Per-item failures never surface here; they become [`ItemOutcome::Failed`].
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The root directory is missing or not a directory.
    #[error("invalid root directory: {0}")]
    InvalidRoot(#[from] ScanError),

    /// The automation session could not be opened.
    #[error("failed to open automation session: {0}")]
    SessionOpen(#[source] SessionError),

    /// The download client could not be created.
    #[error("failed to set up downloads: {0}")]
    Setup(#[from] DownloadError),

    /// `run` was called while another run was in progress.
    #[error("a run is already in progress")]
    AlreadyRunning,

    /// The spawned run task panicked or was aborted.
    #[error("run task failed: {0}")]
    TaskFailed(String),
}

/// Stage at which an item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Submission,
    Generation,
    Download,
    Cancelled,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Submission => "submission",
            Self::Generation => "generation",
            Self::Download => "download",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Step an item is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStage {
    Submitting,
    Generating,
    Downloading,
    RecordingLedger,
}

/// Terminal result of one work item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// The video is saved. `ledger_updated` is false when the status write
    /// failed afterwards.
    Completed {
        artifact: DownloadedArtifact,
        ledger_updated: bool,
    },
    Failed { stage: FailureStage, reason: String },
}

impl ItemOutcome {
    pub(crate) fn failed(stage: FailureStage, reason: impl ToString) -> Self {
        Self::Failed {
            stage,
            reason: reason.to_string(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Label used for the items metric.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Failed { stage, .. } => match stage {
                FailureStage::Submission => "submission_failed",
                FailureStage::Generation => "generation_failed",
                FailureStage::Download => "download_failed",
                FailureStage::Cancelled => "cancelled",
            },
        }
    }
}

/// Counters of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatistics {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub groups: usize,
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    pub submission_failures: usize,
    pub generation_failures: usize,
    pub download_failures: usize,
    pub cancelled: usize,
    pub ledger_write_errors: usize,
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStatistics {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            groups: 0,
            attempted: 0,
            completed: 0,
            failed: 0,
            submission_failures: 0,
            generation_failures: 0,
            download_failures: 0,
            cancelled: 0,
            ledger_write_errors: 0,
        }
    }

    /// Counts one finished item.
    pub fn record(&mut self, outcome: &ItemOutcome) {
        self.attempted += 1;
        match outcome {
            ItemOutcome::Completed { ledger_updated, .. } => {
                self.completed += 1;
                if !ledger_updated {
                    self.ledger_write_errors += 1;
                }
            }
            ItemOutcome::Failed { stage, .. } => {
                self.failed += 1;
                match stage {
                    FailureStage::Submission => self.submission_failures += 1,
                    FailureStage::Generation => self.generation_failures += 1,
                    FailureStage::Download => self.download_failures += 1,
                    FailureStage::Cancelled => self.cancelled += 1,
                }
            }
        }
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Completed share of attempted items, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.completed as f64 * 100.0 / self.attempted as f64
        }
    }
}

/// One pending item as shown by a dry run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedItem {
    /// 1-based ledger row, header excluded.
    pub row: usize,
    pub sequence: u32,
    pub prompt: String,
    pub asset_path: PathBuf,
    pub output_name: String,
}

/// A discovered group with the items a run would process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPlan {
    pub group: String,
    pub directory: PathBuf,
    pub ledger_path: PathBuf,
    pub assets: usize,
    pub items: Vec<PlannedItem>,
}

/// Progress notifications streamed to whatever front end drives the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        root: PathBuf,
    },
    GroupStarted {
        group: String,
        pending: usize,
    },
    GroupFinished {
        group: String,
        completed: usize,
        failed: usize,
    },
    ItemStarted {
        group: String,
        row: usize,
        sequence: u32,
    },
    ItemProgress {
        group: String,
        row: usize,
        stage: ItemStage,
    },
    ItemFinished {
        group: String,
        row: usize,
        outcome: ItemOutcome,
    },
    RunFinished {
        statistics: RunStatistics,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::ContainerKind;

    fn completed(ledger_updated: bool) -> ItemOutcome {
        ItemOutcome::Completed {
            artifact: DownloadedArtifact {
                path: "/tmp/1_a.mp4".into(),
                size_bytes: 2048,
                container: ContainerKind::Mp4,
                attempts: 1,
            },
            ledger_updated,
        }
    }

    #[test]
    fn test_statistics_record() {
        let mut stats = RunStatistics::new();
        stats.record(&completed(true));
        stats.record(&completed(false));
        stats.record(&ItemOutcome::failed(FailureStage::Generation, "timed out"));
        stats.record(&ItemOutcome::failed(FailureStage::Cancelled, "cancelled"));

        assert_eq!(stats.attempted, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.generation_failures, 1);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.ledger_write_errors, 1);
        assert_eq!(stats.success_rate(), 50.0);
    }

    #[test]
    fn test_success_rate_empty() {
        assert_eq!(RunStatistics::new().success_rate(), 0.0);
    }

    #[test]
    fn test_metric_labels() {
        assert_eq!(completed(true).metric_label(), "completed");
        assert_eq!(
            ItemOutcome::failed(FailureStage::Download, "x").metric_label(),
            "download_failed"
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = RunEvent::ItemFinished {
            group: "batch1".to_string(),
            row: 0,
            outcome: ItemOutcome::failed(FailureStage::Submission, "upload target missing"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "item_finished");
        assert_eq!(json["outcome"]["result"], "failed");
        assert_eq!(json["outcome"]["stage"], "submission");
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::SessionOpen(SessionError::NotOpen);
        assert_eq!(
            err.to_string(),
            "failed to open automation session: Session is not open"
        );
    }
}
