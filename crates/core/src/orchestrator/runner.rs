//! Task orchestrator implementation.
//!
//! Drives every task group under a root directory through the session:
//! one item at a time, submit, wait for the video, download it, mark the row.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::download::{DownloadError, DownloadValidator};
use crate::ledger::{LedgerStore, WorkItem};
use crate::metrics;
use crate::poller::{CompletionPoller, GenerationFailure, PollOutcome};
use crate::scanner::{check_root, discover_groups, TaskGroup};
use crate::session::{AutomationSession, SmartDelay, SubmissionRequest};

use super::types::{
    FailureStage, GroupPlan, ItemOutcome, ItemStage, OrchestratorError, PlannedItem, RunEvent,
    RunStatistics,
};

const SEPARATOR_WIDTH: usize = 50;

/// Capacity of the event channel created by [`TaskOrchestrator::spawn`].
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// The task orchestrator - drives work items through the session.
pub struct TaskOrchestrator {
    config: Config,
    session: Arc<dyn AutomationSession>,
    ledger: LedgerStore,
    poller: CompletionPoller,
    downloader: DownloadValidator,
    delay: SmartDelay,
    events: Option<mpsc::Sender<RunEvent>>,
    cancel: CancellationToken,
    running: AtomicBool,
}

impl TaskOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: Config,
        session: Arc<dyn AutomationSession>,
    ) -> Result<Self, OrchestratorError> {
        let downloader = DownloadValidator::new(config.download.clone())?;

        Ok(Self {
            ledger: LedgerStore::new(config.ledger.clone()),
            poller: CompletionPoller::new(config.poller.clone()),
            delay: SmartDelay::new(config.smart_delay.clone()),
            downloader,
            session,
            config,
            events: None,
            cancel: CancellationToken::new(),
            running: AtomicBool::new(false),
        })
    }

    /// Stream run events to `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<RunEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token that stops the run at the next suspension point.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether a run is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Lists what a run over `root` would process. Touches nothing.
    pub fn plan(&self, root: &Path) -> Result<Vec<GroupPlan>, OrchestratorError> {
        plan_run(&self.config, root)
    }

    /// Runs on a background task.
    ///
    /// When no event channel was configured, one is created and handed out
    /// through [`RunHandle::events`].
    pub fn spawn(mut self, root: PathBuf) -> RunHandle {
        let events = if self.events.is_none() {
            let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
            self.events = Some(tx);
            Some(rx)
        } else {
            None
        };
        let cancel = self.cancel.clone();

        let join = tokio::spawn(async move { self.run(&root).await });

        RunHandle {
            cancel,
            events,
            join,
        }
    }

    /// Processes every task group under `root`.
    ///
    /// Fails only when the root is invalid or the session cannot be opened.
    /// Everything that goes wrong with a single item is counted in the
    /// returned statistics instead.
    pub async fn run(&self, root: &Path) -> Result<RunStatistics, OrchestratorError> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Orchestrator already running");
            return Err(OrchestratorError::AlreadyRunning);
        }

        let result = self.run_inner(root).await;
        self.running.store(false, Ordering::SeqCst);

        let label = if result.is_ok() { "finished" } else { "failed" };
        metrics::RUNS_TOTAL.with_label_values(&[label]).inc();
        result
    }

    async fn run_inner(&self, root: &Path) -> Result<RunStatistics, OrchestratorError> {
        let mut stats = RunStatistics::new();
        info!("{}", "=".repeat(SEPARATOR_WIDTH));
        info!("Starting run {} over {}", stats.run_id, root.display());
        self.emit(RunEvent::RunStarted {
            run_id: stats.run_id,
            root: root.to_path_buf(),
        })
        .await;

        if let Err(e) = check_root(root) {
            error!("Cannot start run: {}", e);
            self.close_session().await;
            return Err(e.into());
        }

        info!("Opening {} session", self.session.name());
        if let Err(e) = self.session.open().await {
            error!("Failed to open session: {}", e);
            self.close_session().await;
            return Err(OrchestratorError::SessionOpen(e));
        }

        let groups = discover_groups(root);
        if groups.is_empty() {
            info!("No task groups found under {}", root.display());
        }

        for group in &groups {
            if self.cancel.is_cancelled() {
                info!("Run cancelled, skipping remaining groups");
                break;
            }
            self.process_group(group, &mut stats).await;
        }

        self.close_session().await;
        stats.finish();
        self.report(&stats);
        self.emit(RunEvent::RunFinished {
            statistics: stats.clone(),
        })
        .await;

        Ok(stats)
    }

    /// Processes the pending items of one group in row order.
    pub async fn process_group(&self, group: &TaskGroup, stats: &mut RunStatistics) {
        info!("Processing group {}", group.name);
        let items = self.ledger.pending_items(group);
        stats.groups += 1;
        metrics::GROUPS_PROCESSED.inc();

        self.emit(RunEvent::GroupStarted {
            group: group.name.clone(),
            pending: items.len(),
        })
        .await;

        let mut completed = 0;
        let mut failed = 0;
        let total = items.len();

        for (idx, item) in items.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Run cancelled, stopping group {}", group.name);
                break;
            }

            info!(
                "Processing item {}/{} of {}: row {} ({})",
                idx + 1,
                total,
                group.name,
                item.row + 1,
                item.prompt_preview()
            );
            self.emit(RunEvent::ItemStarted {
                group: group.name.clone(),
                row: item.row,
                sequence: item.sequence,
            })
            .await;

            let outcome = self.process_item(group, item).await;
            log_outcome(group, item, &outcome);
            metrics::ITEMS_TOTAL
                .with_label_values(&[outcome.metric_label()])
                .inc();
            stats.record(&outcome);
            if outcome.is_completed() {
                completed += 1;
            } else {
                failed += 1;
            }

            self.emit(RunEvent::ItemFinished {
                group: group.name.clone(),
                row: item.row,
                outcome,
            })
            .await;

            self.pace().await;
        }

        info!(
            "Group {} done: {} completed, {} failed",
            group.name, completed, failed
        );
        self.emit(RunEvent::GroupFinished {
            group: group.name.clone(),
            completed,
            failed,
        })
        .await;
    }

    /// Runs one item through submit, poll, download and ledger update.
    ///
    /// Never fails: every error becomes an [`ItemOutcome::Failed`].
    pub async fn process_item(&self, group: &TaskGroup, item: &WorkItem) -> ItemOutcome {
        if self.cancel.is_cancelled() {
            return ItemOutcome::failed(FailureStage::Cancelled, "cancelled before submission");
        }

        let request = SubmissionRequest {
            asset_path: item.asset_path.clone(),
            prompt: item.prompt.clone(),
            options: self.config.generation,
        };

        self.progress(group, item, ItemStage::Submitting).await;
        if let Err(e) = self.session.submit(&request).await {
            return ItemOutcome::failed(FailureStage::Submission, e);
        }

        self.progress(group, item, ItemStage::Generating).await;
        let started = Instant::now();
        let locator = match self
            .poller
            .await_completion(self.session.as_ref(), &self.cancel)
            .await
        {
            PollOutcome::Success(locator) => locator,
            PollOutcome::Failure(GenerationFailure::Cancelled) => {
                return ItemOutcome::failed(FailureStage::Cancelled, GenerationFailure::Cancelled);
            }
            PollOutcome::Failure(failure) => {
                return ItemOutcome::failed(FailureStage::Generation, failure);
            }
        };
        metrics::GENERATION_DURATION.observe(started.elapsed().as_secs_f64());

        self.progress(group, item, ItemStage::Downloading).await;
        let file_name = self.downloader.file_name_for(item.sequence, &item.prompt);
        let artifact = match self
            .downloader
            .fetch_and_verify(&locator, &group.directory, &file_name, &self.cancel)
            .await
        {
            Ok(artifact) => artifact,
            Err(DownloadError::Cancelled) => {
                return ItemOutcome::failed(FailureStage::Cancelled, DownloadError::Cancelled);
            }
            Err(e) => return ItemOutcome::failed(FailureStage::Download, e),
        };

        self.progress(group, item, ItemStage::RecordingLedger).await;
        let ledger_updated = match self.ledger.mark_completed(group, item.row) {
            Ok(()) => {
                metrics::LEDGER_WRITES.with_label_values(&["success"]).inc();
                true
            }
            Err(e) => {
                metrics::LEDGER_WRITES.with_label_values(&["failed"]).inc();
                error!(
                    "Video saved to {} but row {} of {} was not marked: {}",
                    artifact.path.display(),
                    item.row + 1,
                    group.ledger_path.display(),
                    e
                );
                false
            }
        };

        ItemOutcome::Completed {
            artifact,
            ledger_updated,
        }
    }

    /// Random pause between items, cut short by cancellation.
    async fn pace(&self) {
        let delay = self.delay.random();
        if delay.is_zero() {
            return;
        }
        debug!("Pausing {:?} before the next item", delay);
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
        }
    }

    async fn close_session(&self) {
        if let Err(e) = self.session.close().await {
            warn!("Failed to close session: {}", e);
        }
    }

    async fn progress(&self, group: &TaskGroup, item: &WorkItem, stage: ItemStage) {
        self.emit(RunEvent::ItemProgress {
            group: group.name.clone(),
            row: item.row,
            stage,
        })
        .await;
    }

    /// Emit a run event.
    ///
    /// A closed or missing channel is not an error for the run.
    async fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).await.is_err() {
                debug!("Run event receiver dropped");
            }
        }
    }

    fn report(&self, stats: &RunStatistics) {
        info!("{}", "=".repeat(SEPARATOR_WIDTH));
        info!("Run {} finished", stats.run_id);
        info!(
            "Attempted: {}, completed: {}, failed: {}",
            stats.attempted, stats.completed, stats.failed
        );
        info!("Success rate: {:.1}%", stats.success_rate());
        if stats.failed > 0 {
            info!(
                "Failures: {} submission, {} generation, {} download, {} cancelled",
                stats.submission_failures,
                stats.generation_failures,
                stats.download_failures,
                stats.cancelled
            );
        }
        if stats.ledger_write_errors > 0 {
            warn!(
                "{} videos were saved but their ledger rows could not be updated",
                stats.ledger_write_errors
            );
        }
        info!("{}", "=".repeat(SEPARATOR_WIDTH));
    }
}

fn log_outcome(group: &TaskGroup, item: &WorkItem, outcome: &ItemOutcome) {
    match outcome {
        ItemOutcome::Completed { artifact, .. } => info!(
            "Row {} of {} completed: {}",
            item.row + 1,
            group.name,
            artifact.path.display()
        ),
        ItemOutcome::Failed { stage, reason } => warn!(
            "Row {} of {} failed at {}: {}",
            item.row + 1,
            group.name,
            stage,
            reason
        ),
    }
}

/// Lists the groups under `root` and the items a run would process.
pub fn plan_run(config: &Config, root: &Path) -> Result<Vec<GroupPlan>, OrchestratorError> {
    check_root(root)?;
    let ledger = LedgerStore::new(config.ledger.clone());
    let download = &config.download;

    let plans = discover_groups(root)
        .into_iter()
        .map(|group| {
            let items = ledger
                .pending_items(&group)
                .into_iter()
                .map(|item| PlannedItem {
                    row: item.row + 1,
                    sequence: item.sequence,
                    output_name: crate::download::artifact_file_name(
                        item.sequence,
                        &item.prompt,
                        download.prompt_slice_chars,
                        &download.extension,
                    ),
                    prompt: item.prompt,
                    asset_path: item.asset_path,
                })
                .collect();
            GroupPlan {
                group: group.name,
                directory: group.directory,
                ledger_path: group.ledger_path,
                assets: group.assets.len(),
                items,
            }
        })
        .collect();

    Ok(plans)
}

/// Handle to a run started with [`TaskOrchestrator::spawn`].
pub struct RunHandle {
    cancel: CancellationToken,
    events: Option<mpsc::Receiver<RunEvent>>,
    join: JoinHandle<Result<RunStatistics, OrchestratorError>>,
}

impl RunHandle {
    /// Asks the run to stop at the next suspension point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Takes the event receiver. Returns `None` on later calls, or when the
    /// orchestrator was built with its own channel.
    pub fn events(&mut self) -> Option<mpsc::Receiver<RunEvent>> {
        self.events.take()
    }

    /// Waits for the run to end.
    pub async fn join(self) -> Result<RunStatistics, OrchestratorError> {
        self.join
            .await
            .map_err(|e| OrchestratorError::TaskFailed(e.to_string()))?
    }
}
