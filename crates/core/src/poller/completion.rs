//! Generation-completion state machine.

use std::collections::HashSet;

use tokio::sync::RwLock;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::session::{ArtifactLocator, AutomationSession, GenerationStatus};

use super::config::PollerConfig;
use super::types::{GenerationFailure, PollOutcome, PollState};

/// Waits for submitted generations to finish.
///
/// The poller remembers every locator it has handed out during the run. The
/// remote page keeps showing the previous item's video for a while after a
/// new submission, and that stale result must not be taken for the new one.
#[derive(Debug)]
pub struct CompletionPoller {
    config: PollerConfig,
    consumed: RwLock<HashSet<ArtifactLocator>>,
}

impl CompletionPoller {
    pub fn new(config: PollerConfig) -> Self {
        Self {
            config,
            consumed: RwLock::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Whether `locator` was already returned for an earlier item.
    pub async fn is_consumed(&self, locator: &ArtifactLocator) -> bool {
        self.consumed.read().await.contains(locator)
    }

    /// Number of locators handed out so far.
    pub async fn consumed_count(&self) -> usize {
        self.consumed.read().await.len()
    }

    /// Polls `session` until the current generation reaches a terminal state.
    pub async fn await_completion(
        &self,
        session: &dyn AutomationSession,
        cancel: &CancellationToken,
    ) -> PollOutcome {
        let deadline = Instant::now() + self.config.generation_timeout();
        let interval = self.config.poll_interval();
        let mut state = PollState::AwaitingStart;

        loop {
            if cancel.is_cancelled() {
                return PollOutcome::Failure(GenerationFailure::Cancelled);
            }

            match session.generation_status().await {
                Err(e) => {
                    warn!("Status query failed: {}", e);
                    return PollOutcome::Failure(GenerationFailure::Transport(e));
                }
                Ok(GenerationStatus::Awaiting) => {
                    if state == PollState::InProgress {
                        warn!("Generation indicator disappeared without a result");
                        return PollOutcome::Failure(GenerationFailure::Aborted);
                    }
                }
                Ok(GenerationStatus::InProgress) => {
                    if state == PollState::AwaitingStart {
                        info!("Generation started");
                        state = PollState::InProgress;
                    }
                }
                Ok(GenerationStatus::Succeeded { locator }) => {
                    if self.is_consumed(&locator).await {
                        debug!("Ignoring result of a previous item: {}", locator);
                    } else {
                        return self.settle(locator, cancel).await;
                    }
                }
                Ok(GenerationStatus::Failed { reason }) => {
                    warn!("Generation rejected: {}", reason);
                    return PollOutcome::Failure(GenerationFailure::Rejected(reason));
                }
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(
                    "Generation did not finish within {} ms",
                    self.config.generation_timeout_ms
                );
                return PollOutcome::Failure(GenerationFailure::TimedOut);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    return PollOutcome::Failure(GenerationFailure::Cancelled);
                }
                _ = sleep(interval.min(deadline - now)) => {}
            }
        }
    }

    /// Lets the remote page finish rendering, then claims the locator.
    async fn settle(&self, locator: ArtifactLocator, cancel: &CancellationToken) -> PollOutcome {
        info!("Generation finished: {}", locator);
        tokio::select! {
            _ = cancel.cancelled() => {
                return PollOutcome::Failure(GenerationFailure::Cancelled);
            }
            _ = sleep(self.config.settle_delay()) => {}
        }
        self.consumed.write().await.insert(locator.clone());
        PollOutcome::Success(locator)
    }
}
