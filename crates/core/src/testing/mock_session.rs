//! Scripted automation session for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::session::{
    ArtifactLocator, AutomationSession, GenerationStatus, SessionError, SubmissionRequest,
};

/// One answer of a status script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Report this status.
    Status(GenerationStatus),
    /// Fail the status query with an API error carrying this message.
    QueryError(String),
}

impl From<GenerationStatus> for ScriptStep {
    fn from(status: GenerationStatus) -> Self {
        Self::Status(status)
    }
}

impl ScriptStep {
    pub fn awaiting() -> Self {
        Self::Status(GenerationStatus::Awaiting)
    }

    pub fn in_progress() -> Self {
        Self::Status(GenerationStatus::InProgress)
    }

    pub fn succeeded(locator: impl Into<String>) -> Self {
        Self::Status(GenerationStatus::Succeeded {
            locator: ArtifactLocator::new(locator),
        })
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Status(GenerationStatus::Failed {
            reason: reason.into(),
        })
    }
}

/// A recorded submission for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    /// The request that was submitted.
    pub request: SubmissionRequest,
    /// Whether the submission was accepted.
    pub success: bool,
}

/// Mock implementation of the AutomationSession trait.
///
/// Each accepted submission starts the next queued status script. Status
/// queries walk through the script and keep repeating its last step, so a
/// single `in_progress` step never finishes.
///
/// # Example
///
/// ```rust,ignore
/// use framecast_core::testing::{ScriptStep, ScriptedSession};
///
/// let session = ScriptedSession::new();
/// session
///     .push_script(vec![ScriptStep::in_progress(), ScriptStep::succeeded("http://x/1.mp4")])
///     .await;
///
/// session.open().await?;
/// session.submit(&request).await?;
/// assert_eq!(session.submission_count().await, 1);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedSession {
    /// Scripts waiting for a submission.
    scripts: Arc<RwLock<VecDeque<Vec<ScriptStep>>>>,
    /// Script of the current submission.
    current: Arc<RwLock<VecDeque<ScriptStep>>>,
    /// Recorded submissions.
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
    /// If set, the next submission fails with this error.
    next_submit_error: Arc<RwLock<Option<SessionError>>>,
    /// If set, `open` fails with this error.
    open_error: Arc<RwLock<Option<SessionError>>>,
    open: Arc<RwLock<bool>>,
    alive: Arc<RwLock<bool>>,
    open_count: Arc<RwLock<usize>>,
    close_count: Arc<RwLock<usize>>,
    status_queries: Arc<RwLock<usize>>,
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSession {
    /// Create a new scripted session.
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(RwLock::new(VecDeque::new())),
            current: Arc::new(RwLock::new(VecDeque::new())),
            submissions: Arc::new(RwLock::new(Vec::new())),
            next_submit_error: Arc::new(RwLock::new(None)),
            open_error: Arc::new(RwLock::new(None)),
            open: Arc::new(RwLock::new(false)),
            alive: Arc::new(RwLock::new(true)),
            open_count: Arc::new(RwLock::new(0)),
            close_count: Arc::new(RwLock::new(0)),
            status_queries: Arc::new(RwLock::new(0)),
        }
    }

    /// Queue the status script of a future submission.
    pub async fn push_script(&self, steps: Vec<ScriptStep>) {
        self.scripts.write().await.push_back(steps);
    }

    /// Replace the script of the current submission.
    pub async fn set_current_script(&self, steps: Vec<ScriptStep>) {
        *self.current.write().await = steps.into();
    }

    /// Configure the next submission to fail with the given error.
    pub async fn set_next_submit_error(&self, error: SessionError) {
        *self.next_submit_error.write().await = Some(error);
    }

    /// Configure `open` to fail with the given error.
    pub async fn set_open_error(&self, error: SessionError) {
        *self.open_error.write().await = Some(error);
    }

    /// Set what `is_alive` reports.
    pub async fn set_alive(&self, alive: bool) {
        *self.alive.write().await = alive;
    }

    /// Get all recorded submissions.
    pub async fn recorded_submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().await.clone()
    }

    /// Get the number of submissions attempted.
    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }

    pub async fn open_count(&self) -> usize {
        *self.open_count.read().await
    }

    pub async fn close_count(&self) -> usize {
        *self.close_count.read().await
    }

    pub async fn status_query_count(&self) -> usize {
        *self.status_queries.read().await
    }
}

#[async_trait]
impl AutomationSession for ScriptedSession {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self) -> Result<(), SessionError> {
        *self.open_count.write().await += 1;
        if let Some(error) = self.open_error.write().await.take() {
            return Err(error);
        }
        *self.open.write().await = true;
        Ok(())
    }

    async fn submit(&self, request: &SubmissionRequest) -> Result<(), SessionError> {
        if !*self.open.read().await {
            return Err(SessionError::NotOpen);
        }

        if let Some(error) = self.next_submit_error.write().await.take() {
            self.submissions.write().await.push(RecordedSubmission {
                request: request.clone(),
                success: false,
            });
            return Err(error);
        }

        let script = self.scripts.write().await.pop_front().unwrap_or_default();
        *self.current.write().await = script.into();
        self.submissions.write().await.push(RecordedSubmission {
            request: request.clone(),
            success: true,
        });
        Ok(())
    }

    async fn generation_status(&self) -> Result<GenerationStatus, SessionError> {
        if !*self.open.read().await {
            return Err(SessionError::NotOpen);
        }
        *self.status_queries.write().await += 1;

        let step = {
            let mut current = self.current.write().await;
            if current.len() > 1 {
                current.pop_front()
            } else {
                current.front().cloned()
            }
        };

        match step {
            Some(ScriptStep::Status(status)) => Ok(status),
            Some(ScriptStep::QueryError(message)) => Err(SessionError::api(500, message)),
            None => Ok(GenerationStatus::Awaiting),
        }
    }

    async fn is_alive(&self) -> bool {
        *self.alive.read().await && *self.open.read().await
    }

    async fn close(&self) -> Result<(), SessionError> {
        *self.close_count.write().await += 1;
        *self.open.write().await = false;
        Ok(())
    }
}
