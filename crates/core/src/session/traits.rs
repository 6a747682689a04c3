//! Trait definitions for the session module.

use async_trait::async_trait;

use super::error::SessionError;
use super::types::{GenerationStatus, SubmissionRequest};

/// A live connection to the remote video generator.
///
/// Implementations own every detail of the remote page. The orchestrator
/// only sees this contract and uses one session from one task at a time.
#[async_trait]
pub trait AutomationSession: Send + Sync {
    /// Returns the name of this session implementation.
    fn name(&self) -> &str;

    /// Attaches to the browser and navigates to the generator.
    async fn open(&self) -> Result<(), SessionError>;

    /// Uploads the asset, applies options, enters the prompt and starts
    /// generation. A partial failure fails the whole submission.
    async fn submit(&self, request: &SubmissionRequest) -> Result<(), SessionError>;

    /// Reports the generation state of the most recent submission.
    async fn generation_status(&self) -> Result<GenerationStatus, SessionError>;

    /// Best-effort liveness check.
    async fn is_alive(&self) -> bool;

    /// Releases session resources. The user's browser window stays open.
    async fn close(&self) -> Result<(), SessionError>;
}
