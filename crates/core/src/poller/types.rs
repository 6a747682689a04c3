//! Types for the poller module.

use std::fmt;

use crate::session::{ArtifactLocator, SessionError};

/// Non-terminal states of one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Submitted, the generating indicator has not appeared yet.
    AwaitingStart,
    /// The generating indicator has been seen.
    InProgress,
}

/// Why a generation did not produce a video.
#[derive(Debug)]
pub enum GenerationFailure {
    /// The generating indicator disappeared without a result.
    Aborted,
    /// The per-item deadline elapsed.
    TimedOut,
    /// The remote application reported a failure.
    Rejected(String),
    /// The status query itself failed.
    Transport(SessionError),
    /// The run was cancelled while waiting.
    Cancelled,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted => write!(f, "generation aborted"),
            Self::TimedOut => write!(f, "generation timed out"),
            Self::Rejected(reason) => write!(f, "generation rejected: {}", reason),
            Self::Transport(e) => write!(f, "status query failed: {}", e),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal result of waiting for one generation.
#[derive(Debug)]
pub enum PollOutcome {
    Success(ArtifactLocator),
    Failure(GenerationFailure),
}

impl PollOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}
