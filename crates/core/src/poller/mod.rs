//! Completion poller: decides when a submitted generation is done.
//!
//! After a submission the poller samples [`AutomationSession::generation_status`]
//! at a fixed interval:
//!
//! - `Awaiting` before any progress keeps waiting
//! - `InProgress` marks the generation as started
//! - `Awaiting` after progress means the generation was aborted
//! - `Succeeded` with a fresh locator finishes after a settle delay
//! - `Failed`, a query error, the deadline or cancellation end with a failure
//!
//! [`AutomationSession::generation_status`]: crate::session::AutomationSession::generation_status

mod completion;
mod config;
mod types;

pub use completion::CompletionPoller;
pub use config::PollerConfig;
pub use types::{GenerationFailure, PollOutcome, PollState};
