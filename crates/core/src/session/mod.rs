//! Automation session: the boundary to the remote video generator.
//!
//! The orchestrator drives the remote web application only through the
//! [`AutomationSession`] trait. Page details (selectors, clicks, uploads)
//! live behind it, in the bridge process that [`HttpBridgeSession`] talks to.
//!
//! # Example
//!
//! ```ignore
//! use framecast_core::session::{HttpBridgeSession, SessionConfig, SmartDelay};
//!
//! let session = HttpBridgeSession::new(SessionConfig::default(), SmartDelay::default())?;
//! session.open().await?;
//! session.submit(&request).await?;
//! let status = session.generation_status().await?;
//! session.close().await?;
//! ```

mod bridge;
mod config;
mod delay;
mod error;
mod traits;
mod types;

pub use bridge::HttpBridgeSession;
pub use config::{SessionConfig, SmartDelayConfig};
pub use delay::{DelayKind, SmartDelay};
pub use error::SessionError;
pub use traits::AutomationSession;
pub use types::{
    ArtifactLocator, Framerate, GenerationOptions, GenerationStatus, Quality, Resolution,
    SubmissionRequest,
};
