//! Task orchestrator for batch video generation.
//!
//! The orchestrator walks every task group under a root directory and pushes
//! each pending ledger row through the same sequence:
//! - **Submit**: upload the image and prompt through the automation session
//! - **Poll**: wait for the remote generation to finish
//! - **Download**: fetch and verify the video next to the ledger
//! - **Record**: mark the row completed in the ledger
//!
//! Items run strictly one after another. A failed item is counted and the
//! run moves on; only an invalid root or a session that cannot be opened
//! aborts the run.

mod runner;
mod types;

pub use runner::{plan_run, RunHandle, TaskOrchestrator};
pub use types::{
    FailureStage, GroupPlan, ItemOutcome, ItemStage, OrchestratorError, PlannedItem, RunEvent,
    RunStatistics,
};
