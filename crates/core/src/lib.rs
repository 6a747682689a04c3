pub mod config;
pub mod download;
pub mod ledger;
pub mod metrics;
pub mod orchestrator;
pub mod poller;
pub mod scanner;
pub mod session;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_env_config, validate_config, validate_run_config,
    Config, ConfigError,
};
pub use download::{DownloadConfig, DownloadError, DownloadValidator, DownloadedArtifact};
pub use ledger::{LedgerConfig, LedgerError, LedgerStore, WorkItem};
pub use orchestrator::{
    plan_run, FailureStage, GroupPlan, ItemOutcome, OrchestratorError, RunEvent, RunHandle,
    RunStatistics, TaskOrchestrator,
};
pub use poller::{CompletionPoller, GenerationFailure, PollOutcome, PollerConfig};
pub use scanner::{discover_groups, ScanError, TaskGroup};
pub use session::{
    AutomationSession, GenerationOptions, GenerationStatus, HttpBridgeSession, SessionConfig,
    SessionError, SmartDelay, SubmissionRequest,
};
