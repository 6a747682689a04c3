mod metrics;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use framecast_core::session::SmartDelay;
use framecast_core::{
    load_config, load_env_config, plan_run, validate_config, validate_run_config, Config,
    GroupPlan, HttpBridgeSession, ItemOutcome, RunEvent, RunStatistics, TaskOrchestrator,
};

/// Exit status after a forced second interrupt, as a shell reports SIGINT.
const INTERRUPT_EXIT_CODE: i32 = 130;

/// Batch image-to-video generation driven by spreadsheet ledgers.
#[derive(Debug, Parser)]
#[command(name = "framecast", version, about)]
struct Cli {
    /// Configuration file. Missing files fall back to defaults plus environment.
    #[arg(long, env = "FRAMECAST_CONFIG", default_value = "framecast.toml")]
    config: PathBuf,

    /// Emit logs, events and reports as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Print Prometheus metrics after the command.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Process every pending item under the root directory.
    Run {
        /// Overrides `root_directory` from the config.
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// List the groups and pending items without touching the session.
    Plan {
        /// Overrides `root_directory` from the config.
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.json);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays parseable.
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = read_config(&cli.config)?;

    match cli.command {
        Command::Run { root } => {
            validate_run_config(&config).context("Configuration validation failed")?;
            let root = resolve_root(&config, root)?;
            let stats = execute(config, root, cli.json).await?;
            print_statistics(&stats, cli.json)?;
        }
        Command::Plan { root } => {
            validate_config(&config).context("Configuration validation failed")?;
            let root = resolve_root(&config, root)?;
            let plans = plan_run(&config, &root)
                .with_context(|| format!("Failed to plan {}", root.display()))?;
            print_plan(&plans, cli.json)?;
        }
    }

    if cli.metrics {
        print!("{}", metrics::encode_metrics());
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<Config> {
    if path.exists() {
        info!("Loading configuration from {:?}", path);
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))
    } else {
        warn!(
            "Config file {:?} not found, using defaults and environment",
            path
        );
        load_env_config().context("Failed to load config from environment")
    }
}

fn resolve_root(config: &Config, root: Option<PathBuf>) -> Result<PathBuf> {
    match root.or_else(|| config.root_directory.clone()) {
        Some(root) => Ok(root),
        None => bail!("No root directory: pass --root or set root_directory"),
    }
}

async fn execute(config: Config, root: PathBuf, json: bool) -> Result<RunStatistics> {
    let delay = SmartDelay::new(config.smart_delay.clone());
    let session = HttpBridgeSession::new(config.session.clone(), delay)
        .context("Failed to create bridge session")?;
    info!("Using bridge at {}", config.session.bridge_url);

    let orchestrator =
        TaskOrchestrator::new(config, Arc::new(session)).context("Failed to build orchestrator")?;
    let mut handle = orchestrator.spawn(root);
    let cancel = handle.cancellation_token();

    if let Some(mut events) = handle.events() {
        let mut interrupts = InterruptState::default();
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => print_event(&event, json)?,
                    None => break,
                },
                _ = signal::ctrl_c() => match interrupts.next() {
                    InterruptAction::Cancel => {
                        warn!("Interrupt received, stopping after the current step (Ctrl-C again exits)");
                        cancel.cancel();
                    }
                    InterruptAction::Exit => {
                        warn!("Second interrupt received, exiting");
                        std::process::exit(INTERRUPT_EXIT_CODE);
                    }
                },
            }
        }
    }

    handle.join().await.context("Run failed")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InterruptAction {
    /// Cancel the run and let it wind down.
    Cancel,
    /// Leave without waiting for the run.
    Exit,
}

#[derive(Debug, Default)]
struct InterruptState {
    received: u32,
}

impl InterruptState {
    fn next(&mut self) -> InterruptAction {
        self.received = self.received.saturating_add(1);
        if self.received == 1 {
            InterruptAction::Cancel
        } else {
            InterruptAction::Exit
        }
    }
}

fn print_event(event: &RunEvent, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        RunEvent::GroupStarted { group, pending } => {
            println!("[{}] {} pending", group, pending);
        }
        RunEvent::ItemFinished {
            group,
            row,
            outcome,
        } => match outcome {
            ItemOutcome::Completed { artifact, .. } => {
                println!("[{}] row {} -> {}", group, row + 1, artifact.path.display());
            }
            ItemOutcome::Failed { stage, reason } => {
                println!("[{}] row {} failed at {}: {}", group, row + 1, stage, reason);
            }
        },
        _ => {}
    }
    Ok(())
}

fn print_statistics(stats: &RunStatistics, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(stats)?);
        return Ok(());
    }

    println!("Run {}", stats.run_id);
    println!("  groups:     {}", stats.groups);
    println!("  attempted:  {}", stats.attempted);
    println!("  completed:  {}", stats.completed);
    println!("  failed:     {}", stats.failed);
    if stats.ledger_write_errors > 0 {
        println!("  ledger write errors: {}", stats.ledger_write_errors);
    }
    println!("  success:    {:.1}%", stats.success_rate());
    Ok(())
}

fn print_plan(plans: &[GroupPlan], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plans)?);
        return Ok(());
    }

    if plans.is_empty() {
        println!("No task groups found");
        return Ok(());
    }
    for plan in plans {
        println!(
            "{} ({}, {} assets, {} pending)",
            plan.group,
            plan.ledger_path.display(),
            plan.assets,
            plan.items.len()
        );
        for item in &plan.items {
            println!(
                "  row {:>3}  {} -> {}",
                item.row,
                item.asset_path.display(),
                item.output_name
            );
        }
    }
    Ok(())
}
