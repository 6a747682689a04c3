//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (runs, groups, item outcomes)
//! - Generation (time from submission to a finished video)
//! - Downloads (attempts, results, duration)
//! - Ledger writes

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Runs total by result.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("framecast_runs_total", "Total batch runs"),
        &["result"], // "finished", "failed"
    )
    .unwrap()
});

/// Task groups processed total.
pub static GROUPS_PROCESSED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "framecast_groups_processed_total",
        "Total task groups processed",
    )
    .unwrap()
});

/// Work items total by outcome.
pub static ITEMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("framecast_items_total", "Total work items processed"),
        &["outcome"], // "completed", "submission_failed", "generation_failed", "download_failed", "cancelled"
    )
    .unwrap()
});

// =============================================================================
// Generation Metrics
// =============================================================================

/// Generation duration in seconds, from submission to a finished video.
pub static GENERATION_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "framecast_generation_duration_seconds",
            "Duration of remote video generation",
        )
        .buckets(vec![15.0, 30.0, 60.0, 90.0, 120.0, 180.0, 240.0, 300.0, 600.0]),
    )
    .unwrap()
});

// =============================================================================
// Download Metrics
// =============================================================================

/// Download attempts total, retries included.
pub static DOWNLOAD_ATTEMPTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "framecast_download_attempts_total",
        "Total download attempts including retries",
    )
    .unwrap()
});

/// Downloads total by result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("framecast_downloads_total", "Total artifact downloads"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Download duration in seconds.
pub static DOWNLOAD_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "framecast_download_duration_seconds",
            "Duration of successful downloads",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
    )
    .unwrap()
});

// =============================================================================
// Ledger Metrics
// =============================================================================

/// Ledger writes total by result.
pub static LEDGER_WRITES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("framecast_ledger_writes_total", "Total ledger status writes"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Orchestrator
        Box::new(RUNS_TOTAL.clone()),
        Box::new(GROUPS_PROCESSED.clone()),
        Box::new(ITEMS_TOTAL.clone()),
        // Generation
        Box::new(GENERATION_DURATION.clone()),
        // Downloads
        Box::new(DOWNLOAD_ATTEMPTS.clone()),
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        // Ledger
        Box::new(LEDGER_WRITES.clone()),
    ]
}
