//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Census and governor (process counts, slot waits, evictions)
//! - Batch pipeline (conversions)
//! - Backup manager (backups, restores)

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

// =============================================================================
// Census / Governor Metrics
// =============================================================================

/// Matching processes seen by the most recent census query.
pub static CENSUS_PROCESSES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ffshepherd_census_processes",
        "Matching processes observed by the last census query",
    )
    .unwrap()
});

/// Slot acquisitions by result.
pub static SLOT_ACQUISITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ffshepherd_slot_acquisitions_total",
            "Total slot acquisition attempts",
        ),
        &["result"], // "granted", "timeout", "cancelled"
    )
    .unwrap()
});

/// Time spent waiting for a slot in seconds.
pub static SLOT_WAIT_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "ffshepherd_slot_wait_seconds",
            "Time spent waiting for a free process slot",
        )
        .buckets(vec![0.0, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 3600.0]),
    )
    .unwrap()
});

/// Eviction terminations by result.
pub static EVICTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ffshepherd_evictions_total", "Total excess process evictions"),
        &["result"], // "terminated", "failed"
    )
    .unwrap()
});

/// Kill-all invocations.
pub static KILL_ALL_INVOCATIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ffshepherd_kill_all_total",
        "Total kill-all cleanup invocations",
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Conversions total by result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ffshepherd_conversions_total", "Total file conversions"),
        &["result"], // "success", "failed", "skipped"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ffshepherd_conversion_duration_seconds",
            "Duration of file conversions",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Backup Metrics
// =============================================================================

/// Backups total by result.
pub static BACKUPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ffshepherd_backups_total", "Total original file backups"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Restores total by result.
pub static RESTORES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ffshepherd_restores_total", "Total files restored from backup"),
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
        // Census / governor
        Box::new(CENSUS_PROCESSES.clone()),
        Box::new(SLOT_ACQUISITIONS.clone()),
        Box::new(SLOT_WAIT_DURATION.clone()),
        Box::new(EVICTIONS.clone()),
        Box::new(KILL_ALL_INVOCATIONS.clone()),
        // Pipeline
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        // Backups
        Box::new(BACKUPS_TOTAL.clone()),
        Box::new(RESTORES_TOTAL.clone()),
    ]
}

/// Renders all core metrics in the Prometheus text exposition format.
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric)?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
