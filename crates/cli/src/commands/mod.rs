//! Subcommand implementations and the wiring they share.

pub mod files;
pub mod fix;
pub mod monitor;
pub mod processes;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use tracing::info;

use ffshepherd_core::metrics::render_metrics;
use ffshepherd_core::{Config, ProcessCensus, ProcessGovernor, SysinfoProcessTable};

/// Governor over the real OS process table.
pub fn governor(config: &Config) -> ProcessGovernor {
    let census = ProcessCensus::new(Arc::new(SysinfoProcessTable::new()));
    ProcessGovernor::new(config.governor.clone(), census)
}

/// Asks a yes/no question on the terminal, defaulting to no.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

/// Writes the Prometheus text exposition to `path`, if given.
pub fn write_metrics(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let text = render_metrics().context("Failed to render metrics")?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write metrics to {:?}", path))?;
    info!("Wrote metrics to {:?}", path);
    Ok(())
}
