//! Process governor implementation.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::census::{ProcessCensus, ProcessRecord, TerminateMode};
use crate::metrics;

use super::config::GovernorConfig;
use super::error::GovernorError;
use super::types::{EvictionReport, SlotGrant};

/// Enforces the process ceiling on top of a [`ProcessCensus`].
#[derive(Debug, Clone)]
pub struct ProcessGovernor {
    config: GovernorConfig,
    census: ProcessCensus,
}

impl ProcessGovernor {
    /// Creates a governor with the given limits.
    pub fn new(config: GovernorConfig, census: ProcessCensus) -> Self {
        Self { config, census }
    }

    /// The limits this governor enforces.
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// The census this governor queries.
    pub fn census(&self) -> &ProcessCensus {
        &self.census
    }

    /// Lists governed processes, oldest first.
    pub async fn processes(&self) -> Result<Vec<ProcessRecord>, GovernorError> {
        Ok(self
            .census
            .list_processes(&self.config.process_name)
            .await?)
    }

    /// Returns true if fewer than `max_processes` governed processes are running.
    ///
    /// The answer can be stale by the time the caller spawns a process.
    pub async fn has_free_slot(&self) -> Result<bool, GovernorError> {
        let current = self.census.count(&self.config.process_name).await?;
        debug!(
            current,
            max = self.config.max_processes,
            "Checked {} process slots",
            self.config.process_name
        );
        Ok(current < self.config.max_processes)
    }

    /// Waits until a slot is free, re-polling the census every `poll_interval`.
    ///
    /// There is no timeout; wrap in [`Self::acquire_slot_with_deadline`] or an
    /// external cancellation for bounded waits.
    pub async fn acquire_slot(&self, poll_interval: Duration) -> Result<SlotGrant, GovernorError> {
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            polls = polls.saturating_add(1);
            if self.has_free_slot().await? {
                let waited = started.elapsed();
                if polls > 1 {
                    info!(
                        polls,
                        waited_ms = waited.as_millis() as u64,
                        "Process slot became available"
                    );
                }
                metrics::SLOT_ACQUISITIONS
                    .with_label_values(&["granted"])
                    .inc();
                metrics::SLOT_WAIT_DURATION.observe(waited.as_secs_f64());
                return Ok(SlotGrant { polls, waited });
            }

            if polls == 1 {
                info!(
                    max = self.config.max_processes,
                    "Waiting for a {} slot to become available",
                    self.config.process_name
                );
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Like [`Self::acquire_slot`], failing with [`GovernorError::SlotTimeout`]
    /// once `timeout` has elapsed.
    pub async fn acquire_slot_with_deadline(
        &self,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<SlotGrant, GovernorError> {
        match tokio::time::timeout(timeout, self.acquire_slot(poll_interval)).await {
            Ok(result) => result,
            Err(_) => {
                metrics::SLOT_ACQUISITIONS
                    .with_label_values(&["timeout"])
                    .inc();
                Err(GovernorError::SlotTimeout {
                    waited_secs: timeout.as_secs_f64(),
                })
            }
        }
    }

    /// Terminates governed processes beyond the `max_processes` oldest.
    ///
    /// Termination is best-effort: failures are logged and reported, never
    /// retried, and never fail the call.
    pub async fn evict_excess(
        &self,
        max_processes: usize,
    ) -> Result<EvictionReport, GovernorError> {
        let processes = self.processes().await?;
        if processes.len() <= max_processes {
            return Ok(EvictionReport::default());
        }

        // `processes` is sorted oldest first; the newest are evicted.
        let kill = &processes[max_processes..];
        let mut report = EvictionReport {
            targeted: kill.len(),
            ..Default::default()
        };

        warn!(
            running = processes.len(),
            max = max_processes,
            evicting = kill.len(),
            "Too many {} processes",
            self.config.process_name
        );

        for record in kill {
            match self
                .census
                .table()
                .terminate(record.pid, TerminateMode::Graceful)
                .await
            {
                Ok(()) => {
                    info!(
                        pid = record.pid,
                        "Terminated excess {} process", record.executable_name
                    );
                    metrics::EVICTIONS.with_label_values(&["terminated"]).inc();
                    report.terminated.push(record.pid);
                }
                Err(e) => {
                    warn!(pid = record.pid, "Failed to terminate excess process: {}", e);
                    metrics::EVICTIONS.with_label_values(&["failed"]).inc();
                    report.failed.push(record.pid);
                }
            }
        }

        Ok(report)
    }

    /// Forcibly terminates every process matching `name_filter`.
    ///
    /// Returns how many processes were targeted; nothing running is a no-op.
    pub async fn kill_all(&self, name_filter: &str) -> Result<usize, GovernorError> {
        metrics::KILL_ALL_INVOCATIONS.inc();
        let processes = self.census.list_processes(name_filter).await?;
        if processes.is_empty() {
            debug!("No {} processes to kill", name_filter);
            return Ok(0);
        }

        let mut killed = 0usize;
        for record in &processes {
            match self
                .census
                .table()
                .terminate(record.pid, TerminateMode::Forced)
                .await
            {
                Ok(()) => killed += 1,
                Err(e) if e.is_gone() => {
                    debug!(pid = record.pid, "Process exited before it could be killed")
                }
                Err(e) => warn!(pid = record.pid, "Failed to kill process: {}", e),
            }
        }

        info!(
            targeted = processes.len(),
            killed,
            "Killed remaining {} processes",
            name_filter
        );
        Ok(processes.len())
    }
}
