//! Configuration for the governor module.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits enforced on the external transcoder processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Maximum concurrently running processes.
    #[serde(default = "default_max_processes")]
    pub max_processes: usize,

    /// Thread limit passed to each process.
    #[serde(default = "default_threads_per_process")]
    pub threads_per_process: u32,

    /// Memory budget in GB. Informational only, it is logged but not enforced.
    #[serde(default = "default_ram_limit")]
    pub ram_limit_gb: f64,

    /// Seconds between slot checks while waiting.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: f64,

    /// Executable name the census filters on.
    #[serde(default = "default_process_name")]
    pub process_name: String,
}

fn default_max_processes() -> usize {
    3
}

fn default_threads_per_process() -> u32 {
    2
}

fn default_ram_limit() -> f64 {
    7.0
}

fn default_poll_interval() -> f64 {
    5.0
}

fn default_process_name() -> String {
    "ffmpeg".to_string()
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            max_processes: default_max_processes(),
            threads_per_process: default_threads_per_process(),
            ram_limit_gb: default_ram_limit(),
            poll_interval_secs: default_poll_interval(),
            process_name: default_process_name(),
        }
    }
}

impl GovernorConfig {
    /// Sets the process ceiling.
    pub fn with_max_processes(mut self, max: usize) -> Self {
        self.max_processes = max;
        self
    }

    /// Sets the per-process thread limit.
    pub fn with_threads_per_process(mut self, threads: u32) -> Self {
        self.threads_per_process = threads;
        self
    }

    /// Sets the slot poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = interval.as_secs_f64();
        self
    }

    /// Sets the executable name to govern.
    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = name.into();
        self
    }

    /// Slot poll interval as a duration. Invalid values fall back to the default.
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_poll_interval()))
    }
}
