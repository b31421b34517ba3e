//! Types for the census module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A live OS process as seen by one census query.
///
/// Records are produced fresh on every query and never mutated.
/// They order by start time, oldest first, with the PID breaking ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Process ID.
    pub pid: u32,
    /// When the process started.
    pub start_time: DateTime<Utc>,
    /// Executable name as reported by the OS.
    pub executable_name: String,
}

impl ProcessRecord {
    /// Creates a new record.
    pub fn new(pid: u32, start_time: DateTime<Utc>, executable_name: impl Into<String>) -> Self {
        Self {
            pid,
            start_time,
            executable_name: executable_name.into(),
        }
    }
}

impl Ord for ProcessRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start_time
            .cmp(&other.start_time)
            .then_with(|| self.pid.cmp(&other.pid))
    }
}

impl PartialOrd for ProcessRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a process should be terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminateMode {
    /// Ask the process to exit (SIGTERM on unix).
    Graceful,
    /// Kill the process outright (SIGKILL on unix, TerminateProcess on Windows).
    Forced,
}
