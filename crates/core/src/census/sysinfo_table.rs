//! `sysinfo`-backed process table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sysinfo::{ProcessStatus, ProcessesToUpdate, System};

use super::error::{CensusError, TerminateError};
use super::signal::send_termination;
use super::traits::ProcessTable;
use super::types::{ProcessRecord, TerminateMode};

/// Process table that re-reads the OS on every call via `sysinfo`.
#[derive(Debug, Default)]
pub struct SysinfoProcessTable;

impl SysinfoProcessTable {
    /// Creates a new process table.
    pub fn new() -> Self {
        Self
    }

    fn read_table() -> Vec<ProcessRecord> {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);

        system
            .processes()
            .values()
            .filter_map(|process| {
                let pid = process.pid().as_u32();
                // Linux lists every thread as a task of its own.
                if process.thread_kind().is_some() {
                    return None;
                }
                // Zombies have already exited; they hold no slot.
                if matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead) {
                    tracing::trace!(pid, "Skipping exited process");
                    return None;
                }
                let name = process.name().to_string_lossy().into_owned();
                if name.is_empty() {
                    tracing::trace!(pid, "Skipping process with unreadable name");
                    return None;
                }
                let start_time = i64::try_from(process.start_time())
                    .ok()
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                Some(ProcessRecord::new(pid, start_time, name))
            })
            .collect()
    }
}

#[async_trait]
impl ProcessTable for SysinfoProcessTable {
    fn name(&self) -> &str {
        "sysinfo"
    }

    async fn snapshot(&self) -> Result<Vec<ProcessRecord>, CensusError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(CensusError::Unsupported);
        }

        tokio::task::spawn_blocking(Self::read_table)
            .await
            .map_err(|e| CensusError::enumeration_failed(e.to_string()))
    }

    async fn terminate(&self, pid: u32, mode: TerminateMode) -> Result<(), TerminateError> {
        tokio::task::spawn_blocking(move || send_termination(pid, mode))
            .await
            .map_err(|e| TerminateError::Failed {
                pid,
                reason: e.to_string(),
            })?
    }
}
