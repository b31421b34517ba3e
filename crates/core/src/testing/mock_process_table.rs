//! Mock process table for testing.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::census::{
    name_matches, CensusError, ProcessRecord, ProcessTable, TerminateError, TerminateMode,
};

/// Mock implementation of the ProcessTable trait.
///
/// Holds an in-memory process table that tests mutate directly:
/// - Spawn and exit fake processes
/// - Record termination requests for assertions
/// - Simulate permission failures and a broken OS API
/// - Track the peak number of live processes per name
///
/// # Example
///
/// ```rust,ignore
/// use ffshepherd_core::testing::MockProcessTable;
///
/// let table = Arc::new(MockProcessTable::new());
/// let pid = table.spawn("ffmpeg").await;
///
/// let census = ProcessCensus::new(table.clone());
/// assert_eq!(census.count("ffmpeg").await?, 1);
///
/// table.exit(pid).await;
/// ```
#[derive(Debug, Clone)]
pub struct MockProcessTable {
    /// Live processes by PID.
    processes: Arc<RwLock<BTreeMap<u32, ProcessRecord>>>,
    /// Recorded termination requests.
    terminations: Arc<RwLock<Vec<(u32, TerminateMode)>>>,
    /// PIDs whose termination is refused.
    protected: Arc<RwLock<HashSet<u32>>>,
    /// Whether terminated processes leave the table immediately.
    exit_on_terminate: Arc<AtomicBool>,
    /// Whether snapshots fail systemically.
    fail_enumeration: Arc<AtomicBool>,
    /// Next PID handed out by `spawn`.
    next_pid: Arc<AtomicU32>,
    /// Highest number of simultaneously live processes observed.
    peak_live: Arc<AtomicUsize>,
    /// Number of snapshots taken.
    snapshots: Arc<AtomicUsize>,
}

impl Default for MockProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProcessTable {
    /// Create an empty mock process table.
    pub fn new() -> Self {
        Self {
            processes: Arc::new(RwLock::new(BTreeMap::new())),
            terminations: Arc::new(RwLock::new(Vec::new())),
            protected: Arc::new(RwLock::new(HashSet::new())),
            exit_on_terminate: Arc::new(AtomicBool::new(true)),
            fail_enumeration: Arc::new(AtomicBool::new(false)),
            next_pid: Arc::new(AtomicU32::new(1000)),
            peak_live: Arc::new(AtomicUsize::new(0)),
            snapshots: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a process with an automatically assigned PID, started "now".
    ///
    /// Later spawns always have a later start time than earlier ones.
    pub async fn spawn(&self, name: &str) -> u32 {
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.spawn_at(pid, name, i64::from(pid)).await;
        pid
    }

    /// Add a process with an explicit PID and start time (seconds since epoch).
    pub async fn spawn_at(&self, pid: u32, name: &str, started_secs: i64) {
        let start_time: DateTime<Utc> = Utc
            .timestamp_opt(started_secs, 0)
            .single()
            .unwrap_or_default();
        let mut processes = self.processes.write().await;
        processes.insert(pid, ProcessRecord::new(pid, start_time, name));
        self.peak_live.fetch_max(processes.len(), Ordering::SeqCst);
    }

    /// Remove a process as if it exited on its own.
    pub async fn exit(&self, pid: u32) {
        self.processes.write().await.remove(&pid);
    }

    /// PIDs of live processes whose name matches `name_filter`, ascending.
    pub async fn live_pids(&self, name_filter: &str) -> Vec<u32> {
        self.processes
            .read()
            .await
            .values()
            .filter(|r| name_matches(&r.executable_name, name_filter))
            .map(|r| r.pid)
            .collect()
    }

    /// All recorded termination requests, in order.
    pub async fn terminations(&self) -> Vec<(u32, TerminateMode)> {
        self.terminations.read().await.clone()
    }

    /// Refuse termination requests for `pid` with a permission error.
    pub async fn deny_termination(&self, pid: u32) {
        self.protected.write().await.insert(pid);
    }

    /// Keep terminated processes in the table (simulates slow shutdown).
    pub fn set_exit_on_terminate(&self, exit: bool) {
        self.exit_on_terminate.store(exit, Ordering::SeqCst);
    }

    /// Make every snapshot fail as if the OS API were unavailable.
    pub fn fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::SeqCst);
    }

    /// Highest number of processes that were ever live at once.
    pub fn peak_live(&self) -> usize {
        self.peak_live.load(Ordering::SeqCst)
    }

    /// Number of snapshots taken so far.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessTable for MockProcessTable {
    fn name(&self) -> &str {
        "mock"
    }

    async fn snapshot(&self) -> Result<Vec<ProcessRecord>, CensusError> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Err(CensusError::enumeration_failed("mock process table unavailable"));
        }
        Ok(self.processes.read().await.values().cloned().collect())
    }

    async fn terminate(&self, pid: u32, mode: TerminateMode) -> Result<(), TerminateError> {
        self.terminations.write().await.push((pid, mode));

        if self.protected.read().await.contains(&pid) {
            return Err(TerminateError::PermissionDenied { pid });
        }

        let mut processes = self.processes.write().await;
        if !processes.contains_key(&pid) {
            return Err(TerminateError::NoSuchProcess { pid });
        }
        if self.exit_on_terminate.load(Ordering::SeqCst) {
            processes.remove(&pid);
        }
        Ok(())
    }
}
