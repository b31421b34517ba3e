//! Types for the governor module.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of a successful slot acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrant {
    /// Number of census polls performed, including the successful one.
    pub polls: u32,
    /// Time spent waiting.
    pub waited: Duration,
}

/// Outcome of one eviction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionReport {
    /// Processes in the kill partition.
    pub targeted: usize,
    /// PIDs whose termination request was delivered.
    pub terminated: Vec<u32>,
    /// PIDs that could not be terminated.
    pub failed: Vec<u32>,
}

impl EvictionReport {
    /// Whether any process was targeted.
    pub fn is_empty(&self) -> bool {
        self.targeted == 0
    }
}
