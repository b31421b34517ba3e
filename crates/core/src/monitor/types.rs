//! Types for the monitor module.

use serde::{Deserialize, Serialize};

use crate::governor::EvictionReport;

/// Outcome of one monitor iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTick {
    /// Matching processes seen by the census.
    pub observed: usize,
    /// What the eviction pass did, empty when within the limit.
    pub evicted: EvictionReport,
}
