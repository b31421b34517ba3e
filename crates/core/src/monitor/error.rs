//! Error types for the monitor module.

use thiserror::Error;

use crate::governor::GovernorError;

/// Errors that stop the monitor daemon.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Process accounting failed.
    #[error("Monitor stopped: {0}")]
    Governor(#[from] GovernorError),
}
