//! Error types for the governor module.

use thiserror::Error;

use crate::census::CensusError;

/// Errors that can occur while governing processes.
#[derive(Debug, Error)]
pub enum GovernorError {
    /// The census could not read the process table. No accounting is possible.
    #[error("Process census failed: {0}")]
    Census(#[from] CensusError),

    /// No slot became free before the deadline.
    #[error("No process slot became free within {waited_secs:.1} seconds")]
    SlotTimeout { waited_secs: f64 },
}
