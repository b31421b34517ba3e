//! Error types for the census module.

use thiserror::Error;

/// Systemic failures of the process census.
///
/// Per-process races (a process exiting or being inaccessible while the table
/// is read) are not errors; they are treated as absence.
#[derive(Debug, Error)]
pub enum CensusError {
    /// Process enumeration is not supported on this platform.
    #[error("Process enumeration is not supported on this platform")]
    Unsupported,

    /// The OS process table could not be read.
    #[error("Process enumeration failed: {reason}")]
    EnumerationFailed { reason: String },
}

impl CensusError {
    /// Creates an enumeration failed error.
    pub fn enumeration_failed(reason: impl Into<String>) -> Self {
        Self::EnumerationFailed {
            reason: reason.into(),
        }
    }
}

/// Failure to terminate a single process.
#[derive(Debug, Error)]
pub enum TerminateError {
    /// The process no longer exists.
    #[error("No such process: {pid}")]
    NoSuchProcess { pid: u32 },

    /// The caller lacks permission to signal the process.
    #[error("Permission denied terminating process {pid}")]
    PermissionDenied { pid: u32 },

    /// Any other OS-level failure.
    #[error("Failed to terminate process {pid}: {reason}")]
    Failed { pid: u32, reason: String },
}

impl TerminateError {
    /// Whether the process was already gone.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::NoSuchProcess { .. })
    }
}
