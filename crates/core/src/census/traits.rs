//! Trait definitions for the census module.

use async_trait::async_trait;

use super::error::{CensusError, TerminateError};
use super::types::{ProcessRecord, TerminateMode};

/// Access to the OS process table.
#[async_trait]
pub trait ProcessTable: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Re-reads the process table and returns every live process.
    ///
    /// Processes that vanish or cannot be inspected during the read are
    /// omitted. Only a systemic failure returns an error.
    async fn snapshot(&self) -> Result<Vec<ProcessRecord>, CensusError>;

    /// Sends a termination request to one process.
    async fn terminate(&self, pid: u32, mode: TerminateMode) -> Result<(), TerminateError>;
}
