//! Error types for the processor module.

use std::path::PathBuf;
use thiserror::Error;

use crate::governor::GovernorError;

/// Failures that abort a whole batch.
///
/// Per-file problems never surface here; they are counted in the summary.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input directory does not exist.
    #[error("Input directory not found: {path}")]
    InputDirNotFound { path: PathBuf },

    /// The input path is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The temp directory could not be created.
    #[error("Failed to create temp directory: {path}")]
    TempDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Process accounting is impossible.
    #[error("Process governor failed: {0}")]
    Governor(#[from] GovernorError),

    /// A worker task panicked or was aborted.
    #[error("Worker failed: {0}")]
    Worker(String),

    /// I/O error while listing inputs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
