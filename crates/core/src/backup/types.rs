//! Types for the backup module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A completed backup of one original file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    /// The original file.
    pub original: PathBuf,
    /// Its copy in the backup directory.
    pub backup: PathBuf,
    /// Bytes copied.
    pub size_bytes: u64,
    /// SHA-256 of the copied content, when verification is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// A file that could not be processed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of restoring a backup directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Target paths that were restored.
    pub restored: Vec<PathBuf>,
    /// Backups that could not be restored.
    pub failed: Vec<FileFailure>,
}

impl RestoreReport {
    /// Number of files successfully restored.
    pub fn restored_count(&self) -> usize {
        self.restored.len()
    }
}

/// Outcome of swapping `X{marker}.mp4` files over their `X.mp4` originals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplaceReport {
    /// Converted files found in the directory.
    pub found: usize,
    /// Originals that now hold the converted content.
    pub replaced: Vec<PathBuf>,
    /// Converted files whose original does not exist.
    pub missing_original: Vec<PathBuf>,
    /// Converted files that could not be swapped.
    pub failed: Vec<FileFailure>,
}
