//! Crash-safe file replacement and backups.
//!
//! Originals are copied into a backup directory before any destructive step,
//! new content is swapped in through a staging file plus rename, and the
//! whole backup directory can be restored on demand.

mod error;
mod manager;
mod types;

pub use error::BackupError;
pub use manager::BackupManager;
pub use types::{BackupEntry, FileFailure, ReplaceReport, RestoreReport};
