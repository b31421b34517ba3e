//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the OS-facing traits, so the
//! governor, pipeline and monitor can be exercised without real processes.
//!
//! # Example
//!
//! ```rust,ignore
//! use ffshepherd_core::testing::{MockConverter, MockProcessTable};
//!
//! let table = Arc::new(MockProcessTable::new());
//! let converter = MockConverter::new().with_process_table(table.clone());
//!
//! // Configure mock behavior
//! converter.fail_for("corrupt.mp4").await;
//! table.spawn("ffmpeg").await;
//! ```

mod mock_converter;
mod mock_process_table;

pub use mock_converter::{MockConverter, RecordedConversion};
pub use mock_process_table::MockProcessTable;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Write a small fake media file and return its path.
    ///
    /// The content is `original:<name>`.
    pub fn media_file(dir: &Path, name: &str) -> std::io::Result<PathBuf> {
        let path = dir.join(name);
        std::fs::write(&path, format!("original:{}", name))?;
        Ok(path)
    }

    /// Write several fake media files.
    pub fn media_files(dir: &Path, names: &[&str]) -> std::io::Result<Vec<PathBuf>> {
        names.iter().map(|name| media_file(dir, name)).collect()
    }
}
