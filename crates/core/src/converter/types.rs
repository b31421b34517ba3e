//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ordered ffmpeg options as flag/value pairs.
///
/// Order is preserved because ffmpeg option position matters. Entries with a
/// `None` value are kept here but skipped when the command line is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FfmpegOptions {
    entries: Vec<(String, Option<String>)>,
}

impl FfmpegOptions {
    /// Creates an empty option list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a flag with a value.
    pub fn set(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((flag.into(), Some(value.into())));
        self
    }

    /// Appends a flag whose value may be absent.
    pub fn set_opt(mut self, flag: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.entries.push((flag.into(), value.map(Into::into)));
        self
    }

    /// Appends every entry of `other`, keeping its order.
    pub fn merge(mut self, other: &FfmpegOptions) -> Self {
        self.entries.extend(other.entries.iter().cloned());
        self
    }

    /// All entries, including those without a value.
    pub fn entries(&self) -> &[(String, Option<String>)] {
        &self.entries
    }

    /// The value of the first entry with the given flag.
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f == flag)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A conversion job request.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Job ID, unique within a batch run.
    pub job_id: String,
    /// Input file path.
    pub input_path: PathBuf,
    /// Output file path.
    pub output_path: PathBuf,
    /// Codec and filter options placed between the input and the output.
    pub options: FfmpegOptions,
}

impl ConversionJob {
    pub fn new(
        job_id: impl Into<String>,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        options: FfmpegOptions,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            input_path: input_path.into(),
            output_path: output_path.into(),
            options,
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Job ID.
    pub job_id: String,
    /// Output file path.
    pub output_path: PathBuf,
    /// Output file size in bytes.
    pub output_size_bytes: u64,
    /// Conversion duration in milliseconds.
    pub duration_ms: u64,
}
