//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the FFmpeg-based converter (`[ffmpeg]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Explicit path to the ffmpeg binary. Falls back to a PATH search when
    /// unset or when the file does not exist.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Executable name searched for on PATH.
    #[serde(default = "default_tool_name")]
    pub tool_name: String,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Timeout for a single conversion in seconds. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Whether to pass `-y` so an existing output file is overwritten.
    #[serde(default = "default_true")]
    pub overwrite_output: bool,
}

fn default_tool_name() -> String {
    "ffmpeg".to_string()
}

fn default_log_level() -> String {
    "error".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            path: None,
            tool_name: default_tool_name(),
            log_level: default_log_level(),
            timeout_secs: None,
            overwrite_output: default_true(),
        }
    }
}

impl ConverterConfig {
    /// Sets an explicit ffmpeg path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Sets the ffmpeg log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Timeout as a duration, if configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
