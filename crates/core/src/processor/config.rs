//! Configuration for the processor module.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the batch pipeline (`[pipeline]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input extensions eligible for conversion, without the dot. Matched
    /// case-insensitively.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Suffix added to temp output names.
    #[serde(default = "default_temp_suffix")]
    pub temp_suffix: String,

    /// Extension of converted outputs.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Name of the backup subdirectory inside the input directory.
    #[serde(default = "default_backup_dir_name")]
    pub backup_dir_name: String,

    /// Worker count. Derived from the CPU count when unset.
    #[serde(default)]
    pub concurrency: Option<usize>,

    /// Whether workers wait for a governor slot before spawning ffmpeg.
    #[serde(default = "default_true")]
    pub limit_processes: bool,

    /// Whether every matching process is killed when the batch ends.
    #[serde(default = "default_true")]
    pub kill_on_exit: bool,

    /// Upper bound on a single slot wait, in seconds. Unbounded when unset.
    #[serde(default)]
    pub slot_timeout_secs: Option<u64>,

    /// Whether backups are verified by checksum.
    #[serde(default = "default_true")]
    pub verify_backups: bool,
}

fn default_extensions() -> Vec<String> {
    ["mp4", "mov", "avi", "mkv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_temp_suffix() -> String {
    "_fixed".to_string()
}

fn default_output_extension() -> String {
    "mp4".to_string()
}

fn default_backup_dir_name() -> String {
    "backup".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            temp_suffix: default_temp_suffix(),
            output_extension: default_output_extension(),
            backup_dir_name: default_backup_dir_name(),
            concurrency: None,
            limit_processes: true,
            kill_on_exit: true,
            slot_timeout_secs: None,
            verify_backups: true,
        }
    }
}

impl PipelineConfig {
    /// Sets a fixed worker count.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    /// Enables or disables waiting for governor slots.
    pub fn with_limit_processes(mut self, enabled: bool) -> Self {
        self.limit_processes = enabled;
        self
    }

    /// Enables or disables the terminal kill of matching processes.
    pub fn with_kill_on_exit(mut self, enabled: bool) -> Self {
        self.kill_on_exit = enabled;
        self
    }

    /// Bounds each slot wait.
    pub fn with_slot_timeout(mut self, timeout: Duration) -> Self {
        self.slot_timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn slot_timeout(&self) -> Option<Duration> {
        self.slot_timeout_secs.map(Duration::from_secs)
    }

    /// Whether `path` has one of the eligible extensions.
    pub fn is_eligible(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}
