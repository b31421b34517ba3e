//! Command-line construction for ffmpeg invocations.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::config::ConverterConfig;
use super::types::FfmpegOptions;

/// Everything needed to render an ffmpeg command line.
///
/// Built once at startup from the converter and governor configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConfig {
    /// Program to execute.
    pub program: PathBuf,
    /// Value passed to `-threads`.
    pub threads_per_process: u32,
    /// Value passed to `-loglevel`.
    pub log_level: String,
    /// Whether `-y` is emitted before the output path.
    pub overwrite_output: bool,
}

impl CommandConfig {
    /// Resolves the program path and combines the converter settings with
    /// the per-process thread limit.
    pub fn from_config(config: &ConverterConfig, threads_per_process: u32) -> Self {
        Self {
            program: resolve_ffmpeg_path(config.path.as_deref(), &config.tool_name),
            threads_per_process,
            log_level: config.log_level.clone(),
            overwrite_output: config.overwrite_output,
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            threads_per_process: 2,
            log_level: "error".to_string(),
            overwrite_output: true,
        }
    }
}

/// Builds the full argument vector; element 0 is the program.
///
/// Shape: `program -hide_banner -loglevel L -i INPUT -threads N [options] [-y] OUTPUT`.
/// Options with no value are skipped. Pure: no I/O.
pub fn build_command(
    input_path: &Path,
    output_path: &Path,
    config: &CommandConfig,
    extra_options: &FfmpegOptions,
) -> Vec<String> {
    let mut args = vec![
        config.program.to_string_lossy().to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        config.log_level.clone(),
        "-i".to_string(),
        input_path.to_string_lossy().to_string(),
        "-threads".to_string(),
        config.threads_per_process.to_string(),
    ];

    for (flag, value) in extra_options.entries() {
        if let Some(value) = value {
            args.push(flag.clone());
            args.push(value.clone());
        }
    }

    if config.overwrite_output {
        args.push("-y".to_string());
    }
    args.push(output_path.to_string_lossy().to_string());
    args
}

/// Picks the ffmpeg executable: the configured path if it exists, then a PATH
/// search for `tool_name`, then the bare tool name.
pub fn resolve_ffmpeg_path(configured: Option<&Path>, tool_name: &str) -> PathBuf {
    if let Some(path) = configured {
        if path.is_file() {
            return path.to_path_buf();
        }
        debug!(path = %path.display(), "Configured ffmpeg path does not exist, searching PATH");
    }

    match which::which(tool_name) {
        Ok(found) => found,
        Err(_) => {
            debug!("{} not found on PATH", tool_name);
            PathBuf::from(tool_name)
        }
    }
}
