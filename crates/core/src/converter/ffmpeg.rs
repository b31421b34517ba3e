//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

use super::builder::{build_command, CommandConfig};
use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionJob, ConversionResult};

/// Upper bound on captured stderr kept in errors.
const MAX_STDERR_BYTES: usize = 4096;

/// FFmpeg-based converter implementation.
///
/// The child process is killed when the conversion future is dropped, so a
/// cancelled batch never leaves an orphaned ffmpeg behind.
#[derive(Debug, Clone)]
pub struct FfmpegConverter {
    command: CommandConfig,
    timeout: Option<Duration>,
}

impl FfmpegConverter {
    /// Creates a converter from a resolved command configuration.
    pub fn new(command: CommandConfig, timeout: Option<Duration>) -> Self {
        Self { command, timeout }
    }

    /// Creates a converter from the `[ffmpeg]` section and the governor's
    /// per-process thread limit.
    pub fn from_config(config: &ConverterConfig, threads_per_process: u32) -> Self {
        Self::new(
            CommandConfig::from_config(config, threads_per_process),
            config.timeout(),
        )
    }

    /// The command configuration used for every job.
    pub fn command(&self) -> &CommandConfig {
        &self.command
    }

    fn spawn_error(&self, e: std::io::Error) -> ConverterError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConverterError::FfmpegNotFound {
                path: self.command.program.clone(),
            }
        } else {
            ConverterError::Io(e)
        }
    }
}

/// Keeps the tail of stderr, where ffmpeg reports the fatal error.
fn stderr_tail(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let mut start = text.len().saturating_sub(MAX_STDERR_BYTES);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    Some(text[start..].to_string())
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        let start = Instant::now();

        if !tokio::fs::try_exists(&job.input_path).await.unwrap_or(false) {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        if let Some(parent) = job.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|_| {
                    ConverterError::OutputDirectoryFailed {
                        path: parent.to_path_buf(),
                    }
                })?;
            }
        }

        let args = build_command(&job.input_path, &job.output_path, &self.command, &job.options);
        debug!(job_id = %job.job_id, "Running {}", args.join(" "));

        let child = Command::new(&args[0])
            .args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    // Dropping the wait future kills the child.
                    warn!(job_id = %job.job_id, "Conversion timed out, process killed");
                    return Err(ConverterError::Timeout {
                        timeout_secs: limit.as_secs(),
                    });
                }
            },
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            return Err(ConverterError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", output.status.code()),
                stderr_tail(&output.stderr),
            ));
        }

        let output_meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| ConverterError::conversion_failed("Output file not created", None))?;

        Ok(ConversionResult {
            job_id: job.job_id,
            output_path: job.output_path,
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let output = Command::new(&self.command.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ConverterError::conversion_failed(
                "ffmpeg -version failed",
                stderr_tail(&output.stderr),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::FfmpegOptions;
    use std::path::PathBuf;

    fn converter_for(program: PathBuf, timeout: Option<Duration>) -> FfmpegConverter {
        FfmpegConverter::new(
            CommandConfig {
                program,
                ..Default::default()
            },
            timeout,
        )
    }

    #[test]
    fn test_stderr_tail_truncates() {
        let long = "x".repeat(MAX_STDERR_BYTES * 2);
        assert_eq!(stderr_tail(long.as_bytes()).unwrap().len(), MAX_STDERR_BYTES);
        assert!(stderr_tail(b"  \n").is_none());
    }

    #[tokio::test]
    async fn test_missing_binary_maps_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a.mp4");
        std::fs::write(&input, b"video").unwrap();

        let converter = converter_for(PathBuf::from("/nonexistent/bin/ffmpeg"), None);
        let job = ConversionJob::new("j", &input, dir.path().join("out.mp4"), FfmpegOptions::new());
        let err = converter.convert(job).await.unwrap_err();
        assert!(matches!(err, ConverterError::FfmpegNotFound { .. }));
        assert!(matches!(
            converter.validate().await,
            Err(ConverterError::FfmpegNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let converter = converter_for(PathBuf::from("ffmpeg"), None);
        let job = ConversionJob::new(
            "j",
            dir.path().join("missing.mp4"),
            dir.path().join("out.mp4"),
            FfmpegOptions::new(),
        );
        assert!(matches!(
            converter.convert(job).await,
            Err(ConverterError::InputNotFound { .. })
        ));
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn write_script(dir: &std::path::Path, body: &str) -> PathBuf {
            let path = dir.join("fake-ffmpeg");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn test_successful_conversion_writes_output() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(
                dir.path(),
                "for last; do :; done\necho converted > \"$last\"",
            );
            let input = dir.path().join("a.mp4");
            std::fs::write(&input, b"original").unwrap();
            let output = dir.path().join("tmp").join("a_mp4_fixed.mp4");

            let converter = converter_for(script, None);
            let result = converter
                .convert(ConversionJob::new("j", &input, &output, FfmpegOptions::new()))
                .await
                .unwrap();

            assert_eq!(result.output_path, output);
            assert!(result.output_size_bytes > 0);
            assert_eq!(std::fs::read_to_string(&output).unwrap(), "converted\n");
        }

        #[tokio::test]
        async fn test_nonzero_exit_captures_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(dir.path(), "echo 'Invalid data found' >&2\nexit 1");
            let input = dir.path().join("b.mp4");
            std::fs::write(&input, b"corrupt").unwrap();

            let converter = converter_for(script, None);
            let err = converter
                .convert(ConversionJob::new(
                    "j",
                    &input,
                    dir.path().join("out.mp4"),
                    FfmpegOptions::new(),
                ))
                .await
                .unwrap_err();

            assert!(matches!(err, ConverterError::ConversionFailed { .. }));
            assert_eq!(err.stderr(), Some("Invalid data found"));
        }

        #[tokio::test]
        async fn test_zero_exit_without_output_fails() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(dir.path(), "exit 0");
            let input = dir.path().join("c.mp4");
            std::fs::write(&input, b"video").unwrap();

            let converter = converter_for(script, None);
            let err = converter
                .convert(ConversionJob::new(
                    "j",
                    &input,
                    dir.path().join("never.mp4"),
                    FfmpegOptions::new(),
                ))
                .await
                .unwrap_err();
            assert!(matches!(err, ConverterError::ConversionFailed { .. }));
        }

        #[tokio::test]
        async fn test_timeout_kills_process() {
            let dir = tempfile::tempdir().unwrap();
            let script = write_script(dir.path(), "sleep 5");
            let input = dir.path().join("d.mp4");
            std::fs::write(&input, b"video").unwrap();

            let converter = converter_for(script, Some(Duration::from_millis(200)));
            let started = Instant::now();
            let err = converter
                .convert(ConversionJob::new(
                    "j",
                    &input,
                    dir.path().join("out.mp4"),
                    FfmpegOptions::new(),
                ))
                .await
                .unwrap_err();

            assert!(matches!(err, ConverterError::Timeout { .. }));
            assert!(started.elapsed() < Duration::from_secs(4));
        }
    }
}
