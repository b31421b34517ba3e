//! `fix`: normalize a folder of videos in place.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use ffshepherd_core::{BatchPipeline, BatchSummary, Config, Converter, FfmpegConverter};

use super::{governor, write_metrics};

pub struct FixArgs {
    pub input_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub concurrency: Option<usize>,
    pub limit_processes: bool,
    pub kill_on_exit: bool,
    pub json: bool,
    pub metrics_out: Option<PathBuf>,
}

pub async fn run(config: &Config, args: FixArgs, token: CancellationToken) -> Result<ExitCode> {
    let converter =
        FfmpegConverter::from_config(&config.ffmpeg, config.governor.threads_per_process);
    converter
        .validate()
        .await
        .context("ffmpeg is not usable")?;

    let pipeline_config = config
        .pipeline
        .clone()
        .with_limit_processes(args.limit_processes)
        .with_kill_on_exit(args.kill_on_exit);

    info!(
        max_processes = config.governor.max_processes,
        threads_per_process = config.governor.threads_per_process,
        ram_limit_gb = config.governor.ram_limit_gb,
        "Process limits"
    );

    let pipeline = BatchPipeline::new(
        pipeline_config,
        converter,
        governor(config),
        config.preset.to_options(),
    );

    let result = pipeline
        .run_batch_with_cancel(&args.input_dir, &args.temp_dir, args.concurrency, token)
        .await;
    write_metrics(args.metrics_out.as_deref())?;
    let summary = result.context("Batch failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(exit_code(&summary))
}

fn print_summary(summary: &BatchSummary) {
    println!(
        "{} files: {} converted, {} failed, {} skipped in {:.1}s",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.skipped,
        summary.duration_ms() as f64 / 1000.0
    );
    if summary.interrupted {
        println!("Interrupted before all files were processed");
    }
    for failure in &summary.failures {
        let reason = failure.error.lines().next().unwrap_or_default();
        println!("  failed ({}): {} - {}", failure.stage, failure.path.display(), reason);
    }
}

/// 0 when everything converted, 130 when interrupted, 1 otherwise.
fn exit_code(summary: &BatchSummary) -> ExitCode {
    if summary.interrupted {
        ExitCode::from(130)
    } else if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
