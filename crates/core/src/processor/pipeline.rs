//! Batch pipeline implementation.

use chrono::Utc;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backup::BackupManager;
use crate::converter::{ConversionJob, Converter, ConverterError, FfmpegOptions};
use crate::governor::{GovernorError, ProcessGovernor};
use crate::metrics;

use super::concurrency::auto_concurrency;
use super::config::PipelineConfig;
use super::error::PipelineError;
use super::types::{BatchSummary, ConversionTask, FailureStage, TaskStatus};

type TaskQueue = Arc<Mutex<VecDeque<ConversionTask>>>;

/// Converts every eligible file of a directory with a bounded worker pool and
/// replaces each original only after it has been backed up.
///
/// Per file: wait for a governor slot, convert into the temp directory, back
/// up the original, replace it, delete the temp output.
pub struct BatchPipeline<C: Converter> {
    config: PipelineConfig,
    converter: Arc<C>,
    governor: ProcessGovernor,
    backups: BackupManager,
    options: FfmpegOptions,
}

/// Shared state of one run, handed to every worker.
struct BatchRun<C: Converter> {
    run_id: Uuid,
    converter: Arc<C>,
    governor: ProcessGovernor,
    backups: BackupManager,
    options: FfmpegOptions,
    backup_dir: PathBuf,
    limit_processes: bool,
    slot_timeout: Option<Duration>,
    total: usize,
    done: AtomicUsize,
}

/// What a worker hands back when it stops.
struct WorkerOutput {
    finished: Vec<ConversionTask>,
    error: Option<PipelineError>,
}

impl<C: Converter + 'static> BatchPipeline<C> {
    /// Creates a pipeline that passes `options` to every conversion.
    pub fn new(
        config: PipelineConfig,
        converter: C,
        governor: ProcessGovernor,
        options: FfmpegOptions,
    ) -> Self {
        let backups = BackupManager::new().with_verification(config.verify_backups);
        Self {
            config,
            converter: Arc::new(converter),
            governor,
            backups,
            options,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn governor(&self) -> &ProcessGovernor {
        &self.governor
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Directory holding backups of originals from `input_dir`.
    pub fn backup_dir(&self, input_dir: &Path) -> PathBuf {
        input_dir.join(&self.config.backup_dir_name)
    }

    /// Temp output for `input`: `{stem}_{ext}{temp_suffix}.{output_extension}`.
    ///
    /// Keeping the source extension in the name keeps `a.mov` and `a.mp4`
    /// apart in the same batch.
    pub fn temp_path_for(&self, input: &Path, temp_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let ext = input
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        temp_dir.join(format!(
            "{}_{}{}.{}",
            stem, ext, self.config.temp_suffix, self.config.output_extension
        ))
    }

    /// Runs a batch that can only end by finishing or failing systemically.
    pub async fn run_batch(
        &self,
        input_dir: &Path,
        temp_dir: &Path,
        concurrency: Option<usize>,
    ) -> Result<BatchSummary, PipelineError> {
        self.run_batch_with_cancel(input_dir, temp_dir, concurrency, CancellationToken::new())
            .await
    }

    /// Runs a batch that stops early when `token` is cancelled.
    ///
    /// On cancellation no further files are dispatched, slot waits end,
    /// in-flight conversions are abandoned (their ffmpeg is killed) and
    /// counted as failed, and undispatched files are counted as skipped.
    /// Whatever the outcome, every matching process is killed exactly once
    /// afterwards when `kill_on_exit` is set.
    pub async fn run_batch_with_cancel(
        &self,
        input_dir: &Path,
        temp_dir: &Path,
        concurrency: Option<usize>,
        token: CancellationToken,
    ) -> Result<BatchSummary, PipelineError> {
        let result = self
            .run_inner(input_dir, temp_dir, concurrency, &token)
            .await;

        if self.config.kill_on_exit {
            self.kill_remaining().await;
        }

        match &result {
            Ok(summary) => info!(
                run_id = %summary.run_id,
                total = summary.total,
                succeeded = summary.succeeded,
                failed = summary.failed,
                skipped = summary.skipped,
                interrupted = summary.interrupted,
                "Batch finished"
            ),
            Err(e) => error!("Batch aborted: {}", e),
        }
        result
    }

    async fn kill_remaining(&self) {
        let name = &self.governor.config().process_name;
        match self.governor.kill_all(name).await {
            Ok(0) => debug!("No leftover {} processes", name),
            Ok(n) => info!(killed = n, "Killed leftover {} processes", name),
            Err(e) => warn!("Failed to kill leftover {} processes: {}", name, e),
        }
    }

    async fn run_inner(
        &self,
        input_dir: &Path,
        temp_dir: &Path,
        concurrency: Option<usize>,
        token: &CancellationToken,
    ) -> Result<BatchSummary, PipelineError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let files = self.eligible_files(input_dir).await?;
        if files.is_empty() {
            info!(dir = %input_dir.display(), "No eligible files found");
            return Ok(BatchSummary::empty(run_id, started_at));
        }

        let workers = concurrency
            .or(self.config.concurrency)
            .unwrap_or_else(auto_concurrency)
            .clamp(1, files.len());

        fs::create_dir_all(temp_dir)
            .await
            .map_err(|e| PipelineError::TempDirFailed {
                path: temp_dir.to_path_buf(),
                source: e,
            })?;

        let tasks: VecDeque<ConversionTask> = files
            .into_iter()
            .map(|input| {
                let output = self.temp_path_for(&input, temp_dir);
                ConversionTask::new(input, output)
            })
            .collect();
        let total = tasks.len();
        info!(%run_id, total, workers, "Starting batch");

        let queue: TaskQueue = Arc::new(Mutex::new(tasks));
        let abort = token.child_token();
        let run = Arc::new(BatchRun {
            run_id,
            converter: Arc::clone(&self.converter),
            governor: self.governor.clone(),
            backups: self.backups.clone(),
            options: self.options.clone(),
            backup_dir: self.backup_dir(input_dir),
            limit_processes: self.config.limit_processes,
            slot_timeout: self.config.slot_timeout(),
            total,
            done: AtomicUsize::new(0),
        });

        let mut set = JoinSet::new();
        for worker_id in 0..workers {
            let run = Arc::clone(&run);
            let queue = Arc::clone(&queue);
            let abort = abort.clone();
            set.spawn(async move { run.work(worker_id, queue, abort).await });
        }

        let mut summary = BatchSummary::empty(run_id, started_at);
        summary.total = total;
        let mut fatal = None;

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(output) => {
                    for task in output.finished {
                        summary.record(task);
                    }
                    if let Some(e) = output.error {
                        abort.cancel();
                        fatal.get_or_insert(e);
                    }
                }
                Err(e) => {
                    abort.cancel();
                    fatal.get_or_insert(PipelineError::Worker(e.to_string()));
                }
            }
        }

        for task in queue.lock().await.drain(..) {
            metrics::CONVERSIONS_TOTAL
                .with_label_values(&["skipped"])
                .inc();
            summary.record(task);
        }

        summary.interrupted = token.is_cancelled();
        summary.finished_at = Utc::now();

        match fatal {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Eligible files directly inside `input_dir`, sorted by name.
    ///
    /// Leftover temp outputs of an earlier run are not eligible.
    async fn eligible_files(&self, input_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let meta = fs::metadata(input_dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::InputDirNotFound {
                    path: input_dir.to_path_buf(),
                }
            } else {
                PipelineError::Io(e)
            }
        })?;
        if !meta.is_dir() {
            return Err(PipelineError::NotADirectory {
                path: input_dir.to_path_buf(),
            });
        }

        let temp_marker = format!(
            "{}.{}",
            self.config.temp_suffix, self.config.output_extension
        );
        let mut files = Vec::new();
        let mut entries = fs::read_dir(input_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file || !self.config.is_eligible(&path) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(&temp_marker) {
                debug!(file = %name, "Skipping leftover temp output");
                continue;
            }
            files.push(path);
        }
        files.sort();
        Ok(files)
    }
}

impl<C: Converter> BatchRun<C> {
    async fn work(
        &self,
        worker_id: usize,
        queue: TaskQueue,
        abort: CancellationToken,
    ) -> WorkerOutput {
        let mut finished = Vec::new();
        loop {
            if abort.is_cancelled() {
                break;
            }
            let Some(task) = queue.lock().await.pop_front() else {
                break;
            };
            match self.run_task(task, &abort).await {
                Ok(task) => finished.push(task),
                Err((task, e)) => {
                    finished.push(task);
                    return WorkerOutput {
                        finished,
                        error: Some(e),
                    };
                }
            }
        }
        debug!(worker_id, "Worker finished");
        WorkerOutput {
            finished,
            error: None,
        }
    }

    /// Drives one task to a terminal state, or back to pending if the run was
    /// interrupted before its process started.
    async fn run_task(
        &self,
        mut task: ConversionTask,
        abort: &CancellationToken,
    ) -> Result<ConversionTask, (ConversionTask, PipelineError)> {
        let name = task.file_name();
        task.status = TaskStatus::Running;

        if self.limit_processes {
            let poll = self.governor.config().poll_interval();
            let wait = async {
                match self.slot_timeout {
                    Some(limit) => self.governor.acquire_slot_with_deadline(poll, limit).await,
                    None => self.governor.acquire_slot(poll).await,
                }
            };
            tokio::select! {
                _ = abort.cancelled() => {
                    metrics::SLOT_ACQUISITIONS.with_label_values(&["cancelled"]).inc();
                    metrics::CONVERSIONS_TOTAL.with_label_values(&["skipped"]).inc();
                    debug!(file = %name, "Interrupted while waiting for a slot");
                    task.status = TaskStatus::Pending;
                    return Ok(task);
                }
                result = wait => match result {
                    Ok(grant) => debug!(file = %name, polls = grant.polls, "Acquired process slot"),
                    Err(e @ GovernorError::SlotTimeout { .. }) => {
                        warn!(file = %name, "{}", e);
                        task.fail(FailureStage::Slot, e.to_string());
                        return Ok(self.finish(task, None));
                    }
                    Err(e) => return Err((task, PipelineError::Governor(e))),
                },
            }
        }

        info!(file = %name, "Converting");
        let job = ConversionJob::new(
            format!("{}-{}", self.run_id, name),
            &task.input_path,
            &task.output_path,
            self.options.clone(),
        );
        let started = Instant::now();
        let converted = tokio::select! {
            _ = abort.cancelled() => None,
            result = self.converter.convert(job) => Some(result),
        };
        let elapsed = started.elapsed();

        match converted {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!(file = %name, stderr = e.stderr().unwrap_or(""), "Conversion failed: {}", e);
                self.remove_temp(&task).await;
                task.fail(FailureStage::Conversion, describe(&e));
                return Ok(self.finish(task, Some(elapsed)));
            }
            None => {
                warn!(file = %name, "Conversion abandoned on interrupt");
                self.remove_temp(&task).await;
                task.fail(FailureStage::Interrupted, "interrupted during conversion");
                return Ok(self.finish(task, Some(elapsed)));
            }
        }

        if let Err(e) = self.backups.backup(&task.input_path, &self.backup_dir).await {
            warn!(file = %name, "Backup failed, original left untouched: {}", e);
            self.remove_temp(&task).await;
            task.fail(FailureStage::Backup, e.to_string());
            return Ok(self.finish(task, Some(elapsed)));
        }

        if let Err(e) = self.backups.replace(&task.final_path, &task.output_path).await {
            warn!(file = %name, "Replace failed, original left untouched: {}", e);
            self.remove_temp(&task).await;
            task.fail(FailureStage::Replace, e.to_string());
            return Ok(self.finish(task, Some(elapsed)));
        }

        self.remove_temp(&task).await;
        task.status = TaskStatus::Succeeded;
        Ok(self.finish(task, Some(elapsed)))
    }

    async fn remove_temp(&self, task: &ConversionTask) {
        match fs::remove_file(&task.output_path).await {
            Ok(()) => debug!(file = %task.output_path.display(), "Deleted temp output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                file = %task.output_path.display(),
                "Failed to delete temp output: {}", e
            ),
        }
    }

    /// Records metrics and progress for a task in a terminal state.
    fn finish(&self, task: ConversionTask, elapsed: Option<Duration>) -> ConversionTask {
        let label = match task.status {
            TaskStatus::Succeeded => "success",
            _ => "failed",
        };
        metrics::CONVERSIONS_TOTAL.with_label_values(&[label]).inc();
        if let Some(elapsed) = elapsed {
            metrics::CONVERSION_DURATION
                .with_label_values(&[label])
                .observe(elapsed.as_secs_f64());
        }

        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        match &task.status {
            TaskStatus::Succeeded => info!(
                file = %task.file_name(),
                "[{}/{}] Replaced original with converted file",
                done,
                self.total
            ),
            TaskStatus::Failed { stage, .. } => warn!(
                file = %task.file_name(),
                %stage,
                "[{}/{}] File failed",
                done,
                self.total
            ),
            _ => {}
        }
        task
    }
}

/// Error text with the tail of ffmpeg's stderr attached.
fn describe(error: &ConverterError) -> String {
    match error.stderr() {
        Some(stderr) => format!("{}\n{}", error, stderr),
        None => error.to_string(),
    }
}
