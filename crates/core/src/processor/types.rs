//! Types for the processor module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Step of a task that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Waiting for a governor slot timed out.
    Slot,
    /// ffmpeg failed or could not be started.
    Conversion,
    /// The original could not be backed up.
    Backup,
    /// The converted output could not replace the original.
    Replace,
    /// The batch was interrupted while the task was in flight.
    Interrupted,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Slot => "slot",
            Self::Conversion => "conversion",
            Self::Backup => "backup",
            Self::Replace => "replace",
            Self::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// Lifecycle of one file in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed { stage: FailureStage, error: String },
}

/// One file to convert, owned by the worker running it.
#[derive(Debug, Clone)]
pub struct ConversionTask {
    /// Original file.
    pub input_path: PathBuf,
    /// Temporary converted output.
    pub output_path: PathBuf,
    /// Where the converted content ends up.
    pub final_path: PathBuf,
    pub status: TaskStatus,
}

impl ConversionTask {
    /// Creates a pending task that replaces `input_path` in place.
    pub fn new(input_path: PathBuf, output_path: PathBuf) -> Self {
        Self {
            final_path: input_path.clone(),
            input_path,
            output_path,
            status: TaskStatus::Pending,
        }
    }

    pub(crate) fn fail(&mut self, stage: FailureStage, error: impl Into<String>) {
        self.status = TaskStatus::Failed {
            stage,
            error: error.into(),
        };
    }

    /// Display name used in logs.
    pub fn file_name(&self) -> String {
        self.input_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.input_path.display().to_string())
    }
}

/// A file that failed, for the batch summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub stage: FailureStage,
    pub error: String,
}

/// Aggregate outcome of a batch run. Task order is not recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    /// Eligible files found.
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Files never dispatched because the run was interrupted.
    pub skipped: usize,
    /// Whether the run was interrupted.
    pub interrupted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub failures: Vec<FailedFile>,
}

impl BatchSummary {
    /// Summary of a run that found nothing to do.
    pub fn empty(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            total: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            interrupted: false,
            started_at,
            finished_at: Utc::now(),
            failures: Vec::new(),
        }
    }

    /// Folds finished tasks into the counts.
    pub(crate) fn record(&mut self, task: ConversionTask) {
        match task.status {
            TaskStatus::Succeeded => self.succeeded += 1,
            TaskStatus::Failed { stage, error } => {
                self.failed += 1;
                self.failures.push(FailedFile {
                    path: task.input_path,
                    stage,
                    error,
                });
            }
            TaskStatus::Pending | TaskStatus::Running => self.skipped += 1,
        }
    }

    /// True when every file converted.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && !self.interrupted
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_defaults_to_in_place_replacement() {
        let task = ConversionTask::new("/v/a.mp4".into(), "/t/a_mp4_fixed.mp4".into());
        assert_eq!(task.final_path, PathBuf::from("/v/a.mp4"));
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.file_name(), "a.mp4");
    }

    #[test]
    fn test_summary_record() {
        let mut summary = BatchSummary::empty(Uuid::new_v4(), Utc::now());

        let mut ok = ConversionTask::new("/v/a.mp4".into(), "/t/a.mp4".into());
        ok.status = TaskStatus::Succeeded;
        let mut bad = ConversionTask::new("/v/b.mp4".into(), "/t/b.mp4".into());
        bad.fail(FailureStage::Conversion, "exit 1");
        let pending = ConversionTask::new("/v/c.mp4".into(), "/t/c.mp4".into());

        summary.record(ok);
        summary.record(bad);
        summary.record(pending);

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failures[0].stage, FailureStage::Conversion);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_summary_serializes_stage_snake_case() {
        let failed = FailedFile {
            path: "/v/b.mp4".into(),
            stage: FailureStage::Interrupted,
            error: "cancelled".into(),
        };
        let json = serde_json::to_string(&failed).unwrap();
        assert!(json.contains("\"stage\":\"interrupted\""));
    }
}
