//! Batch lifecycle integration tests.
//!
//! These tests run the batch pipeline end to end with a mock converter and a
//! mock process table:
//! - Mixed success and failure within one batch
//! - Backups and restore after a batch
//! - Interrupts and the final kill of leftover processes

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use ffshepherd_core::{
    census::{ProcessCensus, ProcessTable, TerminateMode},
    processor::FailureStage,
    testing::{fixtures, MockConverter, MockProcessTable},
    BackupManager, BatchPipeline, FfmpegOptions, GovernorConfig, PipelineConfig,
    ProcessGovernor,
};

/// Test helper owning a pipeline over mocks and a scratch directory tree.
struct TestHarness {
    pipeline: BatchPipeline<MockConverter>,
    converter: MockConverter,
    table: Arc<MockProcessTable>,
    root: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    fn with_config(config: PipelineConfig) -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir(root.path().join("videos")).expect("Failed to create input dir");

        let table = Arc::new(MockProcessTable::new());
        let converter = MockConverter::new().with_process_table(Arc::clone(&table));
        let census = ProcessCensus::new(Arc::clone(&table) as Arc<dyn ProcessTable>);
        let governor = ProcessGovernor::new(
            GovernorConfig::default().with_poll_interval(Duration::from_millis(5)),
            census,
        );
        let pipeline =
            BatchPipeline::new(config, converter.clone(), governor, FfmpegOptions::new());

        Self {
            pipeline,
            converter,
            table,
            root,
        }
    }

    fn input_dir(&self) -> PathBuf {
        self.root.path().join("videos")
    }

    fn temp_dir(&self) -> PathBuf {
        self.root.path().join("tmp")
    }

    fn add(&self, names: &[&str]) {
        fixtures::media_files(&self.input_dir(), names).expect("Failed to write fixtures");
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.input_dir().join(name)).expect("Failed to read file")
    }
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn test_mixed_batch_replaces_only_successful_files() {
    let h = TestHarness::new();
    h.add(&["a.mp4", "b.mp4"]);
    h.converter.fail_for("b.mp4").await;

    let summary = h
        .pipeline
        .run_batch(&h.input_dir(), &h.temp_dir(), Some(2))
        .await
        .unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);
    assert!(!summary.interrupted);

    assert_eq!(h.read("a.mp4"), "converted:a.mp4");
    assert_eq!(h.read("b.mp4"), "original:b.mp4");

    let failure = &summary.failures[0];
    assert_eq!(failure.path, h.input_dir().join("b.mp4"));
    assert_eq!(failure.stage, FailureStage::Conversion);
    assert!(failure.error.contains("Invalid data found"));

    // No temp output survives, whatever the outcome.
    assert!(dir_entries(&h.temp_dir()).is_empty());
    // Only the converted file was backed up.
    assert_eq!(dir_entries(&h.input_dir().join("backup")), vec!["a.mp4"]);
    assert_eq!(h.converter.conversion_count().await, 2);
}

#[tokio::test]
async fn test_restore_after_batch_reproduces_originals() {
    let h = TestHarness::new();
    h.add(&["a.mp4", "b.mov", "c.mkv"]);

    let summary = h
        .pipeline
        .run_batch(&h.input_dir(), &h.temp_dir(), None)
        .await
        .unwrap();
    assert_eq!(summary.succeeded, 3);
    assert!(summary.is_success());
    assert_eq!(h.read("b.mov"), "converted:b.mov");

    let report = BackupManager::new()
        .restore_all(&h.pipeline.backup_dir(&h.input_dir()), &h.input_dir())
        .await
        .unwrap();

    assert_eq!(report.restored_count(), 3);
    for name in ["a.mp4", "b.mov", "c.mkv"] {
        assert_eq!(h.read(name), format!("original:{}", name));
    }
}

#[tokio::test]
async fn test_empty_batch_creates_no_temp_dir() {
    let h = TestHarness::new();
    h.add(&["readme.txt", "cover.jpg"]);

    let summary = h
        .pipeline
        .run_batch(&h.input_dir(), &h.temp_dir(), None)
        .await
        .unwrap();

    assert_eq!((summary.total, summary.succeeded, summary.failed), (0, 0, 0));
    assert!(!h.temp_dir().exists());
    assert_eq!(h.converter.conversion_count().await, 0);
}

#[tokio::test]
async fn test_extension_match_ignores_case_and_subdirectories() {
    let h = TestHarness::new();
    h.add(&["A.MOV", "clip.Mkv", "notes.txt"]);
    std::fs::create_dir(h.input_dir().join("nested.mp4")).unwrap();

    let summary = h
        .pipeline
        .run_batch(&h.input_dir(), &h.temp_dir(), Some(1))
        .await
        .unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(h.read("notes.txt"), "original:notes.txt");
}

#[tokio::test]
async fn test_interrupt_abandons_in_flight_and_skips_the_rest() {
    let h = TestHarness::new();
    h.add(&["a.mp4", "b.mp4", "c.mp4", "d.mp4"]);
    h.converter.set_conversion_duration(Duration::from_secs(30)).await;

    let token = CancellationToken::new();
    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        })
    };

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        h.pipeline
            .run_batch_with_cancel(&h.input_dir(), &h.temp_dir(), Some(2), token),
    )
    .await
    .expect("batch did not stop after interrupt")
    .unwrap();
    canceller.await.unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.total, 4);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.skipped, 2);
    assert!(summary
        .failures
        .iter()
        .all(|f| f.stage == FailureStage::Interrupted));

    for name in ["a.mp4", "b.mp4", "c.mp4", "d.mp4"] {
        assert_eq!(h.read(name), format!("original:{}", name));
    }

    // The abandoned conversions left processes behind; the final kill got them.
    assert!(h.table.live_pids("ffmpeg").await.is_empty());
    let forced = h
        .table
        .terminations()
        .await
        .into_iter()
        .filter(|(_, mode)| *mode == TerminateMode::Forced)
        .count();
    assert_eq!(forced, 2);
}

#[tokio::test]
async fn test_kill_on_exit_targets_leftover_processes() {
    let h = TestHarness::with_config(PipelineConfig::default().with_limit_processes(false));
    h.add(&["a.mp4"]);
    let orphan = h.table.spawn("ffmpeg").await;
    let unrelated = h.table.spawn("vlc").await;

    h.pipeline
        .run_batch(&h.input_dir(), &h.temp_dir(), None)
        .await
        .unwrap();

    assert!(!h.table.live_pids("ffmpeg").await.contains(&orphan));
    assert_eq!(h.table.live_pids("vlc").await, vec![unrelated]);
}

#[tokio::test]
async fn test_kill_on_exit_disabled_leaves_processes() {
    let h = TestHarness::with_config(
        PipelineConfig::default()
            .with_limit_processes(false)
            .with_kill_on_exit(false),
    );
    h.add(&["a.mp4"]);
    let orphan = h.table.spawn("ffmpeg").await;

    let summary = h
        .pipeline
        .run_batch(&h.input_dir(), &h.temp_dir(), None)
        .await
        .unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(h.table.live_pids("ffmpeg").await, vec![orphan]);
    assert!(h.table.terminations().await.is_empty());
}

#[tokio::test]
async fn test_leftover_temp_outputs_are_not_inputs() {
    let h = TestHarness::new();
    h.add(&["a.mp4"]);
    // A crashed run may leave temp outputs next to the inputs.
    h.add(&["a_mp4_fixed.mp4"]);

    let summary = h
        .pipeline
        .run_batch(&h.input_dir(), &h.input_dir(), None)
        .await
        .unwrap();

    assert_eq!(summary.total, 1);
    assert_eq!(h.read("a.mp4"), "converted:a.mp4");
    assert_eq!(dir_entries(&h.input_dir()), vec!["a.mp4", "backup"]);
}

#[cfg(unix)]
mod real_converter {
    use super::*;
    use ffshepherd_core::converter::CommandConfig;
    use ffshepherd_core::{Converter, FfmpegConverter};
    use std::os::unix::fs::PermissionsExt;

    /// A stand-in transcoder: fails on inputs named `bad*`, otherwise writes
    /// a marker into the output path (the last argument).
    const SCRIPT: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
    echo "ffmpeg version fake"
    exit 0
fi
for last; do :; done
case "$*" in
    *bad.mp4*) echo "bad.mp4: Invalid data found when processing input" >&2; exit 1 ;;
esac
echo "transcoded" > "$last"
"#;

    fn fake_ffmpeg(dir: &Path) -> PathBuf {
        let path = dir.join("ffmpeg");
        std::fs::write(&path, SCRIPT).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_batch_with_scripted_ffmpeg() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("videos");
        std::fs::create_dir(&input).unwrap();
        fixtures::media_files(&input, &["good.mp4", "bad.mp4"]).unwrap();

        let converter = FfmpegConverter::new(
            CommandConfig {
                program: fake_ffmpeg(root.path()),
                ..Default::default()
            },
            Some(Duration::from_secs(10)),
        );
        converter.validate().await.unwrap();

        let table = Arc::new(MockProcessTable::new());
        let census = ProcessCensus::new(Arc::clone(&table) as Arc<dyn ProcessTable>);
        let governor = ProcessGovernor::new(GovernorConfig::default(), census);
        let pipeline = BatchPipeline::new(
            PipelineConfig::default(),
            converter,
            governor,
            ffshepherd_core::NormalizePreset::default().to_options(),
        );

        let summary = pipeline
            .run_batch(&input, &root.path().join("tmp"), Some(2))
            .await
            .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            std::fs::read_to_string(input.join("good.mp4")).unwrap(),
            "transcoded\n"
        );
        assert_eq!(
            std::fs::read_to_string(input.join("bad.mp4")).unwrap(),
            "original:bad.mp4"
        );
        assert!(summary.failures[0].error.contains("Invalid data found"));
    }
}
