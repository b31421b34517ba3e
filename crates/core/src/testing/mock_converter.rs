//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{ConversionJob, ConversionResult, Converter, ConverterError};

use super::MockProcessTable;

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Fail specific input files (like a corrupt video)
/// - Simulate conversion time
/// - Register a fake ffmpeg process in a [`MockProcessTable`] while running
///
/// Successful conversions write `converted:<input file name>` to the output
/// path so tests can check which content ended up where.
///
/// # Example
///
/// ```rust,ignore
/// use ffshepherd_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.fail_for("b.mp4").await;
///
/// let result = converter.convert(job).await?;
///
/// let conversions = converter.recorded_conversions().await;
/// assert_eq!(conversions.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Input file names that fail to convert.
    failing_inputs: Arc<RwLock<HashSet<String>>>,
    /// If set, the next conversion will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Simulated conversion duration.
    conversion_duration: Arc<RwLock<Duration>>,
    /// Table that receives a fake process for every running conversion.
    process_table: Option<Arc<MockProcessTable>>,
    /// Name given to fake processes.
    process_name: String,
    /// Conversions currently running.
    active: Arc<AtomicUsize>,
    /// Highest number of conversions running at once.
    peak_active: Arc<AtomicUsize>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            failing_inputs: Arc::new(RwLock::new(HashSet::new())),
            next_error: Arc::new(RwLock::new(None)),
            conversion_duration: Arc::new(RwLock::new(Duration::from_millis(10))),
            process_table: None,
            process_name: "ffmpeg".to_string(),
            active: Arc::new(AtomicUsize::new(0)),
            peak_active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register a fake process in `table` for the duration of each conversion.
    pub fn with_process_table(mut self, table: Arc<MockProcessTable>) -> Self {
        self.process_table = Some(table);
        self
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Make every conversion of an input with this file name fail.
    pub async fn fail_for(&self, file_name: &str) {
        self.failing_inputs
            .write()
            .await
            .insert(file_name.to_string());
    }

    /// Configure the next conversion to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration.write().await = duration;
    }

    /// Highest number of conversions observed running at once.
    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }

    async fn record(&self, job: ConversionJob, success: bool) {
        self.conversions
            .write()
            .await
            .push(RecordedConversion { job, success });
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        if let Some(error) = self.next_error.write().await.take() {
            self.record(job, false).await;
            return Err(error);
        }

        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(running, Ordering::SeqCst);

        let pid = match &self.process_table {
            Some(table) => Some(table.spawn(&self.process_name).await),
            None => None,
        };

        let duration = *self.conversion_duration.read().await;
        tokio::time::sleep(duration).await;

        if let (Some(table), Some(pid)) = (&self.process_table, pid) {
            table.exit(pid).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let file_name = job
            .input_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if self.failing_inputs.read().await.contains(&file_name) {
            self.record(job, false).await;
            return Err(ConverterError::conversion_failed(
                "FFmpeg exited with code: Some(1)",
                Some(format!("{}: Invalid data found when processing input", file_name)),
            ));
        }

        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = format!("converted:{}", file_name);
        tokio::fs::write(&job.output_path, &content).await?;

        let result = ConversionResult {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: content.len() as u64,
            duration_ms: duration.as_millis() as u64,
        };
        self.record(job, true).await;
        Ok(result)
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
