//! Processor module for the batch conversion pipeline.
//!
//! This module provides the `BatchPipeline` which coordinates, per file:
//! - Slot acquisition: waiting on the process governor
//! - Conversion: running ffmpeg into a temp directory
//! - Replacement: backing up the original and swapping in the result
//!
//! A fixed pool of tokio workers drains a shared task queue, so at most
//! `concurrency` conversions are in flight. Completion order is not defined.
//!
//! # Example
//!
//! ```ignore
//! use ffshepherd_core::processor::{BatchPipeline, PipelineConfig};
//!
//! let pipeline = BatchPipeline::new(
//!     PipelineConfig::default(),
//!     converter,
//!     governor,
//!     NormalizePreset::default().to_options(),
//! );
//!
//! let token = CancellationToken::new();
//! let summary = pipeline
//!     .run_batch_with_cancel(Path::new("/videos"), Path::new("/tmp/fix"), None, token)
//!     .await?;
//! println!("{} of {} converted", summary.succeeded, summary.total);
//! ```

mod concurrency;
mod config;
mod error;
mod pipeline;
mod types;

pub use concurrency::{auto_concurrency, workers_for, MAX_WORKERS, MIN_WORKERS};
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::BatchPipeline;
pub use types::{BatchSummary, ConversionTask, FailedFile, FailureStage, TaskStatus};
