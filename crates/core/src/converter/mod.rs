//! Converter module for running ffmpeg.
//!
//! This module provides the `Converter` trait, the pure command builder and
//! the `FfmpegConverter` that spawns one ffmpeg process per job.
//!
//! # Example
//!
//! ```ignore
//! use ffshepherd_core::converter::{
//!     Converter, ConversionJob, ConverterConfig, FfmpegConverter, NormalizePreset,
//! };
//!
//! let converter = FfmpegConverter::from_config(&ConverterConfig::default(), 2);
//! converter.validate().await?;
//!
//! let job = ConversionJob::new(
//!     "job-1",
//!     "/videos/clip.mov",
//!     "/tmp/fix/clip_mov_fixed.mp4",
//!     NormalizePreset::default().to_options(),
//! );
//! let result = converter.convert(job).await?;
//! println!("Converted in {} ms", result.duration_ms);
//! ```

mod builder;
mod config;
mod error;
mod ffmpeg;
mod preset;
mod traits;
mod types;

pub use builder::{build_command, resolve_ffmpeg_path, CommandConfig};
pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use preset::NormalizePreset;
pub use traits::Converter;
pub use types::{ConversionJob, ConversionResult, FfmpegOptions};
