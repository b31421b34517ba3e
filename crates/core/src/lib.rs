pub mod backup;
pub mod census;
pub mod config;
pub mod converter;
pub mod governor;
pub mod metrics;
pub mod monitor;
pub mod processor;
pub mod testing;

pub use backup::{BackupEntry, BackupError, BackupManager, ReplaceReport, RestoreReport};
pub use census::{ProcessCensus, ProcessRecord, ProcessTable, SysinfoProcessTable};
pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError,
};
pub use converter::{
    build_command, Converter, ConverterConfig, FfmpegConverter, FfmpegOptions, NormalizePreset,
};
pub use governor::{GovernorConfig, GovernorError, ProcessGovernor};
pub use monitor::{MonitorConfig, MonitorDaemon, MonitorError};
pub use processor::{BatchPipeline, BatchSummary, PipelineConfig, PipelineError};
