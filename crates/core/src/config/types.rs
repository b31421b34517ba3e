use serde::{Deserialize, Serialize};

use crate::converter::{ConverterConfig, NormalizePreset};
use crate::governor::GovernorConfig;
use crate::monitor::MonitorConfig;
use crate::processor::PipelineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub governor: GovernorConfig,
    #[serde(default)]
    pub ffmpeg: ConverterConfig,
    #[serde(default)]
    pub preset: NormalizePreset,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.governor.max_processes, 3);
        assert_eq!(config.governor.threads_per_process, 2);
        assert_eq!(config.governor.ram_limit_gb, 7.0);
        assert_eq!(config.governor.process_name, "ffmpeg");
        assert!(config.ffmpeg.path.is_none());
        assert_eq!(config.monitor.max_processes, 3);
        assert_eq!(config.monitor.check_interval_secs, 5.0);
        assert_eq!(config.pipeline.backup_dir_name, "backup");
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[governor]
max_processes = 5
threads_per_process = 4
ram_limit_gb = 16.0
poll_interval_secs = 0.5

[ffmpeg]
path = "/opt/ffmpeg/bin/ffmpeg"
timeout_secs = 600

[preset]
width = 1920
height = 1080
crf = 20

[pipeline]
extensions = ["mp4", "webm"]
concurrency = 3
limit_processes = false

[monitor]
max_processes = 4
check_interval_secs = 10
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.governor.max_processes, 5);
        assert_eq!(config.governor.threads_per_process, 4);
        assert_eq!(config.governor.poll_interval_secs, 0.5);
        assert_eq!(
            config.ffmpeg.path,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert_eq!(config.ffmpeg.timeout_secs, Some(600));
        assert_eq!(config.preset.width, 1920);
        assert_eq!(config.preset.crf, 20);
        // untouched preset keys keep their defaults
        assert_eq!(config.preset.audio_bitrate_kbps, 128);
        assert_eq!(config.pipeline.extensions, vec!["mp4", "webm"]);
        assert_eq!(config.pipeline.concurrency, Some(3));
        assert!(!config.pipeline.limit_processes);
        assert_eq!(config.monitor.check_interval_secs, 10.0);
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = Config::default();
        let rendered = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.governor.max_processes, config.governor.max_processes);
        assert_eq!(parsed.pipeline.temp_suffix, config.pipeline.temp_suffix);
    }
}
