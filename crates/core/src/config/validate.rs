use super::{types::Config, ConfigError};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let governor = &config.governor;
    if governor.max_processes == 0 {
        return Err(invalid("governor.max_processes must be at least 1"));
    }
    if governor.threads_per_process == 0 {
        return Err(invalid("governor.threads_per_process must be at least 1"));
    }
    if !is_positive(governor.poll_interval_secs) {
        return Err(invalid("governor.poll_interval_secs must be greater than 0"));
    }
    if !governor.ram_limit_gb.is_finite() || governor.ram_limit_gb < 0.0 {
        return Err(invalid("governor.ram_limit_gb cannot be negative"));
    }
    if governor.process_name.trim().is_empty() {
        return Err(invalid("governor.process_name cannot be empty"));
    }

    let preset = &config.preset;
    if preset.width == 0 || preset.height == 0 {
        return Err(invalid("preset.width and preset.height cannot be 0"));
    }
    if preset.crf > 51 {
        return Err(invalid("preset.crf must be between 0 and 51"));
    }

    let pipeline = &config.pipeline;
    if pipeline.extensions.is_empty() {
        return Err(invalid("pipeline.extensions cannot be empty"));
    }
    if pipeline.temp_suffix.is_empty() {
        return Err(invalid("pipeline.temp_suffix cannot be empty"));
    }
    if pipeline.backup_dir_name.trim().is_empty() {
        return Err(invalid("pipeline.backup_dir_name cannot be empty"));
    }
    if pipeline.concurrency == Some(0) {
        return Err(invalid("pipeline.concurrency cannot be 0"));
    }

    let monitor = &config.monitor;
    if monitor.max_processes == 0 {
        return Err(invalid("monitor.max_processes must be at least 1"));
    }
    if !is_positive(monitor.check_interval_secs) {
        return Err(invalid("monitor.check_interval_secs must be greater than 0"));
    }

    Ok(())
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_max_processes_fails() {
        let mut config = Config::default();
        config.governor.max_processes = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_threads_fails() {
        let mut config = Config::default();
        config.governor.threads_per_process = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_poll_interval() {
        let mut config = Config::default();
        config.governor.poll_interval_secs = 0.0;
        assert!(validate_config(&config).is_err());

        config.governor.poll_interval_secs = f64::NAN;
        assert!(validate_config(&config).is_err());

        config.governor.poll_interval_secs = 0.01;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_pipeline_fields() {
        let mut config = Config::default();
        config.pipeline.extensions.clear();
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.pipeline.concurrency = Some(0);
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.pipeline.temp_suffix = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_preset_crf_range() {
        let mut config = Config::default();
        config.preset.crf = 52;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_monitor_interval() {
        let mut config = Config::default();
        config.monitor.check_interval_secs = -1.0;
        assert!(validate_config(&config).is_err());
    }
}
