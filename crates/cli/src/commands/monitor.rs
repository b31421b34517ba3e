//! `monitor`: keep the ffmpeg process count under a limit.

use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;

use ffshepherd_core::{Config, MonitorConfig, MonitorDaemon};

use super::{governor, write_metrics};

pub async fn run(
    config: &Config,
    max_processes: Option<usize>,
    check_interval: Option<f64>,
    metrics_out: Option<&Path>,
    token: CancellationToken,
) -> Result<ExitCode> {
    let monitor_config = monitor_config(&config.monitor, max_processes, check_interval)?;
    let daemon = MonitorDaemon::new(governor(config), monitor_config);

    let result = daemon.run(token).await;
    write_metrics(metrics_out)?;
    result.context("Monitor failed")?;
    Ok(ExitCode::SUCCESS)
}

/// Applies command line overrides to the configured monitor settings.
fn monitor_config(
    base: &MonitorConfig,
    max_processes: Option<usize>,
    check_interval: Option<f64>,
) -> Result<MonitorConfig> {
    let mut config = base.clone();
    if let Some(max) = max_processes {
        if max == 0 {
            bail!("--max-processes must be at least 1");
        }
        config = config.with_max_processes(max);
    }
    if let Some(secs) = check_interval {
        let interval = Duration::try_from_secs_f64(secs)
            .ok()
            .filter(|d| !d.is_zero())
            .with_context(|| format!("Invalid --check-interval: {}", secs))?;
        config = config.with_check_interval(interval);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let config = monitor_config(&MonitorConfig::default(), Some(1), Some(0.5)).unwrap();
        assert_eq!(config.max_processes, 1);
        assert_eq!(config.check_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_defaults_kept() {
        let config = monitor_config(&MonitorConfig::default(), None, None).unwrap();
        assert_eq!(config.max_processes, 3);
        assert_eq!(config.check_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(monitor_config(&MonitorConfig::default(), Some(0), None).is_err());
        assert!(monitor_config(&MonitorConfig::default(), None, Some(0.0)).is_err());
        assert!(monitor_config(&MonitorConfig::default(), None, Some(-2.0)).is_err());
    }
}
