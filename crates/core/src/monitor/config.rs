//! Configuration for the monitor module.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Monitor daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Processes allowed to keep running; the oldest are kept.
    #[serde(default = "default_max_processes")]
    pub max_processes: usize,

    /// Seconds between checks.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: f64,
}

fn default_max_processes() -> usize {
    3
}

fn default_check_interval() -> f64 {
    5.0
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_processes: default_max_processes(),
            check_interval_secs: default_check_interval(),
        }
    }
}

impl MonitorConfig {
    pub fn with_max_processes(mut self, max: usize) -> Self {
        self.max_processes = max;
        self
    }

    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval_secs = interval.as_secs_f64();
        self
    }

    /// Check interval as a duration. Invalid values fall back to the default.
    pub fn check_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.check_interval_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_check_interval()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.max_processes, 3);
        assert_eq!(config.check_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_builder() {
        let config = MonitorConfig::default()
            .with_max_processes(1)
            .with_check_interval(Duration::from_millis(500));
        assert_eq!(config.max_processes, 1);
        assert_eq!(config.check_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_fractional_interval_from_toml() {
        let config: MonitorConfig = toml::from_str("check_interval_secs = 0.25").unwrap();
        assert_eq!(config.check_interval(), Duration::from_millis(250));
        assert_eq!(config.max_processes, 3);
    }
}
