//! Monitor daemon loop.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::governor::ProcessGovernor;

use super::config::MonitorConfig;
use super::error::MonitorError;
use super::types::MonitorTick;

/// Periodically enforces `max_processes` over the governed processes.
#[derive(Debug, Clone)]
pub struct MonitorDaemon {
    governor: ProcessGovernor,
    config: MonitorConfig,
}

impl MonitorDaemon {
    /// The daemon counts processes named by the governor's `process_name` and
    /// evicts down to `config.max_processes`.
    pub fn new(governor: ProcessGovernor, config: MonitorConfig) -> Self {
        Self { governor, config }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Runs one census and, if needed, one eviction pass.
    pub async fn tick(&self) -> Result<MonitorTick, MonitorError> {
        let observed = self.governor.processes().await?.len();
        debug!(
            observed,
            max = self.config.max_processes,
            "Checked {} processes",
            self.governor.config().process_name
        );

        if observed <= self.config.max_processes {
            return Ok(MonitorTick {
                observed,
                evicted: Default::default(),
            });
        }

        let evicted = self.governor.evict_excess(self.config.max_processes).await?;
        Ok(MonitorTick { observed, evicted })
    }

    /// Ticks every `check_interval` until `token` is cancelled.
    ///
    /// Returns the number of completed ticks. A census failure ends the loop
    /// since no accounting is possible without it.
    pub async fn run(&self, token: CancellationToken) -> Result<u64, MonitorError> {
        let interval = self.config.check_interval();
        info!(
            max = self.config.max_processes,
            interval_secs = interval.as_secs_f64(),
            "Monitor started"
        );

        let mut ticks = 0u64;
        let mut last_observed = None;
        loop {
            if token.is_cancelled() {
                break;
            }

            let tick = match self.tick().await {
                Ok(tick) => tick,
                Err(e) => {
                    error!("Monitor census failed: {}", e);
                    return Err(e);
                }
            };
            ticks += 1;

            if last_observed != Some(tick.observed) {
                info!(
                    running = tick.observed,
                    "{} processes running",
                    self.governor.config().process_name
                );
                last_observed = Some(tick.observed);
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        info!(ticks, "Monitor stopped");
        Ok(ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::census::{ProcessCensus, ProcessTable};
    use crate::governor::{GovernorConfig, GovernorError};
    use crate::testing::MockProcessTable;
    use std::sync::Arc;
    use std::time::Duration;

    fn daemon(table: &Arc<MockProcessTable>, max: usize, interval: Duration) -> MonitorDaemon {
        let census = ProcessCensus::new(Arc::clone(table) as Arc<dyn ProcessTable>);
        let governor = ProcessGovernor::new(GovernorConfig::default(), census);
        MonitorDaemon::new(
            governor,
            MonitorConfig::default()
                .with_max_processes(max)
                .with_check_interval(interval),
        )
    }

    #[tokio::test]
    async fn test_tick_within_limit_evicts_nothing() {
        let table = Arc::new(MockProcessTable::new());
        table.spawn("ffmpeg").await;
        table.spawn("bash").await;

        let tick = daemon(&table, 3, Duration::from_secs(1)).tick().await.unwrap();
        assert_eq!(tick.observed, 1);
        assert!(tick.evicted.is_empty());
        assert!(table.terminations().await.is_empty());
    }

    #[tokio::test]
    async fn test_tick_evicts_newest() {
        let table = Arc::new(MockProcessTable::new());
        table.spawn_at(10, "ffmpeg", 100).await;
        table.spawn_at(11, "ffmpeg", 300).await;
        table.spawn_at(12, "ffmpeg", 200).await;

        let tick = daemon(&table, 1, Duration::from_secs(1)).tick().await.unwrap();
        assert_eq!(tick.observed, 3);
        assert_eq!(tick.evicted.targeted, 2);
        assert_eq!(table.live_pids("ffmpeg").await, vec![10]);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let table = Arc::new(MockProcessTable::new());
        let daemon = daemon(&table, 3, Duration::from_secs(3600));
        let token = CancellationToken::new();

        let handle = {
            let token = token.clone();
            tokio::spawn(async move { daemon.run(token).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let ticks = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor did not stop")
            .unwrap()
            .unwrap();
        assert_eq!(ticks, 1);
    }

    #[tokio::test]
    async fn test_run_converges_on_orphans() {
        let table = Arc::new(MockProcessTable::new());
        for _ in 0..5 {
            table.spawn("ffmpeg").await;
        }
        let daemon = daemon(&table, 2, Duration::from_millis(10));
        let token = CancellationToken::new();
        let handle = {
            let token = token.clone();
            tokio::spawn(async move { daemon.run(token).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(table.live_pids("ffmpeg").await.len(), 2);
    }

    #[tokio::test]
    async fn test_run_fails_on_census_error() {
        let table = Arc::new(MockProcessTable::new());
        table.fail_enumeration(true);

        let result = daemon(&table, 3, Duration::from_millis(10))
            .run(CancellationToken::new())
            .await;
        assert!(matches!(
            result,
            Err(MonitorError::Governor(GovernorError::Census(_)))
        ));
    }
}
