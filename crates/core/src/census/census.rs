//! Name-filtered census over a process table.

use std::sync::Arc;

use super::error::CensusError;
use super::traits::ProcessTable;
use super::types::ProcessRecord;

/// Returns true if `executable_name` matches `name_filter`.
///
/// Matching is case-insensitive containment, so `ffmpeg.exe` and `FFmpeg`
/// both match the filter `ffmpeg`.
pub fn name_matches(executable_name: &str, name_filter: &str) -> bool {
    executable_name
        .to_lowercase()
        .contains(&name_filter.to_lowercase())
}

/// Point-in-time enumeration of processes matching an executable name.
#[derive(Clone)]
pub struct ProcessCensus {
    table: Arc<dyn ProcessTable>,
}

impl ProcessCensus {
    /// Creates a census over the given process table.
    pub fn new(table: Arc<dyn ProcessTable>) -> Self {
        Self { table }
    }

    /// The underlying process table.
    pub fn table(&self) -> &Arc<dyn ProcessTable> {
        &self.table
    }

    /// Lists live processes whose executable name matches `name_filter`,
    /// oldest first. Every call re-queries the OS.
    pub async fn list_processes(
        &self,
        name_filter: &str,
    ) -> Result<Vec<ProcessRecord>, CensusError> {
        let mut matching: Vec<ProcessRecord> = self
            .table
            .snapshot()
            .await?
            .into_iter()
            .filter(|record| name_matches(&record.executable_name, name_filter))
            .collect();
        matching.sort();

        tracing::trace!(
            filter = name_filter,
            count = matching.len(),
            "Census query complete"
        );
        crate::metrics::CENSUS_PROCESSES.set(matching.len() as i64);

        Ok(matching)
    }

    /// Counts live processes matching `name_filter`.
    pub async fn count(&self, name_filter: &str) -> Result<usize, CensusError> {
        Ok(self.list_processes(name_filter).await?.len())
    }
}

impl std::fmt::Debug for ProcessCensus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessCensus")
            .field("table", &self.table.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProcessTable;

    #[test]
    fn test_name_matches_case_insensitive() {
        assert!(name_matches("ffmpeg", "ffmpeg"));
        assert!(name_matches("FFmpeg.exe", "ffmpeg"));
        assert!(name_matches("ffmpeg", "FFMPEG"));
        assert!(!name_matches("ffprobe", "ffmpeg"));
        assert!(!name_matches("bash", "ffmpeg"));
    }

    #[tokio::test]
    async fn test_list_filters_and_sorts() {
        let table = Arc::new(MockProcessTable::new());
        table.spawn_at(300, "ffmpeg", 30).await;
        table.spawn_at(100, "bash", 10).await;
        table.spawn_at(200, "FFMPEG.EXE", 20).await;
        table.spawn_at(400, "ffprobe", 40).await;

        let census = ProcessCensus::new(table);
        let records = census.list_processes("ffmpeg").await.unwrap();
        let pids: Vec<u32> = records.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![200, 300]);
    }

    #[tokio::test]
    async fn test_count_empty_table() {
        let census = ProcessCensus::new(Arc::new(MockProcessTable::new()));
        assert_eq!(census.count("ffmpeg").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_enumeration_failure_propagates() {
        let table = Arc::new(MockProcessTable::new());
        table.fail_enumeration(true);
        let census = ProcessCensus::new(table);
        let err = census.list_processes("ffmpeg").await.unwrap_err();
        assert!(matches!(err, CensusError::EnumerationFailed { .. }));
    }
}
