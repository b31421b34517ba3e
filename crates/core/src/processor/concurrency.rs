//! Worker count selection.

use tracing::debug;

/// Smallest worker pool used when the count is derived automatically.
pub const MIN_WORKERS: usize = 2;
/// Largest worker pool used when the count is derived automatically.
pub const MAX_WORKERS: usize = 5;

/// Worker count for this host: 75% of the physical cores, clamped to
/// [`MIN_WORKERS`]..=[`MAX_WORKERS`].
pub fn auto_concurrency() -> usize {
    let physical = num_cpus::get_physical();
    let logical = num_cpus::get();
    let workers = workers_for(Some(physical).filter(|n| *n > 0), Some(logical).filter(|n| *n > 0));
    debug!(physical, logical, workers, "Derived worker count");
    workers
}

/// Pure form of [`auto_concurrency`]. Falls back to the logical count, then
/// to [`MIN_WORKERS`], when a core count is unknown.
pub fn workers_for(physical: Option<usize>, logical: Option<usize>) -> usize {
    match physical.or(logical) {
        Some(cores) => (cores * 3 / 4).clamp(MIN_WORKERS, MAX_WORKERS),
        None => MIN_WORKERS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workers_scale_with_cores() {
        assert_eq!(workers_for(Some(4), Some(8)), 3);
        assert_eq!(workers_for(Some(6), Some(12)), 4);
    }

    #[test]
    fn test_workers_are_clamped() {
        assert_eq!(workers_for(Some(1), Some(1)), MIN_WORKERS);
        assert_eq!(workers_for(Some(2), Some(4)), MIN_WORKERS);
        assert_eq!(workers_for(Some(64), Some(128)), MAX_WORKERS);
    }

    #[test]
    fn test_workers_fallbacks() {
        assert_eq!(workers_for(None, Some(8)), 5);
        assert_eq!(workers_for(None, None), MIN_WORKERS);
    }

    #[test]
    fn test_auto_concurrency_in_range() {
        let n = auto_concurrency();
        assert!((MIN_WORKERS..=MAX_WORKERS).contains(&n));
    }
}
