//! Monitor daemon: periodic eviction of excess processes.
//!
//! Runs independently of any batch. Each tick counts the governed processes
//! and, when there are more than allowed, evicts the newest ones. This is
//! what recovers from orphans left by crashed or unrelated runs.

mod config;
mod daemon;
mod error;
mod types;

pub use config::MonitorConfig;
pub use daemon::MonitorDaemon;
pub use error::MonitorError;
pub use types::MonitorTick;
