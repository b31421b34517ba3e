//! Process governor: a soft concurrency ceiling over external processes.
//!
//! The governor keeps no state of its own. Every decision is derived from a
//! fresh census plus the immutable [`GovernorConfig`], so several governors
//! (a batch pipeline and a monitor daemon, say) can act on the same process
//! table without coordinating. The ceiling is soft: the window between a
//! slot check and the spawn of a new process is not locked.

mod config;
mod error;
mod governor;
mod types;

pub use config::GovernorConfig;
pub use error::GovernorError;
pub use governor::ProcessGovernor;
pub use types::{EvictionReport, SlotGrant};
