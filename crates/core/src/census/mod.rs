//! Process census: point-in-time enumeration of OS processes.
//!
//! The OS process table is reached only through the [`ProcessTable`] trait.
//! [`SysinfoProcessTable`] is the production implementation; termination
//! strategies for each platform live in one place and are never branched on
//! by callers.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ffshepherd_core::census::{ProcessCensus, SysinfoProcessTable};
//!
//! let census = ProcessCensus::new(Arc::new(SysinfoProcessTable::new()));
//! for record in census.list_processes("ffmpeg").await? {
//!     println!("{} started at {}", record.pid, record.start_time);
//! }
//! ```

mod census;
mod error;
mod signal;
mod sysinfo_table;
mod traits;
mod types;

pub use census::{name_matches, ProcessCensus};
pub use error::{CensusError, TerminateError};
pub use sysinfo_table::SysinfoProcessTable;
pub use traits::ProcessTable;
pub use types::{ProcessRecord, TerminateMode};
