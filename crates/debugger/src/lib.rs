//! Batch debugger for Synacor VM program images.

use env_logger as _;
#[cfg(test)]
use tempfile as _;

/// Session error types.
pub mod errors;
/// Disassembly and state listings.
pub mod inspect;
/// Batch run sessions and snapshot files.
pub mod session;

pub use errors::{DebuggerError, FAILURE_EXIT_CODE};
pub use inspect::{write_dump, write_state};
pub use session::{
    load_engine, parse_address, parse_number, read_snapshot, run_session, write_snapshot,
    SessionConfig, SessionHost, SessionReport,
};
