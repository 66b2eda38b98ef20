//! Errors surfaced by debugger sessions.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vm_core::SnapshotError;

/// Exit code for usage and I/O failures.
pub const FAILURE_EXIT_CODE: i32 = 2;

/// Anything that stops a session before or after the machine runs.
#[derive(Debug, Error)]
pub enum DebuggerError {
    /// A file could not be read or written.
    #[error("{}: {source}", path.display())]
    File {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing machine output, trace or log failed mid-run.
    #[error("output error: {0}")]
    Output(#[from] io::Error),
    /// A snapshot file could not be decoded or encoded.
    #[error("{}: {source}", path.display())]
    Snapshot {
        /// Snapshot path.
        path: PathBuf,
        /// Decode or encode failure.
        #[source]
        source: SnapshotError,
    },
    /// An address or count argument is not a number in range.
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

impl DebuggerError {
    /// Wraps an I/O error with the path it concerns.
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Wraps a snapshot error with the path it concerns.
    pub fn snapshot(path: impl Into<PathBuf>, source: SnapshotError) -> Self {
        Self::Snapshot {
            path: path.into(),
            source,
        }
    }
}
