//! Versioned machine-state snapshots.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{MachineState, MemoryImage, RegisterFile};

/// Stable snapshot wire-version identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum SnapshotVersion {
    /// Initial schema: memory, registers, stack, pc and result code.
    V1 = 1,
}

impl SnapshotVersion {
    /// Version written by this build.
    pub const CURRENT: Self = Self::V1;

    /// Converts a wire value to a known snapshot version.
    #[must_use]
    pub const fn from_u16(version: u16) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

impl From<SnapshotVersion> for u16 {
    fn from(version: SnapshotVersion) -> Self {
        version as Self
    }
}

impl TryFrom<u16> for SnapshotVersion {
    type Error = SnapshotError;

    fn try_from(version: u16) -> Result<Self, Self::Error> {
        Self::from_u16(version).ok_or(SnapshotError::UnsupportedVersion(version))
    }
}

/// Failure to decode a persisted snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot was written by an unknown schema revision.
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u16),
    /// The bytes are not a well-formed snapshot.
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Full machine state captured for exact restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema revision.
    pub version: SnapshotVersion,
    /// Every memory cell, including cells grown by writes.
    pub memory: MemoryImage,
    /// Next cell to fetch, or `None` when halted.
    pub pc: Option<usize>,
    /// Register file.
    pub registers: RegisterFile,
    /// Stack from bottom to top.
    pub stack: Vec<u16>,
    /// Result code.
    pub result: u16,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u16,
}

impl Snapshot {
    /// Captures `state` at the current schema revision.
    #[must_use]
    pub fn capture(state: &MachineState) -> Self {
        Self {
            version: SnapshotVersion::CURRENT,
            memory: state.memory().clone(),
            pc: state.pc(),
            registers: *state.registers(),
            stack: state.stack().to_vec(),
            result: state.result(),
        }
    }

    /// Rebuilds the captured machine.
    #[must_use]
    pub fn into_state(self) -> MachineState {
        MachineState::from_parts(self.memory, self.registers, self.stack, self.pc, self.result)
    }

    /// Encodes the snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Malformed`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        let bytes = serde_json::to_vec(self)?;
        log::debug!(
            "encoded snapshot v{}: {} cells, {} stack entries",
            u16::from(self.version),
            self.memory.len(),
            self.stack.len()
        );
        Ok(bytes)
    }

    /// Decodes a JSON snapshot.
    ///
    /// The version is checked before the rest of the record, so a snapshot
    /// from a newer schema is reported as such rather than as malformed.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::UnsupportedVersion`] for unknown revisions
    /// and [`SnapshotError::Malformed`] for anything that is not a snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let probe: VersionProbe = serde_json::from_slice(bytes)?;
        if SnapshotVersion::from_u16(probe.version).is_none() {
            log::warn!("rejecting snapshot with version {}", probe.version);
            return Err(SnapshotError::UnsupportedVersion(probe.version));
        }
        let snapshot: Self = serde_json::from_slice(bytes)?;
        log::debug!(
            "decoded snapshot: {} cells, pc {:?}",
            snapshot.memory.len(),
            snapshot.pc
        );
        Ok(snapshot)
    }
}
