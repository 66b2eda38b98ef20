//! Word-addressed main memory.

use serde::{Deserialize, Serialize};

/// Upper bound on memory growth: every 16-bit address is writable.
pub const ADDRESS_SPACE_CELLS: usize = u16::MAX as usize + 1;

/// Bytes per memory cell in a program image.
pub const BYTES_PER_CELL: usize = 2;

/// Ordered sequence of 16-bit cells.
///
/// The image starts at program length and only grows when a write lands past
/// the current end; the gap is zero-filled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryImage {
    cells: Vec<u16>,
}

impl MemoryImage {
    /// Wraps already-decoded cells.
    #[must_use]
    pub const fn from_words(cells: Vec<u16>) -> Self {
        Self { cells }
    }

    /// Decodes a little-endian program image.
    ///
    /// A trailing odd byte cannot form a cell and is dropped.
    #[must_use]
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        let chunks = bytes.chunks_exact(BYTES_PER_CELL);
        if !chunks.remainder().is_empty() {
            log::warn!(
                "program image has odd length {}, ignoring trailing byte",
                bytes.len()
            );
        }
        let cells: Vec<u16> = chunks
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        log::debug!("decoded program image: {} cells", cells.len());
        Self { cells }
    }

    /// Encodes the image back into little-endian bytes.
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.cells.iter().flat_map(|cell| cell.to_le_bytes()).collect()
    }

    /// Number of cells currently backed by the image.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` when the image holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reads a cell, or `None` past the end of the image.
    #[must_use]
    pub fn get(&self, addr: usize) -> Option<u16> {
        self.cells.get(addr).copied()
    }

    /// Reads a cell for data access; cells past the end read as zero.
    #[must_use]
    pub fn read(&self, addr: usize) -> u16 {
        self.get(addr).unwrap_or(0)
    }

    /// Writes a cell, growing the image when `addr` is past the end.
    pub fn write(&mut self, addr: u16, value: u16) {
        let index = usize::from(addr);
        if index >= self.cells.len() {
            self.cells.resize(index + 1, 0);
        }
        self.cells[index] = value;
    }

    /// All cells in address order.
    #[must_use]
    pub fn as_slice(&self) -> &[u16] {
        &self.cells
    }
}
