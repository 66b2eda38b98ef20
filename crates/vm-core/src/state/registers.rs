use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of architecturally visible registers.
pub const REGISTER_COUNT: usize = 8;

/// Register identifier (`R0..R7`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl Register {
    /// Ordered list of all registers.
    pub const ALL: [Self; REGISTER_COUNT] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
    ];

    /// Returns the array index for this register (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Converts an array index into a register.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < REGISTER_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.index())
    }
}

/// The eight-cell register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterFile {
    cells: [u16; REGISTER_COUNT],
}

impl RegisterFile {
    /// Builds a register file from raw cell values.
    #[must_use]
    pub const fn from_array(cells: [u16; REGISTER_COUNT]) -> Self {
        Self { cells }
    }

    /// Reads a register.
    #[must_use]
    pub const fn get(&self, reg: Register) -> u16 {
        self.cells[reg.index()]
    }

    /// Writes a register.
    pub const fn set(&mut self, reg: Register, value: u16) {
        self.cells[reg.index()] = value;
    }

    /// Raw cell values in register order.
    #[must_use]
    pub const fn as_array(&self) -> &[u16; REGISTER_COUNT] {
        &self.cells
    }

    /// Iterates `(register, value)` pairs in register order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, u16)> + '_ {
        Register::ALL
            .into_iter()
            .map(move |reg| (reg, self.get(reg)))
    }
}
