//! Mutable machine state.

/// Register identifiers and register file storage.
pub mod registers;

pub use registers::{Register, RegisterFile, REGISTER_COUNT};

use crate::MemoryImage;

/// Memory, registers, stack, program counter and result code of one machine.
///
/// A `None` program counter is the halted sentinel: no fetch happens until a
/// debugger moves the counter again or state is reloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineState {
    memory: MemoryImage,
    registers: RegisterFile,
    stack: Vec<u16>,
    pc: Option<usize>,
    result: u16,
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new(MemoryImage::default())
    }
}

impl MachineState {
    /// Creates a fresh machine at `pc = 0` over the given memory.
    #[must_use]
    pub const fn new(memory: MemoryImage) -> Self {
        Self {
            memory,
            registers: RegisterFile::from_array([0; REGISTER_COUNT]),
            stack: Vec::new(),
            pc: Some(0),
            result: 0,
        }
    }

    /// Decodes a little-endian program image into a fresh machine.
    #[must_use]
    pub fn from_le_bytes(bytes: &[u8]) -> Self {
        Self::new(MemoryImage::from_le_bytes(bytes))
    }

    /// Reassembles a machine from its parts, as captured by a snapshot.
    #[must_use]
    pub const fn from_parts(
        memory: MemoryImage,
        registers: RegisterFile,
        stack: Vec<u16>,
        pc: Option<usize>,
        result: u16,
    ) -> Self {
        Self {
            memory,
            registers,
            stack,
            pc,
            result,
        }
    }

    /// Main memory.
    #[must_use]
    pub const fn memory(&self) -> &MemoryImage {
        &self.memory
    }

    /// Reads a memory cell for data access (zero past the end).
    #[must_use]
    pub fn read_memory(&self, addr: usize) -> u16 {
        self.memory.read(addr)
    }

    /// Writes a memory cell, growing memory when needed.
    pub fn write_memory(&mut self, addr: u16, value: u16) {
        self.memory.write(addr, value);
    }

    /// The register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Reads one register.
    #[must_use]
    pub const fn register(&self, reg: Register) -> u16 {
        self.registers.get(reg)
    }

    /// Writes one register.
    pub const fn set_register(&mut self, reg: Register, value: u16) {
        self.registers.set(reg, value);
    }

    /// Stack contents from bottom to top.
    #[must_use]
    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    /// Pushes a value onto the stack.
    pub fn push(&mut self, value: u16) {
        self.stack.push(value);
    }

    /// Pops the top of the stack.
    pub fn pop(&mut self) -> Option<u16> {
        self.stack.pop()
    }

    /// Next cell to fetch, or `None` once halted.
    #[must_use]
    pub const fn pc(&self) -> Option<usize> {
        self.pc
    }

    /// Moves the program counter. Also leaves the halted sentinel.
    pub const fn set_pc(&mut self, addr: usize) {
        self.pc = Some(addr);
    }

    /// Result code, `0` until something halts the machine.
    #[must_use]
    pub const fn result(&self) -> u16 {
        self.result
    }

    /// Returns `true` once the program counter holds the halted sentinel.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.pc.is_none()
    }

    /// Records `code` and parks the program counter on the halted sentinel.
    pub(crate) const fn halt(&mut self, code: u16) {
        self.result = code;
        self.pc = None;
    }

    /// Replaces memory and restores power-on registers, stack, pc and result.
    pub fn reset(&mut self, memory: MemoryImage) {
        *self = Self::new(memory);
    }
}
