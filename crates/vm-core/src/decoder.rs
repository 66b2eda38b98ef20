//! Instruction fetch and decode.
//!
//! Decoding is a pure read of memory: it never touches the program counter,
//! so the engine and the disassembler share it.

use crate::encoding::MAX_OPERANDS;
use crate::{Fault, MemoryImage, Opcode, OpcodeDescriptor};

/// One decoded instruction with its raw operand cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    addr: usize,
    opcode: Opcode,
    operands: [u16; MAX_OPERANDS],
}

impl Instruction {
    /// Builds an instruction from its parts. Extra operand cells are ignored.
    #[must_use]
    pub fn new(addr: usize, opcode: Opcode, operands: &[u16]) -> Self {
        let mut cells = [0; MAX_OPERANDS];
        for (slot, value) in cells.iter_mut().zip(operands.iter().take(opcode.arity())) {
            *slot = *value;
        }
        Self {
            addr,
            opcode,
            operands: cells,
        }
    }

    /// Address of the opcode cell.
    #[must_use]
    pub const fn addr(&self) -> usize {
        self.addr
    }

    /// Decoded opcode.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Static table entry of the opcode.
    #[must_use]
    pub const fn descriptor(&self) -> &'static OpcodeDescriptor {
        self.opcode.descriptor()
    }

    /// Raw operand cells, exactly `arity` long.
    #[must_use]
    pub fn operands(&self) -> &[u16] {
        &self.operands[..self.opcode.arity()]
    }

    /// Raw operand cell at `index`; zero when the opcode has fewer operands.
    #[must_use]
    pub const fn operand(&self, index: usize) -> u16 {
        if index < MAX_OPERANDS {
            self.operands[index]
        } else {
            0
        }
    }

    /// Number of cells occupied, opcode included.
    #[must_use]
    pub const fn width(&self) -> usize {
        1 + self.opcode.arity()
    }

    /// Address of the cell after this instruction.
    #[must_use]
    pub const fn next_addr(&self) -> usize {
        self.addr + self.width()
    }
}

/// Result of decoding at an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A complete instruction.
    Instruction(Instruction),
    /// The address lies past the end of memory.
    EndOfProgram,
    /// The cells at the address cannot form an instruction.
    Fault(Fault),
}

impl Decoded {
    /// Returns the decoded instruction, if any.
    #[must_use]
    pub const fn instruction(self) -> Option<Instruction> {
        match self {
            Self::Instruction(instr) => Some(instr),
            Self::EndOfProgram | Self::Fault(_) => None,
        }
    }
}

/// Decodes the instruction starting at `addr`.
#[must_use]
pub fn decode_at(memory: &MemoryImage, addr: usize) -> Decoded {
    let Some(code) = memory.get(addr) else {
        return Decoded::EndOfProgram;
    };
    let Some(opcode) = Opcode::from_u16(code) else {
        return Decoded::Fault(Fault::UnknownOpcode { opcode: code, addr });
    };

    let mut operands = [0; MAX_OPERANDS];
    for (offset, slot) in operands.iter_mut().take(opcode.arity()).enumerate() {
        let Some(value) = memory.get(addr + 1 + offset) else {
            return Decoded::Fault(Fault::TruncatedInstruction { opcode, addr });
        };
        *slot = value;
    }

    Decoded::Instruction(Instruction {
        addr,
        opcode,
        operands,
    })
}
