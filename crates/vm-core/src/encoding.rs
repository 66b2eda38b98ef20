use std::fmt;

use OperandRole::{Destination as D, RegisterOrMemory as M, Source as S};

/// Number of defined opcodes (`0..=21`).
pub const OPCODE_COUNT: usize = 22;

/// Largest operand count of any opcode.
pub const MAX_OPERANDS: usize = 3;

/// Defined opcodes, numbered by their in-memory code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum Opcode {
    Halt = 0,
    Set = 1,
    Push = 2,
    Pop = 3,
    Eq = 4,
    Gt = 5,
    Jmp = 6,
    Jt = 7,
    Jf = 8,
    Add = 9,
    Mult = 10,
    Mod = 11,
    And = 12,
    Or = 13,
    Not = 14,
    Rmem = 15,
    Wmem = 16,
    Call = 17,
    Ret = 18,
    Out = 19,
    In = 20,
    Noop = 21,
}

/// How an instruction consumes one of its operand cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandRole {
    /// Must be a register address; written by the instruction.
    Destination,
    /// Literal or register address resolved to a value.
    Source,
    /// Register address, or a raw memory address taken verbatim (`in`).
    RegisterOrMemory,
}

/// Immutable per-opcode metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpcodeDescriptor {
    /// Opcode variant.
    pub opcode: Opcode,
    /// Numeric code as stored in memory.
    pub code: u16,
    /// Lower-case assembler mnemonic.
    pub mnemonic: &'static str,
    /// Role of each operand cell, in memory order.
    pub operands: &'static [OperandRole],
}

impl OpcodeDescriptor {
    /// Number of operand cells that follow the opcode cell.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.operands.len()
    }
}

const fn descriptor(
    opcode: Opcode,
    mnemonic: &'static str,
    operands: &'static [OperandRole],
) -> OpcodeDescriptor {
    OpcodeDescriptor {
        opcode,
        code: opcode as u16,
        mnemonic,
        operands,
    }
}

/// Static opcode table, indexed by opcode number.
pub const OPCODE_TABLE: &[OpcodeDescriptor; OPCODE_COUNT] = &[
    descriptor(Opcode::Halt, "halt", &[]),
    descriptor(Opcode::Set, "set", &[D, S]),
    descriptor(Opcode::Push, "push", &[S]),
    descriptor(Opcode::Pop, "pop", &[D]),
    descriptor(Opcode::Eq, "eq", &[D, S, S]),
    descriptor(Opcode::Gt, "gt", &[D, S, S]),
    descriptor(Opcode::Jmp, "jmp", &[S]),
    descriptor(Opcode::Jt, "jt", &[S, S]),
    descriptor(Opcode::Jf, "jf", &[S, S]),
    descriptor(Opcode::Add, "add", &[D, S, S]),
    descriptor(Opcode::Mult, "mult", &[D, S, S]),
    descriptor(Opcode::Mod, "mod", &[D, S, S]),
    descriptor(Opcode::And, "and", &[D, S, S]),
    descriptor(Opcode::Or, "or", &[D, S, S]),
    descriptor(Opcode::Not, "not", &[D, S]),
    descriptor(Opcode::Rmem, "rmem", &[D, S]),
    descriptor(Opcode::Wmem, "wmem", &[S, S]),
    descriptor(Opcode::Call, "call", &[S]),
    descriptor(Opcode::Ret, "ret", &[]),
    descriptor(Opcode::Out, "out", &[S]),
    descriptor(Opcode::In, "in", &[M]),
    descriptor(Opcode::Noop, "noop", &[]),
];

impl Opcode {
    /// Every opcode in numeric order.
    pub const ALL: [Self; OPCODE_COUNT] = [
        Self::Halt,
        Self::Set,
        Self::Push,
        Self::Pop,
        Self::Eq,
        Self::Gt,
        Self::Jmp,
        Self::Jt,
        Self::Jf,
        Self::Add,
        Self::Mult,
        Self::Mod,
        Self::And,
        Self::Or,
        Self::Not,
        Self::Rmem,
        Self::Wmem,
        Self::Call,
        Self::Ret,
        Self::Out,
        Self::In,
        Self::Noop,
    ];

    /// Decodes a memory cell into an opcode.
    #[must_use]
    pub const fn from_u16(code: u16) -> Option<Self> {
        if (code as usize) < OPCODE_COUNT {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    /// Looks up an opcode by mnemonic, ignoring ASCII case.
    #[must_use]
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        OPCODE_TABLE
            .iter()
            .find(|entry| entry.mnemonic.eq_ignore_ascii_case(name))
            .map(|entry| entry.opcode)
    }

    /// Numeric code as stored in memory.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Static table entry for this opcode.
    #[must_use]
    pub const fn descriptor(self) -> &'static OpcodeDescriptor {
        &OPCODE_TABLE[self as usize]
    }

    /// Lower-case assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        self.descriptor().mnemonic
    }

    /// Number of operand cells that follow the opcode cell.
    #[must_use]
    pub const fn arity(self) -> usize {
        self.descriptor().arity()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Returns the table entry for a raw memory cell, if it is a defined opcode.
#[must_use]
pub fn lookup(code: u16) -> Option<&'static OpcodeDescriptor> {
    Opcode::from_u16(code).map(Opcode::descriptor)
}
