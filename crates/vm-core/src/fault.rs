use thiserror::Error;

use crate::Opcode;

/// Result code stored when the machine halts on a fatal condition.
pub const FATAL_HALT_CODE: u16 = 1;

/// Result code stored by the `halt` instruction.
pub const HALT_INSTRUCTION_CODE: u16 = 1;

/// Fatal architecture violations that halt the machine.
///
/// None of these are recoverable: once raised, the program counter is set to
/// the halted sentinel and no further execution happens without a reload or a
/// snapshot restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Fault {
    /// The cell at the program counter is not a defined opcode number.
    #[error("bad opcode {opcode} at address {addr}")]
    UnknownOpcode {
        /// Raw cell value that failed to decode.
        opcode: u16,
        /// Address of the offending cell.
        addr: usize,
    },
    /// A destination operand does not name a register.
    #[error("operand {value} is not a register address")]
    NotARegister {
        /// Raw operand value.
        value: u16,
    },
    /// `pop` or `ret` found the stack empty.
    #[error("stack underflow on {opcode}")]
    StackUnderflow {
        /// Instruction that attempted the pop.
        opcode: Opcode,
    },
    /// `mod` with a zero divisor.
    #[error("division by zero at address {addr}")]
    DivisionByZero {
        /// Address of the `mod` instruction.
        addr: usize,
    },
    /// Operand cells of an instruction run past the end of memory.
    #[error("truncated {opcode} instruction at address {addr}")]
    TruncatedInstruction {
        /// Opcode whose operands are missing.
        opcode: Opcode,
        /// Address of the instruction start.
        addr: usize,
    },
    /// `call` return address does not fit in a 16-bit cell.
    #[error("return address {addr} does not fit in a memory cell")]
    ReturnAddressOverflow {
        /// Address that could not be pushed.
        addr: usize,
    },
}

impl Fault {
    /// Result code recorded when this fault halts the machine.
    #[must_use]
    pub const fn halt_code(self) -> u16 {
        FATAL_HALT_CODE
    }
}

/// Why the machine stopped for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum HaltReason {
    /// The program executed `halt`.
    #[error("HALT")]
    Instruction,
    /// The program counter moved past the end of memory.
    #[error("end of program")]
    EndOfProgram,
    /// A host or debugger asked the machine to stop.
    #[error("requested halt")]
    Requested,
    /// A snapshot of an already halted machine was restored.
    #[error("restored halted state")]
    Restored,
    /// A fatal fault was raised.
    #[error(transparent)]
    Fault(#[from] Fault),
}

impl HaltReason {
    /// Returns the fault behind this halt, when there is one.
    #[must_use]
    pub const fn fault(self) -> Option<Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            Self::Instruction | Self::EndOfProgram | Self::Requested | Self::Restored => None,
        }
    }
}
