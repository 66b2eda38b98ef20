//! Core interpreter for the Synacor 16-bit register machine.

/// Word-addressed main memory.
pub mod memory;
pub use memory::{MemoryImage, ADDRESS_SPACE_CELLS, BYTES_PER_CELL};

/// Public host-facing API contract and integration types.
pub mod api;
pub use api::{
    CoreConfig, DumpSink, InputSource, Io, OutputSink, RunOutcome, RunState, StepOutcome,
    SuspendReason, TraceEvent, TraceSink,
};

/// Machine state: memory, registers, stack, pc and result code.
pub mod state;
pub use state::{MachineState, Register, RegisterFile, REGISTER_COUNT};

/// Static opcode table and opcode metadata.
pub mod encoding;
pub use encoding::{lookup, Opcode, OpcodeDescriptor, OperandRole, OPCODE_COUNT, OPCODE_TABLE};

/// Literal/register operand classification.
pub mod operand;
pub use operand::{as_register_index, is_register_address, resolve_value, to_address};

/// Instruction fetch and decode.
pub mod decoder;
pub use decoder::{decode_at, Decoded, Instruction};

/// Fatal fault taxonomy and halt reasons.
pub mod fault;
pub use fault::{Fault, HaltReason, FATAL_HALT_CODE, HALT_INSTRUCTION_CODE};

/// Opcode behaviors.
pub mod execute;
pub use execute::{execute, Effect};

/// Breakpoint address set.
pub mod breakpoints;
pub use breakpoints::BreakpointSet;

/// Fetch-decode-execute engine.
pub mod engine;
pub use engine::Engine;

/// Disassembler and trace formatting.
pub mod disasm;
pub use disasm::{describe_cell, disassemble, dump, format_operands, DisassemblyRow, RowKind, TraceLine};

/// Versioned state snapshots.
pub mod snapshot;
pub use snapshot::{Snapshot, SnapshotError, SnapshotVersion};

/// Buffered input/output host.
pub mod host;
pub use host::{BufferedHost, InputQueue, NEWLINE};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
