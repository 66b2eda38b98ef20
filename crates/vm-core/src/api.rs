//! Host-facing contracts for embedding the engine.
//!
//! The engine talks to its surroundings only through the sink and source
//! traits defined here; terminal front ends, command shells and file loaders
//! live outside this crate.

use crate::{DisassemblyRow, HaltReason, Instruction, RegisterFile};

/// Immutable configuration for an engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreConfig {
    /// Dispatches trace callbacks for every fetched instruction.
    pub tracing_enabled: bool,
    /// Upper bound on completed instructions per `run` call.
    pub step_limit: Option<u64>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            tracing_enabled: true,
            step_limit: None,
        }
    }
}

/// Why execution paused without halting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuspendReason {
    /// `in` found no input available.
    NeedsInput,
    /// A breakpoint intercepted the instruction at `addr`.
    Breakpoint {
        /// Address of the intercepted instruction.
        addr: usize,
    },
}

/// Engine state surface exposed to hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Ready to fetch the next instruction.
    Running,
    /// Paused; the next `step` re-fetches the same instruction.
    Suspended(SuspendReason),
    /// Stopped; only a reload, snapshot restore or debugger jump resumes.
    Halted {
        /// Recorded result code.
        code: u16,
    },
}

/// Outcome of a `step` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Every requested cycle completed.
    Completed,
    /// Execution paused before finishing the requested cycles.
    Suspended(SuspendReason),
    /// The machine is halted.
    Halted {
        /// Recorded result code.
        code: u16,
        /// Human-readable cause.
        reason: HaltReason,
    },
}

impl StepOutcome {
    /// Returns `true` for [`StepOutcome::Completed`].
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Aggregated outcome of a `run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Instructions completed during this call.
    pub steps: u64,
    /// Outcome that ended the run; `Completed` means the step limit was hit.
    pub stop: StepOutcome,
    /// Result code when the run ended.
    pub result: u16,
}

/// Receives character codes written by `out`.
pub trait OutputSink {
    /// Emits one character code. Always succeeds.
    fn emit(&mut self, code: u16);
}

/// Supplies character codes to `in`.
pub trait InputSource {
    /// Returns the next character code, or `None` when nothing is available.
    fn try_read(&mut self) -> Option<u16>;
}

/// Observes every fetched instruction.
pub trait TraceSink {
    /// Records an instruction in fetch order.
    fn on_instruction(&mut self, event: &TraceEvent);
}

/// Receives rows produced by the disassembler.
pub trait DumpSink {
    /// Records one disassembled row in address order.
    fn on_disassembled(&mut self, row: &DisassemblyRow);
}

/// Everything a running engine needs from its host.
pub trait Io: OutputSink + InputSource + TraceSink {}

impl<T: OutputSink + InputSource + TraceSink + ?Sized> Io for T {}

/// One fetched instruction as reported to a [`TraceSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceEvent {
    /// Decoded instruction with raw operands.
    pub instruction: Instruction,
    /// Register file at fetch time.
    pub registers: RegisterFile,
    /// `true` when a breakpoint intercepted the instruction.
    pub breaking: bool,
}

impl OutputSink for Vec<u16> {
    fn emit(&mut self, code: u16) {
        self.push(code);
    }
}

impl TraceSink for Vec<TraceEvent> {
    fn on_instruction(&mut self, event: &TraceEvent) {
        self.push(*event);
    }
}

impl DumpSink for Vec<DisassemblyRow> {
    fn on_disassembled(&mut self, row: &DisassemblyRow) {
        self.push(*row);
    }
}
