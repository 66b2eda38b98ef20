//! Fetch-decode-execute driver with breakpoints and suspend/resume.
//!
//! The engine owns one [`MachineState`] and advances it one instruction per
//! cycle. A cycle that cannot complete (a breakpoint, or `in` with no input)
//! leaves the program counter on the instruction start, so the next `step`
//! re-fetches and re-decodes the same instruction.

use crate::api::{CoreConfig, Io, RunOutcome, RunState, StepOutcome, SuspendReason, TraceEvent};
use crate::breakpoints::BreakpointSet;
use crate::decoder::{decode_at, Decoded};
use crate::execute::{execute, Effect};
use crate::fault::{HaltReason, FATAL_HALT_CODE, HALT_INSTRUCTION_CODE};
use crate::snapshot::Snapshot;
use crate::{MachineState, MemoryImage, Register};

/// Execution engine over an exclusively owned machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    state: MachineState,
    breakpoints: BreakpointSet,
    config: CoreConfig,
    suspended: Option<SuspendReason>,
    halt_reason: Option<HaltReason>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(MemoryImage::default())
    }
}

impl Engine {
    /// Creates an engine at `pc = 0` over `memory` with the default config.
    #[must_use]
    pub fn new(memory: MemoryImage) -> Self {
        Self::with_config(memory, CoreConfig::default())
    }

    /// Creates an engine at `pc = 0` over `memory`.
    #[must_use]
    pub fn with_config(memory: MemoryImage, config: CoreConfig) -> Self {
        Self {
            state: MachineState::new(memory),
            breakpoints: BreakpointSet::default(),
            config,
            suspended: None,
            halt_reason: None,
        }
    }

    /// Creates an engine from a little-endian program image.
    #[must_use]
    pub fn from_program(bytes: &[u8]) -> Self {
        Self::new(MemoryImage::from_le_bytes(bytes))
    }

    /// Replaces memory with a program image and resets registers, stack,
    /// pc, result code and breakpoints.
    pub fn load_program(&mut self, bytes: &[u8]) {
        self.state.reset(MemoryImage::from_le_bytes(bytes));
        self.breakpoints.clear();
        self.suspended = None;
        self.halt_reason = None;
    }

    /// Machine state, read-only.
    #[must_use]
    pub const fn state(&self) -> &MachineState {
        &self.state
    }

    /// Breakpoints consulted at every fetch.
    #[must_use]
    pub const fn breakpoints(&self) -> &BreakpointSet {
        &self.breakpoints
    }

    /// Mutable access to the breakpoints.
    pub const fn breakpoints_mut(&mut self) -> &mut BreakpointSet {
        &mut self.breakpoints
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> CoreConfig {
        self.config
    }

    /// Current position in the `Running`/`Suspended`/`Halted` state machine.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        if self.state.is_halted() {
            RunState::Halted {
                code: self.state.result(),
            }
        } else if let Some(reason) = self.suspended {
            RunState::Suspended(reason)
        } else {
            RunState::Running
        }
    }

    /// Why the machine halted, while it is halted.
    #[must_use]
    pub fn halt_reason(&self) -> Option<HaltReason> {
        if self.state.is_halted() {
            Some(self.halt_reason.unwrap_or(HaltReason::Restored))
        } else {
            None
        }
    }

    /// Recorded result code.
    #[must_use]
    pub const fn result(&self) -> u16 {
        self.state.result()
    }

    /// Attempts `count` cycles.
    ///
    /// `count == 0` executes exactly one cycle and ignores breakpoints for
    /// that cycle only. Stepping a halted machine is a no-op that reports
    /// the existing result.
    pub fn step(&mut self, count: u64, io: &mut dyn Io) -> StepOutcome {
        let (cycles, bypass_first) = if count == 0 { (1, true) } else { (count, false) };
        for cycle in 0..cycles {
            match self.cycle(bypass_first && cycle == 0, io) {
                StepOutcome::Completed => {}
                stop => return stop,
            }
        }
        StepOutcome::Completed
    }

    /// Steps until the machine halts or suspends, or the configured step
    /// limit is reached.
    pub fn run(&mut self, io: &mut dyn Io) -> RunOutcome {
        let mut steps = 0_u64;
        loop {
            if self.config.step_limit.is_some_and(|limit| steps >= limit) {
                return self.run_outcome(steps, StepOutcome::Completed);
            }
            match self.step(1, io) {
                StepOutcome::Completed => steps += 1,
                stop => return self.run_outcome(steps, stop),
            }
        }
    }

    /// Stops the machine on request of the host (result code 1).
    pub fn halt(&mut self) -> StepOutcome {
        self.finish(FATAL_HALT_CODE, HaltReason::Requested)
    }

    /// Moves the program counter, leaving any suspension or halt.
    pub fn jump(&mut self, addr: usize) {
        self.state.set_pc(addr);
        self.suspended = None;
        self.halt_reason = None;
    }

    /// Writes a memory cell, growing memory when needed.
    pub fn set_memory(&mut self, addr: u16, value: u16) {
        self.state.write_memory(addr, value);
    }

    /// Writes a register.
    pub const fn set_register(&mut self, reg: Register, value: u16) {
        self.state.set_register(reg, value);
    }

    /// Pushes a raw value onto the stack.
    pub fn push(&mut self, value: u16) {
        self.state.push(value);
    }

    /// Pops the top of the stack, if any.
    pub fn pop(&mut self) -> Option<u16> {
        self.state.pop()
    }

    /// Captures the machine state.
    #[must_use]
    pub fn save(&self) -> Snapshot {
        Snapshot::capture(&self.state)
    }

    /// Replaces the machine state with a snapshot. Breakpoints are kept.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.state = snapshot.into_state();
        self.suspended = None;
        self.halt_reason = self.state.is_halted().then_some(HaltReason::Restored);
    }

    fn cycle(&mut self, bypass_breakpoints: bool, io: &mut dyn Io) -> StepOutcome {
        let Some(pc) = self.state.pc() else {
            return self.halted_outcome();
        };
        self.suspended = None;

        let instr = match decode_at(self.state.memory(), pc) {
            Decoded::Instruction(instr) => instr,
            Decoded::EndOfProgram => {
                return self.finish(self.state.result(), HaltReason::EndOfProgram);
            }
            Decoded::Fault(fault) => return self.finish(fault.halt_code(), fault.into()),
        };

        let breaking = !bypass_breakpoints && self.breakpoints.contains(pc);
        if self.config.tracing_enabled {
            io.on_instruction(&TraceEvent {
                instruction: instr,
                registers: *self.state.registers(),
                breaking,
            });
        }
        if breaking {
            return self.suspend(SuspendReason::Breakpoint { addr: pc });
        }

        match execute(&instr, &mut self.state, io) {
            Ok(Effect::Continue) => self.state.set_pc(instr.next_addr()),
            Ok(Effect::Jump(target)) => self.state.set_pc(target),
            Ok(Effect::Halt) => return self.finish(HALT_INSTRUCTION_CODE, HaltReason::Instruction),
            Ok(Effect::NeedsInput) => return self.suspend(SuspendReason::NeedsInput),
            Err(fault) => return self.finish(fault.halt_code(), fault.into()),
        }
        StepOutcome::Completed
    }

    fn suspend(&mut self, reason: SuspendReason) -> StepOutcome {
        self.suspended = Some(reason);
        StepOutcome::Suspended(reason)
    }

    fn finish(&mut self, code: u16, reason: HaltReason) -> StepOutcome {
        self.state.halt(code);
        self.suspended = None;
        self.halt_reason = Some(reason);
        StepOutcome::Halted { code, reason }
    }

    fn halted_outcome(&self) -> StepOutcome {
        StepOutcome::Halted {
            code: self.state.result(),
            reason: self.halt_reason.unwrap_or(HaltReason::Restored),
        }
    }

    const fn run_outcome(&self, steps: u64, stop: StepOutcome) -> RunOutcome {
        RunOutcome {
            steps,
            stop,
            result: self.state.result(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Engine;
    use crate::api::{CoreConfig, RunState, StepOutcome, SuspendReason};
    use crate::host::BufferedHost;
    use crate::{Fault, HaltReason, MemoryImage, Opcode, Register};

    fn engine(words: &[u16]) -> Engine {
        Engine::new(MemoryImage::from_words(words.to_vec()))
    }

    #[test]
    fn add_scenario_updates_register_and_pc() {
        let mut engine = engine(&[9, 32769, 4, 5]);
        let mut host = BufferedHost::default();
        assert_eq!(engine.step(1, &mut host), StepOutcome::Completed);
        assert_eq!(engine.state().register(Register::R1), 9);
        assert_eq!(engine.state().pc(), Some(4));
    }

    #[test]
    fn halt_scenario_sets_result_and_sentinel() {
        let mut engine = engine(&[0]);
        let outcome = engine.run(&mut BufferedHost::default());
        assert_eq!(outcome.result, 1);
        assert_eq!(
            outcome.stop,
            StepOutcome::Halted {
                code: 1,
                reason: HaltReason::Instruction
            }
        );
        assert_eq!(engine.state().pc(), None);
        assert_eq!(engine.run_state(), RunState::Halted { code: 1 });
    }

    #[test]
    fn running_off_the_end_is_normal_termination() {
        let mut engine = engine(&[21, 21]);
        let outcome = engine.run(&mut BufferedHost::default());
        assert_eq!(outcome.steps, 2);
        assert_eq!(outcome.result, 0);
        assert_eq!(engine.halt_reason(), Some(HaltReason::EndOfProgram));
    }

    #[test]
    fn unknown_opcode_halts_with_code_one() {
        let mut engine = engine(&[21, 99]);
        let outcome = engine.run(&mut BufferedHost::default());
        assert_eq!(outcome.result, 1);
        assert_eq!(
            engine.halt_reason(),
            Some(HaltReason::Fault(Fault::UnknownOpcode {
                opcode: 99,
                addr: 1
            }))
        );
    }

    #[test]
    fn breakpoint_suspends_before_executing() {
        let mut engine = engine(&[21, 1, 32768, 7, 0]);
        engine.breakpoints_mut().add(1);
        let mut host = BufferedHost::tracing();

        let outcome = engine.run(&mut host);
        assert_eq!(
            outcome.stop,
            StepOutcome::Suspended(SuspendReason::Breakpoint { addr: 1 })
        );
        assert_eq!(engine.state().pc(), Some(1));
        assert_eq!(engine.state().register(Register::R0), 0);
        assert!(host.trace.last().is_some_and(|event| event.breaking));

        // Still parked on the breakpoint until it is bypassed.
        assert_eq!(
            engine.step(1, &mut host),
            StepOutcome::Suspended(SuspendReason::Breakpoint { addr: 1 })
        );
        assert_eq!(engine.step(0, &mut host), StepOutcome::Completed);
        assert_eq!(engine.state().register(Register::R0), 7);
        assert!(engine.breakpoints().contains(1));
    }

    #[test]
    fn in_suspends_and_resumes_at_same_instruction() {
        let mut engine = engine(&[20, 32768, 0]);
        let mut host = BufferedHost::default();

        assert_eq!(
            engine.step(1, &mut host),
            StepOutcome::Suspended(SuspendReason::NeedsInput)
        );
        assert_eq!(engine.state().pc(), Some(0));
        assert_eq!(
            engine.run_state(),
            RunState::Suspended(SuspendReason::NeedsInput)
        );

        host.input.push_line("a");
        assert_eq!(engine.step(1, &mut host), StepOutcome::Completed);
        assert_eq!(engine.state().register(Register::R0), u16::from(b'a'));
        assert_eq!(engine.state().pc(), Some(2));
        assert_eq!(engine.run_state(), RunState::Running);
    }

    #[test]
    fn stepping_a_halted_machine_is_a_no_op() {
        let mut engine = engine(&[0]);
        let mut host = BufferedHost::default();
        engine.run(&mut host);
        let before = engine.clone();
        assert_eq!(
            engine.step(5, &mut host),
            StepOutcome::Halted {
                code: 1,
                reason: HaltReason::Instruction
            }
        );
        assert_eq!(engine, before);
    }

    #[test]
    fn step_limit_bounds_run() {
        let mut engine = Engine::with_config(
            MemoryImage::from_words(vec![6, 0]),
            CoreConfig {
                step_limit: Some(10),
                ..CoreConfig::default()
            },
        );
        let outcome = engine.run(&mut BufferedHost::default());
        assert_eq!(outcome.steps, 10);
        assert_eq!(outcome.stop, StepOutcome::Completed);
        assert_eq!(engine.run_state(), RunState::Running);
    }

    #[test]
    fn disabled_tracing_reports_nothing() {
        let mut engine = Engine::with_config(
            MemoryImage::from_words(vec![21, 21]),
            CoreConfig {
                tracing_enabled: false,
                ..CoreConfig::default()
            },
        );
        let mut host = BufferedHost::tracing();
        engine.run(&mut host);
        assert!(host.trace.is_empty());
    }

    #[test]
    fn jump_leaves_halted_sentinel() {
        let mut engine = engine(&[0, 19, 72, 0]);
        let mut host = BufferedHost::default();
        engine.run(&mut host);

        engine.jump(1);
        assert_eq!(engine.run_state(), RunState::Running);
        engine.run(&mut host);
        assert_eq!(host.output_text(), "H");
    }

    #[test]
    fn requested_halt_records_reason() {
        let mut engine = engine(&[21]);
        engine.halt();
        assert_eq!(engine.halt_reason(), Some(HaltReason::Requested));
        assert_eq!(engine.result(), 1);
    }

    #[test]
    fn load_program_resets_everything() {
        let mut engine = engine(&[2, 5, 0]);
        engine.breakpoints_mut().add(2);
        engine.step(1, &mut BufferedHost::default());

        engine.load_program(&[Opcode::Noop.code().to_le_bytes(), [0, 0]].concat());
        assert_eq!(engine.state().pc(), Some(0));
        assert!(engine.state().stack().is_empty());
        assert!(engine.breakpoints().is_empty());
        assert_eq!(engine.state().memory().as_slice(), &[21, 0]);
    }

    #[test]
    fn restore_keeps_breakpoints() {
        let mut engine = engine(&[21, 21, 21]);
        let snapshot = engine.save();
        engine.breakpoints_mut().add(2);
        engine.step(2, &mut BufferedHost::default());

        engine.restore(snapshot);
        assert_eq!(engine.state().pc(), Some(0));
        assert!(engine.breakpoints().contains(2));
    }
}
