//! Opcode behaviors.
//!
//! Every behavior validates its destination before touching state, so a
//! faulting instruction leaves memory, registers and stack exactly as they
//! were. `in` consults the input source before writing anything, which keeps
//! a suspended `in` free of side effects.

use crate::api::Io;
use crate::operand::{as_register_index, resolve_value, VALUE_MASK, VALUE_MODULUS};
use crate::{Fault, Instruction, MachineState, Opcode};

/// Control effect of one executed instruction, applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fall through to the next instruction.
    Continue,
    /// Transfer control to the given address.
    Jump(usize),
    /// The `halt` instruction ran.
    Halt,
    /// `in` found no input; nothing was written.
    NeedsInput,
}

#[derive(Debug, Clone, Copy)]
enum ArithOp {
    Add,
    Mult,
    Mod,
    And,
    Or,
}

#[derive(Debug, Clone, Copy)]
enum CompareOp {
    Eq,
    Gt,
}

#[derive(Debug, Clone, Copy)]
enum BranchOp {
    IfTrue,
    IfFalse,
}

/// Executes one decoded instruction against `state`.
///
/// The program counter is left to the caller; a taken branch is reported as
/// [`Effect::Jump`].
///
/// # Errors
///
/// Returns the [`Fault`] that must halt the machine: a destination that is
/// not a register, an empty stack on `pop`/`ret`, a zero `mod` divisor or a
/// return address that does not fit in a cell.
pub fn execute(
    instr: &Instruction,
    state: &mut MachineState,
    io: &mut dyn Io,
) -> Result<Effect, Fault> {
    match instr.opcode() {
        Opcode::Halt => Ok(Effect::Halt),
        Opcode::Set => execute_set(instr, state),
        Opcode::Push => {
            state.push(source(instr, state, 0));
            Ok(Effect::Continue)
        }
        Opcode::Pop => execute_pop(instr, state),
        Opcode::Eq => execute_compare(instr, state, CompareOp::Eq),
        Opcode::Gt => execute_compare(instr, state, CompareOp::Gt),
        Opcode::Jmp => Ok(Effect::Jump(usize::from(source(instr, state, 0)))),
        Opcode::Jt => Ok(execute_branch(instr, state, BranchOp::IfTrue)),
        Opcode::Jf => Ok(execute_branch(instr, state, BranchOp::IfFalse)),
        Opcode::Add => execute_arith(instr, state, ArithOp::Add),
        Opcode::Mult => execute_arith(instr, state, ArithOp::Mult),
        Opcode::Mod => execute_arith(instr, state, ArithOp::Mod),
        Opcode::And => execute_arith(instr, state, ArithOp::And),
        Opcode::Or => execute_arith(instr, state, ArithOp::Or),
        Opcode::Not => {
            let dest = as_register_index(instr.operand(0))?;
            let value = !source(instr, state, 1) & VALUE_MASK;
            state.set_register(dest, value);
            Ok(Effect::Continue)
        }
        Opcode::Rmem => {
            let dest = as_register_index(instr.operand(0))?;
            let value = state.read_memory(usize::from(source(instr, state, 1)));
            state.set_register(dest, value);
            Ok(Effect::Continue)
        }
        Opcode::Wmem => {
            let addr = source(instr, state, 0);
            let value = source(instr, state, 1);
            state.write_memory(addr, value);
            Ok(Effect::Continue)
        }
        Opcode::Call => execute_call(instr, state),
        Opcode::Ret => {
            let target = state.pop().ok_or(Fault::StackUnderflow {
                opcode: Opcode::Ret,
            })?;
            Ok(Effect::Jump(usize::from(target)))
        }
        Opcode::Out => {
            io.emit(source(instr, state, 0));
            Ok(Effect::Continue)
        }
        Opcode::In => Ok(execute_in(instr, state, io)),
        Opcode::Noop => Ok(Effect::Continue),
    }
}

fn source(instr: &Instruction, state: &MachineState, index: usize) -> u16 {
    resolve_value(instr.operand(index), state.registers())
}

fn execute_set(instr: &Instruction, state: &mut MachineState) -> Result<Effect, Fault> {
    let dest = as_register_index(instr.operand(0))?;
    let value = source(instr, state, 1);
    state.set_register(dest, value);
    Ok(Effect::Continue)
}

fn execute_pop(instr: &Instruction, state: &mut MachineState) -> Result<Effect, Fault> {
    let dest = as_register_index(instr.operand(0))?;
    let value = state.pop().ok_or(Fault::StackUnderflow {
        opcode: Opcode::Pop,
    })?;
    state.set_register(dest, value);
    Ok(Effect::Continue)
}

fn execute_compare(
    instr: &Instruction,
    state: &mut MachineState,
    op: CompareOp,
) -> Result<Effect, Fault> {
    let dest = as_register_index(instr.operand(0))?;
    let lhs = source(instr, state, 1);
    let rhs = source(instr, state, 2);
    let holds = match op {
        CompareOp::Eq => lhs == rhs,
        CompareOp::Gt => lhs > rhs,
    };
    state.set_register(dest, u16::from(holds));
    Ok(Effect::Continue)
}

fn execute_branch(instr: &Instruction, state: &MachineState, op: BranchOp) -> Effect {
    let condition = source(instr, state, 0);
    let taken = match op {
        BranchOp::IfTrue => condition != 0,
        BranchOp::IfFalse => condition == 0,
    };
    if taken {
        Effect::Jump(usize::from(source(instr, state, 1)))
    } else {
        Effect::Continue
    }
}

#[allow(clippy::cast_possible_truncation)]
fn execute_arith(
    instr: &Instruction,
    state: &mut MachineState,
    op: ArithOp,
) -> Result<Effect, Fault> {
    let dest = as_register_index(instr.operand(0))?;
    let lhs = source(instr, state, 1);
    let rhs = source(instr, state, 2);
    let value = match op {
        // Both results are below the modulus, so the narrowing is lossless.
        ArithOp::Add => ((u32::from(lhs) + u32::from(rhs)) % VALUE_MODULUS) as u16,
        ArithOp::Mult => ((u32::from(lhs) * u32::from(rhs)) % VALUE_MODULUS) as u16,
        ArithOp::Mod => {
            if rhs == 0 {
                return Err(Fault::DivisionByZero { addr: instr.addr() });
            }
            lhs % rhs
        }
        ArithOp::And => lhs & rhs,
        ArithOp::Or => lhs | rhs,
    };
    state.set_register(dest, value);
    Ok(Effect::Continue)
}

fn execute_call(instr: &Instruction, state: &mut MachineState) -> Result<Effect, Fault> {
    let next = instr.next_addr();
    let ret = u16::try_from(next).map_err(|_| Fault::ReturnAddressOverflow { addr: next })?;
    let target = source(instr, state, 0);
    state.push(ret);
    Ok(Effect::Jump(usize::from(target)))
}

fn execute_in(instr: &Instruction, state: &mut MachineState, io: &mut dyn Io) -> Effect {
    let Some(code) = io.try_read() else {
        return Effect::NeedsInput;
    };
    let target = instr.operand(0);
    match as_register_index(target) {
        Ok(reg) => state.set_register(reg, code),
        Err(_) => state.write_memory(target, code),
    }
    Effect::Continue
}
