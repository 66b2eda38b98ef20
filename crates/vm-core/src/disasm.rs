//! Static disassembly and trace/dump line formatting.
//!
//! Disassembly reuses the decoder on a borrowed [`MachineState`], so it never
//! moves the program counter or touches the stack.

use std::fmt;

use crate::api::{DumpSink, TraceEvent};
use crate::decoder::{decode_at, Decoded, Instruction};
use crate::operand::as_register_index;
use crate::{MachineState, Opcode, RegisterFile};

/// What a disassembled row holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    /// A complete instruction.
    Instruction(Instruction),
    /// A cell that does not start a valid instruction.
    Data(u16),
}

/// A single disassembled row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisassemblyRow {
    /// Address of the first cell of the row.
    pub addr: usize,
    /// Decoded contents.
    pub kind: RowKind,
}

impl DisassemblyRow {
    /// Number of cells the row covers.
    #[must_use]
    pub const fn width(&self) -> usize {
        match self.kind {
            RowKind::Instruction(instr) => instr.width(),
            RowKind::Data(_) => 1,
        }
    }
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RowKind::Instruction(instr) => write!(
                f,
                "{:>8} | {:>6} {}",
                self.addr,
                instr.opcode().mnemonic(),
                format_operands(instr.opcode(), instr.operands(), None)
            ),
            RowKind::Data(value) => write!(f, "{:>8} | {:>6} {value}", self.addr, "data"),
        }
    }
}

/// Walks `start..end`, reporting each row to `sink`.
///
/// Cells that do not start a complete instruction are reported as data rows
/// when `include_raw` is set and skipped otherwise. The walk stops at the end
/// of memory.
pub fn dump(
    state: &MachineState,
    start: usize,
    end: usize,
    include_raw: bool,
    sink: &mut dyn DumpSink,
) {
    let mut addr = start;
    while addr < end {
        let row = match decode_at(state.memory(), addr) {
            Decoded::Instruction(instr) => DisassemblyRow {
                addr,
                kind: RowKind::Instruction(instr),
            },
            Decoded::Fault(_) => DisassemblyRow {
                addr,
                kind: RowKind::Data(state.read_memory(addr)),
            },
            Decoded::EndOfProgram => break,
        };
        if include_raw || matches!(row.kind, RowKind::Instruction(_)) {
            sink.on_disassembled(&row);
        }
        addr += row.width();
    }
}

/// Collects the rows of `start..end` into a vector.
#[must_use]
pub fn disassemble(
    state: &MachineState,
    start: usize,
    end: usize,
    include_raw: bool,
) -> Vec<DisassemblyRow> {
    let mut rows = Vec::new();
    dump(state, start, end, include_raw, &mut rows);
    rows
}

/// Renders operands separated by `", "`.
///
/// Register operands show as `{R<n>}`, or `{R<n>:<value>}` when `registers`
/// is given. Operands of `out` also show the character they print.
#[must_use]
pub fn format_operands(opcode: Opcode, operands: &[u16], registers: Option<&RegisterFile>) -> String {
    operands
        .iter()
        .map(|&raw| {
            let register = as_register_index(raw).ok();
            let value = match (register, registers) {
                (Some(reg), Some(file)) => file.get(reg),
                _ => raw,
            };
            let glyph = (opcode == Opcode::Out)
                .then(|| char::from_u32(u32::from(value)))
                .flatten();
            match (register, registers, glyph) {
                (Some(reg), Some(_), Some(c)) => format!("{{{reg}:{value}:{c:?}}}"),
                (Some(reg), Some(_), None) => format!("{{{reg}:{value}}}"),
                (Some(reg), None, _) => format!("{{{reg}}}"),
                (None, _, Some(c)) => format!("{{{value}:{c:?}}}"),
                (None, _, None) => value.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display adapter for one trace line.
#[derive(Debug, Clone, Copy)]
pub struct TraceLine<'a>(pub &'a TraceEvent);

impl fmt::Display for TraceLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instr = &self.0.instruction;
        write!(
            f,
            "{:>8} | {:>6} {}",
            instr.addr(),
            instr.opcode().mnemonic(),
            format_operands(instr.opcode(), instr.operands(), Some(&self.0.registers))
        )?;
        if self.0.breaking {
            f.write_str(" [!!]")?;
        }
        Ok(())
    }
}

/// Describes a raw memory cell: its value, plus the mnemonic when the value
/// is a defined opcode number.
#[must_use]
pub fn describe_cell(value: u16) -> String {
    match Opcode::from_u16(value) {
        Some(opcode) => format!("{value} ({opcode})"),
        None => value.to_string(),
    }
}
