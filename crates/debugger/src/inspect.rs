//! Read-only views of a loaded machine: disassembly and state listing.

use std::io::{self, Write};

use vm_core::{describe_cell, disassemble, Engine};

/// Writes the disassembly of `start..end` (default: end of memory).
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_dump(
    engine: &Engine,
    start: usize,
    end: Option<usize>,
    include_raw: bool,
    out: &mut impl Write,
) -> io::Result<usize> {
    let end = end.unwrap_or_else(|| engine.state().memory().len());
    let rows = disassemble(engine.state(), start, end, include_raw);
    for row in &rows {
        writeln!(out, "{row}")?;
    }
    Ok(rows.len())
}

/// Writes pc, result, registers and stack.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_state(engine: &Engine, out: &mut impl Write) -> io::Result<()> {
    let state = engine.state();
    match state.pc() {
        Some(pc) => writeln!(
            out,
            "pc: {pc} -> {}",
            describe_cell(state.read_memory(pc))
        )?,
        None => writeln!(out, "pc: halted")?,
    }
    write!(out, "result: {}", state.result())?;
    if let Some(reason) = engine.halt_reason() {
        write!(out, " ({reason})")?;
    }
    writeln!(out)?;
    for (reg, value) in state.registers().iter() {
        writeln!(out, "{reg}: {value}")?;
    }
    let stack: Vec<String> = state.stack().iter().map(u16::to_string).collect();
    writeln!(out, "stack ({}): {}", stack.len(), stack.join(" "))?;
    Ok(())
}
