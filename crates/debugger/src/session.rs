//! Batch sessions: load a program, queue input, run, persist.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use vm_core::{
    CoreConfig, Engine, InputQueue, InputSource, MemoryImage, OutputSink, RunOutcome, Snapshot,
    StepOutcome, SuspendReason, TraceEvent, TraceLine, TraceSink,
};

use crate::errors::DebuggerError;

/// Options for one `run` session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionConfig {
    /// Little-endian program image.
    pub program: PathBuf,
    /// Snapshot restored after loading the program.
    pub state: Option<PathBuf>,
    /// Text file whose lines are queued as input.
    pub input: Option<PathBuf>,
    /// Extra input lines, queued after the input file.
    pub send: Vec<String>,
    /// Queue every line of standard input last.
    pub read_stdin: bool,
    /// Breakpoint addresses.
    pub breakpoints: Vec<usize>,
    /// Execute one instruction ignoring breakpoints before running.
    pub continue_first: bool,
    /// Upper bound on executed instructions.
    pub max_steps: Option<u64>,
    /// File receiving one trace line per fetched instruction.
    pub trace: Option<PathBuf>,
    /// File the machine output is appended to.
    pub log: Option<PathBuf>,
    /// Where to write a snapshot once the run stops.
    pub save: Option<PathBuf>,
    /// Turns off trace dispatch entirely.
    pub disable_trace: bool,
}

/// Engine host that streams output and trace lines to writers.
///
/// The engine's sinks cannot fail, so the first write error is kept and
/// reported by [`SessionHost::finish`].
#[derive(Debug)]
pub struct SessionHost<W> {
    /// Pending input.
    pub input: InputQueue,
    out: W,
    log: Option<BufWriter<File>>,
    trace: Option<BufWriter<File>>,
    breakpoint_line: Option<String>,
    error: Option<io::Error>,
}

impl<W: Write> SessionHost<W> {
    /// Creates a host printing machine output to `out`.
    pub fn new(out: W) -> Self {
        Self {
            input: InputQueue::default(),
            out,
            log: None,
            trace: None,
            breakpoint_line: None,
            error: None,
        }
    }

    /// Also appends machine output to `file`.
    #[must_use]
    pub fn with_log(mut self, file: File) -> Self {
        self.log = Some(BufWriter::new(file));
        self
    }

    /// Writes trace lines to `file`.
    #[must_use]
    pub fn with_trace(mut self, file: File) -> Self {
        self.trace = Some(BufWriter::new(file));
        self
    }

    /// Trace line of the most recent breakpoint hit.
    #[must_use]
    pub fn breakpoint_line(&self) -> Option<&str> {
        self.breakpoint_line.as_deref()
    }

    /// Flushes every writer and hands back the output writer.
    ///
    /// # Errors
    ///
    /// Returns the first write error seen during the session.
    pub fn finish(mut self) -> Result<W, DebuggerError> {
        if let Some(err) = self.error.take() {
            return Err(err.into());
        }
        if let Some(log) = self.log.as_mut() {
            log.flush()?;
        }
        if let Some(trace) = self.trace.as_mut() {
            trace.flush()?;
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }
}

impl<W: Write> OutputSink for SessionHost<W> {
    fn emit(&mut self, code: u16) {
        let mut buf = [0; 4];
        let glyph = char::from_u32(u32::from(code)).unwrap_or(char::REPLACEMENT_CHARACTER);
        let bytes = glyph.encode_utf8(&mut buf).as_bytes();

        let result = self.out.write_all(bytes);
        self.record(result);
        let result = self.log.as_mut().map_or(Ok(()), |log| log.write_all(bytes));
        self.record(result);
    }
}

impl<W: Write> InputSource for SessionHost<W> {
    fn try_read(&mut self) -> Option<u16> {
        self.input.try_read()
    }
}

impl<W: Write> TraceSink for SessionHost<W> {
    fn on_instruction(&mut self, event: &TraceEvent) {
        if let Some(trace) = self.trace.as_mut() {
            let result = writeln!(trace, "{}", TraceLine(event));
            self.record(result);
        }
        if event.breaking {
            self.breakpoint_line = Some(TraceLine(event).to_string());
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Outcome that stopped the run; `Completed` means the step limit.
    pub stop: StepOutcome,
    /// Instructions executed.
    pub steps: u64,
    /// Result code of the machine.
    pub result: u16,
    /// Program counter when the run stopped.
    pub pc: Option<usize>,
    /// Trace line of the breakpoint that suspended the run, if traced.
    pub breakpoint_line: Option<String>,
}

impl SessionReport {
    /// Process exit code: the result code when halted, `0` otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.stop {
            StepOutcome::Halted { code, .. } => i32::from(code),
            StepOutcome::Completed | StepOutcome::Suspended(_) => 0,
        }
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pc = self.pc.unwrap_or_default();
        match self.stop {
            StepOutcome::Halted { code, reason } => write!(f, "halted: {reason} (code {code})")?,
            StepOutcome::Suspended(SuspendReason::NeedsInput) => {
                write!(f, "suspended: waiting for input at {pc}")?;
            }
            StepOutcome::Suspended(SuspendReason::Breakpoint { addr }) => {
                write!(f, "suspended: breakpoint at {addr}")?;
            }
            StepOutcome::Completed => write!(f, "stopped: step limit reached at {pc}")?,
        }
        write!(f, " after {} steps", self.steps)?;
        if let Some(line) = &self.breakpoint_line {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

/// Loads a program image and optionally restores a snapshot over it.
///
/// # Errors
///
/// Fails when either file cannot be read or the snapshot cannot be decoded.
pub fn load_engine(
    program: &Path,
    state: Option<&Path>,
    config: CoreConfig,
) -> Result<Engine, DebuggerError> {
    let bytes = fs::read(program).map_err(|err| DebuggerError::file(program, err))?;
    let mut engine = Engine::with_config(MemoryImage::from_le_bytes(&bytes), config);
    log::info!(
        "loaded {} ({} cells)",
        program.display(),
        engine.state().memory().len()
    );
    if let Some(path) = state {
        engine.restore(read_snapshot(path)?);
        log::info!("restored state from {}", path.display());
    }
    Ok(engine)
}

/// Reads a snapshot file.
///
/// # Errors
///
/// Fails when the file cannot be read or decoded.
pub fn read_snapshot(path: &Path) -> Result<Snapshot, DebuggerError> {
    let bytes = fs::read(path).map_err(|err| DebuggerError::file(path, err))?;
    Snapshot::from_bytes(&bytes).map_err(|err| DebuggerError::snapshot(path, err))
}

/// Writes a snapshot of `engine` to `path`.
///
/// # Errors
///
/// Fails when the snapshot cannot be encoded or the file written.
pub fn write_snapshot(engine: &Engine, path: &Path) -> Result<(), DebuggerError> {
    let bytes = engine
        .save()
        .to_bytes()
        .map_err(|err| DebuggerError::snapshot(path, err))?;
    fs::write(path, bytes).map_err(|err| DebuggerError::file(path, err))?;
    log::info!("saved state to {}", path.display());
    Ok(())
}

/// Runs one batch session, printing machine output to `out`.
///
/// # Errors
///
/// Fails on unreadable inputs, unwritable outputs or a bad snapshot. A
/// machine fault is not an error: it is reported as a halt.
pub fn run_session<W: Write>(
    config: &SessionConfig,
    out: W,
) -> Result<(SessionReport, W), DebuggerError> {
    // The step taken by `--continue` counts against `--max-steps`.
    let bypass = config.continue_first && config.max_steps != Some(0);
    let core = CoreConfig {
        tracing_enabled: !config.disable_trace,
        step_limit: if bypass {
            config.max_steps.map(|limit| limit - 1)
        } else {
            config.max_steps
        },
    };
    let mut engine = load_engine(&config.program, config.state.as_deref(), core)?;
    for addr in &config.breakpoints {
        engine.breakpoints_mut().add(*addr);
    }

    let mut host = SessionHost::new(out);
    if let Some(path) = &config.log {
        host = host.with_log(open_append(path)?);
    }
    if let Some(path) = &config.trace {
        host = host.with_trace(File::create(path).map_err(|err| DebuggerError::file(path, err))?);
    }
    queue_input(config, &mut host.input)?;
    log::debug!("{} input codes queued", host.input.len());

    let outcome = if bypass {
        match engine.step(0, &mut host) {
            StepOutcome::Completed => {
                let rest = engine.run(&mut host);
                RunOutcome {
                    steps: rest.steps + 1,
                    ..rest
                }
            }
            stop => RunOutcome {
                steps: 0,
                stop,
                result: engine.result(),
            },
        }
    } else {
        engine.run(&mut host)
    };

    if let Some(path) = &config.save {
        write_snapshot(&engine, path)?;
    }

    let report = SessionReport {
        stop: outcome.stop,
        steps: outcome.steps,
        result: outcome.result,
        pc: engine.state().pc(),
        breakpoint_line: match outcome.stop {
            StepOutcome::Suspended(SuspendReason::Breakpoint { .. }) => {
                host.breakpoint_line().map(str::to_owned)
            }
            _ => None,
        },
    };
    let out = host.finish()?;
    Ok((report, out))
}

/// Parses a decimal or `0x`-prefixed hexadecimal number.
///
/// # Errors
///
/// Returns [`DebuggerError::InvalidNumber`] for anything else.
pub fn parse_number(text: &str) -> Result<u64, DebuggerError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| DebuggerError::InvalidNumber(text.to_owned()))
}

/// Parses a memory address; see [`parse_number`].
///
/// # Errors
///
/// Returns [`DebuggerError::InvalidNumber`] when the value is not a number
/// or does not fit in the 16-bit address space.
pub fn parse_address(text: &str) -> Result<usize, DebuggerError> {
    usize::try_from(parse_number(text)?)
        .ok()
        .filter(|addr| *addr < vm_core::ADDRESS_SPACE_CELLS)
        .ok_or_else(|| DebuggerError::InvalidNumber(text.to_owned()))
}

fn queue_input(config: &SessionConfig, input: &mut InputQueue) -> Result<(), DebuggerError> {
    if let Some(path) = &config.input {
        let text = fs::read_to_string(path).map_err(|err| DebuggerError::file(path, err))?;
        for line in text.lines().filter(|line| !line.is_empty()) {
            input.push_line(line);
        }
    }
    for line in &config.send {
        input.push_line(line);
    }
    if config.read_stdin {
        for line in io::stdin().lock().lines() {
            let line = line.map_err(|err| DebuggerError::file("<stdin>", err))?;
            input.push_line(&line);
        }
    }
    Ok(())
}

fn open_append(path: &Path) -> Result<File, DebuggerError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| DebuggerError::file(path, err))
}
