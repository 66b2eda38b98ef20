//! CLI entry point for the Synacor VM batch debugger.

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use debugger::{
    load_engine, parse_address, parse_number, run_session, write_dump, write_state,
    DebuggerError, SessionConfig, FAILURE_EXIT_CODE,
};
use thiserror as _;
#[cfg(test)]
use tempfile as _;
use vm_core::CoreConfig;

const USAGE_TEXT: &str = "\
Usage: synacor-dbg <command> [options]

Commands:
  run  <program> [options]            Run until halt, suspension or step limit
  dump <program> [START [END]]        Disassemble memory
  show <program>                      Print pc, registers and stack

Run options:
  --state <file>       Restore a saved snapshot before running
  --input <file>       Queue each line of <file> as input
  --send <text>        Queue one input line (repeatable)
  --stdin              Queue every line of standard input
  --break <addr>       Set a breakpoint (repeatable)
  --continue           Step over a breakpoint at the current pc first
  --max-steps <n>      Stop after <n> instructions
  --trace <file>       Write one trace line per fetched instruction
  --log <file>         Append machine output to <file>
  --save <file>        Save a snapshot when the run stops
  --no-trace           Disable trace dispatch

Dump/show options:
  --state <file>       Inspect a saved snapshot instead of the fresh program
  --all                Include cells that are not instructions (dump only)
  -h, --help           Show this help message

Addresses and counts accept decimal or 0x-prefixed hex.

Examples:
  synacor-dbg run challenge.bin --send 'take tablet' --save after.json
  synacor-dbg run challenge.bin --state after.json --break 0x1234
  synacor-dbg dump challenge.bin 0 64 --all
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run(SessionConfig),
    Dump(DumpArgs),
    Show(ShowArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct DumpArgs {
    program: PathBuf,
    state: Option<PathBuf>,
    start: usize,
    end: Option<usize>,
    include_raw: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct ShowArgs {
    program: PathBuf,
    state: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        "dump" => parse_dump_args(args)
            .map(Command::Dump)
            .map(ParseResult::Command),
        "show" => parse_show_args(args)
            .map(Command::Show)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn value_for(flag: &str, args: &mut impl Iterator<Item = OsString>) -> Result<OsString, String> {
    args.next()
        .ok_or_else(|| format!("missing value for {flag}"))
}

fn number_for(flag: &str, args: &mut impl Iterator<Item = OsString>) -> Result<String, String> {
    Ok(value_for(flag, args)?.to_string_lossy().to_string())
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<SessionConfig, String> {
    let mut program: Option<PathBuf> = None;
    let mut config = SessionConfig::default();

    while let Some(arg) = args.next() {
        let flag = arg.to_string_lossy().to_string();
        match flag.as_str() {
            "--help" | "-h" => return Err(USAGE_TEXT.to_string()),
            "--state" => config.state = Some(PathBuf::from(value_for(&flag, &mut args)?)),
            "--input" => config.input = Some(PathBuf::from(value_for(&flag, &mut args)?)),
            "--send" => config
                .send
                .push(value_for(&flag, &mut args)?.to_string_lossy().to_string()),
            "--stdin" => config.read_stdin = true,
            "--break" => {
                let text = number_for(&flag, &mut args)?;
                config
                    .breakpoints
                    .push(parse_address(&text).map_err(|e| e.to_string())?);
            }
            "--continue" => config.continue_first = true,
            "--max-steps" => {
                let text = number_for(&flag, &mut args)?;
                config.max_steps = Some(parse_number(&text).map_err(|e| e.to_string())?);
            }
            "--trace" => config.trace = Some(PathBuf::from(value_for(&flag, &mut args)?)),
            "--log" => config.log = Some(PathBuf::from(value_for(&flag, &mut args)?)),
            "--save" => config.save = Some(PathBuf::from(value_for(&flag, &mut args)?)),
            "--no-trace" => config.disable_trace = true,
            _ if flag.starts_with('-') => return Err(format!("unknown option: {flag}")),
            _ => {
                if program.is_some() {
                    return Err("multiple program paths provided".to_string());
                }
                program = Some(PathBuf::from(arg));
            }
        }
    }

    config.program = program.ok_or_else(|| "missing program path".to_string())?;
    Ok(config)
}

#[allow(clippy::while_let_on_iterator)]
fn parse_dump_args(mut args: impl Iterator<Item = OsString>) -> Result<DumpArgs, String> {
    let mut program: Option<PathBuf> = None;
    let mut state: Option<PathBuf> = None;
    let mut bounds: Vec<usize> = Vec::new();
    let mut include_raw = false;

    while let Some(arg) = args.next() {
        let flag = arg.to_string_lossy().to_string();
        match flag.as_str() {
            "--help" | "-h" => return Err(USAGE_TEXT.to_string()),
            "--state" => state = Some(PathBuf::from(value_for(&flag, &mut args)?)),
            "--all" => include_raw = true,
            _ if flag.starts_with('-') => return Err(format!("unknown option: {flag}")),
            _ if program.is_none() => program = Some(PathBuf::from(arg)),
            _ if bounds.len() < 2 => bounds.push(parse_address(&flag).map_err(|e| e.to_string())?),
            _ => return Err(format!("unexpected argument: {flag}")),
        }
    }

    let program = program.ok_or_else(|| "missing program path".to_string())?;
    Ok(DumpArgs {
        program,
        state,
        start: bounds.first().copied().unwrap_or(0),
        end: bounds.get(1).copied(),
        include_raw,
    })
}

#[allow(clippy::while_let_on_iterator)]
fn parse_show_args(mut args: impl Iterator<Item = OsString>) -> Result<ShowArgs, String> {
    let mut program: Option<PathBuf> = None;
    let mut state: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        let flag = arg.to_string_lossy().to_string();
        match flag.as_str() {
            "--help" | "-h" => return Err(USAGE_TEXT.to_string()),
            "--state" => state = Some(PathBuf::from(value_for(&flag, &mut args)?)),
            _ if flag.starts_with('-') => return Err(format!("unknown option: {flag}")),
            _ if program.is_some() => return Err("multiple program paths provided".to_string()),
            _ => program = Some(PathBuf::from(arg)),
        }
    }

    let program = program.ok_or_else(|| "missing program path".to_string())?;
    Ok(ShowArgs { program, state })
}

fn run_run(config: &SessionConfig) -> Result<i32, DebuggerError> {
    let stdout = io::stdout().lock();
    let (report, _) = run_session(config, stdout)?;
    eprintln!("{report}");
    Ok(report.exit_code())
}

fn run_dump(args: &DumpArgs) -> Result<i32, DebuggerError> {
    let engine = load_engine(&args.program, args.state.as_deref(), CoreConfig::default())?;
    let mut stdout = io::stdout().lock();
    let rows = write_dump(&engine, args.start, args.end, args.include_raw, &mut stdout)?;
    stdout.flush()?;
    log::debug!("dumped {rows} rows");
    Ok(0)
}

fn run_show(args: &ShowArgs) -> Result<i32, DebuggerError> {
    let engine = load_engine(&args.program, args.state.as_deref(), CoreConfig::default())?;
    let mut stdout = io::stdout().lock();
    write_state(&engine, &mut stdout)?;
    stdout.flush()?;
    Ok(0)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(command)) => {
            let result = match &command {
                Command::Run(config) => run_run(config),
                Command::Dump(args) => run_dump(args),
                Command::Show(args) => run_show(args),
            };
            result.unwrap_or_else(|err| {
                eprintln!("error: {err}");
                FAILURE_EXIT_CODE
            })
        }
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
                0
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
                FAILURE_EXIT_CODE
            }
        }
    };

    std::process::exit(exit_code);
}
