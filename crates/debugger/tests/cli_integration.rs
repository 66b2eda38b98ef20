//! Integration tests for the synacor-dbg CLI.

use debugger as _;
use env_logger as _;
use log as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror as _;
use vm_core as _;

const R0: u16 = 32768;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("synacor-dbg")
}

fn write_program(dir: &Path, name: &str, words: &[u16]) -> PathBuf {
    let path = dir.join(name);
    let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
    fs::write(&path, bytes).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(binary_path())
        .args(args)
        .output()
        .expect("failed to run synacor-dbg")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Prints "Hi" and halts.
const HELLO: &[u16] = &[19, 72, 19, 105, 0];

/// Echoes every input character until input runs out.
const ECHO: &[u16] = &[20, R0, 19, R0, 6, 0];

#[test]
fn run_prints_output_and_exits_with_halt_code() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = write_program(temp_dir.path(), "hello.bin", HELLO);

    let output = run(&["run", program.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "Hi");
    assert!(stderr(&output).contains("halted: HALT (code 1)"));
}

#[test]
fn run_feeds_queued_input_and_suspends_when_exhausted() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = write_program(temp_dir.path(), "echo.bin", ECHO);
    let input = temp_dir.path().join("input.txt");
    fs::write(&input, "one\n").unwrap();

    let output = run(&[
        "run",
        program.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
        "--send",
        "two",
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "one\ntwo\n");
    assert!(stderr(&output).contains("suspended: waiting for input at 0"));
}

#[test]
fn saved_state_resumes_where_it_stopped() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = write_program(temp_dir.path(), "echo.bin", ECHO);
    let state = temp_dir.path().join("state.json");

    let first = run(&[
        "run",
        program.to_str().unwrap(),
        "--send",
        "a",
        "--save",
        state.to_str().unwrap(),
    ]);
    assert_eq!(first.status.code(), Some(0));
    assert!(state.exists());

    let second = run(&[
        "run",
        program.to_str().unwrap(),
        "--state",
        state.to_str().unwrap(),
        "--send",
        "b",
    ]);
    assert_eq!(stdout(&second), "b\n");

    let show = run(&[
        "show",
        program.to_str().unwrap(),
        "--state",
        state.to_str().unwrap(),
    ]);
    assert_eq!(show.status.code(), Some(0));
    assert!(stdout(&show).contains(&format!("R0: {}", u16::from(b'\n'))));
    assert!(stdout(&show).starts_with("pc: 0 -> 20 (in)"));
}

#[test]
fn breakpoint_stops_before_instruction_and_continue_steps_over_it() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = write_program(temp_dir.path(), "hello.bin", HELLO);
    let state = temp_dir.path().join("bp.json");

    let stopped = run(&[
        "run",
        program.to_str().unwrap(),
        "--break",
        "2",
        "--save",
        state.to_str().unwrap(),
    ]);
    assert_eq!(stopped.status.code(), Some(0));
    assert_eq!(stdout(&stopped), "H");
    let report = stderr(&stopped);
    assert!(report.contains("suspended: breakpoint at 2"));
    assert!(report.contains("[!!]"));

    let resumed = run(&[
        "run",
        program.to_str().unwrap(),
        "--state",
        state.to_str().unwrap(),
        "--break",
        "2",
        "--continue",
    ]);
    assert_eq!(resumed.status.code(), Some(1));
    assert_eq!(stdout(&resumed), "i");
}

#[test]
fn trace_and_log_files_are_written() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = write_program(temp_dir.path(), "hello.bin", HELLO);
    let trace = temp_dir.path().join("trace.txt");
    let log = temp_dir.path().join("out.log");

    let output = run(&[
        "run",
        program.to_str().unwrap(),
        "--trace",
        trace.to_str().unwrap(),
        "--log",
        log.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let lines: Vec<String> = fs::read_to_string(&trace)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect();
    assert_eq!(
        lines,
        vec![
            "       0 |    out {72:'H'}",
            "       2 |    out {105:'i'}",
            "       4 |   halt ",
        ]
    );
    assert_eq!(fs::read_to_string(&log).unwrap(), "Hi");
}

#[test]
fn max_steps_stops_an_infinite_loop() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = write_program(temp_dir.path(), "loop.bin", &[6, 0]);

    let output = run(&["run", program.to_str().unwrap(), "--max-steps", "100"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).contains("step limit reached at 0 after 100 steps"));
}

#[test]
fn faults_report_reason_and_code_one() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = write_program(temp_dir.path(), "ret.bin", &[18]);

    let output = run(&["run", program.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("stack underflow on ret"));
}

#[test]
fn dump_lists_instructions_and_raw_cells() {
    let temp_dir = tempfile::tempdir().unwrap();
    let program = write_program(temp_dir.path(), "mixed.bin", &[9, R0, 4, 5, 999, 0]);

    let plain = run(&["dump", program.to_str().unwrap()]);
    assert_eq!(plain.status.code(), Some(0));
    assert_eq!(
        stdout(&plain),
        "       0 |    add {R0}, 4, 5\n       5 |   halt \n"
    );

    let all = run(&["dump", program.to_str().unwrap(), "4", "5", "--all"]);
    assert_eq!(stdout(&all), "       4 |   data 999\n");
}

#[test]
fn missing_program_is_an_io_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let missing = temp_dir.path().join("absent.bin");

    let output = run(&["run", missing.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("absent.bin"));
}

#[test]
fn unknown_command_prints_usage() {
    let output = run(&["assemble"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Usage: synacor-dbg"));
}

#[test]
fn help_exits_cleanly() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Commands:"));
}
