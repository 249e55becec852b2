// CLI regression tests: output streaming, limits, traces, and miette diagnostics.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn slashes() -> Command {
    Command::cargo_bin("slashes").unwrap()
}

/// A program file in the system temp directory, removed on drop.
struct TempProgram {
    path: PathBuf,
}

impl TempProgram {
    fn new(program: &str) -> Self {
        let path = std::env::temp_dir().join(format!("slashes-cli-{}.slashes", std::process::id()));
        fs::write(&path, program).unwrap();
        Self { path }
    }
}

impl Drop for TempProgram {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[test]
fn eval_streams_program_output() {
    slashes()
        .args(["eval", "/x/y/xhello"])
        .assert()
        .success()
        .stdout("yhello");
}

#[test]
fn malformed_program_is_not_an_error() {
    slashes()
        .args(["eval", "ok/unterminated"])
        .assert()
        .success()
        .stdout("ok");
}

#[test]
fn step_limit_stops_a_non_halting_program() {
    slashes()
        .args(["eval", "--max-steps", "1000", "/a/aa/a"])
        .assert()
        .code(2)
        .stdout("");
}

#[test]
fn output_limit_truncates() {
    slashes()
        .args(["eval", "--max-output", "5", "Hello, world!"])
        .assert()
        .code(2)
        .stdout("Hello");
}

#[test]
fn summary_trace_goes_to_stderr() {
    slashes()
        .args(["eval", "-v", "1", "/a/b/aa"])
        .assert()
        .success()
        .stdout("bb")
        .stderr(contains("INPUT:").and(contains("OUTPUT:")));
}

#[test]
fn episode_trace_marks_the_directive() {
    slashes()
        .args(["eval", "-v", "2", "/a/b/aa"])
        .assert()
        .success()
        .stderr(contains("APPLY:  /a/b/aa").and(contains("        v v v")));
}

#[test]
fn out_of_range_verbosity_is_clamped() {
    slashes()
        .args(["eval", "-v", "-7", "abc"])
        .assert()
        .success()
        .stdout("abc")
        .stderr("");
}

#[test]
fn json_trace_emits_one_event_per_line() {
    let assert = slashes()
        .args(["eval", "-v", "2", "--trace-format", "json", "/a/b/a"])
        .assert()
        .success()
        .stdout("b");
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    let events: Vec<serde_json::Value> = stderr
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(events.len(), 4);
    assert_eq!(events[1]["event"], "episode");
    assert_eq!(events[3]["halt"], "empty");
}

#[test]
fn sample_runs_by_name() {
    slashes()
        .args(["sample", "thue-morse"])
        .assert()
        .success()
        .stdout("0110100110010110");
}

#[test]
fn sample_without_name_lists_samples() {
    slashes()
        .arg("sample")
        .assert()
        .success()
        .stdout(contains("fibonacci").and(contains("never halts")));
}

#[test]
fn unknown_sample_reports_miette_diagnostic() {
    slashes()
        .args(["sample", "nope"])
        .assert()
        .failure()
        .stderr(contains("slashes::sample::unknown"));
}

#[test]
fn missing_file_reports_miette_diagnostic() {
    slashes()
        .args(["run", "tests/does_not_exist.slashes"])
        .assert()
        .code(1)
        .stderr(contains("slashes::io::read").or(contains("help:")));
}

#[test]
fn run_reads_program_from_file() {
    let file = TempProgram::new("/world/there/Hello, world");

    slashes()
        .arg("run")
        .arg(&file.path)
        .assert()
        .success()
        .stdout("Hello, there");
}

#[test]
fn test_subcommand_runs_suites() {
    slashes()
        .args(["test", "tests/suites"])
        .assert()
        .success()
        .stdout(contains("Test summary").and(contains("failed 0")));
}
