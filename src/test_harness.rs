//! Slashes Test Harness
//!
//! Discovers YAML test suites, runs every case through the engine with a step
//! budget, and reports the results with colored output and character diffs.
//!
//! # Test Format
//!
//! ```yaml
//! - name: "basic rewrite"
//!   program: "/x/y/xhello"
//!   expected: "yhello"             # optional; output produced before the stop
//!   halts: true                    # optional, defaults to true
//!   halt: "empty"                  # optional halt reason, see `Halt::name`
//!   max_steps: 10000               # optional step budget
//!   verbosity: 2                   # optional; checks trace consistency
//!   skip: false                    # optional, defaults to false
//!   only: false                    # optional, defaults to false
//! ```
//!
//! A case with `halts: false` passes when the budget runs out before the
//! program halts; that is how non-halting programs are tested.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use difference::{Changeset, Difference};
use serde::Deserialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use walkdir::WalkDir;

use crate::{
    engine::Execution,
    errors::{Result, SlashesError},
    trace::{TraceBuffer, Verbosity},
};

/// Step budget used when a case does not set `max_steps`.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

// =============================================================================
// CORE TYPES
// =============================================================================

/// A single YAML test case.
#[derive(Debug, Deserialize, Clone)]
pub struct TestCase {
    pub name: String,
    pub program: String,
    pub expected: Option<String>,
    #[serde(default = "default_halts")]
    pub halts: bool,
    pub halt: Option<String>,
    pub max_steps: Option<u64>,
    #[serde(default)]
    pub verbosity: i64,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub only: bool,
}

fn default_halts() -> bool {
    true
}

/// Outcome of a single test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    Pass {
        file: String,
        name: String,
    },
    Fail {
        file: String,
        name: String,
        reason: String,
        /// Expected and actual output, when the output was what differed.
        mismatch: Option<(String, String)>,
    },
    Skipped {
        file: String,
        name: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Configuration for test execution and reporting.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub test_root: PathBuf,
    pub filter: Option<String>,
    pub color: ColorChoice,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            test_root: PathBuf::from("tests/suites"),
            filter: None,
            color: crate::cli::output::color_choice(atty::Stream::Stdout),
        }
    }
}

// =============================================================================
// TEST DISCOVERY AND LOADING
// =============================================================================

/// Discovers all YAML files recursively under the given root directory.
pub fn discover_yaml_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Load and parse test cases from a YAML file.
pub fn load_test_cases(path: &Path) -> Result<Vec<TestCase>> {
    let content = fs::read_to_string(path).map_err(|source| SlashesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| SlashesError::Suite {
        path: path.to_path_buf(),
        source,
    })
}

/// Helper for test skipping logic.
pub fn skip_reason(case: &TestCase, has_only: bool, filter: Option<&str>) -> Option<String> {
    if has_only && !case.only {
        return Some("Not marked 'only' in 'only' mode".to_string());
    }
    if case.skip {
        return Some("Marked 'skip'".to_string());
    }
    if let Some(f) = filter {
        if !case.name.to_lowercase().contains(&f.to_lowercase()) {
            return Some(format!("Filtered out by substring: {}", f));
        }
    }
    None
}

// =============================================================================
// TEST EXECUTION
// =============================================================================

/// Run one case and compare the outcome against its expectations.
pub fn run_test_case(file: &str, case: &TestCase) -> TestResult {
    let fail = |reason: String, mismatch: Option<(String, String)>| TestResult::Fail {
        file: file.to_string(),
        name: case.name.clone(),
        reason,
        mismatch,
    };

    let mut execution = Execution::with_trace(
        case.program.as_str(),
        Verbosity::from_level(case.verbosity),
        TraceBuffer::new(),
    );
    let bounded = execution.run_bounded(case.max_steps.unwrap_or(DEFAULT_MAX_STEPS));

    match (case.halts, bounded.halt) {
        (true, None) => {
            return fail(
                format!("did not halt within {} steps", execution.steps()),
                None,
            )
        }
        (false, Some(halt)) => {
            return fail(format!("expected to run forever, halted: {}", halt.describe()), None)
        }
        _ => {}
    }

    if let (Some(expected), Some(actual)) = (case.halt.as_deref(), bounded.halt) {
        if expected != actual.name() {
            return fail(
                format!("halt reason mismatch: expected '{}', got '{}'", expected, actual.name()),
                None,
            );
        }
    }

    if let Some(expected) = case.expected.as_deref() {
        if expected != bounded.output {
            return fail(
                "output did not match expected".to_string(),
                Some((expected.to_string(), bounded.output)),
            );
        }
    }

    if execution.verbosity().reports_episodes() {
        let recorded = execution.trace().episode_count() as u64;
        if recorded != execution.episodes() {
            return fail(
                format!(
                    "trace reported {} episodes, engine ran {}",
                    recorded,
                    execution.episodes()
                ),
                None,
            );
        }
    }

    TestResult::Pass {
        file: file.to_string(),
        name: case.name.clone(),
    }
}

/// Partition test results by outcome type.
pub fn summarize(results: &[TestResult]) -> TestSummary {
    results.iter().fold(TestSummary::default(), |mut s, r| {
        match r {
            TestResult::Pass { .. } => s.passed += 1,
            TestResult::Fail { .. } => s.failed += 1,
            TestResult::Skipped { .. } => s.skipped += 1,
        }
        s
    })
}

/// Discover, run, and collect every case under `config.test_root`.
pub fn collect_results(config: &TestConfig) -> Result<Vec<TestResult>> {
    let mut all_cases = Vec::new();
    for path in discover_yaml_files(&config.test_root) {
        let file = path.display().to_string();
        for case in load_test_cases(&path)? {
            all_cases.push((file.clone(), case));
        }
    }
    let has_only = all_cases.iter().any(|(_, case)| case.only);

    Ok(all_cases
        .into_iter()
        .map(|(file, case)| {
            match skip_reason(&case, has_only, config.filter.as_deref()) {
                Some(reason) => TestResult::Skipped {
                    file,
                    name: case.name,
                    reason,
                },
                None => run_test_case(&file, &case),
            }
        })
        .collect())
}

/// Run all suites, print a report, and return the summary counts.
pub fn run_all_tests(config: &TestConfig) -> Result<TestSummary> {
    let results = collect_results(config)?;
    report_results(&results, config.color)?;
    Ok(summarize(&results))
}

// =============================================================================
// REPORTING
// =============================================================================

/// Print every result followed by a summary line.
pub fn report_results(results: &[TestResult], color: ColorChoice) -> std::io::Result<()> {
    let mut out = StandardStream::stdout(color);

    for r in results {
        match r {
            TestResult::Pass { file, name } => {
                label(&mut out, "PASS", Color::Green)?;
                writeln!(out, ": {} [{}]", name, file)?;
            }
            TestResult::Fail {
                file,
                name,
                reason,
                mismatch,
            } => {
                label(&mut out, "FAIL", Color::Red)?;
                writeln!(out, ": {} [{}]", name, file)?;
                writeln!(out, "  Error: {}", reason)?;
                if let Some((expected, actual)) = mismatch {
                    writeln!(out, "  Diff:")?;
                    print_diff(&mut out, expected, actual)?;
                }
            }
            TestResult::Skipped { file, name, reason } => {
                label(&mut out, "SKIP", Color::Yellow)?;
                writeln!(out, ": {} [{}] ({})", name, file, reason)?;
            }
        }
    }

    let summary = summarize(results);
    writeln!(
        out,
        "\nTest summary: total {}, passed {}, failed {}, skipped {}",
        results.len(),
        summary.passed,
        summary.failed,
        summary.skipped
    )?;
    out.flush()
}

/// Character-level diff; removals are what was expected, additions what was produced.
pub fn print_diff(out: &mut impl WriteColor, expected: &str, actual: &str) -> std::io::Result<()> {
    let changeset = Changeset::new(expected, actual, "");
    write!(out, "    ")?;
    for diff in &changeset.diffs {
        match diff {
            Difference::Same(x) => {
                out.reset()?;
                write!(out, "{}", x)?;
            }
            Difference::Add(x) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                write!(out, "{}", x)?;
            }
            Difference::Rem(x) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                write!(out, "{}", x)?;
            }
        }
    }
    out.reset()?;
    writeln!(out)
}

fn label(out: &mut impl WriteColor, text: &str, color: Color) -> std::io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{}", text)?;
    out.reset()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(yaml: &str) -> TestCase {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn defaults_expect_a_halting_program() {
        let c = case("name: t\nprogram: abc\n");
        assert!(c.halts);
        assert_eq!(c.verbosity, 0);
        assert!(matches!(run_test_case("f", &c), TestResult::Pass { .. }));
    }

    #[test]
    fn output_mismatch_carries_both_sides() {
        let c = case("name: t\nprogram: abc\nexpected: abd\n");
        match run_test_case("f", &c) {
            TestResult::Fail { mismatch, .. } => {
                assert_eq!(mismatch, Some(("abd".to_string(), "abc".to_string())));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn non_halting_case_passes_when_budget_runs_out() {
        let c = case("name: t\nprogram: /a/aa/a\nhalts: false\nmax_steps: 100\n");
        assert!(matches!(run_test_case("f", &c), TestResult::Pass { .. }));
    }

    #[test]
    fn halt_reason_is_checked() {
        let c = case("name: t\nprogram: /abc\nhalt: unterminated_replacement\n");
        assert!(matches!(run_test_case("f", &c), TestResult::Fail { .. }));
        let c = case("name: t\nprogram: /abc\nhalt: unterminated_pattern\n");
        assert!(matches!(run_test_case("f", &c), TestResult::Pass { .. }));
    }

    #[test]
    fn skip_and_only_rules() {
        let mut c = case("name: Rewrite\nprogram: x\n");
        assert_eq!(skip_reason(&c, false, None), None);
        assert!(skip_reason(&c, true, None).is_some());
        assert_eq!(skip_reason(&c, false, Some("rewr")), None);
        assert!(skip_reason(&c, false, Some("other")).is_some());
        c.skip = true;
        assert!(skip_reason(&c, false, None).is_some());
    }
}
