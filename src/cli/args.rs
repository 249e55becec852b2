//! Defines the command-line arguments and subcommands for the Slashes CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "slashes",
    version,
    about = "Run programs written in the /// string-rewriting language."
)]
pub struct SlashesArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a /// program from a file and stream its output.
    Run {
        /// The path to the program file.
        #[arg(required = true)]
        file: PathBuf,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Run a /// program given directly on the command line.
    Eval {
        /// The program text.
        #[arg(required = true, allow_hyphen_values = true)]
        program: String,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Run a built-in sample program, or list them when no name is given.
    Sample {
        name: Option<String>,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Discover and run all YAML test suites in a directory.
    Test {
        /// The path to the directory containing test suites.
        #[arg(default_value = "tests/suites")]
        path: PathBuf,
        /// Only run cases whose name contains this substring.
        #[arg(long)]
        filter: Option<String>,
    },
}

/// How trace events are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TraceFormat {
    /// Human-readable, colored when stderr is a terminal.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Options shared by every subcommand that executes a program.
#[derive(Debug, Clone, Args)]
pub struct RunOptions {
    /// Trace verbosity, 0 (silent) to 5 (pause at every replacement).
    /// Values outside the range are clamped.
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub verbose: i64,
    /// Stop after this many engine steps if the program is still running.
    #[arg(long)]
    pub max_steps: Option<u64>,
    /// Stop after printing this many characters.
    #[arg(long)]
    pub max_output: Option<usize>,
    #[arg(long, value_enum, default_value_t = TraceFormat::Text)]
    pub trace_format: TraceFormat,
    /// Show a character diff between successive program states in text traces.
    #[arg(long)]
    pub diff: bool,
}
