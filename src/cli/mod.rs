//! The Slashes Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions: it loads programs, wires a trace sink to the
//! requested verbosity, and streams output characters to stdout as the engine
//! produces them.

use std::{
    fs,
    io::{self, Write},
    path::Path,
    process,
    sync::Once,
};

use clap::Parser;

use crate::{
    cli::args::{Command, RunOptions, SlashesArgs, TraceFormat},
    engine::{Execution, Halt, Pull},
    errors::{print_error, Result, SlashesError},
    samples,
    test_harness::{run_all_tests, TestConfig},
    trace::{TraceSink, Verbosity},
};

pub mod args;
pub mod output;

use output::{color_choice, JsonTracer, TerminalTracer};

/// Exit code when a caller limit stopped a program that was still running.
pub const EXIT_LIMIT: i32 = 2;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Settings for one program run, taken from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunConfig {
    pub verbosity: Verbosity,
    pub max_steps: Option<u64>,
    pub max_output: Option<usize>,
    pub trace_format: TraceFormat,
    pub diff: bool,
}

impl From<&RunOptions> for RunConfig {
    fn from(options: &RunOptions) -> Self {
        Self {
            verbosity: Verbosity::from_level(options.verbose),
            max_steps: options.max_steps,
            max_output: options.max_output,
            trace_format: options.trace_format,
            diff: options.diff,
        }
    }
}

/// Why streaming stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    Halted(Halt),
    StepLimit,
    OutputLimit,
}

impl Stop {
    pub fn exit_code(self) -> i32 {
        match self {
            Stop::Halted(_) => 0,
            Stop::StepLimit | Stop::OutputLimit => EXIT_LIMIT,
        }
    }
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber on stderr.
///
/// Only active when `RUST_LOG` is set, e.g. `RUST_LOG=slashes=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

/// The main entry point for the CLI.
pub fn run() {
    init_tracing();
    let args = SlashesArgs::parse();

    let code = match dispatch(args.command) {
        Ok(code) => code,
        Err(e) => {
            print_error(e);
            1
        }
    };
    process::exit(code);
}

fn dispatch(command: Command) -> Result<i32> {
    match command {
        Command::Run { file, options } => {
            let program = read_program(&file)?;
            execute_program(&program, &RunConfig::from(&options))
        }
        Command::Eval { program, options } => execute_program(&program, &RunConfig::from(&options)),
        Command::Sample { name: None, .. } => {
            output::print_samples(samples::all())?;
            Ok(0)
        }
        Command::Sample {
            name: Some(name),
            options,
        } => {
            let sample = samples::find(&name).ok_or(SlashesError::UnknownSample { name })?;
            execute_program(sample.program, &RunConfig::from(&options))
        }
        Command::Test { path, filter } => {
            let config = TestConfig {
                test_root: path,
                filter,
                ..TestConfig::default()
            };
            let summary = run_all_tests(&config)?;
            Ok(if summary.failed > 0 { 1 } else { 0 })
        }
    }
}

fn read_program(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| SlashesError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Run `program` to stdout with the configured tracer; returns the exit code.
pub fn execute_program(program: &str, config: &RunConfig) -> Result<i32> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stop = match config.trace_format {
        TraceFormat::Text => {
            let mut tracer = TerminalTracer::new(color_choice(atty::Stream::Stderr), config.diff);
            let stop = stream(
                Execution::with_trace(program, config.verbosity, &mut tracer),
                config,
                &mut out,
            )?;
            tracer.finish()?;
            stop
        }
        TraceFormat::Json => {
            let mut tracer = JsonTracer::new(io::stderr());
            let stop = stream(
                Execution::with_trace(program, config.verbosity, &mut tracer),
                config,
                &mut out,
            )?;
            tracer.finish()?;
            stop
        }
    };
    tracing::debug!(?stop, "execution stopped");
    Ok(stop.exit_code())
}

/// Pull characters from `execution` into `out` until it halts or a limit in
/// `config` is reached.
pub fn stream<S: TraceSink>(
    mut execution: Execution<S>,
    config: &RunConfig,
    out: &mut impl Write,
) -> Result<Stop> {
    let mut emitted = 0usize;
    let mut buf = [0u8; 4];
    loop {
        if config.max_output.is_some_and(|limit| emitted >= limit) {
            out.flush()?;
            return Ok(Stop::OutputLimit);
        }
        let budget = config
            .max_steps
            .map_or(u64::MAX, |limit| limit.saturating_sub(execution.steps()));
        match execution.pull(budget) {
            Pull::Char(c) => {
                out.write_all(c.encode_utf8(&mut buf).as_bytes())?;
                emitted += 1;
                if c == '\n' {
                    out.flush()?;
                }
            }
            Pull::Halted(halt) => {
                out.flush()?;
                return Ok(Stop::Halted(halt));
            }
            Pull::Pending => {
                out.flush()?;
                return Ok(Stop::StepLimit);
            }
        }
    }
}
