//! Errors raised around the engine: loading programs, reading test suites,
//! writing traces.
//!
//! The engine never fails. Halting on malformed syntax and running forever are
//! both program behaviour, so nothing in here describes them.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum SlashesError {
    #[error("could not read '{}'", path.display())]
    #[diagnostic(code(slashes::io::read), help("check that the file exists and is readable UTF-8 text"))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid test suite '{}'", path.display())]
    #[diagnostic(code(slashes::suite::parse))]
    Suite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("no sample program named '{name}'")]
    #[diagnostic(code(slashes::sample::unknown), help("run `slashes sample` to list the available samples"))]
    UnknownSample { name: String },

    #[error("failed to write output")]
    #[diagnostic(code(slashes::io::write))]
    Write(#[from] std::io::Error),

    #[error("failed to encode trace event")]
    #[diagnostic(code(slashes::trace::encode))]
    Encode(#[from] serde_json::Error),
}

pub type Result<T, E = SlashesError> = std::result::Result<T, E>;

/// Render an error through miette's report handler on stderr.
pub fn print_error(error: SlashesError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
