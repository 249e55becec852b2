//! Slashes: a lazy, traceable interpreter for the `///` esoteric language.
//!
//! A `///` program is a single string consumed from the left. Plain
//! characters are printed, `\x` prints `x`, and `/pattern/replacement/`
//! rewrites the rest of the program until `pattern` no longer occurs.
//!
//! ```
//! let output: String = slashes::execute("/x/y/xhello", 0).collect();
//! assert_eq!(output, "yhello");
//! ```
//!
//! Output is pulled one character at a time, so programs that never halt can
//! still be consumed up to any point the caller chooses; see
//! [`Execution::pull`] for step-bounded pulls.

pub mod buffer;
pub mod cli;
pub mod engine;
pub mod errors;
pub mod reader;
pub mod samples;
pub mod test_harness;
pub mod trace;

pub use crate::engine::{execute, Bounded, Execution, Halt, Malformed, Pull, State, Step};
pub use crate::errors::SlashesError;
pub use crate::trace::{NullTrace, TraceBuffer, TraceEvent, TraceSink, Verbosity};
