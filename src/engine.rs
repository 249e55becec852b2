//! The `///` execution engine.
//!
//! An [`Execution`] owns one program buffer and advances it one discrete
//! [`Step`] at a time. Output is produced lazily: iterating an execution runs
//! the state machine only as far as needed to yield the next character, so a
//! program that never halts can still be observed (or abandoned) by the
//! caller. The engine itself has no step limit and no timeout.

use std::iter::FusedIterator;

use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    buffer::ProgramBuffer,
    reader::{read_until, Read, DELIMITER, ESCAPE},
    trace::{NullTrace, TraceEvent, TraceSink, Verbosity},
};

// ============================================================================
// STATES AND STEPS
// ============================================================================

/// Trailing syntax that made a program stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Malformed {
    /// The program ended on a lone `\`.
    DanglingEscape,
    /// No closing `/` after the pattern.
    UnterminatedPattern,
    /// No closing `/` after the replacement.
    UnterminatedReplacement,
}

/// Why an execution stopped. Both variants are normal termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Halt {
    /// The program buffer was consumed completely.
    Empty,
    Malformed(Malformed),
}

impl Halt {
    pub fn is_malformed(self) -> bool {
        matches!(self, Halt::Malformed(_))
    }

    /// Stable identifier, matching the serialized form of the halt reason.
    pub fn name(self) -> &'static str {
        match self {
            Halt::Empty => "empty",
            Halt::Malformed(Malformed::DanglingEscape) => "dangling_escape",
            Halt::Malformed(Malformed::UnterminatedPattern) => "unterminated_pattern",
            Halt::Malformed(Malformed::UnterminatedReplacement) => "unterminated_replacement",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Halt::Empty => "program consumed",
            Halt::Malformed(Malformed::DanglingEscape) => "dangling escape at end of program",
            Halt::Malformed(Malformed::UnterminatedPattern) => "unterminated pattern",
            Halt::Malformed(Malformed::UnterminatedReplacement) => "unterminated replacement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted(Halt),
}

/// One unit of work performed by [`Execution::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A character was written to the output, either literal or escaped.
    Emitted(char),
    /// A complete `/pattern/replacement/` directive was read and a
    /// substitution episode started.
    Directive,
    /// One occurrence of the pattern was replaced.
    Replaced,
    /// The pattern no longer occurs; the episode is over.
    EpisodeEnded,
    Halted(Halt),
}

/// Result of a bounded pull, see [`Execution::pull`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Char(char),
    Halted(Halt),
    /// The step budget ran out while the program was still running.
    Pending,
}

/// Output gathered by [`Execution::run_bounded`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bounded {
    pub output: String,
    /// `None` when the budget ran out first.
    pub halt: Option<Halt>,
}

struct Episode {
    pattern: String,
    replacement: String,
    repetitions: u64,
}

enum Phase {
    Scanning,
    Substituting(Episode),
    Halted(Halt),
}

// ============================================================================
// EXECUTION
// ============================================================================

/// A single run of a `///` program.
pub struct Execution<S: TraceSink = NullTrace> {
    buffer: ProgramBuffer,
    phase: Phase,
    verbosity: Verbosity,
    sink: S,
    /// Output so far, kept only when the final summary is reported to an
    /// active sink.
    output: String,
    steps: u64,
    episodes: u64,
    replacements: u64,
}

/// Run `program` lazily, without a trace sink.
///
/// `verbosity` is clamped into the defined range. With no sink attached it
/// has no observable effect and nothing is buffered for the trace; use
/// [`Execution::with_trace`] to observe an execution.
pub fn execute(program: &str, verbosity: i64) -> Execution<NullTrace> {
    Execution::new(program, Verbosity::from_level(verbosity))
}

impl Execution<NullTrace> {
    pub fn new(program: impl Into<String>, verbosity: Verbosity) -> Self {
        Self::with_trace(program, verbosity, NullTrace)
    }
}

impl<S: TraceSink> Execution<S> {
    /// Create an execution reporting to `sink` at the given verbosity.
    pub fn with_trace(
        program: impl Into<String>,
        verbosity: Verbosity,
        sink: S,
    ) -> Self {
        let mut execution = Self {
            buffer: ProgramBuffer::new(program),
            phase: Phase::Scanning,
            verbosity,
            sink,
            output: String::new(),
            steps: 0,
            episodes: 0,
            replacements: 0,
        };
        if execution.verbosity.reports_summary() {
            let program = execution.buffer.as_str().to_string();
            execution.sink.record(&TraceEvent::Start { program });
        }
        execution
    }

    pub fn state(&self) -> State {
        match self.phase {
            Phase::Halted(halt) => State::Halted(halt),
            _ => State::Running,
        }
    }

    /// The program text not yet consumed.
    pub fn remaining(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Steps performed so far, excluding the final halt.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Substitution episodes started so far.
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Individual replacements performed so far, across all episodes.
    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    pub fn trace(&self) -> &S {
        &self.sink
    }

    pub fn into_trace(self) -> S {
        self.sink
    }

    /// Advance the state machine by one unit of work.
    ///
    /// Once halted, every further call returns the same `Step::Halted`
    /// without doing anything.
    pub fn step(&mut self) -> Step {
        let step = match std::mem::replace(&mut self.phase, Phase::Scanning) {
            Phase::Halted(halt) => {
                self.phase = Phase::Halted(halt);
                return Step::Halted(halt);
            }
            Phase::Substituting(episode) => self.substitute(episode),
            Phase::Scanning => self.scan(),
        };
        if !matches!(step, Step::Halted(_)) {
            self.steps += 1;
        }
        step
    }

    /// Pull the next output character, spending at most `max_steps` steps.
    pub fn pull(&mut self, max_steps: u64) -> Pull {
        if let State::Halted(halt) = self.state() {
            return Pull::Halted(halt);
        }
        for _ in 0..max_steps {
            match self.step() {
                Step::Emitted(c) => return Pull::Char(c),
                Step::Halted(halt) => return Pull::Halted(halt),
                Step::Directive | Step::Replaced | Step::EpisodeEnded => {}
            }
        }
        Pull::Pending
    }

    /// Collect output until the program halts or `max_steps` steps have run.
    pub fn run_bounded(&mut self, max_steps: u64) -> Bounded {
        let mut output = String::new();
        let mut budget = max_steps;
        loop {
            if let State::Halted(halt) = self.state() {
                return Bounded {
                    output,
                    halt: Some(halt),
                };
            }
            if budget == 0 {
                return Bounded { output, halt: None };
            }
            budget -= 1;
            if let Step::Emitted(c) = self.step() {
                output.push(c);
            }
        }
    }

    // ------------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------------

    fn scan(&mut self) -> Step {
        match self.buffer.pop_front() {
            None => self.halt(Halt::Empty),
            Some(ESCAPE) => match self.buffer.pop_front() {
                Some(c) => self.emit(c),
                None => self.halt(Halt::Malformed(Malformed::DanglingEscape)),
            },
            Some(DELIMITER) => self.read_directive(),
            Some(c) => self.emit(c),
        }
    }

    fn read_directive(&mut self) -> Step {
        let pattern = match read_until(&mut self.buffer, DELIMITER) {
            Read::Token(token) => token,
            Read::Unterminated => {
                return self.halt(Halt::Malformed(Malformed::UnterminatedPattern))
            }
            Read::DanglingEscape => return self.halt(Halt::Malformed(Malformed::DanglingEscape)),
        };
        let replacement = match read_until(&mut self.buffer, DELIMITER) {
            Read::Token(token) => token,
            Read::Unterminated => {
                return self.halt(Halt::Malformed(Malformed::UnterminatedReplacement))
            }
            Read::DanglingEscape => return self.halt(Halt::Malformed(Malformed::DanglingEscape)),
        };

        self.episodes += 1;
        debug!(
            episode = self.episodes,
            pattern = %pattern,
            replacement = %replacement,
            "substitution episode started"
        );
        if self.verbosity.reports_episodes() {
            self.sink.record(&TraceEvent::Episode {
                pattern: pattern.clone(),
                replacement: replacement.clone(),
                program: self.buffer.as_str().to_string(),
            });
            if self.verbosity.pauses_after_episode() {
                self.sink.acknowledge();
            }
        }

        self.phase = Phase::Substituting(Episode {
            pattern,
            replacement,
            repetitions: 0,
        });
        Step::Directive
    }

    fn substitute(&mut self, mut episode: Episode) -> Step {
        if !self
            .buffer
            .replace_first(&episode.pattern, &episode.replacement)
        {
            debug!(
                episode = self.episodes,
                replacements = episode.repetitions,
                "substitution episode ended"
            );
            if self.verbosity.reports_episodes() {
                self.sink.record(&TraceEvent::EpisodeEnd {
                    pattern: episode.pattern,
                    replacement: episode.replacement,
                    program: self.buffer.as_str().to_string(),
                    replacements: episode.repetitions,
                });
            }
            return Step::EpisodeEnded;
        }

        episode.repetitions += 1;
        self.replacements += 1;
        trace!(
            episode = self.episodes,
            repetition = episode.repetitions,
            len = self.buffer.as_str().len(),
            "replacement applied"
        );
        if self.verbosity.reports_replacements() {
            self.sink.record(&TraceEvent::Replacement {
                pattern: episode.pattern.clone(),
                replacement: episode.replacement.clone(),
                program: self.buffer.as_str().to_string(),
                repetition: episode.repetitions,
            });
            if self.verbosity.pauses_after_replacement() {
                self.sink.acknowledge();
            }
        }
        self.phase = Phase::Substituting(episode);
        Step::Replaced
    }

    fn emit(&mut self, c: char) -> Step {
        if self.verbosity.reports_summary() && self.sink.is_active() {
            self.output.push(c);
        }
        Step::Emitted(c)
    }

    fn halt(&mut self, halt: Halt) -> Step {
        debug!(?halt, steps = self.steps, "program halted");
        self.phase = Phase::Halted(halt);
        if self.verbosity.reports_summary() {
            self.sink.record(&TraceEvent::Finish {
                output: std::mem::take(&mut self.output),
                halt,
            });
        }
        Step::Halted(halt)
    }
}

impl<S: TraceSink> Iterator for Execution<S> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            match self.step() {
                Step::Emitted(c) => return Some(c),
                Step::Halted(_) => return None,
                Step::Directive | Step::Replaced | Step::EpisodeEnded => {}
            }
        }
    }
}

impl<S: TraceSink> FusedIterator for Execution<S> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceBuffer;

    fn steps_of(program: &str) -> Vec<Step> {
        let mut execution = execute(program, 0);
        let mut steps = Vec::new();
        loop {
            let step = execution.step();
            steps.push(step);
            if let Step::Halted(_) = step {
                return steps;
            }
        }
    }

    #[test]
    fn literal_and_escaped_characters_take_one_step_each() {
        assert_eq!(
            steps_of(r"a\/"),
            vec![
                Step::Emitted('a'),
                Step::Emitted('/'),
                Step::Halted(Halt::Empty)
            ]
        );
    }

    #[test]
    fn episode_is_directive_then_replacements_then_end() {
        assert_eq!(
            steps_of("/a/b/aa"),
            vec![
                Step::Directive,
                Step::Replaced,
                Step::Replaced,
                Step::EpisodeEnded,
                Step::Emitted('b'),
                Step::Emitted('b'),
                Step::Halted(Halt::Empty),
            ]
        );
    }

    #[test]
    fn halted_execution_stays_halted() {
        let mut execution = execute(r"\", 0);
        assert_eq!(
            execution.step(),
            Step::Halted(Halt::Malformed(Malformed::DanglingEscape))
        );
        let steps = execution.steps();
        assert_eq!(
            execution.step(),
            Step::Halted(Halt::Malformed(Malformed::DanglingEscape))
        );
        assert_eq!(execution.steps(), steps);
        assert_eq!(execution.next(), None);
    }

    #[test]
    fn dangling_escape_inside_a_pattern_is_malformed() {
        let mut execution = execute(r"/ab\", 0);
        assert_eq!(execution.next(), None);
        assert_eq!(
            execution.state(),
            State::Halted(Halt::Malformed(Malformed::DanglingEscape))
        );
    }

    #[test]
    fn unterminated_replacement_is_reported() {
        let mut execution = execute("/a/b", 0);
        assert_eq!(execution.next(), None);
        assert_eq!(
            execution.state(),
            State::Halted(Halt::Malformed(Malformed::UnterminatedReplacement))
        );
        assert_eq!(execution.remaining(), "");
    }

    #[test]
    fn pull_reports_pending_when_budget_runs_out() {
        let mut execution = execute("/a/aa/a", 0);
        assert_eq!(execution.pull(50), Pull::Pending);
        assert_eq!(execution.state(), State::Running);
    }

    #[test]
    fn pull_with_zero_budget_on_halted_execution() {
        let mut execution = execute("", 0);
        assert_eq!(execution.next(), None);
        assert_eq!(execution.pull(0), Pull::Halted(Halt::Empty));
    }

    #[test]
    fn run_bounded_collects_output_of_halting_programs() {
        let mut execution = execute("/foo/Hello, world!//bar/foo/bar", 0);
        let bounded = execution.run_bounded(1_000);
        assert_eq!(bounded.output, "Hello, world!");
        assert_eq!(bounded.halt, Some(Halt::Empty));
    }

    #[test]
    fn summary_trace_records_start_and_finish() {
        let mut execution = Execution::with_trace("ab", Verbosity::Summary, TraceBuffer::new());
        let output: String = execution.by_ref().collect();
        assert_eq!(output, "ab");
        assert_eq!(
            execution.trace().events,
            vec![
                TraceEvent::Start {
                    program: "ab".into()
                },
                TraceEvent::Finish {
                    output: "ab".into(),
                    halt: Halt::Empty
                },
            ]
        );
    }

    #[test]
    fn untraced_execution_does_not_buffer_output() {
        let mut execution = execute("Hello, world!", 5);
        assert_eq!(execution.by_ref().collect::<String>(), "Hello, world!");
        assert!(execution.output.is_empty());

        let mut execution = Execution::with_trace("ab", Verbosity::Summary, TraceBuffer::new());
        execution.next();
        assert_eq!(execution.output, "a");
    }

    #[test]
    fn step_levels_acknowledge_pause_points() {
        let mut execution = Execution::with_trace("/a/b/aa/c/d/", Verbosity::StepEpisodes, TraceBuffer::new());
        assert_eq!(execution.by_ref().collect::<String>(), "bb");
        assert_eq!(execution.trace().pauses, 2);

        // Level 5 also stops at every episode: two episodes, two replacements.
        let mut execution = Execution::with_trace("/a/b/aa/c/d/", Verbosity::StepReplacements, TraceBuffer::new());
        assert_eq!(execution.by_ref().collect::<String>(), "bb");
        assert_eq!(execution.trace().pauses, 4);
    }
}
