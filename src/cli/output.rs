//! Handles all user-facing trace output for the CLI.
//!
//! Program output goes to stdout untouched; everything here writes to stderr
//! so the two channels never interleave in a captured stdout.

// ============================================================================
// TRACE SINKS: TerminalTracer and JsonTracer implementations
// ============================================================================

use std::io::{self, BufRead, Write};

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use unicode_width::UnicodeWidthStr;

use crate::{
    errors::{Result, SlashesError},
    samples::Sample,
    trace::{TraceEvent, TraceSink},
};

/// Column at which program text starts after the `INPUT:`/`APPLY:` labels.
const LABEL_WIDTH: usize = 8;

/// Renders trace events as colored text on stderr.
///
/// Each applied directive is shown with a marker line whose `v`s sit above
/// the three slashes of `/pattern/replacement/`.
pub struct TerminalTracer {
    out: StandardStream,
    diff: bool,
    last_program: Option<String>,
    error: Option<io::Error>,
}

impl TerminalTracer {
    pub fn new(color: ColorChoice, diff: bool) -> Self {
        Self {
            out: StandardStream::stderr(color),
            diff,
            last_program: None,
            error: None,
        }
    }

    /// Surface the first write failure, if any.
    pub fn finish(mut self) -> Result<()> {
        match self.error.take() {
            Some(e) => Err(SlashesError::Write(e)),
            None => Ok(()),
        }
    }

    fn render(&mut self, event: &TraceEvent) -> io::Result<()> {
        match event {
            TraceEvent::Start { program } => {
                self.label("INPUT:", Color::Cyan)?;
                writeln!(self.out, "{}\n", program)?;
                self.last_program = Some(program.clone());
            }
            TraceEvent::Episode {
                pattern,
                replacement,
                program,
            }
            | TraceEvent::Replacement {
                pattern,
                replacement,
                program,
                ..
            } => {
                self.render_apply(pattern, replacement, program)?;
            }
            TraceEvent::EpisodeEnd {
                pattern,
                replacements,
                ..
            } => {
                self.out
                    .set_color(ColorSpec::new().set_fg(Some(Color::Black)).set_intense(true))?;
                writeln!(
                    self.out,
                    "{:width$}'{}' replaced {} time(s), no occurrence left\n",
                    "",
                    pattern,
                    replacements,
                    width = LABEL_WIDTH
                )?;
                self.out.reset()?;
            }
            TraceEvent::Finish { output, halt } => {
                writeln!(self.out)?;
                self.label("OUTPUT:", Color::Green)?;
                writeln!(self.out, "{}", output)?;
                if halt.is_malformed() {
                    self.out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
                    writeln!(self.out, "{:width$}halted: {}", "", halt.describe(), width = LABEL_WIDTH)?;
                    self.out.reset()?;
                }
            }
        }
        self.out.flush()
    }

    fn render_apply(&mut self, pattern: &str, replacement: &str, program: &str) -> io::Result<()> {
        writeln!(
            self.out,
            "{:label$}v{:pat$}v{:rep$}v",
            "",
            "",
            "",
            label = LABEL_WIDTH,
            pat = pattern.width(),
            rep = replacement.width()
        )?;
        self.label("APPLY:", Color::Yellow)?;
        write!(self.out, "/{}/{}/", pattern, replacement)?;
        match (self.diff, self.last_program.as_deref()) {
            (true, Some(previous)) => {
                let changeset = Changeset::new(previous, program, "");
                print_changes(&mut self.out, &changeset.diffs)?;
            }
            _ => write!(self.out, "{}", program)?,
        }
        writeln!(self.out, "\n")?;
        self.last_program = Some(program.to_string());
        Ok(())
    }

    fn label(&mut self, text: &str, color: Color) -> io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        write!(self.out, "{:width$}", text, width = LABEL_WIDTH)?;
        self.out.reset()
    }

    fn pause(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        write!(self.out, "\nPress <Return> to resume execution")?;
        self.out.flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        // Erase the prompt so the trace reads continuously.
        write!(self.out, "\x1b[1A\x1b[2K\x1b[1A\x1b[2K\x1b[1A\n")?;
        self.out.flush()
    }
}

impl TraceSink for TerminalTracer {
    fn record(&mut self, event: &TraceEvent) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.render(event) {
            self.error = Some(e);
        }
    }

    fn acknowledge(&mut self) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.pause() {
            self.error = Some(e);
        }
    }
}

/// Writes each trace event as one line of JSON.
pub struct JsonTracer<W: Write> {
    writer: W,
    error: Option<SlashesError>,
}

impl<W: Write> JsonTracer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    pub fn finish(mut self) -> Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_event(&mut self, event: &TraceEvent) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> TraceSink for JsonTracer<W> {
    fn record(&mut self, event: &TraceEvent) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write_event(event) {
            self.error = Some(e);
        }
    }
}

// ============================================================================
// CORE OUTPUT FUNCTIONS
// ============================================================================

/// Color only when the stream is an interactive terminal.
pub fn color_choice(stream: atty::Stream) -> ColorChoice {
    if atty::is(stream) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Lists the built-in samples on stdout.
pub fn print_samples(samples: &[Sample]) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(atty::Stream::Stdout));
    let width = samples.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for sample in samples {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(stdout, "{:width$}", sample.name, width = width)?;
        stdout.reset()?;
        let halts = if sample.expected.is_some() { "" } else { " (never halts)" };
        writeln!(stdout, "  {}{}", sample.description, halts)?;
    }
    stdout.flush()
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_changes(out: &mut StandardStream, diffs: &[Difference]) -> io::Result<()> {
    for diff in diffs {
        match diff {
            Difference::Same(x) => {
                out.reset()?;
                write!(out, "{}", x)?;
            }
            Difference::Add(x) => {
                out.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                write!(out, "{}", x)?;
            }
            // Removed text is not part of the new program.
            Difference::Rem(_) => {}
        }
    }
    out.reset()
}
