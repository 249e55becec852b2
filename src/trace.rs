//! Observational trace channel.
//!
//! The engine reports what it is doing to a [`TraceSink`] as a side channel.
//! How much it reports is governed by [`Verbosity`]; nothing a sink does can
//! change what the program outputs.

use serde::Serialize;

use crate::engine::Halt;

// ============================================================================
// VERBOSITY
// ============================================================================

/// How much of an execution gets reported to the trace sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    /// No trace at all.
    #[default]
    Silent = 0,
    /// Initial program and final output.
    Summary = 1,
    /// Plus every substitution episode, before and after.
    Episodes = 2,
    /// Plus every individual replacement inside an episode.
    Replacements = 3,
    /// As `Episodes`, pausing whenever an episode is announced.
    StepEpisodes = 4,
    /// As `Replacements`, also pausing after every replacement.
    StepReplacements = 5,
}

impl Verbosity {
    pub const MAX_LEVEL: i64 = 5;

    /// Map a numeric level onto the nearest defined verbosity.
    pub fn from_level(level: i64) -> Self {
        match level.clamp(0, Self::MAX_LEVEL) {
            0 => Self::Silent,
            1 => Self::Summary,
            2 => Self::Episodes,
            3 => Self::Replacements,
            4 => Self::StepEpisodes,
            _ => Self::StepReplacements,
        }
    }

    pub fn level(self) -> i64 {
        self as i64
    }

    pub fn reports_summary(self) -> bool {
        self >= Self::Summary
    }

    pub fn reports_episodes(self) -> bool {
        self >= Self::Episodes
    }

    pub fn reports_replacements(self) -> bool {
        matches!(self, Self::Replacements | Self::StepReplacements)
    }

    pub fn pauses_after_episode(self) -> bool {
        self >= Self::StepEpisodes
    }

    pub fn pauses_after_replacement(self) -> bool {
        self == Self::StepReplacements
    }
}

impl From<i64> for Verbosity {
    fn from(level: i64) -> Self {
        Self::from_level(level)
    }
}

// ============================================================================
// TRACE EVENTS
// ============================================================================

/// One reported moment of an execution.
///
/// `program` fields always hold the program buffer as it was at that moment,
/// i.e. the text following the directive currently being applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Start {
        program: String,
    },
    Episode {
        pattern: String,
        replacement: String,
        program: String,
    },
    Replacement {
        pattern: String,
        replacement: String,
        program: String,
        repetition: u64,
    },
    EpisodeEnd {
        pattern: String,
        replacement: String,
        program: String,
        replacements: u64,
    },
    Finish {
        output: String,
        halt: Halt,
    },
}

impl TraceEvent {
    /// Short label used by text renderers and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TraceEvent::Start { .. } => "start",
            TraceEvent::Episode { .. } => "episode",
            TraceEvent::Replacement { .. } => "replacement",
            TraceEvent::EpisodeEnd { .. } => "episode_end",
            TraceEvent::Finish { .. } => "finish",
        }
    }
}

// ============================================================================
// SINKS
// ============================================================================

/// Receiver for trace events, to make tracing testable and injectable.
pub trait TraceSink {
    fn record(&mut self, event: &TraceEvent);

    /// Called at pause points. Interactive sinks block here until the user
    /// lets execution resume.
    fn acknowledge(&mut self) {}

    /// Whether events reach anything. The engine skips building trace state
    /// for sinks that return `false`.
    fn is_active(&self) -> bool {
        true
    }
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn record(&mut self, event: &TraceEvent) {
        (**self).record(event);
    }

    fn acknowledge(&mut self) {
        (**self).acknowledge();
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}

impl<T: TraceSink + ?Sized> TraceSink for Box<T> {
    fn record(&mut self, event: &TraceEvent) {
        (**self).record(event);
    }

    fn acknowledge(&mut self) {
        (**self).acknowledge();
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn record(&mut self, _event: &TraceEvent) {}

    fn is_active(&self) -> bool {
        false
    }
}

/// Collects events in memory for testing or programmatic capture.
#[derive(Debug, Clone, Default)]
pub struct TraceBuffer {
    pub events: Vec<TraceEvent>,
    pub pauses: usize,
}

impl TraceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of substitution episodes announced so far.
    pub fn episode_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Episode { .. }))
            .count()
    }

    pub fn replacement_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Replacement { .. }))
            .count()
    }
}

impl TraceSink for TraceBuffer {
    fn record(&mut self, event: &TraceEvent) {
        self.events.push(event.clone());
    }

    fn acknowledge(&mut self) {
        self.pauses += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_levels_clamp() {
        assert_eq!(Verbosity::from_level(-3), Verbosity::Silent);
        assert_eq!(Verbosity::from_level(2), Verbosity::Episodes);
        assert_eq!(Verbosity::from_level(99), Verbosity::StepReplacements);
    }

    #[test]
    fn level_predicates_follow_the_scheme() {
        let v = Verbosity::StepEpisodes;
        assert!(v.reports_summary());
        assert!(v.reports_episodes());
        assert!(!v.reports_replacements());
        assert!(v.pauses_after_episode());
        assert!(!v.pauses_after_replacement());

        let v = Verbosity::StepReplacements;
        assert!(v.reports_replacements());
        assert!(v.pauses_after_replacement());

        assert!(!Verbosity::Silent.reports_summary());
        assert!(!Verbosity::Replacements.pauses_after_episode());
    }

    #[test]
    fn only_the_null_sink_is_inactive() {
        assert!(!NullTrace.is_active());
        assert!(TraceBuffer::new().is_active());
        let mut buffer = TraceBuffer::new();
        assert!((&mut buffer).is_active());
        let boxed: Box<dyn TraceSink> = Box::new(NullTrace);
        assert!(!boxed.is_active());
    }

    #[test]
    fn events_serialize_with_a_tag() {
        let event = TraceEvent::Start {
            program: "hi".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"start","program":"hi"}"#);
    }
}
