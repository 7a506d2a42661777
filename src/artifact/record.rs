//! The runner's record of what happened during a run.

use serde::{Deserialize, Serialize};

use super::event::{LogLevel, RunLogEvent};

/// Ordered events of a run plus its completion flag.
///
/// A record starts incomplete; the runner marks it complete once every
/// asset has been processed, or aborts it with an ERROR event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Events in chronological (insertion) order.
    pub events: Vec<RunLogEvent>,
    /// False when the run was aborted or never finished.
    pub completed: bool,
}

impl RunRecord {
    /// Creates an empty, not yet completed record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&mut self, event: RunLogEvent) {
        self.events.push(event);
    }

    /// Appends an INFO event stamped now.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(RunLogEvent::now(LogLevel::Info, message));
    }

    /// Appends a WARNING event stamped now.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(RunLogEvent::now(LogLevel::Warning, message));
    }

    /// Appends an ERROR event stamped now.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(RunLogEvent::now(LogLevel::Error, message));
    }

    /// Marks the run as completed.
    pub fn complete(&mut self) {
        self.completed = true;
    }

    /// Marks the run as aborted, recording the cause as an ERROR event.
    pub fn abort(&mut self, cause: impl Into<String>) {
        self.error(cause);
        self.completed = false;
    }

    /// Number of events with the given level, synthesized ones included.
    pub fn count(&self, level: LogLevel) -> usize {
        self.events.iter().filter(|e| e.level == level).count()
    }

    /// Events read from a real clock, in order.
    pub fn observed_events(&self) -> impl Iterator<Item = &RunLogEvent> {
        self.events.iter().filter(|e| !e.synthesized)
    }

    /// Seconds between the first and last observed event.
    ///
    /// `None` when there is no observed event, zero for a single one.
    pub fn observed_duration_secs(&self) -> Option<f64> {
        let first = self.observed_events().next()?;
        let last = self.observed_events().last()?;
        let span = last.timestamp - first.timestamp;
        Some(match span.num_microseconds() {
            Some(us) => us as f64 / 1_000_000.0,
            None => span.num_milliseconds() as f64 / 1_000.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_710_756_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_new_record_is_incomplete() {
        let record = RunRecord::new();
        assert!(!record.completed);
        assert!(record.events.is_empty());
    }

    #[test]
    fn test_abort_appends_error_and_clears_flag() {
        let mut record = RunRecord::new();
        record.complete();
        record.abort("disk on fire");
        assert!(!record.completed);
        assert_eq!(record.count(LogLevel::Error), 1);
        assert_eq!(record.events[0].message, "disk on fire");
    }

    #[test]
    fn test_duration_spans_first_to_last() {
        let mut record = RunRecord::new();
        record.push(RunLogEvent::new(at(0), LogLevel::Info, "a"));
        record.push(RunLogEvent::new(at(3), LogLevel::Warning, "b"));
        record.push(RunLogEvent::new(at(10), LogLevel::Info, "c"));
        assert_eq!(record.observed_duration_secs(), Some(10.0));
    }

    #[test]
    fn test_duration_edge_cases() {
        let mut record = RunRecord::new();
        assert_eq!(record.observed_duration_secs(), None);

        record.push(RunLogEvent::new(at(5), LogLevel::Info, "only"));
        assert_eq!(record.observed_duration_secs(), Some(0.0));
    }

    #[test]
    fn test_synthesized_events_do_not_extend_duration() {
        let mut record = RunRecord::new();
        record.push(RunLogEvent::new(at(0), LogLevel::Info, "a"));
        record.push(RunLogEvent::new(at(2), LogLevel::Info, "b"));
        record.push(RunLogEvent::synthesized(at(500), LogLevel::Error, "inferred"));

        assert_eq!(record.observed_duration_secs(), Some(2.0));
        assert_eq!(record.count(LogLevel::Error), 1);
    }

    #[test]
    fn test_duplicate_events_are_counted_independently() {
        let mut record = RunRecord::new();
        let event = RunLogEvent::new(at(1), LogLevel::Warning, "same");
        record.push(event.clone());
        record.push(event);
        assert_eq!(record.count(LogLevel::Warning), 2);
    }
}
