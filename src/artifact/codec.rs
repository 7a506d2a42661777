//! Text encoding of run records (`run.log`, schema `run-log/1`).
//!
//! ```text
//! # schema: run-log/1
//! 2024-03-18T10:00:00.000000Z INFO starting experience 'hover'
//! 2024-03-18T10:00:01.250000Z WARNING asset 'flight_log.json' is not valid JSON
//! RUN_COMPLETE=true
//! ```
//!
//! Reading is tolerant: event lines that do not parse are skipped and
//! counted. A missing `RUN_COMPLETE` sentinel marks the run incomplete and
//! adds an inferred ERROR event.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use tracing::debug;

use super::event::{LogLevel, RunLogEvent};
use super::record::RunRecord;
use crate::error::ArtifactError;

/// Schema major version written and accepted by this codec.
pub const SCHEMA_VERSION: u32 = 1;

/// Completion sentinel key.
pub const COMPLETION_SENTINEL: &str = "RUN_COMPLETE";

/// Message of the event inferred when the sentinel is absent.
pub const MISSING_MARKER_MESSAGE: &str = "missing completion marker";

const SCHEMA_KEY: &str = "schema:";
const SCHEMA_NAME: &str = "run-log/";

/// A run record recovered from text, with parsing diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArtifact {
    pub record: RunRecord,
    /// Lines skipped because they did not match any record shape.
    pub parse_warning_count: usize,
    /// True when the completion sentinel was absent.
    pub marker_missing: bool,
}

/// Renders a record as run-log text, header and sentinel included.
///
/// Synthesized events are not written: they are re-derived on read.
pub fn render(record: &RunRecord) -> String {
    let mut lines = vec![format!("# {} {}{}", SCHEMA_KEY, SCHEMA_NAME, SCHEMA_VERSION)];
    lines.extend(
        record
            .events
            .iter()
            .filter(|e| !e.synthesized)
            .map(|event| {
                format!(
                    "{} {} {}",
                    event.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                    event.level,
                    event.message.replace(['\n', '\r'], " ")
                )
            }),
    );
    lines.push(format!("{}={}", COMPLETION_SENTINEL, record.completed));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Parses run-log text.
///
/// Only the first non-empty line can carry the schema header; an
/// unsupported header there rejects the whole log. Every other line that
/// does not parse, an invalid `RUN_COMPLETE` value included, is skipped and
/// counted.
///
/// Returns the reason as text when the content cannot be read as a run log
/// at all; [`load`] attaches the path.
pub fn parse(content: &str) -> Result<ParsedArtifact, String> {
    let mut record = RunRecord::new();
    let mut parse_warning_count = 0;
    let mut sentinel: Option<bool> = None;
    let mut recognized = false;

    let lines = content
        .lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, raw.trim()))
        .filter(|(_, line)| !line.is_empty());

    for (position, (line_no, line)) in lines.enumerate() {
        if sentinel.is_some() {
            debug!("line {}: content after completion sentinel", line_no);
            parse_warning_count += 1;
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            if position == 0 {
                if let Some(version) = parse_schema_header(comment)? {
                    if version != SCHEMA_VERSION {
                        return Err(format!(
                            "unsupported schema version {} (expected {})",
                            version, SCHEMA_VERSION
                        ));
                    }
                    recognized = true;
                }
            }
            continue;
        }

        if let Some(value) = line
            .strip_prefix(COMPLETION_SENTINEL)
            .and_then(|rest| rest.strip_prefix('='))
        {
            match value.trim() {
                "true" => sentinel = Some(true),
                "false" => sentinel = Some(false),
                other => {
                    debug!(
                        "line {}: invalid {} value '{}'",
                        line_no, COMPLETION_SENTINEL, other
                    );
                    parse_warning_count += 1;
                    continue;
                }
            }
            recognized = true;
            continue;
        }

        match parse_event_line(line) {
            Some(event) => {
                record.push(event);
                recognized = true;
            }
            None => {
                debug!("line {}: skipping unrecognized record", line_no);
                parse_warning_count += 1;
            }
        }
    }

    if !recognized && parse_warning_count > 0 {
        return Err(format!(
            "none of {} non-empty lines is a run-log record",
            parse_warning_count
        ));
    }

    let marker_missing = sentinel.is_none();
    record.completed = sentinel.unwrap_or(false);
    if marker_missing {
        let stamp = record
            .observed_events()
            .last()
            .map(|e| e.timestamp)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        record.push(RunLogEvent::synthesized(
            stamp,
            LogLevel::Error,
            MISSING_MARKER_MESSAGE,
        ));
    }

    Ok(ParsedArtifact {
        record,
        parse_warning_count,
        marker_missing,
    })
}

/// Reads and parses the run log at `path`.
pub fn load(path: &Path) -> Result<ParsedArtifact, ArtifactError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArtifactError::NotFound(path.to_path_buf()),
        _ => ArtifactError::Read {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let content = String::from_utf8(bytes).map_err(|e| ArtifactError::Malformed {
        path: path.to_path_buf(),
        reason: format!("not valid UTF-8: {}", e),
    })?;

    parse(&content).map_err(|reason| ArtifactError::Malformed {
        path: path.to_path_buf(),
        reason,
    })
}

/// Returns the schema version of a `schema:` comment, `None` for other comments.
fn parse_schema_header(comment: &str) -> Result<Option<u32>, String> {
    let Some(schema) = comment.trim().strip_prefix(SCHEMA_KEY) else {
        return Ok(None);
    };
    let schema = schema.trim();
    schema
        .strip_prefix(SCHEMA_NAME)
        .and_then(|v| v.parse::<u32>().ok())
        .map(Some)
        .ok_or_else(|| format!("unsupported schema '{}'", schema))
}

/// Parses `<timestamp> <LEVEL> <message>`.
fn parse_event_line(line: &str) -> Option<RunLogEvent> {
    let mut parts = line.splitn(3, ' ');
    let timestamp = parse_timestamp(parts.next()?)?;
    let level = parts.next()?.parse::<LogLevel>().ok()?;
    let message = parts.next().unwrap_or("");
    Some(RunLogEvent::new(timestamp, level, message))
}

/// Accepts RFC 3339, or a naive ISO-8601 date-time taken as UTC.
fn parse_timestamp(token: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(token) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(token, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BASELINE: &str = "\
# schema: run-log/1
2024-03-18T10:00:00Z INFO takeoff
2024-03-18T10:00:05Z INFO hovering
2024-03-18T10:00:09.500Z INFO landed
RUN_COMPLETE=true
";

    #[test]
    fn test_parse_baseline() {
        let parsed = parse(BASELINE).unwrap();
        assert_eq!(parsed.record.events.len(), 3);
        assert!(parsed.record.completed);
        assert!(!parsed.marker_missing);
        assert_eq!(parsed.parse_warning_count, 0);
        assert_eq!(parsed.record.events[2].message, "landed");
        assert_eq!(parsed.record.observed_duration_secs(), Some(9.5));
    }

    #[test]
    fn test_naive_timestamps_are_utc() {
        let parsed = parse("2024-03-18T10:00:00 INFO a\n2024-03-18T10:00:01.25 INFO b\nRUN_COMPLETE=true\n").unwrap();
        assert_eq!(parsed.record.events.len(), 2);
        assert_eq!(parsed.record.observed_duration_secs(), Some(1.25));
    }

    #[test]
    fn test_message_keeps_inner_spaces_and_may_be_empty() {
        let parsed = parse("2024-03-18T10:00:00Z WARNING low  battery level\n2024-03-18T10:00:01Z INFO\nRUN_COMPLETE=true").unwrap();
        assert_eq!(parsed.record.events[0].message, "low  battery level");
        assert_eq!(parsed.record.events[1].message, "");
    }

    #[test]
    fn test_malformed_lines_are_counted_not_fatal() {
        let content = "\
2024-03-18T10:00:00Z INFO ok
this is not a record
2024-03-18T10:00:01Z DEBUG unknown level
yesterday INFO bad timestamp
RUN_COMPLETE=true
";
        let parsed = parse(content).unwrap();
        assert_eq!(parsed.record.events.len(), 1);
        assert_eq!(parsed.parse_warning_count, 3);
        assert!(parsed.record.completed);
    }

    #[test]
    fn test_blank_lines_and_comments_are_ignored() {
        let parsed = parse("\n# produced by hand\n\n2024-03-18T10:00:00Z INFO a\n\nRUN_COMPLETE=false\n").unwrap();
        assert_eq!(parsed.parse_warning_count, 0);
        assert_eq!(parsed.record.events.len(), 1);
        assert!(!parsed.record.completed);
        assert!(!parsed.marker_missing);
    }

    #[test]
    fn test_missing_sentinel_adds_inferred_error() {
        let parsed = parse("2024-03-18T10:00:00Z INFO a\n2024-03-18T10:00:02Z INFO b\n").unwrap();
        assert!(parsed.marker_missing);
        assert!(!parsed.record.completed);
        assert_eq!(parsed.record.count(LogLevel::Error), 1);

        let inferred = parsed.record.events.last().unwrap();
        assert!(inferred.synthesized);
        assert_eq!(inferred.message, MISSING_MARKER_MESSAGE);
        assert_eq!(parsed.record.observed_duration_secs(), Some(2.0));
    }

    #[test]
    fn test_lines_after_sentinel_are_warnings() {
        let parsed = parse("RUN_COMPLETE=true\n2024-03-18T10:00:00Z INFO late\n").unwrap();
        assert!(parsed.record.events.is_empty());
        assert_eq!(parsed.parse_warning_count, 1);
    }

    #[test]
    fn test_invalid_sentinel_value_is_a_parse_warning() {
        let parsed = parse("2024-03-18T10:00:00Z INFO a\nRUN_COMPLETE=yes\n2024-03-18T10:00:01Z INFO b\nRUN_COMPLETE=true\n").unwrap();
        assert_eq!(parsed.parse_warning_count, 1);
        assert_eq!(parsed.record.events.len(), 2);
        assert!(parsed.record.completed);
        assert!(!parsed.marker_missing);
    }

    #[test]
    fn test_invalid_sentinel_alone_is_malformed() {
        let err = parse("RUN_COMPLETE=maybe\n").unwrap_err();
        assert!(err.contains("non-empty lines"));
    }

    #[test]
    fn test_unsupported_schema_is_malformed() {
        assert!(parse("# schema: run-log/2\nRUN_COMPLETE=true\n").is_err());
        assert!(parse("# schema: flight-log/1\nRUN_COMPLETE=true\n").is_err());
        assert!(parse("\n#schema: garbage\nRUN_COMPLETE=true\n").is_err());
    }

    #[test]
    fn test_schema_comment_after_first_line_is_ignored() {
        let content = "\
# schema: run-log/1
2024-03-18T10:00:00Z INFO a
#schema: garbage
# schema: run-log/7
RUN_COMPLETE=true
";
        let parsed = parse(content).unwrap();
        assert_eq!(parsed.parse_warning_count, 0);
        assert_eq!(parsed.record.events.len(), 1);
        assert!(parsed.record.completed);
    }

    #[test]
    fn test_only_garbage_is_malformed() {
        assert!(parse("{\"samples\": []}\nnot a log\n").is_err());
    }

    #[test]
    fn test_empty_content_is_incomplete_not_malformed() {
        let parsed = parse("").unwrap();
        assert!(parsed.marker_missing);
        assert_eq!(parsed.record.count(LogLevel::Error), 1);
        assert_eq!(parsed.record.observed_duration_secs(), None);
    }

    #[test]
    fn test_render_then_parse_preserves_events() {
        let mut record = RunRecord::new();
        record.info("starting");
        record.warning("multi\nline");
        record.complete();

        let text = render(&record);
        assert!(text.starts_with("# schema: run-log/1\n"));
        assert!(text.ends_with("RUN_COMPLETE=true\n"));

        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.parse_warning_count, 0);
        assert_eq!(parsed.record.events.len(), 2);
        assert_eq!(parsed.record.events[1].message, "multi line");
        assert_eq!(parsed.record.events[1].level, LogLevel::Warning);
        assert!(parsed.record.completed);
        for (read, written) in parsed.record.events.iter().zip(&record.events) {
            assert_eq!(read.timestamp, written.timestamp);
        }
        assert_eq!(
            parsed.record.observed_duration_secs(),
            record.observed_duration_secs()
        );
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logs/run.log");
        assert!(matches!(load(&path), Err(ArtifactError::NotFound(p)) if p == path));
    }

    #[test]
    fn test_load_non_utf8_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run.log");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();
        assert!(matches!(load(&path), Err(ArtifactError::Malformed { .. })));
    }
}
