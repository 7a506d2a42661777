//! Run-log artifact: the handoff between the experience runner and the
//! metrics evaluator.
//!
//! The runner builds a [`RunRecord`] in memory and flushes it as text with
//! [`codec::render`]; the evaluator reads it back with [`codec::load`].
//! When both stages share a process the record is handed over directly and
//! never passes through text.

pub mod codec;
pub mod event;
pub mod record;

pub use codec::{load, parse, render, ParsedArtifact, COMPLETION_SENTINEL, MISSING_MARKER_MESSAGE};
pub use event::{LogLevel, RunLogEvent};
pub use record::RunRecord;
