//! Data model — parsed events, parse outcomes, and parser errors.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// A structured record produced by a parser.
///
/// The engine treats the payload as opaque: only the `log_type` tag takes
/// part in classification bookkeeping. The timestamp is whatever the source
/// format carried, when the parser could extract one.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedEvent {
    /// Stable identifier of the log format, e.g. `"Suricata.DNS"`.
    pub log_type: String,

    /// Timestamp extracted from the event itself (not ingestion time).
    /// Serializes as an ISO-8601 string automatically.
    pub timestamp: Option<DateTime<Utc>>,

    /// Structured event body.
    pub payload: serde_json::Value,

    /// Original raw content (always preserved).
    /// Skipped during serialization - raw logs ship separately.
    #[serde(skip)]
    pub raw: Bytes,
}

impl ParsedEvent {
    pub fn new(log_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            log_type: log_type.into(),
            timestamp: None,
            payload,
            raw: Bytes::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_raw(mut self, raw: Bytes) -> Self {
        self.raw = raw;
        self
    }
}

/// A lazy, finite, non-restartable sequence of parsed events originating
/// from one log line. Terminal after the first `Err`.
pub type ResultStream = Box<dyn Iterator<Item = Result<ParsedEvent, ParseError>> + Send>;

/// How a parser delivers events for one recognized line.
///
/// Recognition failure is not represented here; it is the `Err` channel of
/// [`LogParser::parse_log`](crate::traits::LogParser::parse_log).
pub enum ParseOutcome {
    /// All events materialized eagerly. May be empty.
    Batch(Vec<ParsedEvent>),
    /// Events arrive lazily. Used when a single line expands into many
    /// events (e.g. a container of records) and materializing them up front
    /// would be wasteful.
    Stream(ResultStream),
}

impl std::fmt::Debug for ParseOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseOutcome::Batch(events) => f.debug_tuple("Batch").field(&events.len()).finish(),
            ParseOutcome::Stream(_) => f.debug_tuple("Stream").finish(),
        }
    }
}

/// Why a parser did not produce events for a line.
///
/// To the classification loop every variant means the same thing - "this
/// line is not of this parser's format" - but the variants keep diagnostics
/// precise.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Line too large: {0} bytes (max: {1} bytes)")]
    LineTooLarge(usize, usize),

    /// Synthesized by the engine's fault guard when a parser panics.
    #[error("parser {log_type:?} panic: {message}")]
    ParserPanic { log_type: String, message: String },

    #[error("Parse failed: {0}")]
    ParseFailed(String),

    #[error("Stream failed: {0}")]
    StreamFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_event_builder_defaults() {
        let event = ParsedEvent::new("Test.Format", serde_json::json!({"k": "v"}));
        assert_eq!(event.log_type, "Test.Format");
        assert!(event.timestamp.is_none());
        assert!(event.raw.is_empty());
    }

    #[test]
    fn parsed_event_serializes_without_raw() {
        let event = ParsedEvent::new("Test.Format", serde_json::json!({"k": "v"}))
            .with_raw(Bytes::from_static(b"original line"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["log_type"], "Test.Format");
        assert_eq!(json["payload"]["k"], "v");
        assert!(json.get("raw").is_none(), "raw bytes must not be serialized");
    }

    #[test]
    fn parser_panic_error_names_the_parser() {
        let err = ParseError::ParserPanic {
            log_type: "Suricata.DNS".to_string(),
            message: "index out of bounds".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Suricata.DNS"));
        assert!(msg.contains("index out of bounds"));
    }
}
