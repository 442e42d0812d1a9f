//! AWS CloudTrail log parser.
//!
//! A CloudTrail log line is one JSON envelope `{"Records": [...]}` that
//! routinely holds thousands of management events. The parser validates the
//! envelope eagerly and hands the records back as a lazy stream, so the
//! engine never materializes the whole batch at classification time.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{ParseError, ParseOutcome, ParsedEvent};
use crate::traits::LogParser;

pub const LOG_TYPE: &str = "AWS.CloudTrail";

/// Default maximum document size (16MB). CloudTrail delivers whole files as
/// single JSON documents, so the ceiling is far above single-line formats.
const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Configuration for the CloudTrail parser
#[derive(Debug, Clone)]
pub struct CloudTrailConfig {
    /// Maximum document size to prevent DoS with oversized envelopes
    pub max_document_size: usize,
}

impl Default for CloudTrailConfig {
    fn default() -> Self {
        Self {
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }
}

pub struct CloudTrailParser {
    config: CloudTrailConfig,
}

impl CloudTrailParser {
    pub fn new() -> Self {
        Self {
            config: CloudTrailConfig::default(),
        }
    }

    pub fn with_config(config: CloudTrailConfig) -> Self {
        Self { config }
    }
}

impl Default for CloudTrailParser {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Records")]
    records: Vec<serde_json::Value>,
}

impl LogParser for CloudTrailParser {
    fn parse_log(&self, line: &str) -> Result<ParseOutcome, ParseError> {
        if line.len() > self.config.max_document_size {
            return Err(ParseError::LineTooLarge(
                line.len(),
                self.config.max_document_size,
            ));
        }

        // Quick reject before deserializing the whole document.
        if !line.starts_with('{') || !line.ends_with('}') {
            return Err(ParseError::InvalidFormat("not a JSON object".to_string()));
        }

        // A document without a Records array is some other JSON format.
        let envelope: Envelope = serde_json::from_str(line)
            .map_err(|e| ParseError::ParseFailed(format!("not a CloudTrail envelope: {e}")))?;

        let stream = envelope.records.into_iter().map(|record| {
            let timestamp = record
                .get("eventTime")
                .and_then(|v| v.as_str())
                .and_then(parse_event_time);
            let raw = Bytes::from(record.to_string());
            let mut event = ParsedEvent::new(LOG_TYPE, record).with_raw(raw);
            if let Some(ts) = timestamp {
                event = event.with_timestamp(ts);
            }
            Ok(event)
        });

        Ok(ParseOutcome::Stream(Box::new(stream)))
    }

    fn log_type(&self) -> &str {
        LOG_TYPE
    }
}

/// `eventTime` is RFC 3339 (`2021-02-14T13:44:00Z`); extraction is
/// best-effort and never fails the record.
fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"Records":[{"eventVersion":"1.08","eventTime":"2021-02-14T13:44:00Z","eventSource":"s3.amazonaws.com","eventName":"GetObject","awsRegion":"us-east-1"},{"eventVersion":"1.08","eventTime":"2021-02-14T13:45:10Z","eventSource":"iam.amazonaws.com","eventName":"CreateUser","awsRegion":"us-east-1"}]}"#;

    fn stream_of(outcome: ParseOutcome) -> Vec<ParsedEvent> {
        match outcome {
            ParseOutcome::Stream(stream) => stream.map(|r| r.unwrap()).collect(),
            ParseOutcome::Batch(_) => panic!("CloudTrail parser delivers streams"),
        }
    }

    #[test]
    fn envelope_yields_one_event_per_record() {
        let parser = CloudTrailParser::new();

        let events = stream_of(parser.parse_log(SAMPLE).unwrap());
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].log_type, LOG_TYPE);
        assert_eq!(events[0].payload["eventName"], "GetObject");
        assert_eq!(
            events[0].timestamp.unwrap().to_rfc3339(),
            "2021-02-14T13:44:00+00:00"
        );
        assert_eq!(events[1].payload["eventName"], "CreateUser");
        assert!(!events[1].raw.is_empty());
    }

    #[test]
    fn empty_records_array_is_a_successful_empty_stream() {
        let parser = CloudTrailParser::new();

        let events = stream_of(parser.parse_log(r#"{"Records":[]}"#).unwrap());
        assert!(events.is_empty());
    }

    #[test]
    fn rejects_documents_without_records() {
        let parser = CloudTrailParser::new();

        for line in [
            r#"{"level":"info","msg":"hello"}"#,
            r#"{"records":[]}"#,
            "plain text line",
        ] {
            assert!(parser.parse_log(line).is_err(), "should reject {:?}", line);
        }
    }

    #[test]
    fn rejects_oversized_documents() {
        let parser = CloudTrailParser::with_config(CloudTrailConfig {
            max_document_size: 32,
        });
        let big = format!(r#"{{"Records":[{{"a":"{}"}}]}}"#, "x".repeat(64));

        let result = parser.parse_log(&big);
        assert!(matches!(result, Err(ParseError::LineTooLarge(_, 32))));
    }

    #[test]
    fn missing_event_time_leaves_timestamp_empty() {
        let parser = CloudTrailParser::new();
        let line = r#"{"Records":[{"eventName":"GetObject"}]}"#;

        let events = stream_of(parser.parse_log(line).unwrap());
        assert_eq!(events.len(), 1);
        assert!(events[0].timestamp.is_none());
    }
}
