//! Aggregate and per-parser throughput counters.
//!
//! One classifier instance owns one set of counters for the duration of an
//! ingestion session (typically one file or one stream); the caller drains
//! them before disposal. Every counter is monotonically non-decreasing for
//! the life of the instance.

use std::collections::HashMap;

use serde::Serialize;

/// Aggregate counters for one classifier instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifierStats {
    /// Total time spent classifying, in microseconds.
    pub classify_time_micros: u64,
    /// Raw input bytes, summed over every classify call.
    pub bytes_processed_count: u64,
    /// Input records. Whitespace-only lines count; zero-length input does not.
    pub log_line_count: u64,
    /// Output records materialized at classify time. Events delivered
    /// through a stream are accounted per parser, not here.
    pub event_count: u64,
    pub successfully_classified_count: u64,
    pub classification_failure_count: u64,
}

/// Per-log-type counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParserStats {
    pub log_type: String,
    /// Total time spent inside the parser and its stream, in microseconds.
    pub parser_time_micros: u64,
    /// Trimmed input bytes handed to the parser.
    pub bytes_processed_count: u64,
    pub log_line_count: u64,
    /// Events delivered to the caller, batches and stream advances combined.
    pub event_count: u64,
}

/// Per-parser stats table, keyed by log type.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ParserStatsTable {
    entries: HashMap<String, ParserStats>,
}

impl ParserStatsTable {
    pub fn get(&self, log_type: &str) -> Option<&ParserStats> {
        self.entries.get(log_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParserStats)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold one observation into the table. An empty log type is a no-op.
    /// The first observation for a key installs it; later observations add
    /// the four numeric fields into the existing entry.
    pub(crate) fn update(&mut self, obs: ParserStats) {
        if obs.log_type.is_empty() {
            return;
        }
        match self.entries.get_mut(&obs.log_type) {
            Some(entry) => {
                entry.parser_time_micros += obs.parser_time_micros;
                entry.bytes_processed_count += obs.bytes_processed_count;
                entry.log_line_count += obs.log_line_count;
                entry.event_count += obs.event_count;
            }
            None => {
                self.entries.insert(obs.log_type.clone(), obs);
            }
        }
    }
}
