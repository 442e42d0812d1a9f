//! Classifier — parser selection, fault isolation, and stats roll-up.
//!
//! One classifier owns a [`ParserPriorityQueue`] and two stats tables for
//! the duration of an ingestion session (typically one file or one stream).
//! Each `classify` call probes parsers in priority order until one
//! recognizes the line; failing parsers accumulate penalty, so after a
//! short warm-up the queue ordering reflects the source's true format
//! distribution and most lines are classified with a single probe.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

use tracing::debug;

use crate::model::{ParseError, ParseOutcome, ParsedEvent, ResultStream};
use crate::queue::ParserPriorityQueue;
use crate::registry::ParserRegistry;
use crate::stats::{ClassifierStats, ParserStats, ParserStatsTable};
use crate::traits::LogParser;

/// Outcome of one [`Classifier::classify`] call.
///
/// On success exactly one of `events` / `stream` carries the payload: empty
/// `events` with a present `stream` means events arrive lazily. Both are
/// empty/absent when no parser recognized the line.
///
/// The lifetime ties a present stream to a mutable borrow of the
/// classifier, so the borrow checker rejects classifying another line while
/// the stream is still being consumed.
pub struct ClassifierResult<'a> {
    /// Identified log type; `None` when classification failed.
    pub log_type: Option<String>,
    pub events: Vec<ParsedEvent>,
    pub stream: Option<TrackedStream<'a>>,
}

impl ClassifierResult<'_> {
    pub fn is_classified(&self) -> bool {
        self.log_type.is_some()
    }
}

/// The log classification engine.
///
/// Single-threaded by contract: one `classify` call completes before the
/// next begins, enforced by `&mut self`. Callers who need parallelism shard
/// by instance, one classifier per worker.
pub struct Classifier {
    queue: ParserPriorityQueue,
    stats: ClassifierStats,
    parser_stats: ParserStatsTable,
}

impl Classifier {
    /// Build a classifier over the given parser registry. The registration
    /// order seeds the queue's tie-break for equal penalties.
    pub fn new(registry: ParserRegistry) -> Self {
        Self {
            queue: ParserPriorityQueue::new(registry.into_parsers()),
            stats: ClassifierStats::default(),
            parser_stats: ParserStatsTable::default(),
        }
    }

    /// Aggregate counters. Live view; read between `classify` calls.
    pub fn stats(&self) -> &ClassifierStats {
        &self.stats
    }

    /// Per-log-type counters. Live view; read between `classify` calls.
    pub fn parser_stats(&self) -> &ParserStatsTable {
        &self.parser_stats
    }

    /// Number of registered parsers.
    pub fn parser_count(&self) -> usize {
        self.queue.len()
    }

    /// Current penalty of the parser for `log_type`, if registered.
    pub fn parser_penalty(&self, log_type: &str) -> Option<u64> {
        self.queue
            .iter()
            .find(|item| item.log_type() == log_type)
            .map(|item| item.penalty())
    }

    /// Classify one log line.
    ///
    /// Zero-length input returns an empty result without touching any
    /// counter. Whitespace-only input is counted as a line but probes no
    /// parser. Otherwise parsers are probed in priority order until one
    /// recognizes the trimmed line.
    pub fn classify(&mut self, raw: &str) -> ClassifierResult<'_> {
        // Likely an empty file; nothing to record.
        if raw.is_empty() {
            return ClassifierResult {
                log_type: None,
                events: Vec::new(),
                stream: None,
            };
        }

        let classify_started = Instant::now();

        // The last line of a file commonly carries only a newline; trim
        // before any parser sees the line.
        let line = raw.trim();

        let classified = if line.is_empty() {
            None
        } else {
            self.run_parsers(line)
        };

        let (log_type, events, stream) = match classified {
            Some((log_type, ParseOutcome::Batch(events))) => (Some(log_type), events, None),
            Some((log_type, ParseOutcome::Stream(stream))) => {
                (Some(log_type), Vec::new(), Some(stream))
            }
            None => (None, Vec::new(), None),
        };

        // Aggregate roll-up runs on every exit path past the zero-length
        // check. Bytes count the raw pre-trim length.
        self.stats.classify_time_micros += elapsed_micros(classify_started);
        self.stats.bytes_processed_count += raw.len() as u64;
        self.stats.log_line_count += 1;
        self.stats.event_count += events.len() as u64;
        if !line.is_empty() {
            if log_type.is_some() {
                self.stats.successfully_classified_count += 1;
            } else {
                self.stats.classification_failure_count += 1;
            }
        }

        ClassifierResult {
            log_type,
            events,
            stream: stream.map(|inner| TrackedStream::new(inner, &mut self.parser_stats)),
        }
    }

    /// Probe parsers in priority order until one recognizes the line or the
    /// queue is exhausted. Every transiently popped parser is reinserted
    /// before returning, so the queue population is invariant across calls.
    fn run_parsers(&mut self, line: &str) -> Option<(String, ParseOutcome)> {
        let mut classified: Option<(String, ParseOutcome)> = None;
        let mut popped = Vec::new();

        loop {
            let hit = match self.queue.peek_mut() {
                None => break,
                Some(item) => {
                    let log_type = item.log_type().to_string();
                    let parse_started = Instant::now();
                    match safe_parse(&log_type, item.parser(), line) {
                        Ok(outcome) => {
                            let parser_time_micros = elapsed_micros(parse_started);
                            // Success removes all penalty: the parser is
                            // back at top priority for the next line.
                            item.clear_penalty();
                            Some((log_type, outcome, parser_time_micros))
                        }
                        Err(err) => {
                            debug!(
                                expected_log_type = %log_type,
                                error = %err,
                                "failed to parse line"
                            );
                            None
                        }
                    }
                }
            };

            match hit {
                Some((log_type, outcome, parser_time_micros)) => {
                    let event_count = match &outcome {
                        ParseOutcome::Batch(events) => events.len() as u64,
                        // Stream events are counted as the consumer advances.
                        ParseOutcome::Stream(_) => 0,
                    };
                    self.parser_stats.update(ParserStats {
                        log_type: log_type.clone(),
                        parser_time_micros,
                        bytes_processed_count: line.len() as u64,
                        log_line_count: 1,
                        event_count,
                    });
                    classified = Some((log_type, outcome));
                    break;
                }
                None => {
                    // The peeked item's penalty is still unchanged, so pop
                    // returns the item peek just examined.
                    if let Some(mut item) = self.queue.pop() {
                        item.penalize();
                        popped.push(item);
                    }
                }
            }
        }

        for item in popped {
            self.queue.push(item);
        }
        classified
    }
}

/// Invoke a parser under a fault-isolation guard.
///
/// A panic inside the parser unwinds only to here and becomes a synthetic
/// recognition error; partially produced results are discarded with the
/// stack. The guard wraps the parser call alone, never engine code.
fn safe_parse(
    log_type: &str,
    parser: &dyn LogParser,
    line: &str,
) -> Result<ParseOutcome, ParseError> {
    catch_unwind(AssertUnwindSafe(|| parser.parse_log(line))).unwrap_or_else(|payload| {
        Err(ParseError::ParserPanic {
            log_type: log_type.to_string(),
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

fn elapsed_micros(since: Instant) -> u64 {
    since.elapsed().as_micros() as u64
}

/// Stream adapter that folds per-event accounting into the per-parser stats
/// table as the consumer advances.
///
/// Events are credited to their own `log_type`, which for a mixed-record
/// container may differ from the log type of the parser that produced the
/// stream. End-of-stream and errors pass through unchanged; the stream is
/// terminal after the first error.
pub struct TrackedStream<'a> {
    inner: ResultStream,
    parser_stats: &'a mut ParserStatsTable,
    done: bool,
}

impl<'a> TrackedStream<'a> {
    fn new(inner: ResultStream, parser_stats: &'a mut ParserStatsTable) -> Self {
        Self {
            inner,
            parser_stats,
            done: false,
        }
    }
}

impl Iterator for TrackedStream<'_> {
    type Item = Result<ParsedEvent, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let started = Instant::now();
        match self.inner.next() {
            Some(Ok(event)) => {
                self.parser_stats.update(ParserStats {
                    log_type: event.log_type.clone(),
                    parser_time_micros: elapsed_micros(started),
                    bytes_processed_count: 0,
                    log_line_count: 0,
                    event_count: 1,
                });
                Some(Ok(event))
            }
            Some(Err(err)) => {
                self.done = true;
                Some(Err(err))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl std::fmt::Debug for TrackedStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedStream")
            .field("done", &self.done)
            .finish()
    }
}
