pub use crate::model::{ParseError, ParseOutcome, ParsedEvent, ResultStream};

/// A named handler for exactly one log format.
///
/// Implementations must be pure with respect to the input line: the engine
/// may invoke them in any order, any number of times, and interleaved with
/// other parsers. Any cross-line state a parser keeps is its own concern.
///
/// Parsers may panic on malformed input (e.g. index out of bounds); the
/// engine isolates the unwind and treats it as a recognition failure.
pub trait LogParser: Send + Sync {
    /// Attempt to parse a single trimmed, non-empty log line.
    ///
    /// Returns `Ok(ParseOutcome::Batch(..))` with zero or more events, or
    /// `Ok(ParseOutcome::Stream(..))` when events should be materialized
    /// lazily. Any `Err` means "this line is not of this parser's format".
    fn parse_log(&self, line: &str) -> Result<ParseOutcome, ParseError>;

    /// Stable identifier of the log format this parser handles,
    /// conventionally `"<Source>.<EventType>"`, e.g. `"Suricata.DNS"`.
    fn log_type(&self) -> &str;
}
