//! Parser registration — the fixed log-type → parser mapping a classifier
//! is built from.

use thiserror::Error;

use crate::traits::LogParser;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("parser log type must be a non-empty string")]
    EmptyLogType,

    #[error("duplicate parser registered for log type {0:?}")]
    DuplicateLogType(String),
}

/// Ordered collection of parsers, one per log type.
///
/// Registration order seeds the priority queue's tie-break: with equal
/// penalties, earlier-registered parsers are probed first. Callers who need
/// reproducible probing across runs should register in a fixed (e.g.
/// sorted) order.
#[derive(Default)]
pub struct ParserRegistry {
    parsers: Vec<Box<dyn LogParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser. Rejects empty and duplicate log types.
    pub fn register(mut self, parser: Box<dyn LogParser>) -> Result<Self, RegistryError> {
        if parser.log_type().is_empty() {
            return Err(RegistryError::EmptyLogType);
        }
        if self.parsers.iter().any(|p| p.log_type() == parser.log_type()) {
            return Err(RegistryError::DuplicateLogType(parser.log_type().to_string()));
        }
        self.parsers.push(parser);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Registered log types, in registration order.
    pub fn log_types(&self) -> Vec<&str> {
        self.parsers.iter().map(|p| p.log_type()).collect()
    }

    pub(crate) fn into_parsers(self) -> Vec<Box<dyn LogParser>> {
        self.parsers
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("log_types", &self.log_types())
            .finish()
    }
}
