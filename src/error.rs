//! Engine error kinds.
//!
//! One `thiserror` enum per the teacher's `FactoryError` pattern
//! (`components/factory.rs`): a flat set of named kinds, each carrying just
//! enough context to locate the cause. Validation failures are collected
//! into a list (`ValidationIssue`) rather than surfaced one at a time.

use thiserror::Error;

/// A single cartridge validation failure: the JSON field path and the rule
/// it violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub rule: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            rule: rule.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.rule)
    }
}

/// The five error kinds from spec §7.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cartridge failed validation: {0:?}")]
    SchemaInvalid(Vec<ValidationIssue>),

    #[error("duplicate indicator alias: {0}")]
    DuplicateAlias(String),

    #[error("bad candle timeline: {0}")]
    BadTimeline(String),

    #[error("unknown indicator type: {0}")]
    UnknownIndicator(String),

    #[error("numeric domain violation: {0}")]
    NumericDomain(String),
}
