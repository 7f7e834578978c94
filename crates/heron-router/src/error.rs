//! Router error types.

use thiserror::Error;

/// Errors raised while compiling patterns, predicates or registering routes.
///
/// Every variant describes a configuration problem detected before any
/// request is served. Non-matching requests are never errors; they are
/// reported as `None` by the matching operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// A pattern declared more than one `{**}` end capture.
    #[error("pattern '{pattern}' declares more than one end capture")]
    MultipleEndCaptures {
        /// The offending pattern
        pattern: String,
    },

    /// A `category:content` segment used a category that is not known.
    #[error(
        "unknown segment category '{category}' in pattern '{pattern}' (did you mean 'static:{category}:...' for a literal containing ':'?)"
    )]
    UnknownCategory {
        /// The unknown category name
        category: String,
        /// The offending pattern
        pattern: String,
    },

    /// A `re:` segment carried a regular expression that does not compile.
    #[error("invalid regex '{segment}' in pattern '{pattern}': {reason}")]
    InvalidRegex {
        /// The regex source
        segment: String,
        /// The offending pattern
        pattern: String,
        /// Compiler diagnostic
        reason: String,
    },

    /// A pattern segment was wrapped in braces with nothing inside.
    #[error("empty capture '{{}}' in pattern '{pattern}'")]
    EmptyCapture {
        /// The offending pattern
        pattern: String,
    },

    /// A media type string could not be parsed.
    #[error("invalid media type '{value}': {reason}")]
    InvalidMimeType {
        /// The offending value
        value: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Alternative path patterns of one route disagree on capture count.
    #[error("alternative paths capture {found} segments, expected {expected}")]
    CaptureArityMismatch {
        /// Capture count of the first pattern
        expected: usize,
        /// Capture count of the disagreeing pattern
        found: usize,
    },

    /// A query or header constraint was not written as `key=value`.
    #[error("invalid {kind} constraint '{value}', expected 'key=value'")]
    InvalidConstraint {
        /// `query` or `header`
        kind: &'static str,
        /// The offending value
        value: String,
    },

    /// A route was registered after the table served its first lookup.
    #[error("route table is frozen, routes cannot be added after the first lookup")]
    TableFrozen,
}

impl RouterError {
    /// Creates an invalid media type error.
    pub fn invalid_mime(value: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidMimeType {
            value: value.into(),
            reason,
        }
    }

    /// Returns true if this error was caused by registering into a frozen table.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        matches!(self, Self::TableFrozen)
    }
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
