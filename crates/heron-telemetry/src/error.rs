//! Telemetry error types.

use thiserror::Error;

/// Errors from installing the logging subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A filter directive did not parse.
    #[error("invalid log filter '{directive}': {reason}")]
    InvalidFilter {
        /// The directive as configured
        directive: String,
        /// Parser diagnostic
        reason: String,
    },

    /// A global subscriber was installed before Heron's.
    #[error("a global log subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}
