//! Error types for Heron.
//!
//! Two families of errors exist:
//!
//! | Error | When | Effect |
//! |---|---|---|
//! | [`ConfigError`] | registration and assembly | the dispatcher refuses to build |
//! | [`ConversionError`] | argument binding during a request | the route overflows |
//!
//! Faults raised while serving a request are not errors in this sense; see
//! [`Fault`](crate::Fault).

use heron_router::RouterError;
use thiserror::Error;

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A configuration problem detected while registering handlers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A pattern, predicate or table error.
    #[error(transparent)]
    Router(#[from] RouterError),

    /// A tag names a capability kind the registry does not know.
    #[error("no capability registered for tag kind '{kind}'")]
    UnknownCapability {
        /// The unknown kind
        kind: String,
    },

    /// A tag value was rejected by its capability.
    #[error("invalid '{kind}' tag: {reason}")]
    InvalidTag {
        /// The capability kind
        kind: String,
        /// Why the value was rejected
        reason: String,
    },

    /// A handler's parameter binding does not fit its route.
    #[error("invalid parameter binding for '{handler}': {reason}")]
    InvalidBinding {
        /// The handler name
        handler: String,
        /// Why the binding was rejected
        reason: String,
    },

    /// No not-found handler was registered.
    #[error("a not-found handler must be registered")]
    MissingNotFoundHandler,

    /// No server-error handler was registered.
    #[error("at least one server-error handler must be registered")]
    MissingServerErrorHandler,

    /// More than one not-found handler was registered.
    #[error("only one not-found handler may be registered, found '{first}' and '{second}'")]
    DuplicateNotFoundHandler {
        /// The handler registered first
        first: String,
        /// The handler registered second
        second: String,
    },

    /// A not-found or server-error handler was added after the dispatcher
    /// was built.
    #[error("handler '{handler}' cannot be added after the dispatcher is built")]
    SpecialHandlerAfterBuild {
        /// The handler name
        handler: String,
    },

    /// Meta tags nest deeper than the configured bound.
    #[error("meta tag '{name}' nests deeper than {limit} levels")]
    MetaTagTooDeep {
        /// The meta tag at which the bound was exceeded
        name: String,
        /// The configured bound
        limit: usize,
    },
}

impl ConfigError {
    /// Creates an invalid tag error.
    pub fn invalid_tag(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTag {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid binding error.
    pub fn invalid_binding(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBinding {
            handler: handler.into(),
            reason: reason.into(),
        }
    }
}

/// A request value could not be converted to a handler argument.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot convert {source_desc} value '{value}' to {target}: {reason}")]
pub struct ConversionError {
    /// Where the value came from (`capture 0`, `query 'id'`, ...)
    pub source_desc: String,
    /// The raw value, empty when missing
    pub value: String,
    /// The target type name
    pub target: &'static str,
    /// Why conversion failed
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_error_is_transparent() {
        let err: ConfigError = RouterError::TableFrozen.into();
        assert_eq!(err.to_string(), RouterError::TableFrozen.to_string());
        assert!(matches!(err, ConfigError::Router(RouterError::TableFrozen)));
    }

    #[test]
    fn test_messages() {
        assert!(ConfigError::invalid_tag("method", "bad")
            .to_string()
            .contains("'method'"));
        let err = ConfigError::DuplicateNotFoundHandler {
            first: "a".to_string(),
            second: "b".to_string(),
        };
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_conversion_error_display() {
        let err = ConversionError {
            source_desc: "capture 0".to_string(),
            value: "NaN".to_string(),
            target: "i64",
            reason: "invalid digit".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot convert capture 0 value 'NaN' to i64: invalid digit"
        );
    }
}
