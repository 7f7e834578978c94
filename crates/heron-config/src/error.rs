//! Errors raised while loading or validating Heron configuration.
//!
//! Loading fails at one of three points: finding and reading the source,
//! deserializing it, or validating the values it holds. Routing values are
//! checked with the router's own parsers, so a bad `routing.default_accept`
//! carries the [`RouterError`] that rejected it.

use std::path::PathBuf;

use heron_router::RouterError;
use thiserror::Error;

/// Errors from [`ConfigLoader`](crate::ConfigLoader) and
/// [`HeronConfig::validate`](crate::HeronConfig::validate).
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    /// No configuration file at the given path.
    #[error("no configuration file at {path}")]
    Missing {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read configuration file {path}")]
    Unreadable {
        /// Path of the file
        path: PathBuf,
        /// I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The source is neither TOML nor JSON.
    #[error("unsupported configuration format '{format}', expected 'toml' or 'json'")]
    UnsupportedFormat {
        /// Requested format or file extension
        format: String,
    },

    /// TOML did not deserialize into [`HeronConfig`](crate::HeronConfig).
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON did not deserialize into [`HeronConfig`](crate::HeronConfig).
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A `routing.*` value the router refuses to parse.
    #[error("routing.{key}: {source}")]
    Routing {
        /// Key inside the `[routing]` section
        key: &'static str,
        /// Parser diagnostic
        #[source]
        source: RouterError,
    },

    /// A value outside its allowed range.
    #[error("{field}: {reason}")]
    OutOfRange {
        /// Dotted key, for example `routing.max_meta_depth`
        field: &'static str,
        /// What the value must satisfy
        reason: String,
    },

    /// A `PREFIX__SECTION__KEY` override whose value does not parse.
    #[error("environment override {var}: {expected}")]
    EnvOverride {
        /// Variable name
        var: String,
        /// What the value should have been
        expected: &'static str,
    },
}

impl ConfigLoadError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    pub(crate) fn routing(key: &'static str, source: RouterError) -> Self {
        Self::Routing { key, source }
    }

    pub(crate) fn out_of_range(field: &'static str, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn env_override(var: impl Into<String>, expected: &'static str) -> Self {
        Self::EnvOverride {
            var: var.into(),
            expected,
        }
    }

    /// The dotted configuration key at fault, when the error names one.
    #[must_use]
    pub fn key(&self) -> Option<String> {
        match self {
            Self::Routing { key, .. } => Some(format!("routing.{key}")),
            Self::OutOfRange { field, .. } => Some((*field).to_string()),
            _ => None,
        }
    }
}
