//! Configuration schema types.
//!
//! This module defines the structure of every configuration section.

use heron_core::{RoutingConfig, DEFAULT_MAX_META_DEPTH};
use heron_router::DEFAULT_ACCEPT_LIMIT;
pub use heron_telemetry::LogFormat;
use heron_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Routing section.
///
/// Controls request matching and pipeline assembly.
///
/// # Example
///
/// ```
/// use heron_config::RoutingSection;
///
/// let routing = RoutingSection {
///     accept_entry_limit: 10,
///     ..Default::default()
/// };
/// assert!(routing.head_as_get);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RoutingSection {
    /// Maximum number of `Accept` entries considered per request.
    #[serde(default = "default_accept_entry_limit")]
    pub accept_entry_limit: usize,

    /// Whether `GET` routes also answer `HEAD` requests.
    #[serde(default = "default_true")]
    pub head_as_get: bool,

    /// `Accept` value assumed when a request sends none.
    #[serde(default = "default_accept")]
    pub default_accept: String,

    /// Maximum meta tag nesting depth during assembly.
    #[serde(default = "default_max_meta_depth")]
    pub max_meta_depth: usize,
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            accept_entry_limit: default_accept_entry_limit(),
            head_as_get: true,
            default_accept: default_accept(),
            max_meta_depth: default_max_meta_depth(),
        }
    }
}

impl From<RoutingSection> for RoutingConfig {
    fn from(section: RoutingSection) -> Self {
        Self {
            accept_entry_limit: section.accept_entry_limit,
            head_as_get: section.head_as_get,
            default_accept: section.default_accept,
            max_meta_depth: section.max_meta_depth,
        }
    }
}

fn default_accept_entry_limit() -> usize {
    DEFAULT_ACCEPT_LIMIT
}

fn default_accept() -> String {
    "*/*".to_string()
}

fn default_max_meta_depth() -> usize {
    DEFAULT_MAX_META_DEPTH
}

fn default_true() -> bool {
    true
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Level or filter directive, e.g. `info` or `heron_pipeline=debug,warn`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Log span open and close events.
    #[serde(default)]
    pub span_events: bool,

    /// Include source file and line.
    #[serde(default)]
    pub include_location: bool,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include the event target (module path).
    #[serde(default = "default_true")]
    pub include_target: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Json,
            span_events: false,
            include_location: false,
            thread_ids: false,
            include_target: true,
        }
    }
}

impl From<LoggingSection> for LogConfig {
    fn from(section: LoggingSection) -> Self {
        Self {
            enabled: section.enabled,
            level: section.level,
            format: section.format,
            span_events: section.span_events,
            include_location: section.include_location,
            thread_ids: section.thread_ids,
            include_target: section.include_target,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
