//! Subscriber setup and the dispatcher's log events.
//!
//! [`init_logging`] installs one `fmt` layer behind an [`EnvFilter`]. The
//! dispatcher reports through the [`log_overflow!`](crate::log_overflow),
//! [`log_fault!`](crate::log_fault) and
//! [`log_double_fault!`](crate::log_double_fault) macros, which name their
//! fields from [`fields`] so filters and log queries can rely on them.

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Line format of the installed subscriber.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line output for terminals.
    Pretty,
}

/// What [`init_logging`] installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Install nothing when false
    pub enabled: bool,
    /// `EnvFilter` directive, e.g. `info` or `heron_pipeline=debug,warn`
    pub level: String,
    /// Line format
    pub format: LogFormat,
    /// Also emit span open and close events
    pub span_events: bool,
    /// Source file and line on every event
    pub include_location: bool,
    /// Thread ids on every event
    pub thread_ids: bool,
    /// Module path of the emitting code
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Json,
            span_events: false,
            include_location: false,
            thread_ids: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    /// Pretty output with every overflow visible.
    ///
    /// Overflows log at `debug`, so this preset is the one to use when a
    /// request lands on the wrong route.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
            span_events: true,
            include_location: true,
            ..Self::default()
        }
    }

    /// JSON at `info`: faults and double faults only.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Checks that `level` parses as a filter directive.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::InvalidFilter` naming the directive.
    pub fn validate(&self) -> TelemetryResult<()> {
        create_env_filter(&self.level).map(drop)
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` for a bad `level` and
/// `TelemetryError::AlreadyInstalled` when a global subscriber exists.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = fmt::layer()
        .with_span_events(span_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.thread_ids)
        .with_target(config.include_target);
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Pretty => base.pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInstalled(e.to_string()))
}

/// Parses a filter directive such as `heron_pipeline=debug,warn`.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if any directive is malformed.
pub fn create_env_filter(directive: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::InvalidFilter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

/// Field names of the dispatcher's log events.
pub mod fields {
    /// Request method
    pub const HTTP_METHOD: &str = "http.method";
    /// Request path
    pub const HTTP_PATH: &str = "http.path";
    /// Name of the handler pipeline involved
    pub const PIPELINE: &str = "pipeline";
    /// Pipeline stage that overflowed
    pub const STAGE: &str = "stage";
    /// Fault description
    pub const ERROR: &str = "error";
}

/// Logs a pipeline overflowing to the next candidate, at `debug`.
#[macro_export]
macro_rules! log_overflow {
    ($method:expr, $path:expr, $pipeline:expr, $stage:expr) => {
        $crate::__tracing::debug!(
            { $crate::fields::HTTP_METHOD } = $crate::__tracing::field::display(&$method),
            { $crate::fields::HTTP_PATH } = $crate::__tracing::field::display(&$path),
            { $crate::fields::PIPELINE } = $crate::__tracing::field::display(&$pipeline),
            { $crate::fields::STAGE } = $crate::__tracing::field::display(&$stage),
            "pipeline overflowed"
        )
    };
}

/// Logs a fault handed to the server-error pipelines, at `warn`.
#[macro_export]
macro_rules! log_fault {
    ($method:expr, $path:expr, $pipeline:expr, $error:expr) => {
        $crate::__tracing::warn!(
            { $crate::fields::HTTP_METHOD } = $crate::__tracing::field::display(&$method),
            { $crate::fields::HTTP_PATH } = $crate::__tracing::field::display(&$path),
            { $crate::fields::PIPELINE } = $crate::__tracing::field::display(&$pipeline),
            { $crate::fields::ERROR } = $crate::__tracing::field::display(&$error),
            "handler fault, entering server-error pipeline"
        )
    };
}

/// Logs a fault raised while handling a fault, at `error`.
#[macro_export]
macro_rules! log_double_fault {
    ($method:expr, $path:expr, $error:expr) => {
        $crate::__tracing::error!(
            { $crate::fields::HTTP_METHOD } = $crate::__tracing::field::display(&$method),
            { $crate::fields::HTTP_PATH } = $crate::__tracing::field::display(&$path),
            { $crate::fields::ERROR } = $crate::__tracing::field::display(&$error),
            "double fault, sending fixed diagnostic response"
        )
    };
}
