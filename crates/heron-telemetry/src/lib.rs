//! Logging for Heron.
//!
//! This crate installs the `tracing-subscriber` stack and owns the events
//! the dispatcher emits while routing:
//!
//! | Event | Level | Fields |
//! |-------|-------|--------|
//! | pipeline overflow | `debug` | `http.method`, `http.path`, `pipeline`, `stage` |
//! | handler fault | `warn` | `http.method`, `http.path`, `pipeline`, `error` |
//! | double fault | `error` | `http.method`, `http.path`, `error` |
//!
//! # Example
//!
//! ```rust,ignore
//! use heron_telemetry::{init_logging, LogConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LogConfig::development())?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/heron-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

#[doc(hidden)]
pub use tracing as __tracing;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
