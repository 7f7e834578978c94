//! Typed configuration for Heron.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! The root type is [`HeronConfig`], made of a [`RoutingSection`] (converted
//! into `heron_core::RoutingConfig` for the dispatcher) and a
//! [`LoggingSection`] (converted into `heron_telemetry::LogConfig`).
//!
//! # Example
//!
//! ```no_run
//! use heron_config::ConfigLoader;
//!
//! # fn main() -> Result<(), heron_config::ConfigLoadError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("heron.toml")?
//!     .with_env_prefix("HERON")
//!     .load()?;
//!
//! let routing = config.routing_config();
//! # let _ = routing;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [routing]
//! accept_entry_limit = 50
//! head_as_get = true
//! default_accept = "*/*"
//! max_meta_depth = 8
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values are overridden with `PREFIX__SECTION__KEY`:
//!
//! - `HERON__ROUTING__ACCEPT_ENTRY_LIMIT=20`
//! - `HERON__LOGGING__LEVEL=heron_pipeline=debug,info`

#![doc(html_root_url = "https://docs.rs/heron-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::HeronConfig;
pub use error::ConfigLoadError;
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LoggingSection, RoutingSection};
