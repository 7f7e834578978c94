//! Main configuration type.
//!
//! This module provides the top-level [`HeronConfig`] struct.

use heron_core::RoutingConfig;
use heron_router::AcceptEntry;
use heron_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

use crate::{ConfigLoadError, LogFormat, LoggingSection, RoutingSection};

/// Complete Heron configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use heron_config::HeronConfig;
///
/// let config = HeronConfig::default();
/// assert_eq!(config.routing.accept_entry_limit, 50);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HeronConfig {
    /// Matching and assembly settings.
    #[serde(default)]
    pub routing: RoutingSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl HeronConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigLoadError::OutOfRange` if:
    /// - `routing.accept_entry_limit` or `routing.max_meta_depth` is zero
    /// - `routing.default_accept` holds no media range at all
    /// - `logging.level` is not a valid filter directive
    ///
    /// Returns `ConfigLoadError::Routing` for the first entry of
    /// `routing.default_accept` the router cannot parse.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.routing.accept_entry_limit == 0 {
            return Err(ConfigLoadError::out_of_range(
                "routing.accept_entry_limit",
                "must be greater than zero",
            ));
        }

        if self.routing.max_meta_depth == 0 {
            return Err(ConfigLoadError::out_of_range(
                "routing.max_meta_depth",
                "must be greater than zero",
            ));
        }

        let mut ranges = 0;
        for entry in self
            .routing
            .default_accept
            .split(',')
            .take(self.routing.accept_entry_limit)
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
        {
            AcceptEntry::parse(entry)
                .map_err(|e| ConfigLoadError::routing("default_accept", e))?;
            ranges += 1;
        }
        if ranges == 0 {
            return Err(ConfigLoadError::out_of_range(
                "routing.default_accept",
                "must name at least one media range",
            ));
        }

        self.log_config()
            .validate()
            .map_err(|e| ConfigLoadError::out_of_range("logging.level", e.to_string()))?;

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, debug-level logging with source locations.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::HeronConfig;
    ///
    /// let config = HeronConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.span_events = true;
        config.logging.include_location = true;
        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::{HeronConfig, LogFormat};
    ///
    /// let config = HeronConfig::production();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config
    }

    /// Routing settings in the form the dispatcher consumes.
    #[must_use]
    pub fn routing_config(&self) -> RoutingConfig {
        self.routing.clone().into()
    }

    /// Logging settings in the form `heron-telemetry` consumes.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        self.logging.clone().into()
    }
}
