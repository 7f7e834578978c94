//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! defaults, files and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigLoadError, HeronConfig, LogFormat};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file or string (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use heron_config::ConfigLoader;
///
/// # fn main() -> Result<(), heron_config::ConfigLoadError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("heron.toml")?
///     .with_env_prefix("HERON")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HeronConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader seeded with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HeronConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// `new()` already does this; chain it for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HeronConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = HeronConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = HeronConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigLoadError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON or unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::missing(path));
        }

        let content =
            fs::read_to_string(path).map_err(|e| ConfigLoadError::unreadable(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigLoadError` if the file exists but cannot be read or
    /// parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigLoadError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `format` (`"toml"` or `"json"`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigLoadError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [routing]
    ///     accept_entry_limit = 8
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.routing.accept_entry_limit, 8);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigLoadError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigLoadError::unsupported_format(format))
            }
        };
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the form `PREFIX__SECTION__KEY`, for example
    /// `HERON__ROUTING__HEAD_AS_GET=false`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Apply environment overrides, validate, and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigLoadError` if an override cannot be parsed or the
    /// result fails validation.
    pub fn load(mut self) -> Result<HeronConfig, ConfigLoadError> {
        self.apply_env_overrides()?;
        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without env overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HeronConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<HeronConfig, ConfigLoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigLoadError::unsupported_format(
                path.display().to_string(),
            )),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigLoadError> {
        let Some(prefix) = self.env_prefix.clone() else {
            return Ok(());
        };

        let marker = format!("{prefix}__");
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(key, _)| key.starts_with(&marker))
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, &prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigLoadError> {
        let Some(rest) = key
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix("__"))
        else {
            return Ok(());
        };
        let path: Vec<&str> = rest.split("__").collect();

        match path.as_slice() {
            // Routing section
            ["ROUTING", "ACCEPT_ENTRY_LIMIT"] => {
                self.config.routing.accept_entry_limit = value
                    .parse()
                    .map_err(|_| ConfigLoadError::env_override(key, "expected integer"))?;
            }
            ["ROUTING", "HEAD_AS_GET"] => {
                self.config.routing.head_as_get = parse_bool(value)
                    .ok_or_else(|| ConfigLoadError::env_override(key, "expected boolean"))?;
            }
            ["ROUTING", "DEFAULT_ACCEPT"] => {
                self.config.routing.default_accept = value.to_string();
            }
            ["ROUTING", "MAX_META_DEPTH"] => {
                self.config.routing.max_meta_depth = value
                    .parse()
                    .map_err(|_| ConfigLoadError::env_override(key, "expected integer"))?;
            }

            // Logging section
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigLoadError::env_override(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigLoadError::env_override(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "SPAN_EVENTS"] => {
                self.config.logging.span_events = parse_bool(value)
                    .ok_or_else(|| ConfigLoadError::env_override(key, "expected boolean"))?;
            }
            ["LOGGING", "INCLUDE_LOCATION"] => {
                self.config.logging.include_location = parse_bool(value)
                    .ok_or_else(|| ConfigLoadError::env_override(key, "expected boolean"))?;
            }
            ["LOGGING", "THREAD_IDS"] => {
                self.config.logging.thread_ids = parse_bool(value)
                    .ok_or_else(|| ConfigLoadError::env_override(key, "expected boolean"))?;
            }
            ["LOGGING", "INCLUDE_TARGET"] => {
                self.config.logging.include_target = parse_bool(value)
                    .ok_or_else(|| ConfigLoadError::env_override(key, "expected boolean"))?;
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
