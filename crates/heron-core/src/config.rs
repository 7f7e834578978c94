//! Runtime routing settings.

use heron_router::{MatchOptions, DEFAULT_ACCEPT_LIMIT};

/// Default bound on meta tag nesting.
pub const DEFAULT_MAX_META_DEPTH: usize = 8;

/// Settings that shape matching and assembly.
///
/// Usually loaded through `heron-config` and handed to the dispatcher
/// builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Maximum number of `Accept` entries considered per request
    pub accept_entry_limit: usize,
    /// Whether `GET` routes also serve `HEAD`, dropping the body
    pub head_as_get: bool,
    /// `Accept` value assumed when a request carries none
    pub default_accept: String,
    /// Maximum meta tag nesting depth
    pub max_meta_depth: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            accept_entry_limit: DEFAULT_ACCEPT_LIMIT,
            head_as_get: true,
            default_accept: "*/*".to_string(),
            max_meta_depth: DEFAULT_MAX_META_DEPTH,
        }
    }
}

impl RoutingConfig {
    /// The options passed to route table lookups.
    #[must_use]
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            accept_limit: self.accept_entry_limit,
            head_as_get: self.head_as_get,
            default_accept: self.default_accept.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_router_defaults() {
        let config = RoutingConfig::default();
        assert_eq!(config.match_options(), MatchOptions::default());
        assert_eq!(config.max_meta_depth, 8);
    }
}
