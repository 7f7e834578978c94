//! Media types.
//!
//! Parsing is deliberately loose: a media type is `primary/secondary` with an
//! optional `;`-separated parameter tail that is ignored. Components are
//! lower-cased and interned so that equality between parsed values is cheap.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::error::{RouterError, RouterResult};

/// Maximum number of distinct components kept in the interner.
const INTERN_CAPACITY: usize = 50;

/// The wildcard component.
pub const WILDCARD: &str = "*";

fn interner() -> &'static Mutex<HashMap<Box<str>, Arc<str>>> {
    static INTERNER: OnceLock<Mutex<HashMap<Box<str>, Arc<str>>>> = OnceLock::new();
    INTERNER.get_or_init(|| Mutex::new(HashMap::with_capacity(INTERN_CAPACITY)))
}

/// Returns a shared component, reusing a cached one when possible.
///
/// The cache is bounded; once full, new components are allocated fresh.
fn intern(component: &str) -> Arc<str> {
    let mut cache = interner().lock();
    if let Some(existing) = cache.get(component) {
        return Arc::clone(existing);
    }
    let value: Arc<str> = Arc::from(component);
    if cache.len() < INTERN_CAPACITY {
        cache.insert(Box::from(component), Arc::clone(&value));
    }
    value
}

/// A media type such as `application/json` or `text/*`.
///
/// # Example
///
/// ```rust
/// use heron_router::MimeType;
///
/// let json = MimeType::parse("Application/JSON; charset=utf-8").unwrap();
/// assert_eq!(json.to_string(), "application/json");
///
/// let any_app = MimeType::parse("application").unwrap();
/// assert_eq!(any_app.to_string(), "application/*");
/// assert!(json.matches(&any_app));
/// assert!(json.matches(&MimeType::any()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType {
    primary: Arc<str>,
    secondary: Arc<str>,
}

impl MimeType {
    /// Parses a media type.
    ///
    /// A missing secondary component means `*`. A wildcard primary is only
    /// valid as `*/*`.
    pub fn parse(value: &str) -> RouterResult<Self> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        if essence.is_empty() {
            return Err(RouterError::invalid_mime(value, "media type cannot be empty"));
        }
        let (primary, secondary) = match essence.split_once('/') {
            Some((p, s)) => (p.trim(), s.trim()),
            None => (essence, WILDCARD),
        };
        if primary.is_empty() || secondary.is_empty() {
            return Err(RouterError::invalid_mime(value, "empty type component"));
        }
        Self::new(primary, secondary).map_err(|_| {
            RouterError::invalid_mime(value, "only */* may use a wildcard primary type")
        })
    }

    /// Creates a media type from its two components.
    pub fn new(primary: &str, secondary: &str) -> RouterResult<Self> {
        let primary = primary.to_ascii_lowercase();
        let secondary = secondary.to_ascii_lowercase();
        if primary == WILDCARD && secondary != WILDCARD {
            return Err(RouterError::invalid_mime(
                format!("{primary}/{secondary}"),
                "only */* may use a wildcard primary type",
            ));
        }
        Ok(Self {
            primary: intern(&primary),
            secondary: intern(&secondary),
        })
    }

    fn known(primary: &str, secondary: &str) -> Self {
        Self {
            primary: intern(primary),
            secondary: intern(secondary),
        }
    }

    /// `*/*`
    #[must_use]
    pub fn any() -> Self {
        Self::known(WILDCARD, WILDCARD)
    }

    /// `application/octet-stream`
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::known("application", "octet-stream")
    }

    /// `application/json`
    #[must_use]
    pub fn json() -> Self {
        Self::known("application", "json")
    }

    /// `text/plain`
    #[must_use]
    pub fn text_plain() -> Self {
        Self::known("text", "plain")
    }

    /// `text/html`
    #[must_use]
    pub fn html() -> Self {
        Self::known("text", "html")
    }

    /// Returns the primary component.
    #[must_use]
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Returns the secondary component.
    #[must_use]
    pub fn secondary(&self) -> &str {
        &self.secondary
    }

    /// Returns true if either component is a wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        &*self.primary == WILDCARD || &*self.secondary == WILDCARD
    }

    /// Returns true if this type is acceptable under `accept`.
    ///
    /// A `*/*` accept matches everything; `type/*` matches any subtype of
    /// `type`; otherwise both components must be equal.
    #[must_use]
    pub fn matches(&self, accept: &MimeType) -> bool {
        if &*accept.primary == WILDCARD {
            return true;
        }
        if accept.primary != self.primary {
            return false;
        }
        &*accept.secondary == WILDCARD || accept.secondary == self.secondary
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.primary, self.secondary)
    }
}

impl std::str::FromStr for MimeType {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let mime = MimeType::parse("text/html").unwrap();
        assert_eq!(mime.primary(), "text");
        assert_eq!(mime.secondary(), "html");
    }

    #[test]
    fn test_parse_bare_primary() {
        assert_eq!(MimeType::parse("text").unwrap().to_string(), "text/*");
    }

    #[test]
    fn test_parse_strips_parameters_and_case() {
        let mime = MimeType::parse(" Text/HTML ; level=1").unwrap();
        assert_eq!(mime, MimeType::html());
    }

    #[test]
    fn test_wildcard_primary_rules() {
        assert!(MimeType::parse("*/*").is_ok());
        assert!(MimeType::parse("*").is_ok());
        assert!(matches!(
            MimeType::parse("*/json"),
            Err(RouterError::InvalidMimeType { .. })
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert!(MimeType::parse("").is_err());
        assert!(MimeType::parse("  ;q=1").is_err());
        assert!(MimeType::parse("/json").is_err());
    }

    #[test]
    fn test_matches() {
        let json = MimeType::json();
        assert!(json.matches(&MimeType::any()));
        assert!(json.matches(&MimeType::parse("application/*").unwrap()));
        assert!(json.matches(&MimeType::json()));
        assert!(!json.matches(&MimeType::html()));
        assert!(!json.matches(&MimeType::parse("text/*").unwrap()));
    }

    #[test]
    fn test_interned_components_shared() {
        let a = MimeType::json();
        let b = MimeType::parse("application/json").unwrap();
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.primary, &b.primary));
    }
}
