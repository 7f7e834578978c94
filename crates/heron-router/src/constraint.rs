//! Query parameters and key/value constraints.

use http::HeaderMap;
use indexmap::IndexMap;

use crate::error::{RouterError, RouterResult};

/// An ordered query-string multimap.
///
/// Keys keep their first-seen order; values for a key keep request order.
///
/// # Example
///
/// ```rust
/// use heron_router::QueryParams;
///
/// let query = QueryParams::parse("tag=a&name=J%C3%BCrgen&tag=b");
/// assert_eq!(query.get_all("tag"), ["a", "b"]);
/// assert_eq!(query.first("name"), Some("Jürgen"));
/// assert!(query.get_all("missing").is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    inner: IndexMap<String, Vec<String>>,
}

impl QueryParams {
    /// Creates an empty multimap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw query string (without the leading `?`), percent-decoding
    /// keys and values. A query that cannot be decoded yields an empty map.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        match serde_urlencoded::from_str::<Vec<(String, String)>>(raw) {
            Ok(pairs) => pairs.into_iter().collect(),
            Err(err) => {
                tracing::debug!(query = raw, error = %err, "discarding undecodable query string");
                Self::default()
            }
        }
    }

    /// Appends a value for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// Returns every value for `key`, in request order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map_or(&[][..], Vec::as_slice)
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// Returns true if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Returns true if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates keys with their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::default();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

/// Required key/value pairs for query parameters or headers.
///
/// Every listed key must be present, and its values must equal the required
/// list exactly and in order. Unlisted keys are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValueConstraint {
    required: IndexMap<String, Vec<String>>,
}

impl KeyValueConstraint {
    /// Creates an empty constraint, satisfied by anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `key=value` declarations for query matching.
    pub fn query<I, S>(declarations: I) -> RouterResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::parse(declarations, "query", false)
    }

    /// Parses `key=value` declarations for header matching. Keys are
    /// case-insensitive.
    pub fn header<I, S>(declarations: I) -> RouterResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::parse(declarations, "header", true)
    }

    fn parse<I, S>(declarations: I, kind: &'static str, fold_case: bool) -> RouterResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut constraint = Self::default();
        for declaration in declarations {
            let declaration = declaration.as_ref();
            let Some((key, value)) = declaration.split_once('=') else {
                return Err(RouterError::InvalidConstraint {
                    kind,
                    value: declaration.to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(RouterError::InvalidConstraint {
                    kind,
                    value: declaration.to_string(),
                });
            }
            let key = if fold_case {
                key.to_ascii_lowercase()
            } else {
                key.to_string()
            };
            constraint.require(key, value);
        }
        Ok(constraint)
    }

    /// Adds a required value for `key`, after any already required.
    pub fn require(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.required.entry(key.into()).or_default().push(value.into());
    }

    /// Merges another constraint into this one.
    pub fn merge(&mut self, other: &Self) {
        for (key, values) in &other.required {
            self.required
                .entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    /// Returns true if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    /// Checks the constraint against query parameters.
    #[must_use]
    pub fn matches_query(&self, query: &QueryParams) -> bool {
        self.required
            .iter()
            .all(|(key, values)| query.contains_key(key) && query.get_all(key) == values.as_slice())
    }

    /// Checks the constraint against headers. Header values that are not
    /// visible ASCII never match.
    #[must_use]
    pub fn matches_headers(&self, headers: &HeaderMap) -> bool {
        self.required.iter().all(|(key, values)| {
            let mut present = headers.get_all(key.as_str()).iter();
            let mut expected = values.iter();
            loop {
                match (present.next(), expected.next()) {
                    (None, None) => return true,
                    (Some(actual), Some(wanted)) => {
                        if actual.to_str().ok() != Some(wanted.as_str()) {
                            return false;
                        }
                    }
                    _ => return false,
                }
            }
        })
    }
}
