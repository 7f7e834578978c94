//! Response content-type negotiation.

use crate::accept::{parse_accept, AcceptEntry};
use crate::mime::MimeType;

/// The set of content types a route can produce.
///
/// # Example
///
/// ```rust
/// use heron_router::{MimeType, Produces, DEFAULT_ACCEPT_LIMIT};
///
/// let produces = Produces::new([MimeType::html(), MimeType::json()]);
///
/// let chosen = produces.negotiate(Some("text/html;q=0.5,application/json;q=0.9"), DEFAULT_ACCEPT_LIMIT);
/// assert_eq!(chosen, Some(MimeType::json()));
///
/// assert_eq!(produces.negotiate(Some("image/png"), DEFAULT_ACCEPT_LIMIT), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Produces {
    types: Vec<MimeType>,
    matches_anything: bool,
    default_type: Option<MimeType>,
}

impl Produces {
    /// Creates a set with the given declared types, in preference order.
    #[must_use]
    pub fn new(types: impl IntoIterator<Item = MimeType>) -> Self {
        Self {
            types: types.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Creates a set that falls back to its default for any `Accept`.
    #[must_use]
    pub fn anything() -> Self {
        Self {
            matches_anything: true,
            ..Self::default()
        }
    }

    /// Sets whether unmatched requests fall back to the default type.
    #[must_use]
    pub fn with_matches_anything(mut self, matches_anything: bool) -> Self {
        self.matches_anything = matches_anything;
        self
    }

    /// Sets an explicit default type.
    #[must_use]
    pub fn with_default(mut self, default_type: MimeType) -> Self {
        self.default_type = Some(default_type);
        self
    }

    /// Returns the declared types.
    #[must_use]
    pub fn types(&self) -> &[MimeType] {
        &self.types
    }

    /// Returns true if unmatched requests fall back to the default type.
    #[must_use]
    pub fn matches_anything(&self) -> bool {
        self.matches_anything
    }

    /// The type chosen when no declared type matches.
    ///
    /// An explicit default wins; otherwise the first declared type when
    /// matching anything; otherwise `application/octet-stream`.
    #[must_use]
    pub fn default_type(&self) -> MimeType {
        if let Some(default_type) = &self.default_type {
            return default_type.clone();
        }
        if self.matches_anything {
            if let Some(first) = self.types.first() {
                return first.clone();
            }
        }
        MimeType::octet_stream()
    }

    /// Negotiates against a raw `Accept` header. A missing header is `*/*`.
    #[must_use]
    pub fn negotiate(&self, accept: Option<&str>, limit: usize) -> Option<MimeType> {
        match accept {
            Some(header) => self.negotiate_entries(&parse_accept(header, limit)),
            None => self.negotiate_entries(&[AcceptEntry {
                mime: MimeType::any(),
                quality: 1.0,
            }]),
        }
    }

    /// Negotiates against pre-ranked entries.
    ///
    /// For each entry in order, the first declared type it accepts wins.
    #[must_use]
    pub fn negotiate_entries(&self, ranked: &[AcceptEntry]) -> Option<MimeType> {
        let found = ranked.iter().find_map(|entry| {
            self.types
                .iter()
                .find(|declared| declared.matches(&entry.mime))
        });
        match found {
            Some(mime) => Some(mime.clone()),
            None if self.matches_anything || self.types.is_empty() => Some(self.default_type()),
            None => None,
        }
    }
}
