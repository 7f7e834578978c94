//! Captured path segments.
//!
//! Captures are positional: the n-th captured part of a pattern produces the
//! n-th value. Storage uses a small-vector so that the common case of a few
//! captures does not allocate for the container itself.

use smallvec::SmallVec;

/// Maximum number of captures stored inline.
const INLINE_CAPTURES: usize = 4;

/// Values captured by a successful path match, in pattern order.
///
/// # Example
///
/// ```rust
/// use heron_router::PathPattern;
///
/// let pattern = PathPattern::parse("/users/{*}/files/{**}").unwrap();
/// let captures = pattern.matches(&["users", "7", "files", "a", "b"]).into_captures().unwrap();
///
/// assert_eq!(captures.len(), 2);
/// assert_eq!(captures.get(0), Some("7"));
/// assert_eq!(captures.get(1), Some("a/b"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Captures {
    inner: SmallVec<[String; INLINE_CAPTURES]>,
}

impl Captures {
    /// Creates an empty capture list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a capture list with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Appends a captured value.
    pub fn push(&mut self, value: impl Into<String>) {
        self.inner.push(value.into());
    }

    /// Returns the captured value at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.inner.get(index).map(String::as_str)
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the captured values.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Captures {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntoIterator for Captures {
    type Item = String;
    type IntoIter = smallvec::IntoIter<[String; INLINE_CAPTURES]>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
