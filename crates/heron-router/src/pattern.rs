//! Path pattern compiler and matcher.
//!
//! A pattern is a `/`-separated list of parts. Each part is one of:
//!
//! | Syntax        | Part       | Consumes                        |
//! |---------------|------------|---------------------------------|
//! | `users`       | literal    | one equal segment               |
//! | `static:a:b`  | literal    | one segment equal to `a:b`      |
//! | `re:\d+`      | regex      | one fully matching segment      |
//! | `*`           | wildcard   | one arbitrary segment           |
//! | `**`          | end capture| every remaining segment         |
//!
//! Wrapping any part in braces (`{*}`, `{re:\d+}`, `{**}`) captures the
//! segments it consumes. Matching never backtracks: a part that does not
//! advance the cursor fails the whole match.

use std::fmt;

use regex::Regex;
use smallvec::SmallVec;

use crate::captures::Captures;
use crate::error::{RouterError, RouterResult};

/// Splits a request path into its non-empty segments.
///
/// ```rust
/// use heron_router::split_path;
///
/// assert_eq!(split_path("//a/b/"), vec!["a", "b"]);
/// assert!(split_path("/").is_empty());
/// ```
#[must_use]
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// A single compiled pattern part.
#[derive(Debug, Clone)]
enum Part {
    Literal(String),
    Regex(Regex),
    Wildcard,
    EndCapture,
}

impl Part {
    /// Returns the cursor after consuming from `index`. Equal to `index` when
    /// the part does not match. `index` is always in bounds.
    fn consume<S: AsRef<str>>(&self, path: &[S], index: usize) -> usize {
        match self {
            Self::Literal(text) => {
                if path[index].as_ref() == text.as_str() {
                    index + 1
                } else {
                    index
                }
            }
            Self::Regex(regex) => {
                if regex.is_match(path[index].as_ref()) {
                    index + 1
                } else {
                    index
                }
            }
            Self::Wildcard => index + 1,
            Self::EndCapture => path.len(),
        }
    }
}

/// Outcome of matching a path against a [`PathPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    success: bool,
    captures: Captures,
}

impl PathMatch {
    fn fail() -> Self {
        Self {
            success: false,
            captures: Captures::new(),
        }
    }

    /// Returns true if the path matched.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.success
    }

    /// Returns the captures; empty when the match failed.
    #[must_use]
    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    /// Converts into the captures, or `None` when the match failed.
    #[must_use]
    pub fn into_captures(self) -> Option<Captures> {
        self.success.then_some(self.captures)
    }
}

/// A compiled path pattern.
///
/// # Example
///
/// ```rust
/// use heron_router::PathPattern;
///
/// let pattern = PathPattern::parse("/re/{re:\\d+}").unwrap();
/// assert_eq!(pattern.capture_count(), 1);
///
/// let ok = pattern.matches(&["re", "42"]);
/// assert_eq!(ok.captures().get(0), Some("42"));
///
/// assert!(!pattern.matches(&["re", "NaN"]).is_match());
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    parts: Vec<Part>,
    /// Bit `i` set when part `i` is captured.
    captured: SmallVec<[u64; 1]>,
    capture_count: usize,
}

impl PathPattern {
    /// Compiles a pattern.
    pub fn parse(pattern: &str) -> RouterResult<Self> {
        let mut parts = Vec::new();
        let mut captured: SmallVec<[u64; 1]> = SmallVec::new();
        let mut capture_count = 0;
        let mut has_end_capture = false;

        for segment in pattern.split('/').filter(|s| !s.is_empty()) {
            let (body, is_captured) = match segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
            {
                Some(inner) => (inner, true),
                None => (segment, false),
            };
            if is_captured && body.is_empty() {
                return Err(RouterError::EmptyCapture {
                    pattern: pattern.to_string(),
                });
            }

            let part = Self::classify(body, pattern)?;
            if matches!(part, Part::EndCapture) {
                if has_end_capture {
                    return Err(RouterError::MultipleEndCaptures {
                        pattern: pattern.to_string(),
                    });
                }
                has_end_capture = true;
            }

            if is_captured {
                let position = parts.len();
                let word = position / 64;
                if captured.len() <= word {
                    captured.resize(word + 1, 0);
                }
                captured[word] |= 1u64 << (position % 64);
                capture_count += 1;
            }
            parts.push(part);
        }

        Ok(Self {
            source: pattern.to_string(),
            parts,
            captured,
            capture_count,
        })
    }

    fn classify(body: &str, pattern: &str) -> RouterResult<Part> {
        match body {
            "*" => return Ok(Part::Wildcard),
            "**" => return Ok(Part::EndCapture),
            _ => {}
        }
        let Some((category, content)) = body.split_once(':') else {
            return Ok(Part::Literal(body.to_string()));
        };
        match category {
            "re" => Regex::new(&format!("^(?:{content})$"))
                .map(Part::Regex)
                .map_err(|e| RouterError::InvalidRegex {
                    segment: content.to_string(),
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                }),
            "static" => Ok(Part::Literal(content.to_string())),
            other => Err(RouterError::UnknownCategory {
                category: other.to_string(),
                pattern: pattern.to_string(),
            }),
        }
    }

    fn is_captured(&self, position: usize) -> bool {
        self.captured
            .get(position / 64)
            .is_some_and(|word| word & (1u64 << (position % 64)) != 0)
    }

    /// Returns the number of captured parts.
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.capture_count
    }

    /// Returns the source text of the pattern.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Matches pre-split path segments against the pattern.
    ///
    /// Succeeds only when every part advances the cursor and the cursor ends
    /// exactly at the end of `path`.
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> PathMatch {
        let mut captures = Captures::with_capacity(self.capture_count);
        let mut index = 0;

        for (position, part) in self.parts.iter().enumerate() {
            if index >= path.len() {
                return PathMatch::fail();
            }
            let next = part.consume(path, index).min(path.len());
            if next <= index {
                return PathMatch::fail();
            }
            if self.is_captured(position) {
                let joined = path[index..next]
                    .iter()
                    .map(AsRef::as_ref)
                    .collect::<Vec<&str>>()
                    .join("/");
                captures.push(joined);
            }
            index = next;
        }

        if index != path.len() {
            return PathMatch::fail();
        }
        PathMatch {
            success: true,
            captures,
        }
    }

    /// Convenience wrapper splitting `path` before matching.
    pub fn matches_path(&self, path: &str) -> PathMatch {
        self.matches(&split_path(path))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for PathPattern {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
