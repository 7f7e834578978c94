//! `Accept` header parsing.

use std::cmp::Ordering;

use crate::error::RouterResult;
use crate::mime::{MimeType, WILDCARD};

/// Default bound on the number of entries read from one `Accept` header.
pub const DEFAULT_ACCEPT_LIMIT: usize = 50;

/// Bound on the number of `;`-separated parameters read from one entry.
const PARAMETER_LIMIT: usize = 50;

/// One weighted entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptEntry {
    /// The accepted media range
    pub mime: MimeType,
    /// Weight in `[0, 1]`
    pub quality: f32,
}

impl AcceptEntry {
    /// Parses `type/subtype[;param=value...]`.
    ///
    /// A missing or unparsable `q` parameter yields a quality of 1.
    /// Out of range weights are clamped.
    pub fn parse(entry: &str) -> RouterResult<Self> {
        let mut pieces = entry.splitn(PARAMETER_LIMIT + 1, ';');
        let mime = MimeType::parse(pieces.next().unwrap_or_default())?;
        let quality = pieces
            .take(PARAMETER_LIMIT)
            .filter_map(|param| param.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("q"))
            .and_then(|(_, value)| value.trim().parse::<f32>().ok())
            .filter(|q| q.is_finite())
            .map_or(1.0, |q| q.clamp(0.0, 1.0));
        Ok(Self { mime, quality })
    }

    /// Preference order: higher quality first, then literal components
    /// before wildcards (primary, then secondary).
    fn preference(&self, other: &Self) -> Ordering {
        other
            .quality
            .total_cmp(&self.quality)
            .then_with(|| star_rank(self.mime.primary()).cmp(&star_rank(other.mime.primary())))
            .then_with(|| {
                star_rank(self.mime.secondary()).cmp(&star_rank(other.mime.secondary()))
            })
    }
}

fn star_rank(component: &str) -> u8 {
    u8::from(component == WILDCARD)
}

/// Parses an `Accept` header into entries ranked by preference.
///
/// At most `limit` comma-separated entries are read. Entries past the
/// limit are dropped unread, even when they would outrank the ones kept,
/// and blank pieces count toward the limit. Blank and malformed entries
/// are skipped. The sort is stable, so equally preferred entries
/// keep their header order.
///
/// # Example
///
/// ```rust
/// use heron_router::{parse_accept, DEFAULT_ACCEPT_LIMIT};
///
/// let ranked = parse_accept("text/html;q=0.5,application/json;q=0.9", DEFAULT_ACCEPT_LIMIT);
/// assert_eq!(ranked[0].mime.to_string(), "application/json");
/// assert_eq!(ranked[1].mime.to_string(), "text/html");
/// ```
#[must_use]
pub fn parse_accept(header: &str, limit: usize) -> Vec<AcceptEntry> {
    let mut entries: Vec<AcceptEntry> = header
        .split(',')
        .take(limit)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match AcceptEntry::parse(entry) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::debug!(entry, error = %err, "skipping malformed accept entry");
                None
            }
        })
        .collect();
    entries.sort_by(AcceptEntry::preference);
    entries
}
