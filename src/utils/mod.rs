//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sort key for loosely formatted dates.
///
/// `.` and `/` become `-` so `2025.03.01`, `2025/03/01` and `2025-03-01`
/// compare lexicographically. This is an approximate chronological order,
/// not a calendar check. Strings that do not start with a four-digit year
/// map to the empty key so they sort below every dated record.
pub fn date_sort_key(date: &str) -> String {
    let normalized = date.trim().replace(['.', '/'], "-");
    let has_year = normalized.len() >= 4 && normalized.bytes().take(4).all(|b| b.is_ascii_digit());
    if has_year { normalized } else { String::new() }
}
