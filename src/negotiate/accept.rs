//! `Accept` header value splitting.

/// Split one raw `Accept` value into media ranges.
///
/// Ranges are trimmed and kept in header order; empty ranges are dropped.
/// Quality weights are not interpreted, so `text/html;q=0.9` stays one
/// opaque candidate.
pub fn parse_accept_header(header: &str) -> Vec<&str> {
    header
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .collect()
}
