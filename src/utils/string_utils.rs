//! UTF-8-safe string truncation
//!
//! Slug prefixes come from arbitrary URL path segments, which may hold
//! percent-decoded multi-byte characters. Byte slicing would panic on them.

/// Truncate a string to at most `max_chars` characters (not bytes).
///
/// Never splits a multi-byte character and never allocates.
///
/// ```
/// # use release_harvester::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("funding-round", 7), "funding");
/// assert_eq!(safe_truncate_chars("série-a", 5), "série");
/// assert_eq!(safe_truncate_chars("vc", 100), "vc");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}
