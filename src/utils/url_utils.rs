//! URL and filename helpers for article links.
//!
//! Links are opaque identities: nothing here canonicalizes them. The only
//! transformation is resolving a relative `href` against the index page it
//! came from, and deriving a filesystem-safe slug for the saved text.

use url::Url;
use xxhash_rust::xxh3::xxh3_64;

use super::constants::MAX_SLUG_SEGMENT_CHARS;
use super::string_utils::safe_truncate_chars;

/// Check if a URL is an absolute http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Resolve an `href` found on `page_url` into an absolute link.
///
/// Absolute hrefs are returned byte-for-byte unchanged so that link identity
/// stays exact string equality.
#[must_use]
pub fn resolve_href(page_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if is_valid_url(href) {
        return Some(href.to_string());
    }
    let base = Url::parse(page_url).ok()?;
    let joined = base.join(href).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// Last `/`-separated segment of a link, ignoring nothing.
///
/// `https://x/news/a-b.html` yields `a-b.html`; a trailing slash yields `""`.
#[must_use]
pub fn last_path_segment(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}

/// Filesystem-safe, collision-free file stem for an article link.
///
/// The readable prefix comes from the last path segment; the suffix is the
/// xxh3 hash of the whole link, so two links sharing a trailing segment never
/// map to the same file.
#[must_use]
pub fn article_slug(link: &str) -> String {
    let options = sanitize_filename::Options {
        truncate: true,
        windows: true,
        replacement: "_",
    };
    let segment = sanitize_filename::sanitize_with_options(last_path_segment(link), options);
    let segment = safe_truncate_chars(segment.trim_matches('.'), MAX_SLUG_SEGMENT_CHARS);
    let prefix = if segment.is_empty() { "article" } else { segment };

    format!("{prefix}-{:016x}", xxh3_64(link.as_bytes()))
}
