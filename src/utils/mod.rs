//! Utility functions and helpers.

pub mod html;

use percent_encoding::percent_decode_str;
use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Derive a local filename from the final (possibly redirected) URL of a
/// download, percent-decoded. Falls back to "download" when the URL has no
/// usable last segment or the decoded name is not a plain filename.
pub fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or("");
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    let name = decoded.trim();
    // Decoding can reintroduce separators (`%2F`, `%5C`), and a redirecting
    // server controls the final URL; such names must never reach a path join.
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        "download".to_string()
    } else {
        name.to_string()
    }
}
