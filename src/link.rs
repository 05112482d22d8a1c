// src/link.rs
// Link safety: pulls the first URL out of a model reply and checks it against
// the tier's trusted markers.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s)]+").expect("URL pattern is valid"));

pub const GOV_MARKER: &str = ".gov";
pub const ORG_MARKER: &str = ".org";

/// First `http(s)://` substring, stopping at whitespace or `)`.
pub fn extract_first_url(text: &str) -> Option<&str> {
    URL_PATTERN.find(text).map(|m| m.as_str())
}

/// True when the host of `link` ends with one of `trusted_markers`.
/// Only the host is checked, so `governmentjobs.com` or `?next=x.gov` do not pass.
pub fn is_trusted_link<S: AsRef<str>>(link: &str, trusted_markers: &[S]) -> bool {
    let Ok(parsed) = Url::parse(link) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.trim_end_matches('.').to_ascii_lowercase();

    trusted_markers
        .iter()
        .any(|marker| host.ends_with(&marker.as_ref().to_ascii_lowercase()))
}

/// Removes the first occurrence of `link` from `reply` and trims what is left.
pub fn strip_link(reply: &str, link: &str) -> String {
    if link.is_empty() {
        return reply.trim().to_string();
    }
    reply.replacen(link, "", 1).trim().to_string()
}
