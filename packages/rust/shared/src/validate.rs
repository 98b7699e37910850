//! URL, domain, and email validation helpers.
//!
//! These gate what enters the worklist and what leaves as a draft:
//! `validate_url` filters spreadsheet rows, `extract_domain` derives the
//! enrichment lookup key, `validate_email` guards draft recipients.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// True iff `s` parses as an absolute URL with an http(s) scheme and a
/// non-empty host. Malformed input maps to `false`, never an error.
pub fn validate_url(s: &str) -> bool {
    match Url::parse(s) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// The host component of `s` with any port suffix stripped, or `None`
/// if the URL has no host (or does not parse at all).
///
/// Callers that have already validated the URL treat `None` as an
/// item-fatal error; here it is just an absent value.
pub fn extract_domain(s: &str) -> Option<String> {
    let url = Url::parse(s).ok()?;
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_string())
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

/// True iff `s` looks like a `local@domain.tld` address.
pub fn validate_email(s: &str) -> bool {
    email_regex().is_match(s)
}
