// src/crawl/url.rs
// =============================================================================
// URL validation and normalization.
//
// Every URL the crawler stores is normalized first:
// - resolved against the page it was found on (relative, protocol-relative
//   and absolute links all work through Url::join)
// - query string and fragment removed
// - only URLs with both a scheme and a host survive
//
// The normalized string is the identity key for the visited set, so two
// links that only differ by "?utm=..." or "#section" count as one page.
// =============================================================================

use url::Url;

// Returns true when the URL parses and has both a scheme and a host
//
// Examples:
//   "https://example.test/faq" -> true
//   "mailto:someone@example.test" -> false (no host)
//   "/relative/path" -> false (not absolute)
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => !parsed.scheme().is_empty() && has_host(&parsed),
        Err(_) => false,
    }
}

// Resolves `link` against `base_url` and strips query and fragment
//
// Returns None when the link cannot be resolved or the result has no host.
// Never panics: a malformed base or link just yields None.
pub fn normalize(base_url: &str, link: &str) -> Option<String> {
    let link = link.trim();

    // An unparseable base still lets absolute links through
    let mut resolved = match Url::parse(base_url) {
        Ok(base) => base.join(link).ok()?,
        Err(_) => Url::parse(link).ok()?,
    };

    resolved.set_query(None);
    resolved.set_fragment(None);

    if !has_host(&resolved) {
        return None;
    }

    Some(resolved.to_string())
}

// The part of a URL that decides whether two pages belong to the same site
//
// Host plus an explicit port. The url crate already drops ports that match
// the scheme default, so "https://a.test:443/" and "https://a.test/" agree.
pub fn authority(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;

    match parsed.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host.to_string()),
    }
}

// Lowercased path component, used for extension filtering
pub fn lowercase_path(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|u| u.path().to_lowercase())
}

fn has_host(url: &Url) -> bool {
    url.host_str().map_or(false, |h| !h.is_empty())
}
