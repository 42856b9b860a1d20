use crate::UrlError;
use url::Url;

/// Schemes that never point at something the mirror can download
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:", "blob:", "about:"];

/// Normalizes a URL into the form used for frontier and dedup keys
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an http or https scheme
/// 3. Require a host
/// 4. Remove the fragment
///
/// Host lowercasing, default-port removal and dot-segment removal are performed
/// by the URL parser itself. The query string is kept verbatim because two pages
/// that differ only by query are mirrored to different files.
///
/// # Examples
///
/// ```
/// use siteclone::url::normalize_url;
///
/// let url = normalize_url("HTTPS://Example.COM:443/a/../b?q=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/b?q=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Resolves an attribute value found on a page to an absolute, normalized URL
///
/// Returns None if the reference should be ignored:
/// - empty values
/// - fragment-only references (same page anchors)
/// - javascript:, mailto:, tel:, data:, blob:, about: schemes
/// - values that fail to parse or resolve to a non-HTTP(S) URL
pub fn resolve_reference(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();

    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return None;
    }

    let joined = base.join(raw).ok()?;
    normalize_url(joined.as_str()).ok()
}
