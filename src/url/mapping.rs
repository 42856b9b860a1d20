//! Mapping from remote URLs to paths inside the output tree
//!
//! Every path written under the output root comes from one of these functions and
//! depends on nothing but the URL, so re-running a clone rewrites the same files.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use std::path::{Component, Path};
use url::Url;

/// Directory (relative to the output root) holding every downloaded asset
pub const ASSETS_DIR: &str = "assets";

/// Hex characters of the URL digest kept in an asset filename (40 bits)
const ASSET_HASH_LEN: usize = 10;

/// Fallback extension for assets whose URL carries none
const DEFAULT_ASSET_EXT: &str = ".bin";

/// Longest extension accepted from a URL path
const MAX_EXT_LEN: usize = 8;

/// Maps a page URL to its relative path in the output tree
///
/// # Mapping Rules
///
/// | URL path          | Local path            |
/// |-------------------|-----------------------|
/// | `/` or empty      | `index.html`          |
/// | `/docs/`          | `docs/index.html`     |
/// | `/about`          | `about.html`          |
/// | `/feed.xml`       | `feed.xml`            |
/// | `/search?q=a`     | `search_cT1h.html`    |
///
/// A non-empty query is base64url-encoded and inserted before the extension so
/// pages that differ only by query never overwrite each other.
///
/// # Examples
///
/// ```
/// use siteclone::url::page_local_path;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/docs/").unwrap();
/// assert_eq!(page_local_path(&url), "docs/index.html");
/// ```
pub fn page_local_path(url: &Url) -> String {
    let path = decoded_path(url);

    let mut local = if path.ends_with('/') {
        format!("{}index.html", path)
    } else if has_extension(last_segment(&path)) {
        path
    } else {
        format!("{}.html", path)
    };

    local = local.trim_start_matches('/').to_string();
    if local.is_empty() {
        local = "index.html".to_string();
    }

    match url.query().filter(|q| !q.is_empty()) {
        Some(query) => insert_before_extension(&local, &URL_SAFE_NO_PAD.encode(query)),
        None => local,
    }
}

/// Maps an asset URL to its content-addressed path under `assets/`
///
/// The filename is the first 10 hex characters of the SHA-256 digest of the full
/// URL string followed by `ext` (or `.bin` when no extension is known). Distinct
/// URLs only collide on a 40-bit digest prefix collision.
///
/// # Examples
///
/// ```
/// use siteclone::url::asset_local_path;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/img/logo.png").unwrap();
/// let path = asset_local_path(&url, Some(".png"));
/// assert!(path.starts_with("assets/"));
/// assert!(path.ends_with(".png"));
/// assert_eq!(path.len(), "assets/".len() + 10 + ".png".len());
/// ```
pub fn asset_local_path(url: &Url, ext: Option<&str>) -> String {
    let digest = hex::encode(Sha256::digest(url.as_str().as_bytes()));
    let ext = match ext.filter(|e| !e.is_empty() && *e != ".") {
        Some(e) if e.starts_with('.') => e.to_string(),
        Some(e) => format!(".{}", e),
        None => DEFAULT_ASSET_EXT.to_string(),
    };
    format!("{}/{}{}", ASSETS_DIR, &digest[..ASSET_HASH_LEN], ext)
}

/// Returns the extension (with leading dot) of the URL's last path segment
///
/// Only short alphanumeric extensions are accepted, so paths such as
/// `/v1.2/download` do not yield a bogus extension.
pub fn asset_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let ext = Path::new(segment).extension()?.to_str()?;

    if ext.is_empty() || ext.len() > MAX_EXT_LEN || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    Some(format!(".{}", ext))
}

/// Builds the link that leads from one file of the output tree to another
///
/// Both arguments are paths relative to the output root. The result is relative
/// to the directory containing `from_page`, uses forward slashes, and starts with
/// `./` unless it climbs out of that directory. Each segment is percent-encoded,
/// so a filename holding `?`, `#` or `%` still names the file when the link is
/// followed.
///
/// # Examples
///
/// ```
/// use siteclone::url::relative_link;
///
/// assert_eq!(relative_link("index.html", "assets/a.png"), "./assets/a.png");
/// assert_eq!(relative_link("docs/intro.html", "assets/a.png"), "../assets/a.png");
/// assert_eq!(relative_link("index.html", "a?b.html"), "./a%3Fb.html");
/// ```
pub fn relative_link(from_page: &str, to_path: &str) -> String {
    let from_dir = Path::new(from_page).parent().unwrap_or_else(|| Path::new(""));

    let joined = match pathdiff::diff_paths(to_path, from_dir) {
        Some(diff) => diff
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => {
                    Some(urlencoding::encode(&part.to_string_lossy()).into_owned())
                }
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"),
        None => encode_link_path(to_path),
    };

    if joined.starts_with("../") {
        joined
    } else {
        format!("./{}", joined)
    }
}

/// Percent-encodes each segment of a `/`-separated path of the output tree
///
/// # Examples
///
/// ```
/// use siteclone::url::encode_link_path;
///
/// assert_eq!(encode_link_path("docs/100%.html"), "docs/100%25.html");
/// ```
pub fn encode_link_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-decodes each path segment when the result is a safe filename
fn decoded_path(url: &Url) -> String {
    url.path()
        .split('/')
        .map(|segment| match urlencoding::decode(segment) {
            Ok(decoded) if is_safe_segment(&decoded) => decoded.into_owned(),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_safe_segment(segment: &str) -> bool {
    segment != "." && segment != ".." && !segment.contains(['/', '\\', '\0'])
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

fn has_extension(segment: &str) -> bool {
    Path::new(segment).extension().is_some()
}

/// Inserts `_<tag>` between the stem and extension of the final segment
fn insert_before_extension(local: &str, tag: &str) -> String {
    let (dir, file) = match local.rfind('/') {
        Some(idx) => (&local[..=idx], &local[idx + 1..]),
        None => ("", local),
    };

    match file.rfind('.') {
        Some(dot) if dot > 0 => format!("{}{}_{}{}", dir, &file[..dot], tag, &file[dot..]),
        _ => format!("{}{}_{}", dir, file, tag),
    }
}
