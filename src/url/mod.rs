//! URL handling module for siteclone
//!
//! This module provides URL normalization, reference resolution, origin checks and
//! the mapping from remote URLs to paths inside the output tree.

mod mapping;
mod normalize;

pub use mapping::{
    asset_extension, asset_local_path, encode_link_path, page_local_path, relative_link,
};
pub use normalize::{normalize_url, resolve_reference};

use url::Url;

/// Returns true when both URLs share scheme, host and port
///
/// # Examples
///
/// ```
/// use siteclone::url::same_origin;
/// use url::Url;
///
/// let a = Url::parse("https://example.com/a").unwrap();
/// let b = Url::parse("https://example.com:443/b?x=1").unwrap();
/// let c = Url::parse("http://example.com/a").unwrap();
/// assert!(same_origin(&a, &b));
/// assert!(!same_origin(&a, &c));
/// ```
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
