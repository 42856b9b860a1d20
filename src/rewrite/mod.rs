//! Link rewriting for mirrored documents
//!
//! This module turns fetched HTML and CSS into their offline form:
//! - Extracting the asset and page references a document carries
//! - Pointing those references at files of the output tree
//! - Injecting the service worker bootstrap into every page

mod body;
mod css;
mod dom;
mod html;

pub use body::BodyText;
pub use css::{extract_css_urls, rewrite_css};
pub use dom::{HtmlDocument, HtmlElement, KuchikiDocument, KuchikiElement};
pub use html::{
    extract_references, inject_bootstrap, rewrite_document, srcset_urls, AssetLookup,
    PageContext, References, RewriteStats, BOOTSTRAP_ID,
};
