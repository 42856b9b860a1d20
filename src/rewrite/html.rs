//! HTML reference extraction and link rewriting
//!
//! Extraction walks a fixed table of asset-bearing attributes plus anchors. The
//! rewrite pass points every downloaded asset at its local copy and every
//! same-origin anchor at the page file it will be mirrored to.

use crate::rewrite::css::{extract_css_urls, rewrite_css};
use crate::rewrite::dom::{HtmlDocument, HtmlElement};
use crate::url::{page_local_path, relative_link, resolve_reference, same_origin};
use std::collections::{BTreeSet, HashMap};
use url::Url;

/// Element id of the injected service worker bootstrap
pub const BOOTSTRAP_ID: &str = "siteclone-sw";

/// Inline script registering the generated service worker
const BOOTSTRAP_SCRIPT: &str = r#"<script id="siteclone-sw">if('serviceWorker' in navigator){navigator.serviceWorker.register('/sw.js');}</script>"#;

/// (selector, attribute) pairs carrying asset references
const ASSET_ATTRIBUTES: &[(&str, &str)] = &[
    ("img[src]", "src"),
    ("img[srcset]", "srcset"),
    ("source[src]", "src"),
    ("source[srcset]", "srcset"),
    ("link[href]", "href"),
    ("script[src]", "src"),
    ("video[poster]", "poster"),
    ("audio[src]", "src"),
    ("iframe[src]", "src"),
    ("track[src]", "src"),
    ("embed[src]", "src"),
    ("object[data]", "data"),
    (r#"meta[property="og:image"]"#, "content"),
    (r#"meta[name="twitter:image"]"#, "content"),
];

/// `<link rel>` values that name another document or origin rather than a resource
const NON_ASSET_LINK_RELS: &[&str] = &[
    "canonical",
    "alternate",
    "next",
    "prev",
    "dns-prefetch",
    "preconnect",
];

/// Looks up the local copy of a downloaded asset
pub trait AssetLookup {
    /// Returns the path (relative to the output root) of the stored asset
    fn local_path(&self, url: &Url) -> Option<&str>;
}

impl AssetLookup for HashMap<String, String> {
    fn local_path(&self, url: &Url) -> Option<&str> {
        self.get(url.as_str()).map(String::as_str)
    }
}

/// The page being rewritten
#[derive(Debug, Clone)]
pub struct PageContext {
    /// URL relative references are resolved against (the final, post-redirect URL)
    pub url: Url,
    /// Where the page is written, relative to the output root
    pub local_path: String,
}

impl PageContext {
    /// Context for a page mirrored at the path its own URL maps to
    pub fn new(url: Url) -> Self {
        let local_path = page_local_path(&url);
        Self { url, local_path }
    }

    /// Context for a page fetched at `requested` that ended up at `final_url`
    pub fn with_final_url(requested: &Url, final_url: Url) -> Self {
        Self {
            url: final_url,
            local_path: page_local_path(requested),
        }
    }
}

/// References discovered on a page
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct References {
    /// Absolute, fragment-free URLs of assets
    pub assets: BTreeSet<Url>,
    /// Absolute, fragment-free URLs of anchor targets
    pub pages: BTreeSet<Url>,
}

/// Counts of what a rewrite pass changed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteStats {
    /// Asset attribute values pointed at a local copy
    pub assets: usize,
    /// Anchors pointed at a local page
    pub pages: usize,
    /// Whether the service worker bootstrap was added by this pass
    pub bootstrap_injected: bool,
}

/// Collects asset and page references from a document
///
/// `srcset` candidates are extracted individually with descriptors dropped.
/// `url(...)` references inside `<style>` blocks and `style` attributes count as
/// assets. Values that cannot be resolved are skipped.
pub fn extract_references<D: HtmlDocument>(doc: &D, page_url: &Url) -> References {
    let mut refs = References::default();

    for &(selector, attr) in ASSET_ATTRIBUTES {
        for element in doc.select(selector) {
            if selector.starts_with("link") && !is_asset_link(&element) {
                continue;
            }
            let Some(value) = element.attr(attr) else {
                continue;
            };

            if attr == "srcset" {
                for candidate in srcset_urls(&value) {
                    if let Some(url) = resolve_reference(page_url, candidate) {
                        refs.assets.insert(url);
                    }
                }
            } else if let Some(url) = resolve_reference(page_url, &value) {
                refs.assets.insert(url);
            }
        }
    }

    for css in inline_css(doc) {
        for raw in extract_css_urls(&css) {
            if let Some(url) = resolve_reference(page_url, &raw) {
                refs.assets.insert(url);
            }
        }
    }

    for anchor in doc.select("a[href]") {
        if let Some(url) = anchor
            .attr("href")
            .and_then(|href| resolve_reference(page_url, &href))
        {
            refs.pages.insert(url);
        }
    }

    refs
}

/// Rewrites a document in place so it refers to the mirrored tree
///
/// - asset attributes whose URL has a local copy become page-relative paths
/// - same-origin anchors become page-relative paths of the mirrored page
/// - cross-origin anchors and assets without a local copy are left untouched
/// - `url(...)` references in inline CSS are rewritten through the same table
/// - the service worker bootstrap is injected once
///
/// Fragments (`#section`) on rewritten values are preserved.
pub fn rewrite_document<D, A>(
    doc: &D,
    page: &PageContext,
    site_origin: &Url,
    assets: &A,
) -> RewriteStats
where
    D: HtmlDocument,
    A: AssetLookup + ?Sized,
{
    let mut stats = RewriteStats {
        bootstrap_injected: inject_bootstrap(doc),
        ..RewriteStats::default()
    };

    let to_asset = |raw: &str| -> Option<String> {
        let url = resolve_reference(&page.url, raw)?;
        let local = assets.local_path(&url)?;
        Some(format!("{}{}", relative_link(&page.local_path, local), fragment(raw)))
    };

    for &(selector, attr) in ASSET_ATTRIBUTES {
        for element in doc.select(selector) {
            if selector.starts_with("link") && !is_asset_link(&element) {
                continue;
            }
            let Some(value) = element.attr(attr) else {
                continue;
            };

            if attr == "srcset" {
                let (rewritten, changed) = rewrite_srcset(&value, &to_asset);
                if changed > 0 {
                    element.set_attr(attr, &rewritten);
                    stats.assets += changed;
                }
            } else if let Some(local) = to_asset(&value) {
                element.set_attr(attr, &local);
                stats.assets += 1;
            }
        }
    }

    for style in doc.select("style") {
        let css = style.text();
        let rewritten = rewrite_css(&css, |raw| to_asset(raw));
        if rewritten != css {
            style.set_text(&rewritten);
        }
    }

    for element in doc.select("[style]") {
        if let Some(css) = element.attr("style") {
            let rewritten = rewrite_css(&css, |raw| to_asset(raw));
            if rewritten != css {
                element.set_attr("style", &rewritten);
            }
        }
    }

    for anchor in doc.select("a[href]") {
        let Some(href) = anchor.attr("href") else {
            continue;
        };
        let Some(url) = resolve_reference(&page.url, &href) else {
            continue;
        };

        if let Some(local) = assets.local_path(&url) {
            anchor.set_attr(
                "href",
                &format!("{}{}", relative_link(&page.local_path, local), fragment(&href)),
            );
            stats.pages += 1;
        } else if same_origin(&url, site_origin) {
            let target = page_local_path(&url);
            anchor.set_attr(
                "href",
                &format!("{}{}", relative_link(&page.local_path, &target), fragment(&href)),
            );
            stats.pages += 1;
        }
    }

    stats
}

/// Adds the service worker bootstrap unless the document already carries it
///
/// Returns true if the script was added.
pub fn inject_bootstrap<D: HtmlDocument>(doc: &D) -> bool {
    if !doc.select(&format!("script#{}", BOOTSTRAP_ID)).is_empty() {
        return false;
    }
    doc.append_to_head(BOOTSTRAP_SCRIPT)
}

/// Splits a `srcset` value into its candidate URLs
pub fn srcset_urls(srcset: &str) -> Vec<&str> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .collect()
}

/// Rewrites each `srcset` candidate, keeping descriptors; returns the count changed
fn rewrite_srcset<F>(srcset: &str, to_asset: &F) -> (String, usize)
where
    F: Fn(&str) -> Option<String>,
{
    let mut changed = 0;
    let candidates: Vec<String> = srcset
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            let descriptor = parts.collect::<Vec<_>>().join(" ");
            let url = match to_asset(url) {
                Some(local) => {
                    changed += 1;
                    local
                }
                None => url.to_string(),
            };
            Some(if descriptor.is_empty() {
                url
            } else {
                format!("{} {}", url, descriptor)
            })
        })
        .collect();

    (candidates.join(", "), changed)
}

fn is_asset_link<E: HtmlElement>(element: &E) -> bool {
    let rel = element.attr("rel").unwrap_or_default().to_ascii_lowercase();
    !rel
        .split_whitespace()
        .any(|token| NON_ASSET_LINK_RELS.contains(&token))
}

/// Returns the CSS text of every `<style>` block and `style` attribute
fn inline_css<D: HtmlDocument>(doc: &D) -> Vec<String> {
    let blocks = doc.select("style").into_iter().map(|style| style.text());
    let attributes = doc
        .select("[style]")
        .into_iter()
        .filter_map(|element| element.attr("style"));
    blocks.chain(attributes).collect()
}

/// Returns the `#fragment` suffix of a raw reference (empty when absent)
fn fragment(raw: &str) -> &str {
    raw.trim().find('#').map(|idx| &raw.trim()[idx..]).unwrap_or("")
}
