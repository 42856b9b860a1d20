//! CSS `url(...)` and `@import` rewriting
//!
//! Stylesheets are not parsed into a syntax tree. References are located with two
//! patterns and replaced in place, so everything else in the text is preserved
//! byte for byte and an unresolved reference leaves the stylesheet unchanged.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// `url(...)` with a single-quoted, double-quoted or bare argument
static URL_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:'([^']*)'|"([^"]*)"|([^'"\s)][^\s)]*))\s*\)"#)
        .expect("url() pattern is valid")
});

/// `@import "..."` / `@import '...'` without `url()`
static IMPORT_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)@import\s+(?:'([^']*)'|"([^"]*)")"#).expect("@import pattern is valid")
});

/// Returns every reference found in `url(...)` and `@import` strings
///
/// `data:` URIs and fragment-only references (`url(#clip)`) are left out.
///
/// # Example
///
/// ```
/// use siteclone::rewrite::extract_css_urls;
///
/// let urls = extract_css_urls("a { background: url('/img/a.png') } @import \"theme.css\";");
/// assert_eq!(urls, vec!["/img/a.png", "theme.css"]);
/// ```
pub fn extract_css_urls(css: &str) -> Vec<String> {
    let mut urls = Vec::new();

    for caps in URL_FUNCTION.captures_iter(css) {
        if let Some((_, value)) = reference(&caps) {
            if is_rewritable(value) {
                urls.push(value.to_string());
            }
        }
    }

    for caps in IMPORT_STRING.captures_iter(css) {
        if let Some((_, value)) = reference(&caps) {
            if is_rewritable(value) {
                urls.push(value.to_string());
            }
        }
    }

    urls
}

/// Replaces each reference with the result of `resolve`
///
/// `resolve` receives the reference exactly as written. Returning `None` keeps the
/// original text, which keeps the stylesheet valid when a download failed.
///
/// # Example
///
/// ```
/// use siteclone::rewrite::rewrite_css;
///
/// let css = "body { background: url(/bg.png) } .x { background: url(/missing.png) }";
/// let out = rewrite_css(css, |url| (url == "/bg.png").then(|| "./assets/1.png".to_string()));
/// assert_eq!(out, "body { background: url(\"./assets/1.png\") } .x { background: url(/missing.png) }");
/// ```
pub fn rewrite_css<F>(css: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let rewritten = URL_FUNCTION.replace_all(css, |caps: &Captures| {
        let original = caps[0].to_string();
        match reference(caps) {
            Some((quote, value)) if is_rewritable(value) => match resolve(value) {
                Some(local) => format!("url({})", quoted(&local, quote)),
                None => original,
            },
            _ => original,
        }
    });

    IMPORT_STRING
        .replace_all(&rewritten, |caps: &Captures| {
            let original = caps[0].to_string();
            match reference(caps) {
                Some((quote, value)) if is_rewritable(value) => match resolve(value) {
                    Some(local) => format!("@import {}", quoted(&local, quote.or(Some('"')))),
                    None => original,
                },
                _ => original,
            }
        })
        .into_owned()
}

/// Extracts the quote character (if any) and the reference text from a match
fn reference<'a>(caps: &'a Captures<'_>) -> Option<(Option<char>, &'a str)> {
    if let Some(m) = caps.get(1) {
        return Some((Some('\''), m.as_str()));
    }
    if let Some(m) = caps.get(2) {
        return Some((Some('"'), m.as_str()));
    }
    caps.get(3).map(|m| (None, m.as_str()))
}

fn is_rewritable(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.starts_with('#') && !value.to_ascii_lowercase().starts_with("data:")
}

/// Quotes a rewritten path; bare references are emitted double-quoted
fn quoted(value: &str, quote: Option<char>) -> String {
    match quote {
        Some('\'') => format!("'{}'", value),
        _ => format!("\"{}\"", value),
    }
}
