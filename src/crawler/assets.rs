//! Asset resolution and deduplication
//!
//! The [`AssetResolver`] owns the table mapping remote asset URLs to their files
//! under `assets/`. Every URL is fetched and written at most once per run; pages
//! that reference the same asset all receive the same local path.
//!
//! Stylesheets get one extra step: their own `url(...)` references are resolved
//! first, and the stylesheet is written with those references pointing at the
//! sibling files in `assets/`.

use crate::crawler::{fetch_url, FetchResult};
use crate::output::write_atomic;
use crate::rewrite::{extract_css_urls, rewrite_css, AssetLookup, BodyText};
use crate::robots::RobotsFilter;
use crate::url::{asset_extension, asset_local_path, relative_link, resolve_reference, same_origin};
use crate::Result;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use url::Url;

/// Resolves asset URLs to stored local copies
pub struct AssetResolver {
    client: Client,
    out_dir: PathBuf,
    site_origin: Url,
    same_origin_only: bool,
    concurrency: usize,
    robots: Option<RobotsFilter>,

    /// Remote URL -> path relative to the output root
    table: HashMap<String, String>,

    /// URLs currently being fetched or post-processed
    pending: HashSet<String>,

    /// Fetched bodies of the current batch not yet written
    fetched: HashMap<String, (String, Vec<u8>)>,
}

impl AssetResolver {
    /// Creates a resolver writing under `out_dir`
    ///
    /// Defaults to same-origin assets only, 10 concurrent fetches and no robots rules.
    pub fn new(client: Client, out_dir: impl Into<PathBuf>, site_origin: Url) -> Self {
        Self {
            client,
            out_dir: out_dir.into(),
            site_origin,
            same_origin_only: true,
            concurrency: 10,
            robots: None,
            table: HashMap::new(),
            pending: HashSet::new(),
            fetched: HashMap::new(),
        }
    }

    /// Sets whether assets from other origins are refused
    pub fn same_origin_only(mut self, enabled: bool) -> Self {
        self.same_origin_only = enabled;
        self
    }

    /// Sets the number of fetches `resolve_all` keeps in flight
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    /// Installs (or clears) the robots rules consulted for same-origin assets
    pub fn set_robots(&mut self, robots: Option<RobotsFilter>) {
        self.robots = robots;
    }

    /// Number of assets stored so far
    pub fn stored_count(&self) -> usize {
        self.table.len()
    }

    /// Returns the local path of an already stored asset
    pub fn get(&self, url: &Url) -> Option<&str> {
        self.table.get(url.as_str()).map(String::as_str)
    }

    /// Resolves a single asset
    ///
    /// # Returns
    ///
    /// * `Ok(Some(path))` - The asset is stored (now or earlier) at `path`
    /// * `Ok(None)` - The asset was refused or its fetch failed; nothing is recorded
    /// * `Err(_)` - Writing the file failed
    pub async fn resolve(&mut self, url: &Url) -> Result<Option<String>> {
        if let Some(path) = self.table.get(url.as_str()) {
            return Ok(Some(path.clone()));
        }
        self.resolve_all(vec![url.clone()]).await?;
        Ok(self.table.get(url.as_str()).cloned())
    }

    /// Resolves a batch of assets with bounded concurrency
    ///
    /// URLs that are already stored, refused, or in flight in an enclosing call are
    /// skipped. All fetches complete before anything is written; files are then
    /// written one by one in URL order. A stylesheet that references another asset
    /// of the same batch writes that asset first, so its link can be rewritten.
    /// Returns the number of newly stored assets.
    pub fn resolve_all(&mut self, urls: Vec<Url>) -> BoxFuture<'_, Result<usize>> {
        async move {
            let mut batch = Vec::new();
            for url in urls {
                if self.table.contains_key(url.as_str()) || !self.admits(&url) {
                    continue;
                }
                if self.pending.insert(url.to_string()) {
                    batch.push(url);
                }
            }
            if batch.is_empty() {
                return Ok(0);
            }

            tracing::debug!("Fetching {} assets", batch.len());
            let client = self.client.clone();
            let fetched: Vec<(Url, FetchResult)> = stream::iter(batch)
                .map(|url| {
                    let client = client.clone();
                    async move {
                        let result = fetch_url(&client, url.as_str()).await;
                        (url, result)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

            let before = self.table.len();
            let keys: Vec<String> = fetched.iter().map(|(url, _)| url.to_string()).collect();
            let mut ready = Vec::new();

            for (url, result) in fetched {
                match result {
                    FetchResult::Success {
                        content_type, body, ..
                    } => {
                        self.fetched.insert(url.to_string(), (content_type, body));
                        ready.push(url);
                    }
                    FetchResult::HttpError { status_code } => {
                        tracing::debug!("Asset {} returned HTTP {}", url, status_code);
                    }
                    FetchResult::NetworkError { error } => {
                        tracing::debug!("Asset {} failed: {}", url, error);
                    }
                }
            }
            ready.sort();

            let mut outcome = Ok(());
            for url in ready {
                if let Err(e) = self.store_fetched(&url).await {
                    outcome = Err(e);
                    break;
                }
            }

            for key in keys {
                self.pending.remove(&key);
                self.fetched.remove(&key);
            }
            outcome.map(|()| self.table.len() - before)
        }
        .boxed()
    }

    /// Stores a body the caller already fetched (a non-HTML page)
    ///
    /// Returns the local path; an asset stored earlier is not written again.
    pub async fn adopt(&mut self, url: &Url, content_type: &str, body: Vec<u8>) -> Result<String> {
        if let Some(path) = self.table.get(url.as_str()) {
            return Ok(path.clone());
        }
        self.pending.insert(url.to_string());
        let result = self.store(url, content_type, body).await;
        self.pending.remove(url.as_str());
        result
    }

    /// Returns true if the URL may be fetched as an asset
    fn admits(&self, url: &Url) -> bool {
        let same_site = same_origin(url, &self.site_origin);
        if self.same_origin_only && !same_site {
            tracing::debug!("Skipping cross-origin asset {}", url);
            return false;
        }
        if let Some(robots) = &self.robots {
            if same_site && !robots.allows(url) {
                tracing::debug!("Skipping asset disallowed by robots.txt: {}", url);
                return false;
            }
        }
        true
    }

    /// Writes a body fetched by the current batch, unless a stylesheet already did
    async fn store_fetched(&mut self, url: &Url) -> Result<()> {
        if let Some((content_type, body)) = self.fetched.remove(url.as_str()) {
            self.store(url, &content_type, body).await?;
        }
        Ok(())
    }

    /// Writes a fetched body and records it in the table
    ///
    /// The local path depends on the URL alone; the content type only decides
    /// whether the body is treated as a stylesheet.
    fn store<'a>(
        &'a mut self,
        url: &'a Url,
        content_type: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, Result<String>> {
        async move {
            let ext = asset_extension(url);
            let local_path = asset_local_path(url, ext.as_deref());

            let body = if is_stylesheet(ext.as_deref(), content_type) {
                self.localize_stylesheet(url, &local_path, body).await?
            } else {
                body
            };

            write_atomic(&self.out_dir, &local_path, &body)?;
            tracing::debug!("Stored {} as {}", url, local_path);
            self.table.insert(url.to_string(), local_path.clone());
            Ok(local_path)
        }
        .boxed()
    }

    /// Resolves the references of a stylesheet and rewrites them relative to it
    async fn localize_stylesheet(
        &mut self,
        css_url: &Url,
        css_path: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>> {
        let text = BodyText::decode(body);
        let css = text.as_str();
        let nested: Vec<Url> = extract_css_urls(css)
            .iter()
            .filter_map(|raw| resolve_reference(css_url, raw))
            .collect();
        if nested.is_empty() {
            return Ok(text.into_bytes());
        }

        self.resolve_all(nested.clone()).await?;
        for url in &nested {
            if !self.table.contains_key(url.as_str()) {
                self.store_fetched(url).await?;
            }
        }

        let rewritten = rewrite_css(css, |raw| {
            let target = resolve_reference(css_url, raw)?;
            let local = self.table.get(target.as_str())?;
            let fragment = raw.find('#').map(|idx| &raw[idx..]).unwrap_or("");
            Some(format!("{}{}", relative_link(css_path, local), fragment))
        });
        if rewritten == css {
            return Ok(text.into_bytes());
        }
        Ok(text.encode(rewritten))
    }
}

impl AssetLookup for AssetResolver {
    fn local_path(&self, url: &Url) -> Option<&str> {
        self.get(url)
    }
}

fn is_stylesheet(ext: Option<&str>, content_type: &str) -> bool {
    ext.map(|e| e.eq_ignore_ascii_case(".css")).unwrap_or(false)
        || essence(content_type).eq_ignore_ascii_case("text/css")
}

/// Returns the media type of a Content-Type value without parameters
fn essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}
