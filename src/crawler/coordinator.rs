//! Crawler coordinator - main clone orchestration logic
//!
//! This module contains the crawl loop that coordinates a clone:
//! - Loading robots.txt once before the first page
//! - Draining the breadth-first frontier within the page budget
//! - Resolving each page's assets and rewriting its links
//! - Writing pages and generating the service worker manifest

use crate::config::{validate, MirrorConfig};
use crate::crawler::assets::AssetResolver;
use crate::crawler::frontier::Frontier;
use crate::crawler::{build_http_client, fetch_url, is_html_content_type, FetchResult};
use crate::output::{write_atomic, write_service_worker, CloneSummary, NoopReporter, ProgressReporter};
use crate::rewrite::{
    extract_references, rewrite_document, BodyText, HtmlDocument, KuchikiDocument, PageContext,
};
use crate::robots::{load_robots, robots_url, RobotsFilter};
use crate::state::{PageRecord, PageState};
use crate::url::{normalize_url, page_local_path, same_origin};
use crate::Result;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// A single clone session
///
/// Owns every piece of mutable crawl state: the frontier, the visited set and the
/// asset table. All of it is touched only from the task driving [`Coordinator::run`].
pub struct Coordinator {
    config: MirrorConfig,
    start_url: Url,
    client: Client,
    out_dir: PathBuf,
    robots: Option<RobotsFilter>,
    frontier: Frontier,
    assets: AssetResolver,
    reporter: Box<dyn ProgressReporter>,
    summary: CloneSummary,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The clone configuration; it is validated here
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(MirrorError)` - Invalid configuration or HTTP client setup failure
    pub fn new(config: MirrorConfig) -> Result<Self> {
        validate(&config)?;

        let start_url = normalize_url(&config.start_url)?;
        let client = build_http_client(
            &config.crawler.user_agent,
            Duration::from_millis(config.crawler.timeout_ms),
        )?;
        let out_dir = PathBuf::from(&config.output.out_dir);

        let frontier = Frontier::new(start_url.clone(), config.crawler.max_pages);
        let assets = AssetResolver::new(client.clone(), out_dir.clone(), start_url.clone())
            .same_origin_only(config.crawler.same_origin)
            .concurrency(config.crawler.concurrency);

        Ok(Self {
            summary: CloneSummary::started(out_dir.clone()),
            config,
            start_url,
            client,
            out_dir,
            robots: None,
            frontier,
            assets,
            reporter: Box::new(NoopReporter),
        })
    }

    /// Replaces the progress reporter
    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Runs the clone to completion
    ///
    /// 1. Loads robots.txt (when enabled)
    /// 2. Dequeues pages FIFO until the frontier is empty or the budget is spent
    /// 3. Writes `sw.js` over the finished tree
    ///
    /// Per-page fetch failures are counted and skipped; a failed write aborts the run.
    pub async fn run(mut self) -> Result<CloneSummary> {
        tracing::info!(
            "Cloning {} into {} (max {} pages)",
            self.start_url,
            self.out_dir.display(),
            self.config.crawler.max_pages
        );
        std::fs::create_dir_all(&self.out_dir)?;

        if self.config.crawler.respect_robots {
            self.load_robots().await;
        }

        while let Some(url) = self.frontier.pop() {
            let state = self.process_page(url).await?;
            self.summary.record(state);
            self.reporter
                .report(self.frontier.visited_count(), self.assets.stored_count());
        }

        self.summary.precached_files = write_service_worker(&self.out_dir)?;
        self.summary.pages_visited = self.frontier.visited_count();
        self.summary.assets_stored = self.assets.stored_count();

        let summary = self.summary.finished();
        self.reporter.finish(&summary);
        tracing::info!("{}", summary);
        Ok(summary)
    }

    /// Fetches robots.txt once; a missing or unreadable file imposes no rules
    async fn load_robots(&mut self) {
        let Some(location) = robots_url(&self.start_url) else {
            return;
        };

        match load_robots(&self.client, &location).await {
            Some(rules) => {
                tracing::info!("Loaded robots.txt from {}", location);
                let filter = RobotsFilter::new(
                    rules,
                    self.config.crawler.robots_policy,
                    self.config.crawler.user_agent.clone(),
                );
                self.assets.set_robots(Some(filter.clone()));
                self.robots = Some(filter);
            }
            None => tracing::info!("No usable robots.txt at {}, crawling unrestricted", location),
        }
    }

    /// Takes one dequeued URL to a terminal state
    async fn process_page(&mut self, url: Url) -> Result<PageState> {
        let mut record = PageRecord::queued(url);

        if self.frontier.is_visited(record.url()) {
            record.advance(PageState::SkippedVisited)?;
            return Ok(record.state());
        }

        if let Some(robots) = &self.robots {
            if !robots.allows(record.url()) {
                tracing::debug!("{} disallowed by robots.txt", record.url());
                record.advance(PageState::SkippedRobots)?;
                return Ok(record.state());
            }
        }

        self.frontier.mark_visited(record.url());
        record.advance(PageState::Fetching)?;

        let next = match fetch_url(&self.client, record.url().as_str()).await {
            FetchResult::Success {
                final_url,
                content_type,
                body,
                ..
            } => {
                if is_html_content_type(&content_type) {
                    self.process_html(record.url(), &final_url, body).await?;
                    PageState::HtmlProcessed
                } else {
                    self.process_non_html(record.url(), &content_type, body).await?;
                    PageState::NonHtmlAsset
                }
            }
            FetchResult::HttpError { status_code } => {
                tracing::debug!("{} returned HTTP {}", record.url(), status_code);
                PageState::FetchFailed
            }
            FetchResult::NetworkError { error } => {
                tracing::debug!("{} failed: {}", record.url(), error);
                PageState::FetchFailed
            }
        };

        record.advance(next)?;
        Ok(record.state())
    }

    /// Stores a non-HTML response as an asset
    ///
    /// Anchors on earlier pages were already rewritten to the page path of this
    /// URL, so the stored file is also copied there.
    async fn process_non_html(&mut self, url: &Url, content_type: &str, body: Vec<u8>) -> Result<()> {
        let asset_path = self.assets.adopt(url, content_type, body).await?;
        let page_path = page_local_path(url);
        if page_path != asset_path {
            let bytes = std::fs::read(self.out_dir.join(&asset_path))?;
            write_atomic(&self.out_dir, &page_path, &bytes)?;
        }
        tracing::debug!("{} is not HTML, stored as {} and {}", url, asset_path, page_path);
        Ok(())
    }

    /// Resolves a page's assets, rewrites it, writes it and enqueues its links
    ///
    /// The page is stored at the path of the URL that was requested; references are
    /// resolved against the URL the response finally came from.
    async fn process_html(&mut self, requested: &Url, final_url: &str, body: Vec<u8>) -> Result<()> {
        let final_url = Url::parse(final_url).unwrap_or_else(|_| requested.clone());
        let page = PageContext::with_final_url(requested, final_url);
        let body = BodyText::decode(body);

        let references = {
            let doc = KuchikiDocument::parse(body.as_str());
            extract_references(&doc, &page.url)
        };

        self.assets
            .resolve_all(references.assets.into_iter().collect())
            .await?;

        let rewritten = {
            let doc = KuchikiDocument::parse(body.as_str());
            let stats = rewrite_document(&doc, &page, &self.start_url, &self.assets);
            tracing::trace!(
                "{}: {} asset and {} page links rewritten",
                page.url,
                stats.assets,
                stats.pages
            );
            body.encode(doc.serialize())
        };

        write_atomic(&self.out_dir, &page.local_path, &rewritten)?;
        tracing::debug!("Wrote {} as {}", requested, page.local_path);

        for link in references.pages {
            if same_origin(&link, &self.start_url) {
                self.frontier.push(link);
            }
        }
        Ok(())
    }
}

/// Runs a complete clone with the given reporter
///
/// # Example
///
/// ```no_run
/// use siteclone::config::MirrorConfig;
/// use siteclone::crawler::clone_site;
/// use siteclone::output::NoopReporter;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = MirrorConfig::for_url("https://example.com/");
/// config.output.out_dir = "mirror".to_string();
/// let summary = clone_site(config, Box::new(NoopReporter)).await?;
/// println!("{}", summary);
/// # Ok(())
/// # }
/// ```
pub async fn clone_site(
    config: MirrorConfig,
    reporter: Box<dyn ProgressReporter>,
) -> Result<CloneSummary> {
    Coordinator::new(config)?.with_reporter(reporter).run().await
}
