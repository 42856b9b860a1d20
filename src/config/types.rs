use serde::Deserialize;

/// Main configuration structure for siteclone
///
/// Every field has a default so a TOML file only needs to name what it changes;
/// command-line flags are applied on top of whatever the file provides.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    /// The page the crawl starts from
    #[serde(rename = "start-url", default)]
    pub start_url: String,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of distinct pages visited in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Only download assets served from the start URL's origin
    #[serde(rename = "same-origin", default = "default_true")]
    pub same_origin: bool,

    /// Maximum number of simultaneous asset fetches while processing one page
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Honor the site's robots.txt
    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,

    /// How Allow and Disallow prefixes are weighed against each other
    #[serde(rename = "robots-policy", default)]
    pub robots_policy: RobotsPolicy,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the mirrored tree
    #[serde(rename = "out-dir", default = "default_out_dir")]
    pub out_dir: String,
}

/// Robots.txt matching policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RobotsPolicy {
    /// Any matching Allow prefix wins; otherwise any matching Disallow prefix blocks
    #[default]
    AnyAllow,
    /// Conventional longest-match semantics
    LongestMatch,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            start_url: String::new(),
            crawler: CrawlerConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            same_origin: true,
            concurrency: default_concurrency(),
            timeout_ms: default_timeout_ms(),
            respect_robots: true,
            robots_policy: RobotsPolicy::default(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

impl MirrorConfig {
    /// Creates a default configuration for the given start URL
    pub fn for_url(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            ..Self::default()
        }
    }
}

fn default_max_pages() -> usize {
    100
}

fn default_concurrency() -> usize {
    10
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

fn default_out_dir() -> String {
    "dist/site".to_string()
}

fn default_user_agent() -> String {
    format!("siteclone/{}", env!("CARGO_PKG_VERSION"))
}
