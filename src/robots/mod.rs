//! Robots.txt handling module
//!
//! The rules are fetched once before crawling starts and consulted for every page
//! and same-origin asset. A robots.txt that cannot be fetched imposes no restrictions.

mod parser;

pub use parser::{RobotsGroup, RobotsRules};

use crate::config::RobotsPolicy;
use crate::crawler::{fetch_url, FetchResult};
use reqwest::Client;
use url::Url;

/// Robots rules bound to the policy and user agent they are evaluated with
#[derive(Debug, Clone)]
pub struct RobotsFilter {
    rules: RobotsRules,
    policy: RobotsPolicy,
    user_agent: String,
}

impl RobotsFilter {
    /// Creates a filter over already parsed rules
    pub fn new(rules: RobotsRules, policy: RobotsPolicy, user_agent: impl Into<String>) -> Self {
        Self {
            rules,
            policy,
            user_agent: user_agent.into(),
        }
    }

    /// Checks if a URL may be fetched
    pub fn allows(&self, url: &Url) -> bool {
        self.rules.is_allowed_with(url, self.policy, &self.user_agent)
    }

    /// Returns the underlying rules
    pub fn rules(&self) -> &RobotsRules {
        &self.rules
    }
}

/// Returns the robots.txt location for the origin of `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}

/// Fetches and parses robots.txt
///
/// # Returns
///
/// * `Some(RobotsRules)` - The document was fetched with a 2xx status
/// * `None` - Any network error or non-success status; the crawl runs unfiltered
pub async fn load_robots(client: &Client, robots_url: &Url) -> Option<RobotsRules> {
    match fetch_url(client, robots_url.as_str()).await {
        FetchResult::Success { body, .. } => {
            Some(RobotsRules::parse(&String::from_utf8_lossy(&body)))
        }
        FetchResult::HttpError { status_code } => {
            tracing::debug!("robots.txt at {} returned HTTP {}", robots_url, status_code);
            None
        }
        FetchResult::NetworkError { error } => {
            tracing::debug!("robots.txt at {} unavailable: {}", robots_url, error);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robots_url_uses_origin_root() {
        let page = Url::parse("https://example.com:8443/deep/page?x=1").unwrap();
        assert_eq!(
            robots_url(&page).unwrap().as_str(),
            "https://example.com:8443/robots.txt"
        );
    }

    #[test]
    fn test_filter_applies_policy() {
        let rules = RobotsRules::parse("User-agent: *\nAllow: /docs\nDisallow: /docs/internal");
        let page = Url::parse("https://example.com/docs/internal/x").unwrap();

        let lenient = RobotsFilter::new(rules.clone(), RobotsPolicy::AnyAllow, "TestBot");
        let strict = RobotsFilter::new(rules, RobotsPolicy::LongestMatch, "TestBot");

        assert!(lenient.allows(&page));
        assert!(!strict.allows(&page));
    }
}
