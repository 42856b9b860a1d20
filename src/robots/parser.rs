//! Robots.txt rule parsing and matching
//!
//! Only prefix `Allow`/`Disallow` directives are understood. Wildcards and `$`
//! anchors are treated as literal characters.

use crate::config::RobotsPolicy;
use robotstxt::DefaultMatcher;
use url::Url;

/// One `User-agent` group of a robots.txt file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RobotsGroup {
    /// The user agent named by the group header
    pub user_agent: String,
    /// Path prefixes listed by `Disallow:` lines
    pub disallow: Vec<String>,
    /// Path prefixes listed by `Allow:` lines
    pub allow: Vec<String>,
}

/// Parsed robots.txt rules
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    groups: Vec<RobotsGroup>,
    /// Raw document, kept for the longest-match policy
    content: String,
}

impl RobotsRules {
    /// Parses robots.txt content
    ///
    /// A `User-agent:` line opens a new group; `Allow:`/`Disallow:` lines append to
    /// the most recent group. Directives before the first group header, unknown
    /// keys, lines without a colon, comments and blank lines are ignored.
    pub fn parse(content: &str) -> Self {
        let mut groups: Vec<RobotsGroup> = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };

            let key = key.trim().to_ascii_lowercase();
            let value = strip_comment(value).trim().to_string();

            match key.as_str() {
                "user-agent" => groups.push(RobotsGroup {
                    user_agent: value,
                    ..RobotsGroup::default()
                }),
                "disallow" => {
                    if let Some(group) = groups.last_mut() {
                        group.disallow.push(value);
                    }
                }
                "allow" => {
                    if let Some(group) = groups.last_mut() {
                        group.allow.push(value);
                    }
                }
                _ => {}
            }
        }

        Self {
            groups,
            content: content.to_string(),
        }
    }

    /// Returns all parsed groups in document order
    pub fn groups(&self) -> &[RobotsGroup] {
        &self.groups
    }

    /// Returns the first group addressed to every user agent (`*`)
    pub fn wildcard_group(&self) -> Option<&RobotsGroup> {
        self.groups.iter().find(|g| g.user_agent == "*")
    }

    /// Checks a URL against the `*` group
    ///
    /// The URL is allowed when any `Allow` prefix matches its path, or when no
    /// `Disallow` prefix does. Empty prefixes never match.
    pub fn is_allowed(&self, url: &Url) -> bool {
        let Some(group) = self.wildcard_group() else {
            return true;
        };

        let path = url.path();
        let matches = |prefix: &String| !prefix.is_empty() && path.starts_with(prefix.as_str());

        group.allow.iter().any(matches) || !group.disallow.iter().any(matches)
    }

    /// Checks a URL using the requested policy
    pub fn is_allowed_with(&self, url: &Url, policy: RobotsPolicy, user_agent: &str) -> bool {
        match policy {
            RobotsPolicy::AnyAllow => self.is_allowed(url),
            RobotsPolicy::LongestMatch => {
                if self.content.trim().is_empty() {
                    return true;
                }
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(&self.content, user_agent, url.as_str())
            }
        }
    }
}

fn strip_comment(value: &str) -> &str {
    match value.find('#') {
        Some(idx) => &value[..idx],
        None => value,
    }
}
