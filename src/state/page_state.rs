/// Page state definitions for tracking crawl progress
///
/// This module defines all possible states a page can be in during a clone.
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Page is in the frontier waiting to be fetched
    Queued,

    /// Page is currently being fetched
    Fetching,

    // ===== Terminal Skip States =====
    /// Page is disallowed by robots.txt
    SkippedRobots,

    /// Page was already visited when dequeued
    SkippedVisited,

    // ===== Terminal Error States =====
    /// Fetch failed (network error or non-success status)
    FetchFailed,

    // ===== Terminal Success States =====
    /// Response was not HTML and was stored as an asset
    NonHtmlAsset,

    /// Page was rewritten and written to the output tree
    HtmlProcessed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Fetching)
    }

    /// Returns true if the page produced a file in the output tree
    pub fn is_success(&self) -> bool {
        matches!(self, Self::NonHtmlAsset | Self::HtmlProcessed)
    }

    /// Returns true if this represents a skip state
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedRobots | Self::SkippedVisited)
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// Skips are decided at dequeue time, before the fetch starts.
    pub fn can_transition_to(&self, next: PageState) -> bool {
        match self {
            Self::Queued => matches!(
                next,
                Self::Fetching | Self::SkippedRobots | Self::SkippedVisited
            ),
            Self::Fetching => matches!(
                next,
                Self::FetchFailed | Self::NonHtmlAsset | Self::HtmlProcessed
            ),
            _ => false,
        }
    }

    /// Returns the short label used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::SkippedRobots => "skipped_robots",
            Self::SkippedVisited => "skipped_visited",
            Self::FetchFailed => "fetch_failed",
            Self::NonHtmlAsset => "non_html_asset",
            Self::HtmlProcessed => "html_processed",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PageState; 7] = [
        PageState::Queued,
        PageState::Fetching,
        PageState::SkippedRobots,
        PageState::SkippedVisited,
        PageState::FetchFailed,
        PageState::NonHtmlAsset,
        PageState::HtmlProcessed,
    ];

    #[test]
    fn test_is_terminal() {
        assert!(!PageState::Queued.is_terminal());
        assert!(!PageState::Fetching.is_terminal());

        assert!(PageState::SkippedRobots.is_terminal());
        assert!(PageState::SkippedVisited.is_terminal());
        assert!(PageState::FetchFailed.is_terminal());
        assert!(PageState::NonHtmlAsset.is_terminal());
        assert!(PageState::HtmlProcessed.is_terminal());
    }

    #[test]
    fn test_is_success() {
        assert!(PageState::HtmlProcessed.is_success());
        assert!(PageState::NonHtmlAsset.is_success());

        assert!(!PageState::FetchFailed.is_success());
        assert!(!PageState::SkippedRobots.is_success());
    }

    #[test]
    fn test_is_skipped() {
        assert!(PageState::SkippedRobots.is_skipped());
        assert!(PageState::SkippedVisited.is_skipped());
        assert!(!PageState::FetchFailed.is_skipped());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(PageState::Queued.can_transition_to(PageState::Fetching));
        assert!(PageState::Queued.can_transition_to(PageState::SkippedRobots));
        assert!(PageState::Queued.can_transition_to(PageState::SkippedVisited));
        assert!(PageState::Fetching.can_transition_to(PageState::HtmlProcessed));
        assert!(PageState::Fetching.can_transition_to(PageState::NonHtmlAsset));
        assert!(PageState::Fetching.can_transition_to(PageState::FetchFailed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!PageState::Queued.can_transition_to(PageState::HtmlProcessed));
        assert!(!PageState::Fetching.can_transition_to(PageState::Queued));
        assert!(!PageState::Fetching.can_transition_to(PageState::SkippedVisited));
    }

    #[test]
    fn test_terminal_states_never_reenter() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{} -> {} allowed", from, to);
            }
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PageState::Queued), "queued");
        assert_eq!(format!("{}", PageState::HtmlProcessed), "html_processed");
        assert_eq!(format!("{}", PageState::SkippedRobots), "skipped_robots");
    }
}
