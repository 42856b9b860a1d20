//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageState`: Tracks the state of an individual page (queued, fetching, processed, etc.)
//! - `PageRecord`: A URL paired with its state, advanced through checked transitions

mod page_state;

pub use page_state::PageState;

use crate::MirrorError;
use url::Url;

/// A page moving through the crawl state machine
#[derive(Debug, Clone)]
pub struct PageRecord {
    url: Url,
    state: PageState,
}

impl PageRecord {
    /// Creates a record in the `Queued` state
    pub fn queued(url: Url) -> Self {
        Self {
            url,
            state: PageState::Queued,
        }
    }

    /// The page URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The current state
    pub fn state(&self) -> PageState {
        self.state
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow
    pub fn advance(&mut self, next: PageState) -> Result<(), MirrorError> {
        if !self.state.can_transition_to(next) {
            return Err(MirrorError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("{}: {} -> {}", self.url, self.state, next);
        self.state = next;
        Ok(())
    }
}
