//! Breadth-first frontier with a page budget
//!
//! The frontier is a FIFO queue of normalized page URLs plus the set of URLs
//! already visited. Every URL is enqueued at most once and visited at most once,
//! and nothing is handed out once `max_pages` URLs have been visited.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// Pages waiting to be fetched and pages already visited
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<Url>,
    enqueued: HashSet<String>,
    visited: HashSet<String>,
    max_pages: usize,
}

impl Frontier {
    /// Creates a frontier seeded with the start URL
    pub fn new(start: Url, max_pages: usize) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            enqueued: HashSet::new(),
            visited: HashSet::new(),
            max_pages,
        };
        frontier.push(start);
        frontier
    }

    /// Takes the next URL, or `None` once the queue is empty or the budget is spent
    pub fn pop(&mut self) -> Option<Url> {
        if self.is_exhausted() {
            return None;
        }
        self.queue.pop_front()
    }

    /// Enqueues a URL unless it was seen before or the budget is spent
    ///
    /// Returns true if the URL was added.
    pub fn push(&mut self, url: Url) -> bool {
        if self.is_exhausted()
            || self.visited.contains(url.as_str())
            || !self.enqueued.insert(url.to_string())
        {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Returns true if the URL has been visited
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    /// Records a visit; returns false if the URL was already visited
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Number of visited URLs
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of URLs waiting in the queue
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns true once `max_pages` URLs have been visited
    pub fn is_exhausted(&self) -> bool {
        self.visited.len() >= self.max_pages
    }
}
