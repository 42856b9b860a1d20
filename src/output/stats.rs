//! Clone statistics
//!
//! The crawl loop tallies what happened to every page and asset into a
//! [`CloneSummary`], which the binary prints once the run has finished.

use crate::state::PageState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Totals for a single clone run
#[derive(Debug, Clone, Serialize)]
pub struct CloneSummary {
    /// Pages dequeued and fetched (the visited set size)
    pub pages_visited: usize,

    /// HTML pages rewritten and written
    pub pages_written: usize,

    /// Distinct assets stored, including non-HTML pages
    pub assets_stored: usize,

    /// Pages whose fetch failed
    pub pages_failed: usize,

    /// Pages disallowed by robots.txt
    pub pages_skipped_robots: usize,

    /// Files listed in the service worker
    pub precached_files: usize,

    /// Output directory
    pub out_dir: PathBuf,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl CloneSummary {
    /// Starts a summary for a run writing to `out_dir`
    pub fn started(out_dir: PathBuf) -> Self {
        Self {
            pages_visited: 0,
            pages_written: 0,
            assets_stored: 0,
            pages_failed: 0,
            pages_skipped_robots: 0,
            precached_files: 0,
            out_dir,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Stamps the finish time
    pub fn finished(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Counts a page that reached a terminal state
    pub fn record(&mut self, state: PageState) {
        match state {
            PageState::HtmlProcessed => self.pages_written += 1,
            PageState::FetchFailed => self.pages_failed += 1,
            PageState::SkippedRobots => self.pages_skipped_robots += 1,
            _ => {}
        }
    }

    /// Run duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

impl fmt::Display for CloneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done. Pages: {}, assets: {}. Output: {}",
            self.pages_visited,
            self.assets_stored,
            self.out_dir.display()
        )?;
        if self.pages_failed > 0 || self.pages_skipped_robots > 0 {
            write!(
                f,
                " ({} failed, {} disallowed by robots.txt)",
                self.pages_failed, self.pages_skipped_robots
            )?;
        }
        Ok(())
    }
}

/// Prints a summary to stdout
pub fn print_summary(summary: &CloneSummary) {
    println!("=== Clone Summary ===\n");
    println!("  Pages visited: {}", summary.pages_visited);
    println!("  Pages written: {}", summary.pages_written);
    println!("  Assets stored: {}", summary.assets_stored);
    println!("  Failed fetches: {}", summary.pages_failed);
    println!("  Disallowed by robots.txt: {}", summary.pages_skipped_robots);
    println!("  Precached files: {}", summary.precached_files);
    if let Some(seconds) = summary.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!("  Output: {}", summary.out_dir.display());
}
