//! Progress reporting during a clone
//!
//! The crawl loop reports page and asset counts after each page through the
//! [`ProgressReporter`] trait. The binary uses a spinner; library callers and tests
//! pick the tracing or no-op reporter.

use crate::output::CloneSummary;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

/// Receives progress updates from the crawl loop
pub trait ProgressReporter: Send + Sync {
    /// Called after each page with the running totals
    fn report(&self, pages: usize, assets: usize);

    /// Called once when the clone has finished
    fn finish(&self, summary: &CloneSummary) {
        let _ = summary;
    }
}

/// Terminal spinner showing the running totals
pub struct SpinnerReporter {
    bar: ProgressBar,
}

impl SpinnerReporter {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_message("Starting clone");
        Self { bar }
    }

    /// Returns a writer that prints log lines above the spinner
    pub fn log_writer(&self) -> SpinnerLogWriter {
        SpinnerLogWriter {
            bar: self.bar.clone(),
        }
    }
}

/// Stdout writer that hides the spinner while a line is printed
#[derive(Clone)]
pub struct SpinnerLogWriter {
    bar: ProgressBar,
}

impl Write for SpinnerLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bar.suspend(|| io::stdout().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.bar.suspend(|| io::stdout().flush())
    }
}

impl Default for SpinnerReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for SpinnerReporter {
    fn report(&self, pages: usize, assets: usize) {
        self.bar
            .set_message(format!("Cloned {} page(s), assets: {}", pages, assets));
    }

    fn finish(&self, summary: &CloneSummary) {
        self.bar.finish_with_message(format!(
            "Done. Pages: {}, assets: {}. Output: {}",
            summary.pages_visited,
            summary.assets_stored,
            summary.out_dir.display()
        ));
    }
}

/// Reports progress as `info` events, for non-interactive runs
#[derive(Debug, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, pages: usize, assets: usize) {
        tracing::info!("Progress: {} pages, {} assets", pages, assets);
    }

    fn finish(&self, summary: &CloneSummary) {
        tracing::info!("{}", summary);
    }
}

/// Discards every update
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _pages: usize, _assets: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<(usize, usize)>>);

    impl ProgressReporter for Recording {
        fn report(&self, pages: usize, assets: usize) {
            self.0.lock().unwrap().push((pages, assets));
        }
    }

    #[test]
    fn test_reporter_is_object_safe() {
        let recording = Recording::default();
        let reporter: &dyn ProgressReporter = &recording;
        reporter.report(1, 2);
        reporter.report(2, 5);
        assert_eq!(*recording.0.lock().unwrap(), vec![(1, 2), (2, 5)]);
    }

    #[test]
    fn test_spinner_accepts_updates() {
        let spinner = SpinnerReporter::new();
        spinner.report(3, 7);
        spinner.finish(&CloneSummary::started("dist/site".into()).finished());
    }

    #[test]
    fn test_log_writer_writes_while_spinning() {
        let spinner = SpinnerReporter {
            bar: ProgressBar::hidden(),
        };
        let mut writer = spinner.log_writer();

        writer.write_all(b"log line\n").unwrap();
        writer.flush().unwrap();
        spinner.report(1, 0);
        writer.write_all(b"after update\n").unwrap();
    }
}
