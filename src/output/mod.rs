//! Output module for the mirrored tree and run reporting
//!
//! This module handles:
//! - Atomic writes of pages and assets under the output root
//! - Generating the service worker precache manifest
//! - Progress reporting and the end-of-run summary

pub mod manifest;
mod progress;
pub mod stats;
mod writer;

pub use manifest::{list_precache_paths, write_service_worker, SERVICE_WORKER_FILE};
pub use progress::{
    NoopReporter, ProgressReporter, SpinnerLogWriter, SpinnerReporter, TracingReporter,
};
pub use stats::{print_summary, CloneSummary};
pub use writer::{is_temp_file, write_atomic};
