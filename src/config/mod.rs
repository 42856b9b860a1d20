//! Configuration module for siteclone
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The command-line surface layers its flags on top of the loaded values.
//!
//! # Example
//!
//! ```no_run
//! use siteclone::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("siteclone.toml")).unwrap();
//! println!("Page budget: {}", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CrawlerConfig, MirrorConfig, OutputConfig, RobotsPolicy};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
