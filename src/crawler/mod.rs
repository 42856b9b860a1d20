//! Crawler module for cloning a site
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - The breadth-first frontier and page budget
//! - Asset resolution and deduplication
//! - Overall clone coordination

mod assets;
mod coordinator;
mod fetcher;
mod frontier;

pub use assets::AssetResolver;
pub use coordinator::{clone_site, Coordinator};
pub use fetcher::{build_http_client, fetch_url, is_html_content_type, FetchResult};
pub use frontier::Frontier;
