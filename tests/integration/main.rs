//! End-to-end tests driving full clones against wiremock servers

mod crawl_tests;
mod output_tests;
