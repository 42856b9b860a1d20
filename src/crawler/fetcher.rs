//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the mirror, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests for pages, assets and robots.txt
//! - A single automatic retry for transient failures
//! - Error classification

use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Number of extra attempts after a transient failure
const RETRY_LIMIT: u32 = 1;

/// Pause before a retry
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the resource
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value (empty when absent)
        content_type: String,
        /// Response body
        body: Vec<u8>,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Returns true if this is a successful fetch
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns true if a retry might produce a different outcome
    fn is_transient(&self) -> bool {
        match self {
            Self::Success { .. } => false,
            Self::NetworkError { .. } => true,
            Self::HttpError { status_code } => matches!(
                StatusCode::from_u16(*status_code),
                Ok(StatusCode::REQUEST_TIMEOUT
                    | StatusCode::TOO_MANY_REQUESTS
                    | StatusCode::INTERNAL_SERVER_ERROR
                    | StatusCode::BAD_GATEWAY
                    | StatusCode::SERVICE_UNAVAILABLE
                    | StatusCode::GATEWAY_TIMEOUT)
            ),
        }
    }
}

/// Returns true if a Content-Type header value denotes an HTML document
pub fn is_html_content_type(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    lowered.contains("text/html") || lowered.contains("application/xhtml+xml")
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Value of the User-Agent header
/// * `timeout` - Per-request timeout, covering connect and body transfer
///
/// # Example
///
/// ```no_run
/// use siteclone::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("siteclone/1.0", Duration::from_secs(20)).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL, retrying once on transient failures
///
/// # Retry Logic
///
/// | Condition                         | Action            |
/// |-----------------------------------|-------------------|
/// | 2xx                               | Success           |
/// | 408, 429, 500, 502, 503, 504      | Retry once        |
/// | Other 4xx/5xx                     | Immediate failure |
/// | Timeout / connection / body error | Retry once        |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let mut attempt = 0;

    loop {
        let result = fetch_once(client, url).await;

        if !result.is_transient() || attempt >= RETRY_LIMIT {
            return result;
        }

        attempt += 1;
        tracing::debug!("Retrying {} after transient failure: {:?}", url, result);
        tokio::time::sleep(RETRY_DELAY).await;
    }
}

/// Performs a single GET request
async fn fetch_once(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    match response.bytes().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body: body.to_vec(),
        },
        Err(e) => classify_error(&e),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}
