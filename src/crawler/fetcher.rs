//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (user agent, timeout, redirects)
//! - Plain GET requests for the crawl pipeline
//! - Conditional GET requests (If-Modified-Since / If-None-Match) for refresh
//! - Error classification

use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// A page that came back with HTTP 200
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// Page body content
    pub body: String,
    /// Last-Modified header value
    pub last_modified: Option<String>,
    /// ETag header value
    pub etag: Option<String>,
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// HTTP 200 with a readable body
    Success(FetchedPage),

    /// HTTP 304 in answer to a conditional request
    NotModified,

    /// HTTP 404
    NotFound,

    /// Any other status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, unreadable body, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Validators replayed on a conditional request
#[derive(Debug, Clone, Default)]
pub struct Validators<'a> {
    pub last_modified: Option<&'a str>,
    pub etag: Option<&'a str>,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header sent with every request
/// * `timeout` - Total per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with a plain GET, following redirects
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
///
/// # Returns
///
/// A FetchResult indicating success or the type of failure
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    fetch_conditional(client, url, Validators::default()).await
}

/// Fetches a URL, sending whichever validators are present
///
/// A server that honours them answers 304, reported as `NotModified`.
pub async fn fetch_conditional(client: &Client, url: &str, validators: Validators<'_>) -> FetchResult {
    let mut request = client.get(url);
    if let Some(last_modified) = validators.last_modified {
        request = request.header(IF_MODIFIED_SINCE, last_modified);
    }
    if let Some(etag) = validators.etag {
        request = request.header(IF_NONE_MATCH, etag);
    }

    match request.send().await {
        Ok(response) => classify_response(response).await,
        Err(e) => FetchResult::NetworkError {
            error: describe_error(&e),
        },
    }
}

async fn classify_response(response: Response) -> FetchResult {
    let status = response.status();

    match status {
        StatusCode::OK => {}
        StatusCode::NOT_MODIFIED => return FetchResult::NotModified,
        StatusCode::NOT_FOUND => return FetchResult::NotFound,
        _ => {
            return FetchResult::HttpError {
                status_code: status.as_u16(),
            }
        }
    }

    let final_url = response.url().clone();
    let last_modified = header_value(&response, LAST_MODIFIED);
    let etag = header_value(&response, ETAG);

    match response.text().await {
        Ok(body) => FetchResult::Success(FetchedPage {
            final_url,
            body,
            last_modified,
            etag,
        }),
        Err(e) => FetchResult::NetworkError {
            error: describe_error(&e),
        },
    }
}

fn header_value(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else if e.is_redirect() {
        format!("Redirect error: {}", e)
    } else {
        e.to_string()
    }
}
