//! HTTP client construction for discovery and downloads.
//!
//! The upstream site rejects obvious bot traffic, so every request carries the
//! header set of an ordinary desktop browser. This only keeps the requests from
//! being trivially blocked. It is not a security control and grants no access
//! a browser would not have.

use crate::error::{Result, ScanError};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Duration;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Default timeout for source page requests, in seconds
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 15;

/// Default timeout for archive downloads, in seconds
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 60;

pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers
}

fn client_builder(timeout_secs: u64) -> reqwest::ClientBuilder {
    Client::builder()
        .default_headers(browser_headers())
        .connect_timeout(Duration::from_secs(timeout_secs.clamp(1, 15)))
        .redirect(reqwest::redirect::Policy::limited(5))
}

/// Build a client with browser-like headers and a hard timeout on every request.
pub fn browser_client(timeout_secs: u64) -> Result<Client> {
    client_builder(timeout_secs)
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| ScanError::Other(format!("Failed to create HTTP client: {}", e)))
}

/// Client for streaming archive bodies.
///
/// `timeout_secs` bounds each read, not the whole transfer: a large archive
/// may take as long as it needs while bytes keep arriving, but a server that
/// goes quiet for `timeout_secs` fails the download.
pub fn download_client(timeout_secs: u64) -> Result<Client> {
    client_builder(timeout_secs)
        .read_timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| ScanError::Other(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_build() {
        assert!(browser_client(15).is_ok());
        assert!(download_client(60).is_ok());
        assert!(download_client(0).is_ok());
    }
}
