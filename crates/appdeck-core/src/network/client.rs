//! HTTP client tuned for icon discovery.
//!
//! Provides a wrapper around reqwest with:
//! - A browser-like user agent (several icon hosts refuse unknown agents)
//! - Relaxed certificate validation
//! - Per-request timeouts
//! - Size-capped body reads
//!
//! # Accepted risk: relaxed TLS
//!
//! Certificate validation is disabled for every request made through this
//! client. Icons are fetched from arbitrary third-party hosts, many of which
//! serve self-signed or expired certificates, and a failed handshake must not
//! hide an otherwise valid icon. The payloads are only ever decoded as images
//! for display; nothing fetched here is executed or trusted as configuration.
//! Do not reuse this client for anything else.

use crate::config::FetchConfig;
use crate::{IconError, Result};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::{header, Client, Response};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Failure while reading a response body.
#[derive(Debug)]
pub enum BodyError {
    /// The body grew past the configured limit; carries bytes read so far.
    TooLarge(usize),
    Transport(reqwest::Error),
}

/// HTTP client used by every discovery channel and the candidate fetcher.
pub struct HttpClient {
    client: Client,
    /// Default timeout for requests.
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_options(FetchConfig::CANDIDATE_TIMEOUT, true)
    }

    /// Create a client with a custom default timeout and proxy behaviour.
    pub fn with_options(timeout: Duration, use_system_proxy: bool) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(FetchConfig::USER_AGENT)
            .danger_accept_invalid_certs(true);
        if !use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(|e| IconError::Network {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(e),
        })?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Make a GET request bounded by `timeout`.
    ///
    /// The status is not checked; callers decide what counts as success.
    pub async fn get(
        &self,
        url: &Url,
        timeout: Duration,
        referer: Option<&str>,
    ) -> std::result::Result<Response, reqwest::Error> {
        let mut request = self.client.get(url.as_str()).timeout(timeout);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }

        let response = request.send().await?;
        debug!("GET {} -> {}", url, response.status());
        Ok(response)
    }
}

/// Read a response body, giving up once it exceeds `limit` bytes.
pub async fn read_body_limited(
    response: Response,
    limit: usize,
) -> std::result::Result<Bytes, BodyError> {
    if let Some(declared) = response.content_length() {
        if declared as usize > limit {
            return Err(BodyError::TooLarge(declared as usize));
        }
    }

    let mut body = BytesMut::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(BodyError::Transport)?;
        body.extend_from_slice(&chunk);
        if body.len() > limit {
            return Err(BodyError::TooLarge(body.len()));
        }
    }

    Ok(body.freeze())
}

/// `scheme://host[:port]` of a URL.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Media type of a response without parameters, lowercased.
pub fn content_type_of(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of() {
        let url = Url::parse("https://news.example.com:8443/a/b?c=d").unwrap();
        assert_eq!(origin_of(&url), "https://news.example.com:8443");

        let url = Url::parse("http://example.com/").unwrap();
        assert_eq!(origin_of(&url), "http://example.com");
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new().unwrap();
        assert_eq!(client.default_timeout(), FetchConfig::CANDIDATE_TIMEOUT);
    }

    #[tokio::test]
    async fn test_client_with_options() {
        let client = HttpClient::with_options(Duration::from_secs(3), false).unwrap();
        assert_eq!(client.default_timeout(), Duration::from_secs(3));
    }
}
