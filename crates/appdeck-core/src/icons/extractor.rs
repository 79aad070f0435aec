//! Page markup discovery channel.

use super::candidate::DiscoveryChannel;
use super::discovery::DiscoverySource;
use super::markup::extract_icon_urls;
use crate::network::{read_body_limited, BodyError, HttpClient};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Fetches the target page and scans its markup for icon references.
pub struct PageIconExtractor {
    http: Arc<HttpClient>,
    timeout: Duration,
    max_page_bytes: usize,
}

impl PageIconExtractor {
    pub fn new(http: Arc<HttpClient>, timeout: Duration, max_page_bytes: usize) -> Self {
        Self {
            http,
            timeout,
            max_page_bytes,
        }
    }

    /// Fetch the page markup and the URL it was finally served from.
    async fn fetch_markup(&self, target: &Url) -> Option<(String, Url)> {
        let response = match self.http.get(target, self.timeout, None).await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!("Page fetch timed out after {:?}: {}", self.timeout, target);
                return None;
            }
            Err(e) => {
                warn!("Page fetch failed for {}: {}", target, e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!("Page {} returned {}", target, response.status());
            return None;
        }

        // Relative references resolve against where the page actually lives.
        let page_url = response.url().clone();
        match read_body_limited(response, self.max_page_bytes).await {
            Ok(body) => Some((String::from_utf8_lossy(&body).into_owned(), page_url)),
            Err(BodyError::TooLarge(n)) => {
                warn!("Page {} exceeds {} bytes (read {})", target, self.max_page_bytes, n);
                None
            }
            Err(BodyError::Transport(e)) => {
                warn!("Page body read failed for {}: {}", target, e);
                None
            }
        }
    }
}

#[async_trait]
impl DiscoverySource for PageIconExtractor {
    fn channel(&self) -> DiscoveryChannel {
        DiscoveryChannel::PageMarkup
    }

    async fn discover(&self, target: &Url) -> Vec<Url> {
        let Some((markup, page_url)) = self.fetch_markup(target).await else {
            return Vec::new();
        };
        let urls = extract_icon_urls(&markup, &page_url);
        debug!("{} icon reference(s) in markup of {}", urls.len(), page_url);
        urls
    }
}
