//! Byte-level download and validation of one icon candidate.

use super::candidate::IconPayload;
use crate::config::FetchConfig;
use crate::network::{content_type_of, origin_of, read_body_limited, BodyError, HttpClient};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// URL extensions that override a missing or mislabeled content type.
const ICON_EXTENSIONS: &[(&str, &str)] = &[
    (".ico", "image/x-icon"),
    (".svg", "image/svg+xml"),
    (".webp", "image/webp"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
];

/// Non-image content types that icon hosts commonly serve icons with.
const ACCEPTED_NON_IMAGE_TYPES: &[&str] = &[
    "application/octet-stream",
    "application/x-icon",
    "application/ico",
];

/// Why one candidate could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("unexpected content type '{0}'")]
    InvalidContentType(String),

    #[error("payload too small ({0} bytes)")]
    TooSmall(usize),

    #[error("payload too large ({0} bytes)")]
    TooLarge(usize),

    #[error("timed out")]
    Timeout,

    #[error("network error: {0}")]
    NetworkError(String),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchFailure::Timeout
        } else {
            FetchFailure::NetworkError(err.to_string())
        }
    }
}

/// Lowercased path extension of `url` if it is on the icon allow-list.
fn icon_extension(url: &Url) -> Option<&'static (&'static str, &'static str)> {
    let path = url.path().to_ascii_lowercase();
    ICON_EXTENSIONS.iter().find(|(ext, _)| path.ends_with(ext))
}

pub(crate) fn has_icon_extension(url: &Url) -> bool {
    icon_extension(url).is_some()
}

pub(crate) fn is_acceptable_content_type(content_type: &str) -> bool {
    content_type.starts_with("image/") || ACCEPTED_NON_IMAGE_TYPES.contains(&content_type)
}

/// MIME type recorded on the payload.
///
/// A declared image type wins, then the URL extension, then PNG.
pub(crate) fn resolve_mime(content_type: Option<&str>, url: &Url) -> String {
    match content_type {
        Some(ct) if ct.starts_with("image/") => ct.to_string(),
        _ => icon_extension(url)
            .map(|(_, mime)| *mime)
            .unwrap_or(FetchConfig::DEFAULT_MIME)
            .to_string(),
    }
}

/// Downloads candidates and enforces the validation rules.
pub struct CandidateFetcher {
    http: Arc<HttpClient>,
    timeout: Duration,
    min_bytes: usize,
    max_bytes: usize,
}

impl CandidateFetcher {
    pub fn new(http: Arc<HttpClient>, timeout: Duration, min_bytes: usize, max_bytes: usize) -> Self {
        Self {
            http,
            timeout,
            min_bytes,
            max_bytes,
        }
    }

    /// Fetch `candidate` on behalf of `target`.
    ///
    /// The whole attempt, body included, is bounded by the fetch timeout;
    /// the request is dropped when it expires.
    pub async fn fetch(&self, candidate: &Url, target: &Url) -> Result<IconPayload, FetchFailure> {
        match tokio::time::timeout(self.timeout, self.fetch_unbounded(candidate, target)).await {
            Ok(result) => result,
            Err(_) => Err(FetchFailure::Timeout),
        }
    }

    async fn fetch_unbounded(&self, candidate: &Url, target: &Url) -> Result<IconPayload, FetchFailure> {
        let referer = origin_of(target);
        let response = self.http.get(candidate, self.timeout, Some(&referer)).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchFailure::HttpStatus(status.as_u16()));
        }

        let content_type = content_type_of(&response);
        let type_ok = content_type
            .as_deref()
            .is_some_and(is_acceptable_content_type);
        if !type_ok && !has_icon_extension(candidate) {
            return Err(FetchFailure::InvalidContentType(
                content_type.unwrap_or_else(|| "<none>".to_string()),
            ));
        }

        let bytes = read_body_limited(response, self.max_bytes)
            .await
            .map_err(|e| match e {
                BodyError::TooLarge(n) => FetchFailure::TooLarge(n),
                BodyError::Transport(e) => FetchFailure::from(e),
            })?;

        if bytes.len() < self.min_bytes {
            return Err(FetchFailure::TooSmall(bytes.len()));
        }

        let mime = resolve_mime(content_type.as_deref(), candidate);
        debug!("Validated {} ({} bytes, {})", candidate, bytes.len(), mime);
        Ok(IconPayload::new(bytes, mime))
    }
}
