//! Aggregation and disambiguation.
//!
//! The resolver merges every discovery channel, ranks the merged candidates,
//! fetches all of them (not stopping at the first success) and decides
//! whether the caller has to pick one.

use super::candidate::{
    DiscoveryChannel, FetchState, IconCandidate, IconPayload, ResolutionResult,
};
use super::discovery::DynDiscoverySource;
use super::extractor::PageIconExtractor;
use super::fetcher::{CandidateFetcher, FetchFailure};
use super::probes::{ConventionalPathProber, ExternalServiceProber};
use crate::cancel::CancellationToken;
use crate::config::{FetchConfig, ResolverOptions};
use crate::network::HttpClient;
use crate::{IconError, Result};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of re-fetching one chosen candidate.
pub type FetchOutcome = std::result::Result<IconPayload, FetchFailure>;

/// Parse and validate a target URL. No network activity.
pub fn parse_target(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IconError::invalid_url(raw, "empty URL"));
    }
    let url = Url::parse(trimmed).map_err(|e| IconError::invalid_url(raw, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(IconError::invalid_url(
            raw,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(IconError::invalid_url(raw, "missing host"));
    }
    Ok(url)
}

/// Merge channel outputs into scored candidates, keeping the first discovery
/// of every URL.
pub(crate) fn merge_candidates(discovered: Vec<(DiscoveryChannel, Vec<Url>)>) -> Vec<IconCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for (channel, urls) in discovered {
        for url in urls {
            if seen.insert(url.clone()) {
                candidates.push(IconCandidate::discovered(url, channel));
            }
        }
    }
    candidates
}

/// Stable descending sort; earlier discoveries win ties.
pub(crate) fn rank(candidates: &mut [IconCandidate]) {
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority));
}

/// Drop validated candidates whose bytes duplicate a better-ranked one.
pub(crate) fn dedupe_payloads(candidates: Vec<IconCandidate>) -> Vec<IconCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| match candidate.payload() {
            Some(payload) => {
                let fresh = seen.insert(payload.digest());
                if !fresh {
                    debug!("Dropping duplicate payload from {}", candidate.source_url);
                }
                fresh
            }
            None => true,
        })
        .collect()
}

/// Icon resolution pipeline.
pub struct IconResolver {
    sources: Vec<DynDiscoverySource>,
    fetcher: CandidateFetcher,
    options: ResolverOptions,
}

impl IconResolver {
    /// Build a resolver with the three standard channels.
    pub fn new(options: ResolverOptions) -> Result<Self> {
        options.validate()?;
        let http = Arc::new(HttpClient::with_options(
            options.candidate_timeout,
            options.use_system_proxy,
        )?);
        let sources = Self::default_sources(Arc::clone(&http), &options);
        Self::with_sources(http, options, sources)
    }

    /// Build a resolver over an explicit channel list.
    pub fn with_sources(
        http: Arc<HttpClient>,
        options: ResolverOptions,
        sources: Vec<DynDiscoverySource>,
    ) -> Result<Self> {
        options.validate()?;
        let fetcher = CandidateFetcher::new(
            http,
            options.candidate_timeout,
            options.min_payload_bytes,
            options.max_payload_bytes,
        );
        Ok(Self {
            sources,
            fetcher,
            options,
        })
    }

    /// Page markup, then external services, then conventional paths.
    ///
    /// An empty service or path list leaves that channel out entirely.
    pub fn default_sources(http: Arc<HttpClient>, options: &ResolverOptions) -> Vec<DynDiscoverySource> {
        let mut sources: Vec<DynDiscoverySource> = vec![Arc::new(PageIconExtractor::new(
            http,
            options.page_timeout,
            FetchConfig::MAX_PAGE_BYTES,
        ))];
        if !options.external_services.is_empty() {
            sources.push(Arc::new(ExternalServiceProber::new(
                options.external_services.clone(),
            )));
        }
        if !options.conventional_paths.is_empty() {
            sources.push(Arc::new(ConventionalPathProber::new(
                options.conventional_paths.clone(),
            )));
        }
        sources
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve the best icon for `raw_url`.
    ///
    /// Malformed input fails with [`IconError::InvalidUrl`] before any request
    /// is made. Once `cancel` fires no further fetch starts and the call
    /// returns [`IconError::Cancelled`].
    pub async fn resolve(&self, raw_url: &str, cancel: &CancellationToken) -> Result<ResolutionResult> {
        let target = parse_target(raw_url)?;
        cancel.check()?;

        let deadline = Instant::now() + self.options.pipeline_deadline;
        info!("Resolving icon for {}", target);

        let mut candidates = merge_candidates(self.discover(&target, deadline).await);
        let attempted = candidates.len();
        if attempted == 0 {
            info!("No icon candidates discovered for {}", target);
            return Ok(ResolutionResult::from_validated(Vec::new(), 0));
        }
        rank(&mut candidates);
        debug!("{} candidate(s) for {}", attempted, target);

        let fetched = self.fetch_all(candidates, &target, deadline, cancel).await;
        cancel.check()?;

        let mut validated: Vec<IconCandidate> =
            fetched.into_iter().filter(IconCandidate::is_validated).collect();
        if self.options.dedupe_payloads {
            validated = dedupe_payloads(validated);
        }

        let result = ResolutionResult::from_validated(validated, attempted);
        match &result {
            ResolutionResult::Resolved { candidate } => {
                info!("Resolved icon for {}: {}", target, candidate.source_url)
            }
            ResolutionResult::NeedsDisambiguation { candidates } => info!(
                "{} valid icons for {}, caller must choose",
                candidates.len(),
                target
            ),
            ResolutionResult::Failed { reason } => info!("{} for {}", reason, target),
        }
        Ok(result)
    }

    /// Run every channel; each is best-effort.
    async fn discover(&self, target: &Url, deadline: Instant) -> Vec<(DiscoveryChannel, Vec<Url>)> {
        let runs = self.sources.iter().map(|source| async move {
            let urls = source.discover(target).await;
            debug!("{} channel produced {} URL(s)", source.channel(), urls.len());
            (source.channel(), urls)
        });

        match timeout_at(deadline, join_all(runs)).await {
            Ok(discovered) => discovered,
            Err(_) => {
                warn!("Discovery for {} hit the pipeline deadline", target);
                Vec::new()
            }
        }
    }

    /// Fetch every candidate with bounded parallelism, preserving rank order.
    async fn fetch_all(
        &self,
        candidates: Vec<IconCandidate>,
        target: &Url,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Vec<IconCandidate> {
        stream::iter(candidates)
            .map(|mut candidate| async move {
                if cancel.is_cancelled() {
                    return candidate;
                }
                let outcome = if Instant::now() >= deadline {
                    Err(FetchFailure::Timeout)
                } else {
                    timeout_at(deadline, self.fetcher.fetch(&candidate.source_url, target))
                        .await
                        .unwrap_or(Err(FetchFailure::Timeout))
                };
                candidate.state = match outcome {
                    Ok(payload) => FetchState::Fetched(payload),
                    Err(failure) => {
                        debug!("Dropping {}: {}", candidate.source_url, failure);
                        FetchState::Failed(failure)
                    }
                };
                candidate
            })
            .buffered(self.options.concurrency)
            .collect()
            .await
    }

    /// Re-fetch one candidate the caller picked after disambiguation.
    ///
    /// The outer error covers malformed URLs only; fetch problems come back
    /// as the inner [`FetchFailure`].
    pub async fn download_chosen_candidate(
        &self,
        candidate_url: &str,
        target_url: &str,
    ) -> Result<FetchOutcome> {
        let candidate = parse_target(candidate_url)?;
        let target = parse_target(target_url)?;
        let outcome = self.fetcher.fetch(&candidate, &target).await;
        if let Err(failure) = &outcome {
            warn!("Chosen icon {} could not be fetched: {}", candidate, failure);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icons::discovery::DiscoverySource;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        urls: Vec<Url>,
    }

    #[async_trait]
    impl DiscoverySource for CountingSource {
        fn channel(&self) -> DiscoveryChannel {
            DiscoveryChannel::PageMarkup
        }

        async fn discover(&self, _target: &Url) -> Vec<Url> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.clone()
        }
    }

    fn resolver_with(urls: Vec<Url>) -> (IconResolver, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(CountingSource {
            calls: Arc::clone(&calls),
            urls,
        });
        let http = Arc::new(HttpClient::new().unwrap());
        let resolver =
            IconResolver::with_sources(http, ResolverOptions::default(), vec![source]).unwrap();
        (resolver, calls)
    }

    #[test]
    fn test_parse_target_rejects_malformed_input() {
        for raw in ["", "   ", "not a url", "example.com", "/relative/path", "ftp://example.com/", "mailto:a@b.c", "data:text/plain,hi"] {
            let err = parse_target(raw).unwrap_err();
            assert!(matches!(err, IconError::InvalidUrl { .. }), "{raw}: {err}");
        }
        assert_eq!(
            parse_target(" https://example.com/x ").unwrap().as_str(),
            "https://example.com/x"
        );
    }

    #[test]
    fn test_merge_keeps_first_discovery() {
        let merged = merge_candidates(vec![
            (
                DiscoveryChannel::PageMarkup,
                vec![url("https://e.com/favicon.ico"), url("https://e.com/a.png")],
            ),
            (
                DiscoveryChannel::ConventionalPath,
                vec![url("https://e.com/favicon.ico")],
            ),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].channel, DiscoveryChannel::PageMarkup);
    }

    #[test]
    fn test_rank_is_stable() {
        let mut candidates = merge_candidates(vec![(
            DiscoveryChannel::PageMarkup,
            vec![
                url("https://e.com/favicon.ico"),
                url("https://e.com/first.png"),
                url("https://e.com/a.svg"),
                url("https://e.com/second.png"),
            ],
        )]);
        rank(&mut candidates);
        let order: Vec<&str> = candidates.iter().map(|c| c.source_url.path()).collect();
        assert_eq!(order, vec!["/a.svg", "/first.png", "/second.png", "/favicon.ico"]);
    }

    #[test]
    fn test_dedupe_keeps_higher_ranked_copy() {
        let mut candidates = merge_candidates(vec![(
            DiscoveryChannel::ExternalService,
            vec![
                url("https://e.com/a.png"),
                url("https://e.com/b.ico"),
                url("https://e.com/c.ico"),
            ],
        )]);
        let same = IconPayload::new(Bytes::from_static(&[1u8; 64]), "image/png");
        let other = IconPayload::new(Bytes::from_static(&[2u8; 64]), "image/png");
        candidates[0].state = FetchState::Fetched(same.clone());
        candidates[1].state = FetchState::Fetched(same);
        candidates[2].state = FetchState::Fetched(other);

        let kept = dedupe_payloads(candidates);
        let paths: Vec<&str> = kept.iter().map(|c| c.source_url.path()).collect();
        assert_eq!(paths, vec!["/a.png", "/c.ico"]);
    }

    #[test]
    fn test_explicit_sources_reject_unrunnable_options() {
        let http = Arc::new(HttpClient::new().unwrap());
        let unrunnable = [
            ResolverOptions {
                concurrency: 0,
                ..Default::default()
            },
            ResolverOptions {
                pipeline_deadline: std::time::Duration::ZERO,
                ..Default::default()
            },
        ];
        for options in unrunnable {
            let source: DynDiscoverySource = Arc::new(CountingSource {
                calls: Arc::new(AtomicUsize::new(0)),
                urls: vec![url("https://e.com/a.svg")],
            });
            let err = IconResolver::with_sources(Arc::clone(&http), options, vec![source])
                .err()
                .expect("options should be rejected");
            assert!(matches!(err, IconError::Config { .. }));
        }
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_discovery() {
        let (resolver, calls) = resolver_with(vec![url("https://e.com/a.svg")]);
        let err = resolver
            .resolve("definitely not a url", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, IconError::InvalidUrl { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_discovery_fails_cleanly() {
        let (resolver, calls) = resolver_with(Vec::new());
        let result = resolver
            .resolve("https://example.com", &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_failed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (resolver, calls) = resolver_with(vec![url("https://e.com/a.svg")]);
        let token = CancellationToken::new();
        token.cancel();
        let err = resolver.resolve("https://example.com", &token).await.unwrap_err();
        assert!(matches!(err, IconError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_download_chosen_candidate_validates_urls() {
        let (resolver, _) = resolver_with(Vec::new());
        let err = resolver
            .download_chosen_candidate("nope", "https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, IconError::InvalidUrl { .. }));
    }
}
