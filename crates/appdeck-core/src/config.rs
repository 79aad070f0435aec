//! Centralized configuration for the Appdeck core library.
//!
//! Compile-time defaults for fetching, discovery and storage. Runtime overrides
//! are collected in [`ResolverOptions`] by the service builder.

use std::time::Duration;

/// Candidate and page fetching.
pub struct FetchConfig;

impl FetchConfig {
    pub const CANDIDATE_TIMEOUT: Duration = Duration::from_secs(10);
    pub const PAGE_TIMEOUT: Duration = Duration::from_secs(15);
    pub const PIPELINE_DEADLINE: Duration = Duration::from_secs(60);
    pub const MIN_PAYLOAD_BYTES: usize = 50;
    pub const MAX_PAYLOAD_BYTES: usize = 5 * 1024 * 1024;
    pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;
    pub const CONCURRENCY: usize = 4;
    pub const USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const DEFAULT_MIME: &'static str = "image/png";
}

/// Candidate discovery sources.
///
/// Templates understand `{host}`, `{origin}` and `{url}` (percent-encoded
/// target URL) placeholders.
pub struct DiscoveryConfig;

impl DiscoveryConfig {
    pub const EXTERNAL_SERVICES: &'static [&'static str] = &[
        "https://www.google.com/s2/favicons?domain={host}&sz=64",
        "https://favicon.yandex.net/favicon/{host}",
        "https://icons.duckduckgo.com/ip3/{host}.ico",
        "https://t1.gstatic.com/faviconV2?client=SOCIAL&type=FAVICON&fallback_opts=TYPE,SIZE,URL&url={url}",
        "https://api.faviconkit.com/{host}/64",
    ];

    // Highest fidelity first; the classic favicon goes last.
    pub const CONVENTIONAL_PATHS: &'static [&'static str] = &[
        "/apple-touch-icon-180x180.png",
        "/apple-touch-icon-152x152.png",
        "/apple-touch-icon-144x144.png",
        "/apple-touch-icon-120x120.png",
        "/apple-touch-icon.png",
        "/icon.png",
        "/favicon.ico",
    ];
}

/// Icon store layout.
pub struct PathsConfig;

impl PathsConfig {
    pub const ICONS_DIR_NAME: &'static str = "icons";
    pub const IMAGE_EXTENSIONS: &'static [&'static str] =
        &["png", "jpg", "jpeg", "svg", "ico", "webp"];
}

/// Runtime knobs for one resolver instance.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Per-candidate fetch timeout.
    pub candidate_timeout: Duration,
    /// Timeout for fetching the target page markup.
    pub page_timeout: Duration,
    /// Upper bound on the wall-clock time of one resolution.
    pub pipeline_deadline: Duration,
    /// Payloads smaller than this are treated as placeholders.
    pub min_payload_bytes: usize,
    /// Payloads larger than this are rejected while streaming.
    pub max_payload_bytes: usize,
    /// Maximum candidate fetches in flight.
    pub concurrency: usize,
    /// External lookup service templates, in probe order.
    pub external_services: Vec<String>,
    /// Conventional icon paths, in probe order.
    pub conventional_paths: Vec<String>,
    /// Collapse candidates whose payloads are byte-identical.
    pub dedupe_payloads: bool,
    /// Honour proxy settings from the environment.
    pub use_system_proxy: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            candidate_timeout: FetchConfig::CANDIDATE_TIMEOUT,
            page_timeout: FetchConfig::PAGE_TIMEOUT,
            pipeline_deadline: FetchConfig::PIPELINE_DEADLINE,
            min_payload_bytes: FetchConfig::MIN_PAYLOAD_BYTES,
            max_payload_bytes: FetchConfig::MAX_PAYLOAD_BYTES,
            concurrency: FetchConfig::CONCURRENCY,
            external_services: DiscoveryConfig::EXTERNAL_SERVICES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            conventional_paths: DiscoveryConfig::CONVENTIONAL_PATHS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            dedupe_payloads: true,
            use_system_proxy: true,
        }
    }
}

impl ResolverOptions {
    /// Reject option combinations the pipeline cannot run with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.concurrency == 0 {
            return Err(crate::IconError::Config {
                message: "concurrency must be >= 1".to_string(),
            });
        }
        if self.candidate_timeout.is_zero()
            || self.page_timeout.is_zero()
            || self.pipeline_deadline.is_zero()
        {
            return Err(crate::IconError::Config {
                message: "timeouts must be non-zero".to_string(),
            });
        }
        if self.min_payload_bytes > self.max_payload_bytes {
            return Err(crate::IconError::Config {
                message: format!(
                    "min_payload_bytes ({}) exceeds max_payload_bytes ({})",
                    self.min_payload_bytes, self.max_payload_bytes
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = ResolverOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.min_payload_bytes, 50);
        assert_eq!(options.external_services.len(), 5);
        assert_eq!(options.conventional_paths.last().unwrap(), "/favicon.ico");
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let options = ResolverOptions {
            concurrency: 0,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_zero_pipeline_deadline_rejected() {
        let options = ResolverOptions {
            pipeline_deadline: Duration::ZERO,
            ..Default::default()
        };
        let err = options.validate().unwrap_err();
        assert!(matches!(err, crate::IconError::Config { .. }));
    }

    #[test]
    fn test_inverted_size_bounds_rejected() {
        let options = ResolverOptions {
            min_payload_bytes: 100,
            max_payload_bytes: 10,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
