//! Builder for configuring IconService initialization.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ResolverOptions;
use crate::error::{IconError, Result};
use crate::icons::{DynDiscoverySource, IconResolver, IconStore};
use crate::network::HttpClient;
use crate::IconService;

/// Builder for configuring IconService initialization.
///
/// # Example
///
/// ```rust,ignore
/// use appdeck_core::IconService;
///
/// let service = IconService::builder("./icons")
///     .auto_create_dirs(true)
///     .candidate_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// ```
pub struct IconServiceBuilder {
    icon_dir: PathBuf,
    auto_create_dirs: bool,
    options: ResolverOptions,
    sources: Option<Vec<DynDiscoverySource>>,
    extra_sources: Vec<DynDiscoverySource>,
}

impl IconServiceBuilder {
    /// Create a new builder with the icon directory.
    pub fn new(icon_dir: impl Into<PathBuf>) -> Self {
        Self {
            icon_dir: icon_dir.into(),
            auto_create_dirs: false,
            options: ResolverOptions::default(),
            sources: None,
            extra_sources: Vec::new(),
        }
    }

    /// Auto-create the icon directory if it doesn't exist.
    ///
    /// Default: `false` (directory must exist)
    pub fn auto_create_dirs(mut self, enable: bool) -> Self {
        self.auto_create_dirs = enable;
        self
    }

    /// Replace all resolver options at once.
    pub fn options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn candidate_timeout(mut self, timeout: Duration) -> Self {
        self.options.candidate_timeout = timeout;
        self
    }

    pub fn page_timeout(mut self, timeout: Duration) -> Self {
        self.options.page_timeout = timeout;
        self
    }

    /// Upper bound on the wall-clock time of one resolution.
    pub fn pipeline_deadline(mut self, deadline: Duration) -> Self {
        self.options.pipeline_deadline = deadline;
        self
    }

    /// Maximum candidate fetches in flight.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.options.concurrency = concurrency;
        self
    }

    /// Enable or disable the third-party lookup services.
    ///
    /// Default: `true`
    pub fn external_services(mut self, enable: bool) -> Self {
        if !enable {
            self.options.external_services.clear();
        } else if self.options.external_services.is_empty() {
            self.options.external_services = ResolverOptions::default().external_services;
        }
        self
    }

    /// Enable or disable conventional path probing.
    ///
    /// Default: `true`
    pub fn conventional_paths(mut self, enable: bool) -> Self {
        if !enable {
            self.options.conventional_paths.clear();
        } else if self.options.conventional_paths.is_empty() {
            self.options.conventional_paths = ResolverOptions::default().conventional_paths;
        }
        self
    }

    /// Collapse byte-identical candidates before asking the caller to choose.
    ///
    /// Default: `true`
    pub fn dedupe_payloads(mut self, enable: bool) -> Self {
        self.options.dedupe_payloads = enable;
        self
    }

    pub fn use_system_proxy(mut self, enable: bool) -> Self {
        self.options.use_system_proxy = enable;
        self
    }

    /// Replace the standard discovery channels entirely.
    pub fn with_sources(mut self, sources: Vec<DynDiscoverySource>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Append a channel after the standard ones.
    pub fn add_source(mut self, source: DynDiscoverySource) -> Self {
        self.extra_sources.push(source);
        self
    }

    async fn prepare_icon_dir(icon_dir: &Path, auto_create: bool) -> Result<()> {
        if tokio::fs::metadata(icon_dir).await.is_ok_and(|m| m.is_dir()) {
            return Ok(());
        }
        if !auto_create {
            return Err(IconError::Config {
                message: format!("Icon directory does not exist: {}", icon_dir.display()),
            });
        }
        tokio::fs::create_dir_all(icon_dir).await.map_err(|e| IconError::Io {
            message: format!("Failed to create icon directory: {}", icon_dir.display()),
            path: Some(icon_dir.to_path_buf()),
            source: Some(e),
        })
    }

    /// Build the IconService instance.
    pub async fn build(self) -> Result<IconService> {
        self.options.validate()?;
        Self::prepare_icon_dir(&self.icon_dir, self.auto_create_dirs).await?;

        let http = Arc::new(HttpClient::with_options(
            self.options.candidate_timeout,
            self.options.use_system_proxy,
        )?);

        let mut sources = match self.sources {
            Some(sources) => sources,
            None => IconResolver::default_sources(Arc::clone(&http), &self.options),
        };
        sources.extend(self.extra_sources);

        tracing::debug!(
            "Icon service: {} discovery channel(s), concurrency {}, store {}",
            sources.len(),
            self.options.concurrency,
            self.icon_dir.display()
        );

        Ok(IconService {
            resolver: Arc::new(IconResolver::with_sources(http, self.options, sources)?),
            store: IconStore::new(self.icon_dir),
        })
    }
}
