//! Appdeck Core - Headless icon resolution for the Appdeck launcher.
//!
//! Given an arbitrary site URL this crate discovers candidate icons through
//! page markup, third-party lookup services and conventional paths, ranks
//! them by URL shape, downloads and validates every candidate, and either
//! resolves to a single icon or hands the ranked set back to the caller for a
//! visual choice. The chosen payload is committed to a flat icon directory.
//!
//! There is no HTTP/RPC layer here; see the `appdeck-rpc` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use appdeck_core::{IconService, ResolutionResult};
//!
//! #[tokio::main]
//! async fn main() -> appdeck_core::Result<()> {
//!     let service = IconService::builder("/path/to/icons")
//!         .auto_create_dirs(true)
//!         .build()
//!         .await?;
//!
//!     match service.resolve_icon("https://docs.rs").await? {
//!         ResolutionResult::Resolved { candidate } => {
//!             let payload = candidate.payload().expect("resolved candidates are fetched");
//!             let name = service
//!                 .persist_icon(payload.bytes.to_vec(), &payload.mime_type, "https://docs.rs")
//!                 .await?;
//!             println!("Stored {}", name);
//!         }
//!         ResolutionResult::NeedsDisambiguation { candidates } => {
//!             println!("{} icons to choose from", candidates.len());
//!         }
//!         ResolutionResult::Failed { reason } => println!("{}", reason),
//!     }
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod icons;
pub mod network;

mod api;

// Re-export commonly used types
pub use cancel::{CancellationToken, CancelledError};
pub use config::ResolverOptions;
pub use error::{IconError, Result};
pub use icons::{
    DiscoveryChannel, DiscoverySource, FailureReason, FetchFailure, FetchOutcome, FetchState,
    IconCandidate, IconPayload, IconResolver, IconStore, ResolutionResult,
};

pub use api::IconServiceBuilder;

use std::path::Path;
use std::sync::Arc;

/// Main entry point for icon resolution and storage.
///
/// Cheap to share behind an `Arc`; every call is self-contained and
/// concurrent calls do not share mutable state.
pub struct IconService {
    resolver: Arc<IconResolver>,
    store: IconStore,
}

impl IconService {
    /// Create a builder for IconService.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let service = IconService::builder("./icons")
    ///     .external_services(false)
    ///     .concurrency(8)
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder(icon_dir: impl AsRef<Path>) -> IconServiceBuilder {
        IconServiceBuilder::new(icon_dir.as_ref())
    }

    /// Directory icons are stored in.
    pub fn icon_dir(&self) -> &Path {
        self.store.dir()
    }

    pub fn resolver(&self) -> &Arc<IconResolver> {
        &self.resolver
    }

    pub fn store(&self) -> &IconStore {
        &self.store
    }
}
