//! Icon resolution pipeline.
//!
//! Discovery channels ([`PageIconExtractor`], [`ExternalServiceProber`],
//! [`ConventionalPathProber`]) produce candidate URLs, the [`scorer`] ranks
//! them by URL shape, the [`CandidateFetcher`] downloads and validates them,
//! and the [`IconResolver`] decides between [`ResolutionResult::Resolved`] and
//! [`ResolutionResult::NeedsDisambiguation`]. The [`IconStore`] commits the
//! chosen payload to disk.

mod candidate;
mod discovery;
mod extractor;
mod fetcher;
pub mod markup;
mod probes;
mod resolver;
pub mod scorer;
mod store;

pub use candidate::{
    DiscoveryChannel, FailureReason, FetchState, IconCandidate, IconPayload, ResolutionResult,
};
pub use discovery::{DiscoverySource, DynDiscoverySource};
pub use extractor::PageIconExtractor;
pub use fetcher::{CandidateFetcher, FetchFailure};
pub use probes::{
    conventional_path_urls, external_service_urls, ConventionalPathProber, ExternalServiceProber,
};
pub use resolver::{parse_target, FetchOutcome, IconResolver};
pub use scorer::{score_url, Score};
pub use store::{decode_base64, decode_data_url, extension_for_mime, sanitize_host, IconStore};
