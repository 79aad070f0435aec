//! Candidate and result types for icon resolution.

use super::fetcher::FetchFailure;
use super::scorer::{score_url, Score};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// Where a candidate URL came from. Diagnostic only; never used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryChannel {
    PageMarkup,
    ExternalService,
    ConventionalPath,
}

impl DiscoveryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryChannel::PageMarkup => "page_markup",
            DiscoveryChannel::ExternalService => "external_service",
            DiscoveryChannel::ConventionalPath => "conventional_path",
        }
    }
}

impl std::fmt::Display for DiscoveryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated icon bytes.
///
/// Only the fetcher constructs these, after status, content type and size
/// checks have all passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconPayload {
    pub bytes: Bytes,
    pub mime_type: String,
}

impl IconPayload {
    pub(crate) fn new(bytes: Bytes, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:` URL suitable for an `<img>` preview.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }

    pub(crate) fn digest(&self) -> blake3::Hash {
        blake3::hash(&self.bytes)
    }
}

/// Fetch progress of one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Unfetched,
    Fetched(IconPayload),
    Failed(FetchFailure),
}

/// A discovered, ranked icon source for one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconCandidate {
    pub source_url: Url,
    pub channel: DiscoveryChannel,
    pub priority: u8,
    pub quality_label: &'static str,
    pub state: FetchState,
}

impl IconCandidate {
    /// Annotate a freshly discovered URL with its score. Nothing is fetched.
    pub fn discovered(source_url: Url, channel: DiscoveryChannel) -> Self {
        let Score { priority, label } = score_url(source_url.as_str());
        Self {
            source_url,
            channel,
            priority,
            quality_label: label,
            state: FetchState::Unfetched,
        }
    }

    pub fn payload(&self) -> Option<&IconPayload> {
        match &self.state {
            FetchState::Fetched(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn is_validated(&self) -> bool {
        self.payload().is_some()
    }
}

/// Why a resolution produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No discovery channel produced a single candidate URL.
    DiscoveryEmpty,
    /// Candidates were found but none passed fetch validation.
    NoValidCandidates { attempted: usize },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::DiscoveryEmpty => write!(f, "no icon found"),
            FailureReason::NoValidCandidates { attempted } => {
                write!(f, "no icon found ({} candidates tried)", attempted)
            }
        }
    }
}

/// Terminal output of one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// Exactly one validated candidate.
    Resolved { candidate: IconCandidate },
    /// Two or more validated candidates, best first. The caller picks one.
    NeedsDisambiguation { candidates: Vec<IconCandidate> },
    Failed { reason: FailureReason },
}

impl ResolutionResult {
    /// Build the result for a ranked list of validated candidates.
    pub(crate) fn from_validated(mut candidates: Vec<IconCandidate>, attempted: usize) -> Self {
        match candidates.len() {
            0 => ResolutionResult::Failed {
                reason: if attempted == 0 {
                    FailureReason::DiscoveryEmpty
                } else {
                    FailureReason::NoValidCandidates { attempted }
                },
            },
            1 => ResolutionResult::Resolved {
                candidate: candidates.remove(0),
            },
            _ => ResolutionResult::NeedsDisambiguation { candidates },
        }
    }

    /// All validated candidates carried by this result, best first.
    pub fn candidates(&self) -> &[IconCandidate] {
        match self {
            ResolutionResult::Resolved { candidate } => std::slice::from_ref(candidate),
            ResolutionResult::NeedsDisambiguation { candidates } => candidates,
            ResolutionResult::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResolutionResult::Failed { .. })
    }
}
