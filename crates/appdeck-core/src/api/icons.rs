//! Icon resolution methods on IconService.

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::icons::{FetchOutcome, ResolutionResult};
use crate::IconService;

impl IconService {
    // ========================================
    // Resolution
    // ========================================

    /// Resolve the best icon for a site URL.
    ///
    /// Returns `Err` only for malformed input; "nothing usable" is
    /// [`ResolutionResult::Failed`].
    pub async fn resolve_icon(&self, url: &str) -> Result<ResolutionResult> {
        self.resolver.resolve(url, &CancellationToken::new()).await
    }

    /// Like [`resolve_icon`](Self::resolve_icon), abandoning pending fetches
    /// once `cancel` fires.
    pub async fn resolve_icon_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ResolutionResult> {
        self.resolver.resolve(url, cancel).await
    }

    /// Re-fetch the candidate the user picked after disambiguation.
    pub async fn download_chosen_candidate(
        &self,
        candidate_url: &str,
        target_url: &str,
    ) -> Result<FetchOutcome> {
        self.resolver
            .download_chosen_candidate(candidate_url, target_url)
            .await
    }
}
