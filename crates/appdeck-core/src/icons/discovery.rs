//! Discovery channel trait.
//!
//! Every channel turns a target URL into an ordered list of absolute
//! candidate URLs. Channels never fail: network or parse problems collapse to
//! an empty list so one broken channel cannot sink the others.

use super::candidate::DiscoveryChannel;
use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

#[async_trait]
pub trait DiscoverySource: Send + Sync {
    /// Provenance recorded on every candidate this source yields.
    fn channel(&self) -> DiscoveryChannel;

    /// Candidate URLs for `target`, in this source's preferred order.
    async fn discover(&self, target: &Url) -> Vec<Url>;
}

/// Shared handle used by the resolver's channel list.
pub type DynDiscoverySource = Arc<dyn DiscoverySource>;
