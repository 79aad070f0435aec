//! Template-based discovery channels.
//!
//! Both probers only synthesize URLs; the fetcher decides later whether
//! anything is actually there.

use super::candidate::DiscoveryChannel;
use super::discovery::DiscoverySource;
use crate::network::origin_of;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Substitute `{host}`, `{origin}` and `{url}` in one template.
fn expand_template(template: &str, target: &Url) -> Option<Url> {
    let host = target.host_str()?;
    let expanded = template
        .replace("{host}", host)
        .replace("{origin}", &origin_of(target))
        .replace("{url}", &urlencoding::encode(target.as_str()));

    match Url::parse(&expanded) {
        Ok(url) => Some(url),
        Err(e) => {
            debug!("Skipping unparseable probe URL {}: {}", expanded, e);
            None
        }
    }
}

/// Lookup URLs on third-party favicon services.
pub fn external_service_urls(templates: &[String], target: &Url) -> Vec<Url> {
    templates
        .iter()
        .filter_map(|t| expand_template(t, target))
        .collect()
}

/// Well-known icon paths on the target's own origin.
pub fn conventional_path_urls(paths: &[String], target: &Url) -> Vec<Url> {
    let origin = origin_of(target);
    paths
        .iter()
        .filter_map(|path| {
            let path = path.trim_start_matches('/');
            Url::parse(&format!("{}/{}", origin, path)).ok()
        })
        .collect()
}

/// Third-party favicon lookup services.
pub struct ExternalServiceProber {
    templates: Vec<String>,
}

impl ExternalServiceProber {
    pub fn new(templates: Vec<String>) -> Self {
        Self { templates }
    }
}

#[async_trait]
impl DiscoverySource for ExternalServiceProber {
    fn channel(&self) -> DiscoveryChannel {
        DiscoveryChannel::ExternalService
    }

    async fn discover(&self, target: &Url) -> Vec<Url> {
        external_service_urls(&self.templates, target)
    }
}

/// Conventional icon locations such as `/favicon.ico`.
pub struct ConventionalPathProber {
    paths: Vec<String>,
}

impl ConventionalPathProber {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl DiscoverySource for ConventionalPathProber {
    fn channel(&self) -> DiscoveryChannel {
        DiscoveryChannel::ConventionalPath
    }

    async fn discover(&self, target: &Url) -> Vec<Url> {
        conventional_path_urls(&self.paths, target)
    }
}
