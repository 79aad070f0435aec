//! Static scan of page markup for icon-bearing tags.
//!
//! Three signals are collected in document order:
//! - `<link rel="icon | apple-touch-icon | shortcut icon | mask-icon" href>`
//! - `<meta property|name="og:image | twitter:image" content>`
//! - `<img alt="…logo|icon|brand…" src>`
//!
//! Attribute order inside a tag does not matter. `data:` references are
//! skipped; everything else is resolved against the page URL.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

const ICON_RELS: &[&str] = &[
    "icon",
    "apple-touch-icon",
    "apple-touch-icon-precomposed",
    "mask-icon",
];

const SOCIAL_IMAGE_PROPERTIES: &[&str] = &[
    "og:image",
    "og:image:url",
    "og:image:secure_url",
    "twitter:image",
    "twitter:image:src",
];

const IMG_ALT_MARKERS: &[&str] = &["logo", "icon", "brand"];

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<(link|meta|img)\b((?:"[^"]*"|'[^']*'|[^>"'])*)>"#).unwrap());

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'<>`]+))"#)
        .unwrap()
});

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Lowercased attribute name -> raw value. First occurrence wins.
fn parse_attributes(raw: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for caps in ATTRIBUTE.captures_iter(raw) {
        let name = caps[1].to_ascii_lowercase();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| decode_entities(m.as_str().trim()))
            .unwrap_or_default();
        attrs.entry(name).or_insert(value);
    }
    attrs
}

/// The handful of entities that show up in real-world icon URLs.
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&amp;", "&")
        .replace("&#38;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x2F;", "/")
        .replace("&#47;", "/")
}

fn is_icon_link(attrs: &HashMap<String, String>) -> bool {
    attrs
        .get("rel")
        .map(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| ICON_RELS.contains(&token.to_ascii_lowercase().as_str()))
        })
        .unwrap_or(false)
}

fn is_social_image_meta(attrs: &HashMap<String, String>) -> bool {
    ["property", "name"].iter().any(|key| {
        attrs
            .get(*key)
            .map(|v| SOCIAL_IMAGE_PROPERTIES.contains(&v.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    })
}

fn is_branded_img(attrs: &HashMap<String, String>) -> bool {
    attrs
        .get("alt")
        .map(|alt| {
            let alt = alt.to_lowercase();
            IMG_ALT_MARKERS.iter().any(|m| alt.contains(m))
        })
        .unwrap_or(false)
}

/// Resolve one tag reference against the page URL.
fn resolve_reference(reference: &str, page_url: &Url) -> Option<Url> {
    let is_data_url = reference
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"));
    if reference.is_empty() || is_data_url {
        return None;
    }
    let resolved = page_url.join(reference).ok()?;
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}

/// Extract candidate icon URLs from page markup, in document order.
pub fn extract_icon_urls(markup: &str, page_url: &Url) -> Vec<Url> {
    let markup = COMMENT.replace_all(markup, "");
    let mut urls = Vec::new();

    for caps in TAG.captures_iter(&markup) {
        let tag = caps[1].to_ascii_lowercase();
        let attrs = parse_attributes(&caps[2]);

        let reference = match tag.as_str() {
            "link" if is_icon_link(&attrs) => attrs.get("href"),
            "meta" if is_social_image_meta(&attrs) => attrs.get("content"),
            "img" if is_branded_img(&attrs) => attrs.get("src"),
            _ => None,
        };

        if let Some(url) = reference.and_then(|r| resolve_reference(r, page_url)) {
            urls.push(url);
        }
    }

    urls
}
