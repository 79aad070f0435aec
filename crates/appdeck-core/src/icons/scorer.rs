//! URL-shape heuristics for ranking icon candidates.
//!
//! Rules are evaluated top to bottom and the first match wins. Later rules are
//! deliberately weaker fallbacks, so the table order is part of the contract.

use regex::Regex;
use std::sync::LazyLock;

/// Priority and human-readable quality label for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub priority: u8,
    pub label: &'static str,
}

/// What a rule looks for in the lowercased URL.
#[derive(Debug, Clone, Copy)]
enum Signal {
    /// Any of the substrings is present.
    Contains(&'static [&'static str]),
    /// A declared `WxH` size whose smaller side falls in `min..=max`.
    DeclaredSize { min: u32, max: u32 },
}

#[derive(Debug, Clone, Copy)]
struct ScoreRule {
    signal: Signal,
    priority: u8,
    label: &'static str,
}

const fn contains(markers: &'static [&'static str], priority: u8, label: &'static str) -> ScoreRule {
    ScoreRule {
        signal: Signal::Contains(markers),
        priority,
        label,
    }
}

const fn sized(min: u32, max: u32, priority: u8, label: &'static str) -> ScoreRule {
    ScoreRule {
        signal: Signal::DeclaredSize { min, max },
        priority,
        label,
    }
}

const RULES: &[ScoreRule] = &[
    contains(&[".svg"], 100, "vector, infinite quality"),
    sized(144, u32::MAX, 95, "high-resolution"),
    sized(114, 143, 90, "high-resolution"),
    sized(76, 113, 90, "medium-resolution"),
    sized(60, 75, 85, "medium-resolution"),
    sized(48, 59, 70, "standard"),
    sized(32, 47, 60, "standard"),
    sized(16, 31, 40, "compact"),
    contains(&["apple-touch-icon"], 90, "platform touch icon"),
    contains(&[".webp"], 80, "modern compressed"),
    contains(&[".png"], 75, "modern"),
    contains(&["logo"], 85, "logo"),
    contains(
        &["og:image", "twitter:image", "og-image", "og_image"],
        85,
        "social image",
    ),
    contains(&[".jpg", ".jpeg"], 70, "photographic"),
    contains(&[".ico"], 50, "classic, typically low fidelity"),
    contains(&["favicon"], 30, "generic, deprioritized"),
];

const DEFAULT_SCORE: Score = Score {
    priority: 40,
    label: "default",
};

static DECLARED_SIZE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2,4})x(\d{2,4})").unwrap());

/// Smaller side of the first `WxH` marker in the URL, if any.
fn declared_size(url: &str) -> Option<u32> {
    let caps = DECLARED_SIZE.captures(url)?;
    let width: u32 = caps[1].parse().ok()?;
    let height: u32 = caps[2].parse().ok()?;
    Some(width.min(height))
}

impl Signal {
    fn matches(&self, url: &str, size: Option<u32>) -> bool {
        match *self {
            Signal::Contains(markers) => markers.iter().any(|m| url.contains(m)),
            Signal::DeclaredSize { min, max } => size.is_some_and(|s| (min..=max).contains(&s)),
        }
    }
}

/// Score a candidate URL. Pure and deterministic.
pub fn score_url(url: &str) -> Score {
    let lower = url.to_ascii_lowercase();
    let size = declared_size(&lower);

    RULES
        .iter()
        .find(|rule| rule.signal.matches(&lower, size))
        .map(|rule| Score {
            priority: rule.priority,
            label: rule.label,
        })
        .unwrap_or(DEFAULT_SCORE)
}
