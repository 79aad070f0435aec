//! Icon resolution handlers.

use super::require_str_param;
use crate::server::AppState;
use appdeck_core::icons::score_url;
use appdeck_core::{IconCandidate, IconPayload, ResolutionResult};
use serde_json::{json, Value};

/// Frontend shape of one icon option. `base64Data` is a ready-to-use data URL.
fn icon_json(
    url: &str,
    priority: u8,
    quality: &str,
    source: Option<&str>,
    payload: &IconPayload,
) -> Value {
    json!({
        "url": url,
        "priority": priority,
        "quality": quality,
        "source": source,
        "mimeType": payload.mime_type,
        "size": payload.len(),
        "base64Data": payload.to_data_url(),
    })
}

fn candidate_json(candidate: &IconCandidate) -> Option<Value> {
    candidate.payload().map(|payload| {
        icon_json(
            candidate.source_url.as_str(),
            candidate.priority,
            candidate.quality_label,
            Some(candidate.channel.as_str()),
            payload,
        )
    })
}

pub async fn resolve_icon(state: &AppState, params: &Value) -> appdeck_core::Result<Value> {
    let url = require_str_param(params, "url", "url")?;
    let result = state.service.resolve_icon(&url).await?;

    Ok(match result {
        ResolutionResult::Resolved { candidate } => json!({
            "success": true,
            "icon": candidate_json(&candidate),
        }),
        ResolutionResult::NeedsDisambiguation { candidates } => {
            let icons: Vec<Value> = candidates.iter().filter_map(candidate_json).collect();
            json!({
                "success": false,
                "needsUserChoice": true,
                "icons": icons,
            })
        }
        ResolutionResult::Failed { reason } => json!({
            "success": false,
            "error": reason.to_string(),
        }),
    })
}

pub async fn download_icon(state: &AppState, params: &Value) -> appdeck_core::Result<Value> {
    let icon_url = require_str_param(params, "icon_url", "iconUrl")?;
    let original_url = require_str_param(params, "original_url", "originalUrl")?;

    let outcome = state
        .service
        .download_chosen_candidate(&icon_url, &original_url)
        .await?;

    Ok(match outcome {
        Ok(payload) => {
            let score = score_url(&icon_url);
            json!({
                "success": true,
                "icon": icon_json(&icon_url, score.priority, score.label, None, &payload),
            })
        }
        Err(failure) => json!({
            "success": false,
            "error": failure.to_string(),
        }),
    })
}
