//! Icon store handlers: committing chosen icons and the gallery.

use super::require_str_param;
use crate::server::AppState;
use serde_json::{json, Value};

/// Commit a preview data URL returned by `resolve_icon` / `download_icon`.
pub async fn save_icon(state: &AppState, params: &Value) -> appdeck_core::Result<Value> {
    let data = require_str_param(params, "data", "data")?;
    let original_url = require_str_param(params, "original_url", "originalUrl")?;
    let file_name = state.service.persist_data_url(&data, &original_url).await?;
    Ok(json!({"success": true, "fileName": file_name}))
}

/// Commit raw base64 bytes with an explicit MIME type.
pub async fn persist_icon(state: &AppState, params: &Value) -> appdeck_core::Result<Value> {
    let data = require_str_param(params, "data", "data")?;
    let mime_type = require_str_param(params, "mime_type", "mimeType")?;
    let original_url = require_str_param(params, "original_url", "originalUrl")?;
    let file_name = state
        .service
        .persist_base64(&data, &mime_type, &original_url)
        .await?;
    Ok(json!({"success": true, "fileName": file_name}))
}

pub async fn list_icons(state: &AppState, _params: &Value) -> appdeck_core::Result<Value> {
    let icons = state.service.list_icons().await?;
    Ok(json!(icons))
}

pub async fn delete_icon(state: &AppState, params: &Value) -> appdeck_core::Result<Value> {
    let file_name = require_str_param(params, "file_name", "fileName")?;
    state.service.delete_icon(&file_name).await?;
    Ok(json!(true))
}

pub async fn import_icon(state: &AppState, params: &Value) -> appdeck_core::Result<Value> {
    let source_path = require_str_param(params, "source_path", "sourcePath")?;
    let file_name = state.service.import_icon(source_path).await?;
    Ok(json!({"success": true, "fileName": file_name}))
}
