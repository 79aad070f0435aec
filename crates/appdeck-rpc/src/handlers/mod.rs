//! JSON-RPC request handlers, split by domain.

mod gallery;
mod icons;

use crate::server::AppState;
use crate::wrapper::wrap_response;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

// ============================================================================
// JSON-RPC types
// ============================================================================

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data: None,
            }),
            id,
        }
    }
}

// ============================================================================
// Parameter extraction helpers
// ============================================================================

/// Extract an optional string parameter, supporting both snake_case and camelCase.
pub(crate) fn get_str_param<'a>(params: &'a Value, snake: &str, camel: &str) -> Option<&'a str> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_str())
}

/// Extract a required string parameter or return an error.
pub(crate) fn require_str_param(
    params: &Value,
    snake: &str,
    camel: &str,
) -> appdeck_core::Result<String> {
    get_str_param(params, snake, camel)
        .map(String::from)
        .ok_or_else(|| appdeck_core::IconError::InvalidParams {
            message: format!("Missing required parameter: {}", snake),
        })
}

// ============================================================================
// HTTP endpoints
// ============================================================================

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Main JSON-RPC handler.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    let method = &request.method;
    let params = request.params.unwrap_or(Value::Object(Default::default()));
    let id = request.id.clone();

    debug!("RPC call: {}", method);

    if method == "health_check" {
        return (
            StatusCode::OK,
            Json(JsonRpcResponse::success(id, json!({"status": "ok"}))),
        );
    }

    match dispatch_method(&state, method, &params).await {
        Ok(Some(value)) => {
            let wrapped = wrap_response(method, value);
            (StatusCode::OK, Json(JsonRpcResponse::success(id, wrapped)))
        }
        Ok(None) => {
            warn!("Unknown RPC method: {}", method);
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(
                    id,
                    -32601,
                    format!("Method not found: {}", method),
                )),
            )
        }
        Err(e) => {
            if e.is_validation() {
                warn!("Rejected {} call: {}", method, e);
            } else {
                error!("RPC error for {}: {}", method, e);
            }
            let code = e.to_rpc_error_code();
            (
                StatusCode::OK,
                Json(JsonRpcResponse::error(id, code, e.to_string())),
            )
        }
    }
}

// ============================================================================
// Method dispatcher
// ============================================================================

/// Dispatch a method call to the appropriate domain handler.
///
/// `Ok(None)` means the method name is unknown.
async fn dispatch_method(
    state: &AppState,
    method: &str,
    params: &Value,
) -> appdeck_core::Result<Option<Value>> {
    let value = match method {
        // Resolution
        "resolve_icon" => icons::resolve_icon(state, params).await?,
        "download_icon" => icons::download_icon(state, params).await?,

        // Persistence
        "save_icon" => gallery::save_icon(state, params).await?,
        "persist_icon" => gallery::persist_icon(state, params).await?,

        // Gallery
        "list_icons" => gallery::list_icons(state, params).await?,
        "delete_icon" => gallery::delete_icon(state, params).await?,
        "import_icon" => gallery::import_icon(state, params).await?,

        _ => return Ok(None),
    };
    Ok(Some(value))
}
