//! Response wrapping for frontend compatibility.
//!
//! The frontend expects `{success: bool, ...data, error?: string}`. Handlers
//! that already build that shape pass through; the rest are wrapped here.

use serde_json::{json, Value};

/// Wrap handler results to match the frontend's expected format.
pub fn wrap_response(method: &str, result: Value) -> Value {
    match method {
        // List wrappers
        "list_icons" => {
            json!({
                "success": true,
                "icons": if result.is_null() { json!([]) } else { result }
            })
        }

        // Bool methods
        "delete_icon" => {
            json!({
                "success": result.as_bool().unwrap_or(false)
            })
        }

        // resolve_icon, download_icon, save_icon, persist_icon and import_icon
        // already return {success, ...}
        _ => result,
    }
}
