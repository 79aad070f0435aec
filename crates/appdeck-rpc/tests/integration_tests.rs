//! Integration tests for the appdeck-rpc JSON-RPC server.
//!
//! These tests spawn the real binary against a local fixture site and check
//! that responses match the shapes the frontend expects.

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncBufReadExt;

const PROXY_VARS: &[&str] = &[
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "ALL_PROXY",
    "http_proxy",
    "https_proxy",
    "all_proxy",
];

/// Make an RPC call to the server.
async fn rpc_call(port: u16, method: &str, params: Value) -> Result<Value, String> {
    let json = rpc_call_raw(port, method, params).await?;
    if let Some(error) = json.get("error") {
        return Err(error.to_string());
    }
    Ok(json.get("result").cloned().unwrap_or(Value::Null))
}

/// Make an RPC call and return the full JSON-RPC payload.
async fn rpc_call_raw(port: u16, method: &str, params: Value) -> Result<Value, String> {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .map_err(|e| e.to_string())?;
    let response = client
        .post(format!("http://127.0.0.1:{}/rpc", port))
        .json(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    response.json::<Value>().await.map_err(|e| e.to_string())
}

/// Check health endpoint.
async fn check_health(port: u16) -> bool {
    let Ok(client) = reqwest::Client::builder().no_proxy().build() else {
        return false;
    };
    if let Ok(response) = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        if let Ok(json) = response.json::<Value>().await {
            return json.get("status").and_then(|v| v.as_str()) == Some("ok");
        }
    }
    false
}

/// Wait for server to be ready.
async fn wait_for_server(port: u16, timeout_secs: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(timeout_secs) {
        if check_health(port).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

struct RpcServerHandle {
    child: tokio::process::Child,
    port: u16,
    stdout_drain: Option<tokio::task::JoinHandle<()>>,
}

impl RpcServerHandle {
    async fn stop(mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
    }
}

impl Drop for RpcServerHandle {
    fn drop(&mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.start_kill();
    }
}

fn rpc_binary() -> Result<PathBuf, String> {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_appdeck-rpc") {
        return Ok(PathBuf::from(path));
    }
    let current_exe = std::env::current_exe()
        .map_err(|e| format!("failed to resolve current_exe for fallback: {e}"))?;
    let target_debug_dir = current_exe
        .parent()
        .and_then(|p| p.parent())
        .ok_or_else(|| "failed to resolve target/debug directory for fallback".to_string())?;

    let mut fallback = target_debug_dir.join("appdeck-rpc");
    if cfg!(target_os = "windows") {
        fallback.set_extension("exe");
    }
    if !fallback.exists() {
        return Err(format!(
            "CARGO_BIN_EXE_appdeck-rpc not set and fallback binary not found at {}",
            fallback.display()
        ));
    }
    Ok(fallback)
}

/// Start the RPC binary and wait until `/health` is ready.
async fn start_rpc_server(icon_dir: &Path) -> Result<RpcServerHandle, String> {
    let binary = rpc_binary()?;

    let mut command = tokio::process::Command::new(&binary);
    command
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg("0")
        .arg("--icon-dir")
        .arg(icon_dir)
        .arg("--no-external-services")
        .arg("--fetch-timeout-secs")
        .arg("3")
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    for var in PROXY_VARS {
        command.env_remove(var);
    }
    let mut child = command
        .spawn()
        .map_err(|e| format!("failed to spawn appdeck-rpc: {e}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to capture stdout".to_string())?;
    let mut lines = tokio::io::BufReader::new(stdout).lines();

    let mut discovered_port: Option<u16> = None;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(250), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(value) = line.strip_prefix("RPC_PORT=") {
                    let parsed = value
                        .trim()
                        .parse::<u16>()
                        .map_err(|e| format!("invalid RPC_PORT value '{value}': {e}"))?;
                    discovered_port = Some(parsed);
                    break;
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(format!("failed to read appdeck-rpc stdout: {err}")),
            Err(_) => continue,
        }
    }

    let port =
        discovered_port.ok_or_else(|| "RPC_PORT line not emitted by appdeck-rpc".to_string())?;
    if !wait_for_server(port, 15).await {
        return Err(format!("appdeck-rpc failed health check on port {port}"));
    }

    let stdout_drain =
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

    Ok(RpcServerHandle {
        child,
        port,
        stdout_drain: Some(stdout_drain),
    })
}

// =============================================================================
// Fixture site
// =============================================================================

const SVG: &[u8] = br#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 8 8"><circle cx="4" cy="4" r="4"/></svg>"#;

fn image(content_type: &'static str, bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
}

fn filler(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}

async fn spawn_fixture() -> SocketAddr {
    let app = Router::new()
        .route(
            "/single/",
            get(|| async { Html(r#"<html><head><link rel="icon" href="/brand.svg"></head></html>"#) }),
        )
        .route(
            "/pair/",
            get(|| async {
                Html(
                    r#"<html><head>
                        <link rel="icon" href="/pair/favicon.ico">
                        <link rel="icon" href="/pair/icon.png">
                    </head></html>"#,
                )
            }),
        )
        .route("/brand.svg", get(|| async { image("image/svg+xml", SVG.to_vec()) }))
        .route("/pair/favicon.ico", get(|| async { image("image/x-icon", filler(1, 300)) }))
        .route("/pair/icon.png", get(|| async { image("image/png", filler(2, 600)) }))
        .route("/empty/", get(|| async { Html("<html></html>") }))
        .route("/missing.png", get(|| async { StatusCode::NOT_FOUND }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// =============================================================================
// Response Structure Validators
// =============================================================================

/// Validate BaseResponse structure: { success: bool, error?: string }
fn validate_base_response(response: &Value) -> Result<(), String> {
    if response.get("success").and_then(|v| v.as_bool()).is_none() {
        return Err("Missing 'success' field".into());
    }
    Ok(())
}

/// Validate one icon option as rendered by the picker.
fn validate_icon(icon: &Value) -> Result<(), String> {
    for field in ["url", "priority", "quality", "mimeType", "size", "base64Data"] {
        if icon.get(field).is_none() {
            return Err(format!("Missing field: {}", field));
        }
    }
    let data = icon["base64Data"].as_str().ok_or("'base64Data' must be a string")?;
    if !data.starts_with("data:image/") {
        return Err(format!("'base64Data' is not an image data URL: {}", data));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

struct TestEnv {
    _temp_dir: TempDir,
    icon_dir: PathBuf,
    server: RpcServerHandle,
    site: SocketAddr,
}

impl TestEnv {
    fn site_url(&self, path: &str) -> String {
        format!("http://{}{}", self.site, path)
    }

    async fn call(&self, method: &str, params: Value) -> Value {
        rpc_call(self.server.port, method, params)
            .await
            .unwrap_or_else(|e| panic!("{method} failed: {e}"))
    }
}

async fn create_test_env() -> TestEnv {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let icon_dir = temp_dir.path().join("icons");
    let site = spawn_fixture().await;
    let server = start_rpc_server(&icon_dir).await.expect("server start");
    TestEnv {
        _temp_dir: temp_dir,
        icon_dir,
        server,
        site,
    }
}

#[tokio::test]
async fn test_health_check() {
    let env = create_test_env().await;
    let result = env.call("health_check", json!({})).await;
    assert_eq!(result["status"], "ok");
    env.server.stop().await;
}

#[tokio::test]
async fn test_unknown_method() {
    let env = create_test_env().await;
    let raw = rpc_call_raw(env.server.port, "no_such_method", json!({}))
        .await
        .unwrap();
    assert_eq!(raw["error"]["code"], -32601);
    env.server.stop().await;
}

#[tokio::test]
async fn test_resolve_single_icon() {
    let env = create_test_env().await;
    let result = env
        .call("resolve_icon", json!({"url": env.site_url("/single/")}))
        .await;

    validate_base_response(&result).unwrap();
    assert_eq!(result["success"], true);
    let icon = &result["icon"];
    validate_icon(icon).unwrap();
    assert_eq!(icon["priority"], 100);
    assert_eq!(icon["quality"], "vector, infinite quality");
    assert_eq!(icon["source"], "page_markup");
    assert_eq!(icon["mimeType"], "image/svg+xml");
    env.server.stop().await;
}

#[tokio::test]
async fn test_resolve_needs_user_choice() {
    let env = create_test_env().await;
    let result = env
        .call("resolve_icon", json!({"url": env.site_url("/pair/")}))
        .await;

    assert_eq!(result["success"], false);
    assert_eq!(result["needsUserChoice"], true);
    let icons = result["icons"].as_array().unwrap();
    assert_eq!(icons.len(), 2);
    for icon in icons {
        validate_icon(icon).unwrap();
    }
    assert!(icons[0]["url"].as_str().unwrap().ends_with("/pair/icon.png"));
    assert!(icons[1]["url"].as_str().unwrap().ends_with("/pair/favicon.ico"));
    env.server.stop().await;
}

#[tokio::test]
async fn test_resolve_without_icons() {
    let env = create_test_env().await;
    let result = env
        .call("resolve_icon", json!({"url": env.site_url("/empty/")}))
        .await;
    assert_eq!(result["success"], false);
    assert!(result["error"].as_str().unwrap().starts_with("no icon found"));
    env.server.stop().await;
}

#[tokio::test]
async fn test_resolve_rejects_malformed_url() {
    let env = create_test_env().await;
    let raw = rpc_call_raw(env.server.port, "resolve_icon", json!({"url": "not a url"}))
        .await
        .unwrap();
    assert_eq!(raw["error"]["code"], -32005);

    let raw = rpc_call_raw(env.server.port, "resolve_icon", json!({}))
        .await
        .unwrap();
    assert_eq!(raw["error"]["code"], -32005);
    env.server.stop().await;
}

#[tokio::test]
async fn test_choose_download_and_save() {
    let env = create_test_env().await;
    let original = env.site_url("/pair/");

    let downloaded = env
        .call(
            "download_icon",
            json!({"iconUrl": env.site_url("/pair/favicon.ico"), "originalUrl": original}),
        )
        .await;
    assert_eq!(downloaded["success"], true);
    validate_icon(&downloaded["icon"]).unwrap();
    assert_eq!(downloaded["icon"]["priority"], 50);

    let data = downloaded["icon"]["base64Data"].as_str().unwrap().to_string();
    let saved = env
        .call("save_icon", json!({"data": data, "original_url": original}))
        .await;
    assert_eq!(saved["fileName"], "127_0_0_1.ico");

    let saved_again = env
        .call("save_icon", json!({"data": data, "original_url": original}))
        .await;
    assert_eq!(saved_again["fileName"], "127_0_0_1_1.ico");

    let stored = std::fs::read(env.icon_dir.join("127_0_0_1.ico")).unwrap();
    assert_eq!(stored, filler(1, 300));

    let failed = env
        .call(
            "download_icon",
            json!({"icon_url": env.site_url("/missing.png"), "original_url": original}),
        )
        .await;
    assert_eq!(failed["success"], false);
    assert_eq!(failed["error"], "HTTP status 404");
    env.server.stop().await;
}

#[tokio::test]
async fn test_persist_base64_and_gallery() {
    let env = create_test_env().await;

    let persisted = env
        .call(
            "persist_icon",
            json!({
                "data": "PHN2Zy8+",
                "mimeType": "image/svg+xml",
                "originalUrl": "https://docs.rs/serde"
            }),
        )
        .await;
    assert_eq!(persisted["success"], true);
    assert_eq!(persisted["fileName"], "docs_rs.svg");

    let source = env._temp_dir.path().join("custom.webp");
    std::fs::write(&source, filler(3, 128)).unwrap();
    let imported = env
        .call("import_icon", json!({"sourcePath": source.to_string_lossy()}))
        .await;
    assert_eq!(imported["fileName"], "custom.webp");

    let listed = env.call("list_icons", json!({})).await;
    assert_eq!(listed, json!({"success": true, "icons": ["custom.webp", "docs_rs.svg"]}));

    let deleted = env.call("delete_icon", json!({"file_name": "docs_rs.svg"})).await;
    assert_eq!(deleted["success"], true);

    let raw = rpc_call_raw(env.server.port, "delete_icon", json!({"fileName": "docs_rs.svg"}))
        .await
        .unwrap();
    assert_eq!(raw["error"]["code"], -32002);

    let raw = rpc_call_raw(env.server.port, "delete_icon", json!({"fileName": "../escape.png"}))
        .await
        .unwrap();
    assert_eq!(raw["error"]["code"], -32005);
    env.server.stop().await;
}
