#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response, StatusCode},
    Router,
};
use genai_relay::config::RelayConfig;
use genai_relay::startup::{build_router, AppState};
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::collections::HashMap;
use tower::util::ServiceExt;
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";
pub const TEXT_PATH: &str = "/models/gemini-2.5-flash:generateContent";
pub const TTS_PATH: &str = "/models/gemini-2.5-flash-preview-tts:generateContent";
pub const IMAGE_PATH: &str = "/models/imagen-4.0-generate-001:predict";

/// Router wired to a mock provider.
pub struct TestApp {
    pub router: Router,
    pub provider: MockServer,
}

pub fn test_config(provider_uri: &str) -> RelayConfig {
    test_config_with_timeout(provider_uri, 5)
}

pub fn test_config_with_timeout(provider_uri: &str, timeout_secs: u64) -> RelayConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("GEMINI_API_KEY", API_KEY.to_string()),
        ("GENAI_API_BASE", provider_uri.to_string()),
        ("GENAI_TIMEOUT_SECS", timeout_secs.to_string()),
    ]);

    RelayConfig::from_lookup(CoreConfig { port: 0 }, |key| vars.get(key).cloned())
        .expect("Failed to build test config")
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_timeout(5).await
    }

    /// Same as [`TestApp::spawn`] with a custom provider timeout.
    pub async fn spawn_with_timeout(timeout_secs: u64) -> Self {
        let provider = MockServer::start().await;
        let state = AppState::from_config(test_config_with_timeout(
            &provider.uri(),
            timeout_secs,
        ))
        .expect("Failed to build state");

        Self {
            router: build_router(state),
            provider,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.send(request).await;
        let status = response.status();
        (status, body_json(response).await)
    }

    /// JSON bodies of every request the mock provider received.
    pub async fn provider_bodies(&self) -> Vec<Value> {
        self.provider
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).expect("Provider request was not JSON"))
            .collect()
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// A `generateContent` reply with a single text part.
pub fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}
