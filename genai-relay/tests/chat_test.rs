mod common;

use axum::http::StatusCode;
use common::{gemini_text, TestApp, API_KEY, TEXT_PATH};
use genai_relay::config::MAX_BODY_BYTES;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn missing_prompt_is_rejected_without_calling_provider() {
    let app = TestApp::spawn().await;

    let (status, body) = app.post_json("/api/chat", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Prompt is required");
    assert!(app.provider_bodies().await.is_empty());
}

#[tokio::test]
async fn empty_prompt_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app.post_json("/api/chat", json!({ "prompt": "" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(app.provider_bodies().await.is_empty());
}

#[tokio::test]
async fn whitespace_prompt_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app.post_json("/api/chat", json!({ "prompt": "   " })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Prompt is required");
    assert!(app.provider_bodies().await.is_empty());
}

#[tokio::test]
async fn text_prompt_sends_single_part_with_search_grounding() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .and(header("x-goog-api-key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("Hello there")))
        .expect(1)
        .mount(&app.provider)
        .await;

    let (status, body) = app
        .post_json("/api/chat", json!({ "prompt": "Say hello" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "text": "Hello there", "sources": [] }));

    let sent = app.provider_bodies().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["contents"][0]["parts"], json!([{ "text": "Say hello" }]));
    assert_eq!(sent[0]["tools"], json!([{ "googleSearch": {} }]));
}

#[tokio::test]
async fn attachment_is_sent_before_prompt() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("A chart")))
        .mount(&app.provider)
        .await;

    let (status, _) = app
        .post_json(
            "/api/chat",
            json!({
                "prompt": "What is in this image?",
                "file": { "base64Data": "iVBORw0KGgo=", "mimeType": "image/png" }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);

    let sent = app.provider_bodies().await;
    let parts = sent[0]["contents"][0]["parts"].as_array().unwrap().clone();
    assert_eq!(parts.len(), 2);
    assert_eq!(
        parts[0],
        json!({ "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } })
    );
    assert_eq!(parts[1], json!({ "text": "What is in this image?" }));
}

#[tokio::test]
async fn grounding_queries_become_sources() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Markets are up." }] },
                "finishReason": "STOP",
                "groundingMetadata": { "webSearchQueries": ["BTC price", "ETH news"] }
            }]
        })))
        .mount(&app.provider)
        .await;

    let (status, body) = app
        .post_json("/api/chat", json!({ "prompt": "How is crypto doing?" }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Markets are up.");

    let sources = body["sources"].as_array().unwrap();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0]["title"], "BTC price");
    assert!(sources[0]["uri"].as_str().unwrap().contains("BTC%20price"));
    assert_eq!(sources[1]["title"], "ETH news");
    assert!(sources[1]["uri"].as_str().unwrap().contains("ETH%20news"));
}

#[tokio::test]
async fn provider_failure_is_reported_as_upstream_error() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .mount(&app.provider)
        .await;

    let (status, body) = app.post_json("/api/chat", json!({ "prompt": "hi" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
    assert_eq!(body["details"], "backend exploded");
}

#[tokio::test]
async fn non_json_body_is_bad_request() {
    let app = TestApp::spawn().await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid JSON body"));
}

#[tokio::test]
async fn slow_provider_times_out_as_upstream_error() {
    let app = TestApp::spawn_with_timeout(1).await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(gemini_text("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&app.provider)
        .await;

    let (status, body) = app.post_json("/api/chat", json!({ "prompt": "hi" })).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"], "Request timed out");
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let app = TestApp::spawn().await;
    let payload = format!(
        r#"{{"prompt":"describe","file":{{"base64Data":"{}","mimeType":"image/png"}}}}"#,
        "A".repeat(MAX_BODY_BYTES + 1024)
    );

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(payload))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "Request body exceeds the size limit");
    assert!(app.provider_bodies().await.is_empty());
}

#[tokio::test]
async fn safety_blocked_reply_is_upstream_error() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path(TEXT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [] },
                "finishReason": "SAFETY"
            }]
        })))
        .mount(&app.provider)
        .await;

    let (status, body) = app
        .post_json("/api/chat", json!({ "prompt": "something unsafe" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["details"], "Content filtered");
}
