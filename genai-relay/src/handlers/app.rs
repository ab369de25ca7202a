use axum::{response::Html, Json};
use serde_json::{json, Value};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Landing page describing the relay endpoints.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Liveness probe. Does not touch the provider.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "genai-relay",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
