use axum::{extract::State, Json};
use serde_json::{json, Value};
use service_core::error::AppError;

use super::upstream_error;
use crate::dtos::{SentimentRequest, ValidatedJson};
use crate::services::providers::{GenerationParams, PromptPart};
use crate::startup::AppState;

const UPSTREAM_MESSAGE: &str = "Failed to analyze sentiment";

#[tracing::instrument(skip(state, request))]
pub async fn sentiment(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SentimentRequest>,
) -> Result<Json<Value>, AppError> {
    let asset = request.asset.unwrap_or_default();

    let params = GenerationParams {
        web_search: true,
        response_schema: Some(sentiment_schema()),
    };

    let response = state
        .text_provider
        .generate(vec![PromptPart::Text(sentiment_prompt(&asset))], &params)
        .await
        .map_err(upstream_error(UPSTREAM_MESSAGE))?;

    let text = response.text.ok_or_else(|| {
        tracing::error!(asset = %asset, "Sentiment response contained no text");
        AppError::upstream(UPSTREAM_MESSAGE, "Provider returned an empty response")
    })?;

    let report: Value = serde_json::from_str(text.trim()).map_err(|e| {
        tracing::error!(asset = %asset, error = %e, "Sentiment response was not valid JSON");
        AppError::upstream(UPSTREAM_MESSAGE, format!("Provider returned malformed JSON: {}", e))
    })?;

    Ok(Json(report))
}

fn sentiment_prompt(asset: &str) -> String {
    format!(
        "Analyze the current market sentiment for the financial asset \"{asset}\". \
         Search the web for the latest news, price action and analyst commentary before answering. \
         Return a sentiment score from -10 (extremely bearish) to 10 (extremely bullish), \
         up to three key drivers behind the current sentiment, and a short summary. \
         Use \"{asset}\" as the asset field."
    )
}

/// Shape the provider must return; mirrors the response body exactly.
fn sentiment_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "asset": { "type": "STRING" },
            "sentiment_score": {
                "type": "NUMBER",
                "minimum": -10,
                "maximum": 10,
                "description": "Sentiment from -10 (extremely bearish) to 10 (extremely bullish)"
            },
            "key_drivers": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "maxItems": 3,
                "description": "At most three factors driving the sentiment"
            },
            "summary": { "type": "STRING" }
        },
        "required": ["asset", "sentiment_score", "key_drivers", "summary"]
    })
}
