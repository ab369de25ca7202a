use axum::{extract::State, Json};
use service_core::error::AppError;

use super::upstream_error;
use crate::dtos::{ChatRequest, ChatResponse, FileAttachment, Source, ValidatedJson};
use crate::services::providers::{GenerationParams, PromptPart};
use crate::startup::AppState;

const SEARCH_URL: &str = "https://www.google.com/search?q=";

#[tracing::instrument(skip(state, request))]
pub async fn chat(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let prompt = request.prompt.unwrap_or_default();
    let parts = build_parts(prompt, request.file);

    let params = GenerationParams {
        web_search: true,
        response_schema: None,
    };

    let response = state
        .text_provider
        .generate(parts, &params)
        .await
        .map_err(upstream_error("Failed to get a response from the AI provider"))?;

    Ok(Json(ChatResponse {
        text: response.text.unwrap_or_default(),
        sources: sources_from_queries(&response.search_queries),
    }))
}

/// Attachment first, then the prompt text.
fn build_parts(prompt: String, file: Option<FileAttachment>) -> Vec<PromptPart> {
    let mut parts = Vec::with_capacity(2);
    if let Some(file) = file {
        parts.push(PromptPart::InlineData {
            mime_type: file.mime_type,
            data: file.base64_data,
        });
    }
    parts.push(PromptPart::Text(prompt));
    parts
}

/// Grounding only reports the queries it ran, so each becomes a search link.
fn sources_from_queries(queries: &[String]) -> Vec<Source> {
    queries
        .iter()
        .map(|query| Source {
            uri: format!("{}{}", SEARCH_URL, urlencoding::encode(query)),
            title: query.clone(),
        })
        .collect()
}
