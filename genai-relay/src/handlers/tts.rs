use axum::{extract::State, Json};
use service_core::error::AppError;

use super::upstream_error;
use crate::dtos::{TtsRequest, TtsResponse, ValidatedJson};
use crate::startup::AppState;

#[tracing::instrument(skip(state, request))]
pub async fn text_to_speech(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<TtsRequest>,
) -> Result<Json<TtsResponse>, AppError> {
    let text = request.text.unwrap_or_default();

    let speech = state
        .audio_provider
        .synthesize_speech(&text)
        .await
        .map_err(upstream_error("Failed to synthesize speech"))?;

    Ok(Json(TtsResponse {
        audio_data: speech.audio_data,
        mime_type: speech.mime_type,
    }))
}
