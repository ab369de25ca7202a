use axum::{extract::State, Json};
use service_core::error::AppError;

use super::upstream_error;
use crate::dtos::{ImageRequest, ImageResponse, ValidatedJson};
use crate::startup::AppState;

#[tracing::instrument(skip(state, request))]
pub async fn generate_image(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ImageRequest>,
) -> Result<Json<ImageResponse>, AppError> {
    let prompt = request.prompt.unwrap_or_default();

    let image = state
        .image_provider
        .generate_image(&prompt)
        .await
        .map_err(upstream_error("Failed to generate image"))?;

    tracing::debug!(
        bytes = image.base64_data.len(),
        mime_type = ?image.mime_type,
        "Image generated"
    );

    Ok(Json(ImageResponse {
        base64_image: image.base64_data,
    }))
}
