//! Request and response bodies for the relay endpoints.
//!
//! Required fields are `Option` so that an absent field, a JSON `null` and a
//! blank string all reach validation and come back as a 400 with a message.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use service_core::error::AppError;
use validator::{Validate, ValidationError};

/// Rejects empty and whitespace-only strings.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[serde(default)]
    #[validate(
        required(message = "Prompt is required"),
        custom(function = "not_blank", message = "Prompt is required")
    )]
    pub prompt: Option<String>,

    #[serde(default)]
    #[validate(nested)]
    pub file: Option<FileAttachment>,
}

/// A file the browser sent inline with the prompt.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    #[validate(length(min = 1, message = "File data is required"))]
    pub base64_data: String,

    #[validate(length(min = 1, message = "File mime type is required"))]
    pub mime_type: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub text: String,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SentimentRequest {
    #[serde(default)]
    #[validate(
        required(message = "Asset is required"),
        custom(function = "not_blank", message = "Asset is required")
    )]
    pub asset: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImageRequest {
    #[serde(default)]
    #[validate(
        required(message = "Prompt is required"),
        custom(function = "not_blank", message = "Prompt is required")
    )]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub base64_image: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TtsRequest {
    #[serde(default)]
    #[validate(
        required(message = "Text is required"),
        custom(function = "not_blank", message = "Text is required")
    )]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsResponse {
    pub audio_data: String,
    pub mime_type: String,
}

/// JSON body extractor that validates before the handler runs and reports
/// every failure through [`AppError`].
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(reject_body)?;

        value.validate().map_err(|e| {
            tracing::warn!(error = %e, "Request failed validation");
            AppError::from(e)
        })?;

        Ok(ValidatedJson(value))
    }
}

fn reject_body(rejection: JsonRejection) -> AppError {
    tracing::warn!(error = %rejection.body_text(), "Rejected request body");

    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::BadRequest(anyhow::anyhow!("Expected a JSON request body"))
        }
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            AppError::PayloadTooLarge("Request body exceeds the size limit".to_string())
        }
        other => AppError::BadRequest(anyhow::anyhow!(
            "Invalid JSON body: {}",
            other.body_text()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chat(body: serde_json::Value) -> ChatRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn chat_prompt_missing_null_or_empty_fails() {
        assert!(chat(json!({})).validate().is_err());
        assert!(chat(json!({ "prompt": null })).validate().is_err());
        assert!(chat(json!({ "prompt": "" })).validate().is_err());
        assert!(chat(json!({ "prompt": " \t\n" })).validate().is_err());
        assert!(chat(json!({ "prompt": "hi" })).validate().is_ok());
    }

    #[test]
    fn chat_file_fields_are_camel_case() {
        let request = chat(json!({
            "prompt": "what is this?",
            "file": { "base64Data": "AAAA", "mimeType": "image/png" }
        }));
        request.validate().unwrap();

        let file = request.file.unwrap();
        assert_eq!(file.base64_data, "AAAA");
        assert_eq!(file.mime_type, "image/png");
    }

    #[test]
    fn chat_file_with_empty_data_fails() {
        let request = chat(json!({
            "prompt": "what is this?",
            "file": { "base64Data": "", "mimeType": "image/png" }
        }));
        assert!(request.validate().is_err());
    }

    #[test]
    fn responses_use_wire_field_names() {
        let image = serde_json::to_value(ImageResponse {
            base64_image: "QQ==".to_string(),
        })
        .unwrap();
        assert_eq!(image, json!({ "base64Image": "QQ==" }));

        let tts = serde_json::to_value(TtsResponse {
            audio_data: "QQ==".to_string(),
            mime_type: "audio/wav".to_string(),
        })
        .unwrap();
        assert_eq!(tts, json!({ "audioData": "QQ==", "mimeType": "audio/wav" }));
    }
}
