//! AI provider abstractions and implementations.
//!
//! Handlers only see the traits below; the Gemini and Imagen clients build
//! the provider wire formats.

pub mod gemini;
pub mod imagen;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Header carrying the API key, so it never appears in URLs or error text.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// What the caller gets as `details`. Provider HTTP failures pass the raw
    /// body through untouched.
    pub fn details(&self) -> String {
        match self {
            ProviderError::Api { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Network(err.without_url().to_string())
        }
    }
}

/// One segment of a multimodal prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPart {
    Text(String),
    InlineData { mime_type: String, data: String },
}

/// Options for a text generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    /// Let the model run live web searches to ground its answer.
    pub web_search: bool,

    /// JSON schema the reply must conform to. Implies a JSON mime type.
    pub response_schema: Option<serde_json::Value>,
}

/// Result of a text generation call.
#[derive(Debug, Clone, Default)]
pub struct TextResponse {
    /// Concatenated text of the first candidate, if it produced any.
    pub text: Option<String>,

    /// Search queries the model issued while grounding, in order.
    pub search_queries: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub base64_data: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SynthesizedSpeech {
    pub audio_data: String,
    pub mime_type: String,
}

/// Trait for text/JSON generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(
        &self,
        parts: Vec<PromptPart>,
        params: &GenerationParams,
    ) -> Result<TextResponse, ProviderError>;
}

/// Trait for image generation providers (e.g., Imagen).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ProviderError>;
}

/// Trait for speech synthesis providers (e.g., Gemini TTS).
#[async_trait]
pub trait AudioProvider: Send + Sync {
    async fn synthesize_speech(&self, text: &str) -> Result<SynthesizedSpeech, ProviderError>;
}

/// Builds the HTTP client shared by one provider.
pub(crate) fn build_client(timeout: std::time::Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e)))
}

/// POSTs `body` as JSON and decodes a JSON reply. Non-2xx statuses become
/// [`ProviderError::Api`] carrying the response body verbatim.
pub(crate) async fn post_json<Req, Resp>(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &Req,
) -> Result<Resp, ProviderError>
where
    Req: Serialize + ?Sized,
    Resp: DeserializeOwned,
{
    let response = client
        .post(url)
        .header(API_KEY_HEADER, api_key)
        .json(body)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api { status, body });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))
}
