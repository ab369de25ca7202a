//! Imagen image generation provider.
//!
//! Calls the `:predict` endpoint for a single square image and hands back
//! the base64 payload untouched.

use super::{build_client, post_json, GeneratedImage, ImageProvider, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SAMPLE_COUNT: u32 = 1;
const ASPECT_RATIO: &str = "1:1";

/// Imagen provider configuration.
#[derive(Debug, Clone)]
pub struct ImagenConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

/// Imagen image provider.
pub struct ImagenProvider {
    config: ImagenConfig,
    client: Client,
}

impl ImagenProvider {
    pub fn new(config: ImagenConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Imagen API key not configured".to_string(),
            ));
        }

        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl ImageProvider for ImagenProvider {
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ProviderError> {
        let request = PredictRequest {
            instances: vec![Instance {
                prompt: prompt.to_string(),
            }],
            parameters: Parameters {
                sample_count: SAMPLE_COUNT,
                aspect_ratio: ASPECT_RATIO.to_string(),
            },
        };

        tracing::info!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Imagen API"
        );

        let url = format!(
            "{}/models/{}:predict",
            self.config.api_base, self.config.model
        );
        let response: PredictResponse =
            post_json(&self.client, &url, &self.config.api_key, &request).await?;

        response
            .predictions
            .into_iter()
            .next()
            .and_then(|p| {
                p.bytes_base64_encoded
                    .filter(|b| !b.is_empty())
                    .map(|base64_data| GeneratedImage {
                        base64_data,
                        mime_type: p.mime_type,
                    })
            })
            .ok_or_else(|| {
                ProviderError::InvalidResponse("Provider returned no image".to_string())
            })
    }
}

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    sample_count: u32,
    aspect_ratio: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}
