//! Gemini provider implementation.
//!
//! Text generation (optionally grounded with Google Search and constrained
//! to a JSON schema) and single-voice speech synthesis over the
//! `generateContent` REST endpoint.

use super::{
    build_client, post_json, AudioProvider, GenerationParams, PromptPart, ProviderError,
    SynthesizedSpeech, TextProvider, TextResponse,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub api_key: String,
    pub text_model: String,
    pub tts_model: String,
    pub voice: String,
    pub timeout: Duration,
}

/// Gemini text and speech provider.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let client = build_client(config.timeout)?;
        Ok(Self { config, client })
    }

    fn api_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.api_base, model, method)
    }

    fn build_generation_config(&self, params: &GenerationParams) -> Option<GenerationConfig> {
        params
            .response_schema
            .as_ref()
            .map(|schema| GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(schema.clone()),
                ..Default::default()
            })
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    async fn generate(
        &self,
        parts: Vec<PromptPart>,
        params: &GenerationParams,
    ) -> Result<TextResponse, ProviderError> {
        let part_count = parts.len();
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: parts.into_iter().map(Part::from).collect(),
            }],
            tools: params.web_search.then(|| {
                vec![Tool {
                    google_search: GoogleSearch {},
                }]
            }),
            generation_config: self.build_generation_config(params),
        };

        tracing::info!(
            model = %self.config.text_model,
            part_count,
            web_search = params.web_search,
            structured = params.response_schema.is_some(),
            "Sending request to Gemini API"
        );

        let url = self.api_url(&self.config.text_model, "generateContent");
        let api_response: GenerateContentResponse =
            post_json(&self.client, &url, &self.config.api_key, &request).await?;

        let Some(candidate) = api_response.candidates.into_iter().next() else {
            return Ok(TextResponse::default());
        };

        let text = candidate.content.as_ref().and_then(|content| {
            let joined: String = content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect();
            (!joined.is_empty()).then_some(joined)
        });

        if text.is_none() && candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ProviderError::ContentFiltered);
        }

        let search_queries = candidate
            .grounding_metadata
            .map(|m| m.web_search_queries)
            .unwrap_or_default();

        tracing::debug!(
            text_len = text.as_ref().map(|t| t.len()).unwrap_or(0),
            query_count = search_queries.len(),
            "Received Gemini response"
        );

        Ok(TextResponse {
            text,
            search_queries,
        })
    }
}

#[async_trait]
impl AudioProvider for GeminiProvider {
    async fn synthesize_speech(&self, text: &str) -> Result<SynthesizedSpeech, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::from(PromptPart::Text(text.to_string()))],
            }],
            tools: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.config.voice.clone(),
                        },
                    },
                }),
                ..Default::default()
            }),
        };

        tracing::info!(
            model = %self.config.tts_model,
            voice = %self.config.voice,
            text_len = text.len(),
            "Sending speech request to Gemini API"
        );

        let url = self.api_url(&self.config.tts_model, "generateContent");
        let api_response: GenerateContentResponse =
            post_json(&self.client, &url, &self.config.api_key, &request).await?;

        let inline = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.inline_data)
            .filter(|data| !data.data.is_empty())
            .ok_or_else(|| {
                ProviderError::InvalidResponse(
                    "Provider response is missing inline audio data".to_string(),
                )
            })?;

        Ok(SynthesizedSpeech {
            audio_data: inline.data,
            mime_type: inline.mime_type,
        })
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

/// A content part. Gemini sends other part kinds too (thoughts, function
/// calls); those deserialize with both fields empty.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl From<PromptPart> for Part {
    fn from(part: PromptPart) -> Self {
        match part {
            PromptPart::Text(text) => Part {
                text: Some(text),
                inline_data: None,
            },
            PromptPart::InlineData { mime_type, data } => Part {
                text: None,
                inline_data: Some(InlineData { mime_type, data }),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    web_search_queries: Vec<String>,
}
