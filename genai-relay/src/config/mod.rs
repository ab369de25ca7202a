use service_core::config as core_config;
use service_core::error::AppError;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_DEV_ORIGINS: &str =
    "http://localhost:3000,http://127.0.0.1:3000,http://localhost:5500,http://127.0.0.1:5500";
const DEFAULT_PLATFORM_SUFFIX: &str = ".vercel.app";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Request body cap; large enough for base64-encoded attachments.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Process-wide configuration, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub cors: CorsConfig,
    pub provider_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model for chat and structured sentiment output (e.g., gemini-2.5-flash)
    pub text_model: String,
    /// Imagen model used by the `:predict` endpoint
    pub image_model: String,
    /// Model with AUDIO response modality
    pub tts_model: String,
    /// Prebuilt voice name for speech synthesis
    pub tts_voice: String,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Exact origins allowed during local development.
    pub dev_origins: Vec<String>,
    /// Any `https://<sub><suffix>` origin is allowed (preview deployments).
    pub platform_suffix: String,
    /// The production frontend, if deployed.
    pub frontend_url: Option<String>,
}

impl CorsConfig {
    pub fn is_allowed(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');

        if self
            .dev_origins
            .iter()
            .chain(self.frontend_url.iter())
            .any(|allowed| allowed.trim_end_matches('/') == origin)
        {
            return true;
        }

        if self.platform_suffix.is_empty() {
            return false;
        }

        match origin.strip_prefix("https://") {
            Some(host) => {
                !host.contains('/')
                    && host
                        .strip_suffix(self.platform_suffix.as_str())
                        .is_some_and(|sub| !sub.is_empty() && !sub.ends_with('.'))
            }
            None => false,
        }
    }
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let api_key = get("GEMINI_API_KEY")
            .or_else(|| get("API_KEY"))
            .ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "GEMINI_API_KEY (or API_KEY) is required but not set"
                ))
            })?;

        let timeout_secs = match get("GENAI_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "GENAI_TIMEOUT_SECS must be a whole number of seconds: {}",
                    e
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(RelayConfig {
            common,
            google: GoogleConfig {
                api_key,
                api_base: get_or("GENAI_API_BASE", DEFAULT_API_BASE)
                    .trim_end_matches('/')
                    .to_string(),
            },
            models: ModelConfig {
                text_model: get_or("GENAI_TEXT_MODEL", "gemini-2.5-flash"),
                image_model: get_or("GENAI_IMAGE_MODEL", "imagen-4.0-generate-001"),
                tts_model: get_or("GENAI_TTS_MODEL", "gemini-2.5-flash-preview-tts"),
                tts_voice: get_or("GENAI_TTS_VOICE", "Kore"),
            },
            cors: CorsConfig {
                dev_origins: get_or("CORS_DEV_ORIGINS", DEFAULT_DEV_ORIGINS)
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect(),
                platform_suffix: lookup("CORS_PLATFORM_SUFFIX")
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|| DEFAULT_PLATFORM_SUFFIX.to_string()),
                frontend_url: get("FRONTEND_URL"),
            },
            provider_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
