//! Application startup and lifecycle management.
//!
//! Builds the provider clients once from [`RelayConfig`], wires them into the
//! router and serves until SIGINT/SIGTERM.

use crate::config::{RelayConfig, MAX_BODY_BYTES};
use crate::handlers::{
    app::{health_check, index},
    chat::chat,
    image::generate_image,
    sentiment::sentiment,
    tts::text_to_speech,
};
use crate::services::providers::gemini::{GeminiConfig, GeminiProvider};
use crate::services::providers::imagen::{ImagenConfig, ImagenProvider};
use crate::services::{AudioProvider, ImageProvider, TextProvider};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Request},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub text_provider: Arc<dyn TextProvider>,
    pub image_provider: Arc<dyn ImageProvider>,
    pub audio_provider: Arc<dyn AudioProvider>,
}

impl AppState {
    /// Creates the Gemini and Imagen clients described by `config`.
    pub fn from_config(config: RelayConfig) -> Result<Self, AppError> {
        let gemini = Arc::new(
            GeminiProvider::new(GeminiConfig {
                api_base: config.google.api_base.clone(),
                api_key: config.google.api_key.clone(),
                text_model: config.models.text_model.clone(),
                tts_model: config.models.tts_model.clone(),
                voice: config.models.tts_voice.clone(),
                timeout: config.provider_timeout,
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?,
        );

        let imagen = ImagenProvider::new(ImagenConfig {
            api_base: config.google.api_base.clone(),
            api_key: config.google.api_key.clone(),
            model: config.models.image_model.clone(),
            timeout: config.provider_timeout,
        })
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        tracing::info!(
            text_model = %config.models.text_model,
            image_model = %config.models.image_model,
            tts_model = %config.models.tts_model,
            timeout_secs = config.provider_timeout.as_secs(),
            "Initialized AI providers"
        );

        Ok(Self {
            config: Arc::new(config),
            text_provider: gemini.clone(),
            image_provider: Arc::new(imagen),
            audio_provider: gemini,
        })
    }
}

/// CORS layer driven by the configured allow-list.
fn cors_layer(config: &RelayConfig) -> CorsLayer {
    let cors = config.cors.clone();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &axum::http::request::Parts| {
                let allowed = origin.to_str().is_ok_and(|o| cors.is_allowed(o));
                if !allowed {
                    tracing::warn!(origin = ?origin, "Rejected cross-origin request");
                }
                allowed
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/sentiment", post(sentiment))
        .route("/api/generate-image", post(generate_image))
        .route("/api/tts", post(text_to_speech))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let state = AppState::from_config(config)?;

        // port 0 = random port for testing
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("GenAI relay listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}
