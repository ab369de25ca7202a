//! HTTP handlers for the relay endpoints.

pub mod app;
pub mod chat;
pub mod image;
pub mod sentiment;
pub mod tts;

use crate::services::ProviderError;
use service_core::error::AppError;

/// Logs a provider failure and converts it into the upstream error shape.
pub(crate) fn upstream_error(message: &'static str) -> impl FnOnce(ProviderError) -> AppError {
    move |err| {
        tracing::error!(error = %err, "{}", message);
        AppError::upstream(message, err.details())
    }
}
