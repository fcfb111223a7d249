use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::models::InputError;
use crate::analysis::service::AnalysisError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant maps to a stable `code`. Server-side detail (raw model text,
/// provider bodies, internal errors) is logged here and never sent to clients.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Malformed model response from {model}: {reason}")]
    MalformedResponse {
        model: String,
        reason: String,
        raw: String,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<InputError> for AppError {
    fn from(e: InputError) -> Self {
        AppError::InvalidInput(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::ProviderUnavailable { last_cause, .. } => {
                AppError::ProviderUnavailable(last_cause)
            }
            AnalysisError::MalformedResponse { model, reason, raw } => AppError::MalformedResponse {
                model: model.to_string(),
                reason: reason.to_string(),
                raw,
            },
        }
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::ProviderUnavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            AppError::ProviderUnavailable(cause) => {
                tracing::error!("Provider unavailable: {cause}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PROVIDER_UNAVAILABLE",
                    format!(
                        "AI Service Unavailable. Please check your API usage or region. Cause: {cause}"
                    ),
                )
            }
            AppError::MalformedResponse { model, reason, raw } => {
                tracing::error!("Malformed response from {model}: {reason}. Raw: {raw}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MALFORMED_RESPONSE",
                    "Failed to parse AI response".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        error_response(status, code, &message)
    }
}

/// Shared JSON error body: `{"error": {"code", "message"}}`.
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = Json(json!({
        "error": {
            "code": code,
            "message": message
        }
    }));

    (status, body).into_response()
}
