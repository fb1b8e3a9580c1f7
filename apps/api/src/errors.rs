use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::session::Level;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(String),

    /// Every skill-question generation strategy was exhausted. Retryable: the
    /// session was not mutated, so the caller may resend the same answer.
    #[error("skill question generation failed for {skill} at {level}: {detail}")]
    QuestionGeneration {
        skill: String,
        level: Level,
        detail: String,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::NotFound(msg) => error_body(StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Validation(msg) => {
                error_body(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg)
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred",
                )
            }
            AppError::QuestionGeneration {
                skill,
                level,
                detail,
            } => {
                tracing::warn!("skill question generation failed: {detail}");
                let body = Json(json!({
                    "error": {
                        "code": "skill_question_generation_failed",
                        "message": detail,
                    },
                    "skill": skill,
                    "level": level,
                    "action": "retry",
                }));
                (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred",
                )
            }
        }
    }
}

fn error_body(status: StatusCode, code: &str, message: &str) -> Response {
    let body = Json(json!({
        "error": {
            "code": code,
            "message": message
        }
    }));
    (status, body).into_response()
}
