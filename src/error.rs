use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::json;
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("LLM error: {0}")]
    Llm(String),

    /// No criterion produced a parseable score. Carries the user-facing message.
    #[error("No scores: {0}")]
    NoScores(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Llm(_) | AppError::NoScores(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match &self {
            AppError::Validation(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::NoScores(msg) => {
                tracing::warn!(error = %msg, "Audit produced no scores");
                // The front end only understands a bare error field here.
                return (status, Json(json!({ "error": msg }))).into_response();
            }
            AppError::Llm(msg) => {
                tracing::error!(error = %msg, "LLM error");
                "Internal server error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "Internal server error".to_string()
            }
        };

        let body = if let Some(trace_id) = get_trace_id() {
            json!({
                "error": error_message,
                "status": status.as_u16(),
                "trace_id": trace_id,
            })
        } else {
            json!({
                "error": error_message,
                "status": status.as_u16(),
            })
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AppError::Validation("field is required".to_string()).to_string(),
            "Validation error: field is required"
        );
        assert_eq!(
            AppError::Llm("provider timeout".to_string()).to_string(),
            "LLM error: provider timeout"
        );
        assert_eq!(
            AppError::NoScores("nothing scored".to_string()).to_string(),
            "No scores: nothing scored"
        );
    }

    #[test]
    fn test_error_status_codes() {
        let test_cases = vec![
            (AppError::Validation("test".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("test".into()), StatusCode::NOT_FOUND),
            (AppError::Llm("test".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::NoScores("test".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Internal("test".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected_status) in test_cases {
            assert_eq!(error.status_code(), expected_status, "{error}");
        }
    }

    #[tokio::test]
    async fn test_no_scores_body_has_only_error_field() {
        let (status, body) = body_json(AppError::NoScores("No scores could be computed.".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "No scores could be computed." }));
    }

    #[tokio::test]
    async fn test_llm_error_hides_details() {
        let (status, body) = body_json(AppError::Llm("upstream 503 from provider".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["status"], 500);
    }

    #[tokio::test]
    async fn test_validation_error_exposes_message() {
        let (status, body) = body_json(AppError::Validation("missing field `file`".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing field `file`");
    }
}
