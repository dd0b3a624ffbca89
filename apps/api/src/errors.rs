use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::classification::schema::ClassificationError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error("Agent error: {0}")]
    Agent(#[from] LlmError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Classification(err) => {
                tracing::warn!("Agent output rejected: {err}");
                match err {
                    ClassificationError::Parse(_) => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "PARSE_ERROR",
                        err.to_string(),
                        None,
                    ),
                    ClassificationError::SchemaViolation { field, rule } => {
                        let mut details = serde_json::to_value(rule).unwrap_or(Value::Null);
                        if let Value::Object(map) = &mut details {
                            map.insert("field".to_string(), Value::String(field.clone()));
                        }
                        (
                            StatusCode::UNPROCESSABLE_ENTITY,
                            "SCHEMA_VIOLATION",
                            err.to_string(),
                            Some(details),
                        )
                    }
                }
            }
            AppError::Agent(LlmError::Timeout { .. }) => {
                tracing::error!("Agent error: {self}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "AGENT_TIMEOUT",
                    "The classification assistant did not respond in time".to_string(),
                    None,
                )
            }
            AppError::Agent(e) => {
                tracing::error!("Agent error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "AGENT_ERROR",
                    "The classification assistant failed to respond".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::schema::{parse_result_set, SchemaRule};

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_schema_violation_response_names_field_and_rule() {
        let err = AppError::from(ClassificationError::SchemaViolation {
            field: "job_classifications[0].occupation_title".to_string(),
            rule: SchemaRule::MaxLength { max: 80, actual: 81 },
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "SCHEMA_VIOLATION");
        assert_eq!(
            body["error"]["details"]["field"],
            "job_classifications[0].occupation_title"
        );
        assert_eq!(body["error"]["details"]["rule"], "max_length");
        assert_eq!(body["error"]["details"]["max"], 80);
        assert_eq!(body["error"]["details"]["actual"], 81);
    }

    #[tokio::test]
    async fn test_parse_error_message_is_surfaced() {
        let err = AppError::from(parse_result_set("not json").unwrap_err());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "PARSE_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Agent output is not valid JSON"));
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_agent_errors_map_to_gateway_statuses() {
        let timeout = AppError::from(LlmError::Timeout { secs: 120 }).into_response();
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let failed = AppError::from(LlmError::RunFailed {
            status: "failed".to_string(),
            message: "boom".to_string(),
        })
        .into_response();
        assert_eq!(failed.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(failed).await;
        assert_eq!(body["error"]["code"], "AGENT_ERROR");
    }

    #[tokio::test]
    async fn test_validation_and_not_found() {
        let response = AppError::Validation("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::NotFound("gone".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["message"], "gone");
    }
}
