//! API error type and the JSON error envelope.
//!
//! Every failure renders as `{"success": false, "message": ..., "errors": ...}`
//! with a status code chosen by the variant. Internal errors are logged in
//! full and reach the client only as a generic message.

use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use portfolio_core::error::PortfolioError;

const INTERNAL_MESSAGE: &str = "An internal error occurred";
const VALIDATION_MESSAGE: &str = "Validation Errors";

/// Field name to error message.
pub type FieldErrors = BTreeMap<String, String>;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

#[derive(Debug)]
pub enum ApiError {
    /// 400 with a message only.
    BadRequest(String),
    /// 400 with structured details, e.g. `{"tool": "..."}`.
    BadRequestWith(String, Value),
    /// 401.
    Unauthorized(String),
    /// 404.
    NotFound(String),
    /// 409.
    Conflict(String),
    /// 422 "Validation Errors" with a field map.
    Validation(FieldErrors),
    /// 429.
    TooManyRequests(String),
    /// 502 when an upstream service fails, with details.
    Upstream(String, Value),
    /// 500. The message is logged, never returned.
    Internal(String),
}

impl ApiError {
    /// A 422 for a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), message.into());
        ApiError::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::BadRequestWith(..) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream(..) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, errors) = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::TooManyRequests(msg) => (msg, None),
            ApiError::BadRequestWith(msg, details) | ApiError::Upstream(msg, details) => {
                (msg, Some(details))
            }
            ApiError::Validation(fields) => (
                VALIDATION_MESSAGE.to_string(),
                serde_json::to_value(fields).ok(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (INTERNAL_MESSAGE.to_string(), None)
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<PortfolioError> for ApiError {
    fn from(err: PortfolioError) -> Self {
        match err {
            PortfolioError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PortfolioError::Conflict(msg) => ApiError::Conflict(msg),
            PortfolioError::Validation(msg) => ApiError::BadRequest(msg),
            PortfolioError::Upload(msg) => ApiError::BadRequest(msg),
            PortfolioError::Config(msg) => ApiError::BadRequest(msg),
            PortfolioError::Auth(msg) => ApiError::Unauthorized(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::field("body", rejection.body_text())
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ApiError::field("body", err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_envelope() {
        let resp = ApiError::field("name", "name is required").into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Validation Errors");
        assert_eq!(json["errors"]["name"], "name is required");
    }

    #[tokio::test]
    async fn test_internal_is_sanitised() {
        let resp = ApiError::Internal("disk I/O error at /var/db".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["message"], "An internal error occurred");
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_bad_request_with_details() {
        let resp = ApiError::BadRequestWith(
            "invalid JSON".into(),
            serde_json::json!({"tool": "invalid JSON"}),
        )
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["errors"]["tool"], "invalid JSON");
    }

    #[test]
    fn test_portfolio_error_mapping() {
        let err: ApiError = PortfolioError::NotFound("Blog".into()).into();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Blog not found"));

        let err: ApiError = PortfolioError::Conflict("Tag already exists".into()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = PortfolioError::Storage("locked".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: ApiError = PortfolioError::Upload("file type not allowed".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
