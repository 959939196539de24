//! Success envelope: `{"success": true, "message": ..., "data": ..., "meta"?: ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use portfolio_core::pagination::{PageMeta, Paginated};

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

/// A success response with its status code.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    status: StatusCode,
    body: Envelope<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, data)
    }

    /// 201 with `data`.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, data)
    }

    /// 202 with `data`.
    pub fn accepted(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::ACCEPTED, message, data)
    }

    fn with_status(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            body: Envelope {
                success: true,
                message: message.into(),
                data,
                meta: None,
            },
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// 200 with one page of items and its `meta`.
    pub fn page(message: impl Into<String>, page: Paginated<T>) -> Self {
        let mut resp = Self::ok(message, page.items);
        resp.body.meta = Some(page.meta);
        resp
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
