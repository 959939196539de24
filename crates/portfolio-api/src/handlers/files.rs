//! Generic file upload and deletion.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::form::FormData;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::upload::{StoredFile, STORED_PREFIX};
use crate::validate::Validator;

use super::save_upload;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub folder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    #[serde(default)]
    pub path: String,
}

/// POST /upload?folder=
pub async fn upload_file(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut form: FormData,
) -> ApiResult<StoredFile> {
    let file = form
        .take_file("file")
        .ok_or_else(|| ApiError::field("file", "file is required"))?;
    let folder = params
        .folder
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or("general");

    let stored = save_upload(&state, file, folder, "file").await?;
    Ok(ApiResponse::ok("File uploaded successfully", stored))
}

/// DELETE /upload
pub async fn delete_file(
    State(state): State<AppState>,
    payload: Result<Json<DeleteFileRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(req) = payload?;
    Validator::new().required("path", &req.path).finish()?;

    // Entity columns hold the `/uploads/..` form; accept both.
    let path = req.path.trim().trim_start_matches('/');
    let invalid = || {
        ApiError::BadRequestWith(
            "Invalid file path".into(),
            serde_json::json!({ "path": "invalid path" }),
        )
    };
    if !path.starts_with(&format!("{}/", STORED_PREFIX)) || state.uploads.resolve(path).is_none() {
        return Err(invalid());
    }

    state.uploads.delete(path).await?;
    Ok(ApiResponse::ok("File deleted successfully", ()))
}
