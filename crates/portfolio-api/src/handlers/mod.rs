//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path/query/body via axum extractors, calls one or
//! a few repositories, and returns the JSON envelope. Submodules group the
//! handlers by resource.

pub mod auth;
pub mod blog;
pub mod bookmark;
pub mod contact;
pub mod files;
pub mod profile;
pub mod resume;
pub mod setting;
pub mod showcase;
pub mod tool;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use portfolio_core::error::PortfolioError;
use portfolio_core::pagination::PageRequest;

use crate::error::ApiError;
use crate::form::FilePart;
use crate::state::AppState;
use crate::upload::StoredFile;

// =============================================================================
// Shared query parameters
// =============================================================================

/// Query parameters accepted by list endpoints. Each endpoint reads the
/// ones it supports.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub topic: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref())
    }

    pub fn search(&self) -> Option<&str> {
        non_empty(self.search.as_deref())
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn not_found(entity: &str) -> ApiError {
    ApiError::NotFound(format!("{} not found", entity))
}

/// Store an uploaded file.
///
/// Failures become 400 "Failed to upload {label}" with the reason under
/// the form field name.
pub(crate) async fn save_upload(
    state: &AppState,
    file: FilePart,
    folder: &str,
    field: &str,
) -> Result<StoredFile, ApiError> {
    state
        .uploads
        .save(folder, &file.file_name, file.bytes)
        .await
        .map_err(|e| {
            let reason = match e {
                PortfolioError::Upload(msg) => msg,
                other => other.to_string(),
            };
            tracing::warn!(field, folder, error = %reason, "Upload rejected");
            ApiError::BadRequestWith(
                format!("Failed to upload {}", field.replace('_', " ")),
                serde_json::json!({ field: reason }),
            )
        })
}

/// Store an uploaded file and return its public URL (`/uploads/..`).
/// Entity columns keep this form.
pub(crate) async fn store_upload(
    state: &AppState,
    file: FilePart,
    folder: &str,
    field: &str,
) -> Result<String, ApiError> {
    Ok(save_upload(state, file, folder, field).await?.url)
}

/// A file path to persist, plus the file it superseded.
pub(crate) struct Replaced {
    pub path: String,
    fresh: bool,
    stale: Option<String>,
}

impl Replaced {
    /// Delete the superseded file. Call after the new path is saved.
    pub async fn cleanup(&self, state: &AppState) {
        if let Some(old) = &self.stale {
            state.uploads.remove_quietly(old).await;
        }
    }

    /// Delete the newly stored file when the row update did not happen.
    pub async fn discard(&self, state: &AppState) {
        if self.fresh {
            state.uploads.remove_quietly(&self.path).await;
        }
    }
}

/// Store `file` if present; otherwise keep `previous`.
pub(crate) async fn replace_upload(
    state: &AppState,
    file: Option<FilePart>,
    previous: &str,
    folder: &str,
    field: &str,
) -> Result<Replaced, ApiError> {
    match file {
        Some(file) => Ok(Replaced {
            path: store_upload(state, file, folder, field).await?,
            fresh: true,
            stale: Some(previous.to_string()).filter(|p| !p.is_empty()),
        }),
        None => Ok(Replaced {
            path: previous.to_string(),
            fresh: false,
            stale: None,
        }),
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
