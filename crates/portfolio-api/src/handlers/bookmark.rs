//! Bookmarks, synced from the owner's public GitHub repositories.

use axum::extract::{Path, Query, State};
use serde::Serialize;

use portfolio_ai::github::public_only;
use portfolio_core::types::{Bookmark, BookmarkInput};
use portfolio_storage::{BookmarkRepository, Upserted};

use crate::error::ApiError;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

use super::{non_empty, not_found, ListParams};

/// GET /bookmarks?topic=&search=
pub async fn list_bookmarks(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Bookmark>> {
    let page = BookmarkRepository::new(state.database.clone()).list(
        non_empty(params.topic.as_deref()),
        params.search(),
        params.page_request(),
    )?;
    Ok(ApiResponse::page("List Data Bookmarks", page))
}

/// GET /bookmarks/{id}
pub async fn get_bookmark(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Bookmark> {
    let bookmark = BookmarkRepository::new(state.database.clone())
        .find_by_id(id)?
        .ok_or_else(|| not_found("Bookmark"))?;
    Ok(ApiResponse::ok("Bookmark Found", bookmark))
}

#[derive(Debug, Default, Serialize)]
pub struct SyncSummary {
    pub total: usize,
    pub created: usize,
    pub updated: usize,
}

/// POST /bookmarks/sync
pub async fn sync_bookmarks(State(state): State<AppState>) -> ApiResult<SyncSummary> {
    let username = state.config.github.username.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::BadRequest(
            "GitHub username is not configured".into(),
        ));
    }

    let repos = state.repos.public_repos(&username).await.map_err(|e| {
        tracing::warn!(username = %username, error = %e, "GitHub sync failed");
        ApiError::Upstream(
            "Failed to fetch GitHub repositories".into(),
            serde_json::json!({ "github": e.to_string() }),
        )
    })?;

    let repo = BookmarkRepository::new(state.database.clone());
    let mut summary = SyncSummary::default();
    for info in public_only(repos) {
        let input = BookmarkInput {
            url: info.html_url,
            title: info.name,
            description: info.description.unwrap_or_default(),
            topics: info.topics,
        };
        match repo.upsert_by_url(&input)? {
            Upserted::Created(_) => summary.created += 1,
            Upserted::Updated(_) => summary.updated += 1,
        }
        summary.total += 1;
    }

    tracing::info!(
        username = %username,
        total = summary.total,
        created = summary.created,
        updated = summary.updated,
        "Bookmarks synced"
    );
    Ok(ApiResponse::ok("Bookmarks synced successfully", summary))
}

/// DELETE /bookmarks/{id}
pub async fn delete_bookmark(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    if !BookmarkRepository::new(state.database.clone()).delete(id)? {
        return Err(not_found("Bookmark"));
    }
    Ok(ApiResponse::ok("Bookmark deleted successfully", ()))
}
