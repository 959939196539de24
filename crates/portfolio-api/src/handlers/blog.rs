//! Tags, blog posts, moderation and the AI writer endpoints.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use portfolio_core::slug::slugify;
use portfolio_core::types::{Blog, BlogAuthor, BlogInput, BlogStats, BlogStatus, Tag};
use portfolio_storage::{BlogFilter, BlogRepository, TagRepository};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::form::FormData;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validate::Validator;

use super::{non_empty, not_found, replace_upload, ListParams};

const MAX_GENERATE: usize = 10;

// =============================================================================
// Tags
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    #[serde(default)]
    pub name: String,
}

impl TagRequest {
    /// Validated `(name, slug)`.
    fn name_and_slug(&self) -> Result<(String, String), ApiError> {
        let name = self.name.trim().to_string();
        let slug = slugify(&name);
        Validator::new()
            .required("name", &name)
            .check("name", !slug.is_empty(), "name must contain letters or digits")
            .finish()?;
        Ok((name, slug))
    }
}

/// GET /tags
pub async fn list_tags(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Tag>> {
    let page = TagRepository::new(state.database.clone())
        .list(params.search(), params.page_request())?;
    Ok(ApiResponse::page("List Data Tags", page))
}

/// GET /tags/{id}
pub async fn get_tag(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Tag> {
    let tag = TagRepository::new(state.database.clone())
        .find_by_id(id)?
        .ok_or_else(|| not_found("Tag"))?;
    Ok(ApiResponse::ok("Tag Found", tag))
}

/// GET /tags/slug/{slug}
pub async fn get_tag_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Tag> {
    let tag = TagRepository::new(state.database.clone())
        .find_by_slug(&slug)?
        .ok_or_else(|| not_found("Tag"))?;
    Ok(ApiResponse::ok("Tag Found", tag))
}

/// POST /tags
pub async fn create_tag(
    State(state): State<AppState>,
    payload: Result<Json<TagRequest>, JsonRejection>,
) -> ApiResult<Tag> {
    let Json(req) = payload?;
    let (name, slug) = req.name_and_slug()?;

    let repo = TagRepository::new(state.database.clone());
    if repo.slug_taken(&slug, None)? {
        return Err(ApiError::Conflict("Tag already exists".into()));
    }
    let tag = repo.create(&name, &slug)?;
    Ok(ApiResponse::created("Tag created successfully", tag))
}

/// PUT /tags/{id}
pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<TagRequest>, JsonRejection>,
) -> ApiResult<Tag> {
    let Json(req) = payload?;
    let repo = TagRepository::new(state.database.clone());
    repo.find_by_id(id)?.ok_or_else(|| not_found("Tag"))?;

    let (name, slug) = req.name_and_slug()?;
    if repo.slug_taken(&slug, Some(id))? {
        return Err(ApiError::Conflict("Tag already exists".into()));
    }
    let tag = repo
        .update(id, &name, &slug)?
        .ok_or_else(|| not_found("Tag"))?;
    Ok(ApiResponse::ok("Tag updated successfully", tag))
}

/// DELETE /tags/{id}
pub async fn delete_tag(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    if !TagRepository::new(state.database.clone()).delete(id)? {
        return Err(not_found("Tag"));
    }
    Ok(ApiResponse::ok("Tag deleted successfully", ()))
}

// =============================================================================
// Blogs
// =============================================================================

fn parse_status(raw: Option<&str>) -> Result<Option<BlogStatus>, ApiError> {
    match non_empty(raw) {
        Some(raw) => {
            let mut v = Validator::new();
            let status = v.one_of::<BlogStatus>("status", raw);
            v.finish()?;
            Ok(status)
        }
        None => Ok(None),
    }
}

fn tag_ids(form: &FormData) -> Vec<i64> {
    form.list("tag_ids")
        .iter()
        .filter_map(|id| id.parse().ok())
        .collect()
}

fn validated_title(form: &FormData) -> Result<(String, String), ApiError> {
    let title = form.text("title");
    let slug = slugify(&title);
    Validator::new()
        .required("title", &title)
        .check("title", !slug.is_empty(), "title must contain letters or digits")
        .finish()?;
    Ok((title, slug))
}

fn blog_list(
    state: &AppState,
    params: &ListParams,
    status: Option<BlogStatus>,
) -> ApiResult<Vec<Blog>> {
    let filter = BlogFilter {
        status,
        tag_slug: non_empty(params.tag.as_deref()).map(str::to_string),
        search: params.search().map(str::to_string),
    };
    let page = BlogRepository::new(state.database.clone()).list(&filter, params.page_request())?;
    Ok(ApiResponse::page("List Data Blogs", page))
}

/// GET /blogs - published posts only.
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Blog>> {
    blog_list(&state, &params, Some(BlogStatus::Published))
}

/// GET /blogs/all?status=
pub async fn list_all_blogs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Blog>> {
    let status = parse_status(params.status.as_deref())?;
    blog_list(&state, &params, status)
}

/// GET /blogs/stats
pub async fn blog_stats(State(state): State<AppState>) -> ApiResult<BlogStats> {
    let stats = BlogRepository::new(state.database.clone()).stats()?;
    Ok(ApiResponse::ok("Blog Stats", stats))
}

/// GET /blogs/{slug}
pub async fn get_blog(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<Blog> {
    let blog = BlogRepository::new(state.database.clone())
        .find_by_slug(&slug)?
        .ok_or_else(|| not_found("Blog"))?;
    Ok(ApiResponse::ok("Blog Found", blog))
}

/// POST /blogs
pub async fn create_blog(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut form: FormData,
) -> ApiResult<Blog> {
    let (title, slug) = validated_title(&form)?;
    let repo = BlogRepository::new(state.database.clone());
    if repo.find_by_slug(&slug)?.is_some() {
        return Err(ApiError::Conflict("Blog already exists".into()));
    }

    let cover = replace_upload(&state, form.take_file("cover_image"), "", "blogs", "cover_image")
        .await?;
    let input = BlogInput {
        title,
        slug,
        description: form.text("description"),
        content: form.get("content").unwrap_or_default().to_string(),
        cover_image: cover.path.clone(),
        author: BlogAuthor::User,
        status: BlogStatus::Published,
        user_id: Some(user.id),
    };
    let blog = match repo.create(&input) {
        Ok(blog) => blog,
        Err(e) => {
            state.uploads.remove_quietly(&cover.path).await;
            return Err(e.into());
        }
    };

    repo.replace_tags(blog.id, &tag_ids(&form))?;
    let blog = repo.find_by_id(blog.id)?.ok_or_else(|| not_found("Blog"))?;
    tracing::info!(blog_id = blog.id, user_id = user.id, "Blog created");
    Ok(ApiResponse::created("Blog created successfully", blog))
}

/// PUT /blogs/{id}
pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut form: FormData,
) -> ApiResult<Blog> {
    let repo = BlogRepository::new(state.database.clone());
    let current = repo.find_by_id(id)?.ok_or_else(|| not_found("Blog"))?;
    let (title, slug) = validated_title(&form)?;

    let cover = replace_upload(
        &state,
        form.take_file("cover_image"),
        &current.cover_image,
        "blogs",
        "cover_image",
    )
    .await?;
    let updated = repo.update_content(
        id,
        &title,
        &slug,
        &form.text("description"),
        form.get("content").unwrap_or_default(),
        &cover.path,
    );
    if !matches!(updated, Ok(Some(_))) {
        cover.discard(&state).await;
    }
    updated?.ok_or_else(|| not_found("Blog"))?;
    cover.cleanup(&state).await;

    if form.flag("update_tags") {
        repo.replace_tags(id, &tag_ids(&form))?;
    }
    let blog = repo.find_by_id(id)?.ok_or_else(|| not_found("Blog"))?;
    Ok(ApiResponse::ok("Blog updated successfully", blog))
}

/// DELETE /blogs/{id}
pub async fn delete_blog(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let repo = BlogRepository::new(state.database.clone());
    let blog = repo.find_by_id(id)?.ok_or_else(|| not_found("Blog"))?;
    repo.delete(id)?;
    state.uploads.remove_quietly(&blog.cover_image).await;
    Ok(ApiResponse::ok("Blog deleted successfully", ()))
}

/// PUT /blogs/{id}/publish
pub async fn publish_blog(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Blog> {
    let blog = BlogRepository::new(state.database.clone())
        .set_status(id, BlogStatus::Published, Some(""))?
        .ok_or_else(|| not_found("Blog"))?;
    Ok(ApiResponse::ok("Blog published successfully", blog))
}

/// PUT /blogs/{id}/archive
pub async fn archive_blog(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Blog> {
    let blog = BlogRepository::new(state.database.clone())
        .set_status(id, BlogStatus::Archived, None)?
        .ok_or_else(|| not_found("Blog"))?;
    Ok(ApiResponse::ok("Blog archived successfully", blog))
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub comment: String,
}

/// Rewrite rejected AI posts in the background, one after another.
fn spawn_regeneration(state: &AppState, blogs: Vec<Blog>, comment: String) -> usize {
    let blogs: Vec<Blog> = blogs
        .into_iter()
        .filter(|b| b.author == BlogAuthor::Aibys)
        .collect();
    let count = blogs.len();
    if count > 0 {
        let generator = state.generator.clone();
        tokio::spawn(async move {
            for blog in &blogs {
                generator.regenerate(blog, &comment).await;
            }
        });
    }
    count
}

/// PUT /blogs/{id}/reject
pub async fn reject_blog(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<RejectRequest>, JsonRejection>,
) -> ApiResult<Blog> {
    let Json(req) = payload?;
    Validator::new().required("comment", &req.comment).finish()?;
    let comment = req.comment.trim().to_string();

    let blog = BlogRepository::new(state.database.clone())
        .set_status(id, BlogStatus::Rejected, Some(&comment))?
        .ok_or_else(|| not_found("Blog"))?;

    if spawn_regeneration(&state, vec![blog.clone()], comment) > 0 {
        return Ok(ApiResponse::ok(
            "Blog rejected, Aibys is improving the content based on your feedback",
            blog,
        ));
    }
    Ok(ApiResponse::ok("Blog rejected successfully", blog))
}

#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub action: String,
    pub affected: usize,
    pub ai_regenerate: usize,
}

/// POST /blogs/bulk
pub async fn bulk_blogs(
    State(state): State<AppState>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> ApiResult<BulkResult> {
    let Json(req) = payload?;
    let action = req.action.trim().to_string();
    let comment = req
        .comment
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    Validator::new()
        .check("ids", !req.ids.is_empty(), "ids must contain at least one id")
        .required("action", &action)
        .check(
            "action",
            action.is_empty() || matches!(action.as_str(), "publish" | "reject" | "archive" | "delete"),
            "action must be one of publish|reject|archive|delete",
        )
        .check(
            "comment",
            action != "reject" || !comment.is_empty(),
            "Comment is required for reject action",
        )
        .finish()?;

    let repo = BlogRepository::new(state.database.clone());
    let mut ai_regenerate = 0;
    let affected = match action.as_str() {
        "publish" => repo.set_status_many(&req.ids, BlogStatus::Published, Some(""))?,
        "archive" => repo.set_status_many(&req.ids, BlogStatus::Archived, None)?,
        "reject" => {
            let affected = repo.set_status_many(&req.ids, BlogStatus::Rejected, Some(&comment))?;
            ai_regenerate = spawn_regeneration(&state, repo.find_many(&req.ids)?, comment);
            affected
        }
        _ => {
            let blogs = repo.find_many(&req.ids)?;
            let affected = repo.delete_many(&req.ids)?;
            for blog in &blogs {
                state.uploads.remove_quietly(&blog.cover_image).await;
            }
            affected
        }
    };

    tracing::info!(action = %action, affected, ai_regenerate, "Bulk blog action");
    Ok(ApiResponse::ok(
        "Bulk action completed",
        BulkResult {
            action,
            affected,
            ai_regenerate,
        },
    ))
}

// =============================================================================
// AI writer
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct GenerateAccepted {
    pub keyword: String,
    pub total: usize,
    pub status: &'static str,
}

/// POST /blogs/generate - start a background generation run.
pub async fn generate_blogs(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<GenerateAccepted> {
    let Json(req) = payload?;
    let keyword = req.keyword.trim().to_string();
    Validator::new()
        .required("keyword", &keyword)
        .check(
            "total",
            (1..=MAX_GENERATE).contains(&req.total),
            format!("total must be between 1 and {}", MAX_GENERATE),
        )
        .finish()?;

    let generator = state.generator.clone();
    let run_keyword = keyword.clone();
    let total = req.total;
    tokio::spawn(async move {
        generator.generate(&run_keyword, total).await;
    });

    Ok(ApiResponse::accepted(
        "Blog generation started in background",
        GenerateAccepted {
            keyword,
            total,
            status: "processing",
        },
    ))
}

/// GET /blogs/stream - SSE relay of writer progress.
///
/// Every event is sent as `message`; the JSON data carries its `type`.
/// Subscribers that fall behind skip the events they missed.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>> + Send> {
    let rx = state.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(value) => {
            let data = serde_json::to_string(&value).unwrap_or_default();
            Some(Ok(Event::default().event("message").data(data)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
