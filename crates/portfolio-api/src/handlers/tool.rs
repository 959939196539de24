//! Public utility tools and their admin management.
//!
//! A tool row is only runnable while it is active and its slug names a
//! handler in the registry. Runs are recorded per client IP on a background
//! task so a slow insert never delays the response.

use std::collections::HashMap;

use axum::extract::{Path, Query, Request, State};
use axum::http::Method;
use serde::Serialize;
use serde_json::Value;

use portfolio_core::types::{Tool, ToolInput, ToolStats};
use portfolio_storage::ToolRepository;
use portfolio_tools::{FieldSchema, RegistryEntry, ToolArgs, ToolDocs};

use crate::error::ApiError;
use crate::form::FormData;
use crate::rate_limit::request_ip;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::validate::Validator;

use super::{non_empty, not_found, replace_upload, ListParams};

/// GET /tools?category=
pub async fn list_tools(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Tool>> {
    let tools = ToolRepository::new(state.database.clone())
        .list_active(non_empty(params.category.as_deref()))?;
    Ok(ApiResponse::ok("List Data Tools", tools))
}

/// GET /tools/registry
pub async fn registry(State(state): State<AppState>) -> ApiResult<Vec<RegistryEntry>> {
    Ok(ApiResponse::ok("Tool Registry", state.tools.entries()))
}

#[derive(Debug, Serialize)]
pub struct ToolDetail {
    pub tool: Tool,
    pub input_schema: Vec<FieldSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<ToolDocs>,
}

/// GET /tools/{slug}
pub async fn get_tool(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<ToolDetail> {
    let tool = ToolRepository::new(state.database.clone())
        .find_active_by_slug(&slug)?
        .ok_or_else(|| not_found("Tool"))?;
    let handler = state.tools.get(&tool.slug).ok_or_else(|| not_found("Tool"))?;

    Ok(ApiResponse::ok(
        "Tool Found",
        ToolDetail {
            input_schema: handler.input_schema(),
            docs: handler.docs(),
            tool,
        },
    ))
}

/// Tool input from the query string (GET) or a JSON body (POST).
async fn run_args(state: &AppState, req: Request) -> Result<ToolArgs, ApiError> {
    if req.method() == Method::GET {
        let Query(pairs) = Query::<HashMap<String, String>>::try_from_uri(req.uri())
            .map_err(|e| ApiError::field("query", e.body_text()))?;
        return Ok(ToolArgs::from_pairs(pairs));
    }

    let bytes = axum::body::to_bytes(req.into_body(), state.config.server.max_body_bytes)
        .await
        .map_err(|e| ApiError::field("body", e.to_string()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ToolArgs::default());
    }
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ApiError::field("body", format!("invalid JSON: {}", e)))?;
    Ok(ToolArgs::from_value(value))
}

/// GET|POST /tools/{slug}/run
pub async fn run_tool(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    req: Request,
) -> ApiResult<Value> {
    let repo = ToolRepository::new(state.database.clone());
    let tool = repo
        .find_active_by_slug(&slug)?
        .filter(|t| state.tools.contains(&t.slug))
        .ok_or_else(|| not_found("Tool"))?;

    let ip = request_ip(&req);
    let args = run_args(&state, req).await?;

    match state.tools.execute(&tool.slug, &args).await {
        Ok(result) => {
            // Only successful runs count as usage.
            let (tool_id, tool_slug) = (tool.id, tool.slug.clone());
            tokio::spawn(async move {
                if let Err(e) = repo.record_usage(tool_id, &tool_slug, &ip) {
                    tracing::warn!(tool = %tool_slug, error = %e, "Failed to record tool usage");
                }
            });
            Ok(ApiResponse::ok("Tool executed successfully", result))
        }
        Err(e) => {
            let msg = e.to_string();
            Err(ApiError::BadRequestWith(
                msg.clone(),
                serde_json::json!({ "tool": msg }),
            ))
        }
    }
}

/// GET /tools/all
pub async fn list_all_tools(State(state): State<AppState>) -> ApiResult<Vec<Tool>> {
    let tools = ToolRepository::new(state.database.clone()).list_all()?;
    Ok(ApiResponse::ok("List Data Tools", tools))
}

/// GET /tools/stats
pub async fn tool_stats(State(state): State<AppState>) -> ApiResult<ToolStats> {
    let stats = ToolRepository::new(state.database.clone()).stats()?;
    Ok(ApiResponse::ok("Tool Stats", stats))
}

fn tool_input(form: &FormData, slug: String, icon: String) -> ToolInput {
    ToolInput {
        name: form.text("name"),
        slug,
        description: form.text("description"),
        category: form.text("category"),
        icon,
        // Absent means active.
        is_active: form.get("is_active").is_none() || form.flag("is_active"),
        order: form.int("order").unwrap_or(0),
    }
}

/// POST /tools
pub async fn create_tool(State(state): State<AppState>, mut form: FormData) -> ApiResult<Tool> {
    let slug = form.text("slug");
    Validator::new()
        .required("name", &form.text("name"))
        .required("slug", &slug)
        .finish()?;
    if !state.tools.contains(&slug) {
        return Err(ApiError::BadRequestWith(
            "Handler not found in registry".into(),
            serde_json::json!({ "slug": format!("slug '{}' is not in the registry", slug) }),
        ));
    }

    let icon = replace_upload(&state, form.take_file("icon"), "", "tools", "icon").await?;
    let input = tool_input(&form, slug, icon.path.clone());
    let tool = match ToolRepository::new(state.database.clone()).create(&input) {
        Ok(tool) => tool,
        Err(e) => {
            state.uploads.remove_quietly(&icon.path).await;
            return Err(e.into());
        }
    };
    Ok(ApiResponse::created("Tool created successfully", tool))
}

/// PUT /tools/{id} - the slug is fixed at creation.
pub async fn update_tool(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut form: FormData,
) -> ApiResult<Tool> {
    let repo = ToolRepository::new(state.database.clone());
    let current = repo.find_by_id(id)?.ok_or_else(|| not_found("Tool"))?;
    Validator::new().required("name", &form.text("name")).finish()?;

    let icon = replace_upload(&state, form.take_file("icon"), &current.icon, "tools", "icon").await?;
    let mut input = tool_input(&form, current.slug.clone(), icon.path.clone());
    if form.get("is_active").is_none() {
        input.is_active = current.is_active;
    }
    if form.get("order").is_none() {
        input.order = current.order;
    }
    let tool = repo.update(id, &input)?.ok_or_else(|| not_found("Tool"))?;
    icon.cleanup(&state).await;

    Ok(ApiResponse::ok("Tool updated successfully", tool))
}

/// PUT /tools/{id}/toggle
pub async fn toggle_tool(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Tool> {
    let tool = ToolRepository::new(state.database.clone())
        .toggle(id)?
        .ok_or_else(|| not_found("Tool"))?;
    let message = if tool.is_active {
        "Tool activated successfully"
    } else {
        "Tool deactivated successfully"
    };
    Ok(ApiResponse::ok(message, tool))
}

/// DELETE /tools/{id}
pub async fn delete_tool(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let repo = ToolRepository::new(state.database.clone());
    let tool = repo.find_by_id(id)?.ok_or_else(|| not_found("Tool"))?;
    repo.delete(id)?;
    state.uploads.remove_quietly(&tool.icon).await;
    Ok(ApiResponse::ok("Tool deleted successfully", ()))
}
