//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, the two
//! rate limiters, JWT auth for admin routes, and static upload serving.

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::{Extension, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use portfolio_core::config::PortfolioConfig;
use portfolio_core::error::PortfolioError;

use crate::handlers::{
    self, auth, blog, bookmark, contact, files, profile, resume, setting, showcase, tool,
};
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
///
/// Routes live under `/api`; `/health` is also served at the root and
/// uploaded files under `/uploads`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Routes that do NOT require authentication.
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/profile", get(profile::get_profile))
        .route("/skills", get(resume::list_skills))
        .route("/skills/{id}", get(resume::get_skill))
        .route("/educations", get(resume::list_educations))
        .route("/educations/{id}", get(resume::get_education))
        .route("/courses", get(resume::list_courses))
        .route("/courses/{id}", get(resume::get_course))
        .route("/experiences", get(showcase::list_experiences))
        .route("/experiences/{id}", get(showcase::get_experience))
        .route("/projects", get(showcase::list_projects))
        .route("/projects/{id}", get(showcase::get_project))
        .route("/tags", get(blog::list_tags))
        .route("/tags/{id}", get(blog::get_tag))
        .route("/tags/slug/{slug}", get(blog::get_tag_by_slug))
        .route("/blogs", get(blog::list_blogs))
        .route("/blogs/{id}", get(blog::get_blog))
        .route("/bookmarks", get(bookmark::list_bookmarks))
        .route("/bookmarks/{id}", get(bookmark::get_bookmark))
        .route("/settings", get(setting::get_settings))
        .route("/settings/{key}", get(setting::get_setting))
        .route("/tools/registry", get(tool::registry));

    // Public tool routes, limited per client IP.
    let tool_routes = Router::new()
        .route("/tools", get(tool::list_tools))
        .route("/tools/{id}", get(tool::get_tool))
        .route("/tools/{id}/run", get(tool::run_tool).post(tool::run_tool))
        .route_layer(from_fn(rate_limit_middleware))
        .route_layer(Extension(state.tool_limiter.clone()));

    let contact_routes = Router::new()
        .route("/contacts", post(contact::create_contact))
        .route_layer(from_fn(rate_limit_middleware))
        .route_layer(Extension(state.contact_limiter.clone()));

    // Admin routes behind JWT auth.
    let protected_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/users", get(auth::list_users))
        .route(
            "/users/{id}",
            get(auth::get_user)
                .put(auth::update_user)
                .delete(auth::delete_user),
        )
        .route(
            "/upload",
            post(files::upload_file).delete(files::delete_file),
        )
        .route("/profile", put(profile::upsert_profile))
        .route("/skills", post(resume::create_skill))
        .route(
            "/skills/{id}",
            put(resume::update_skill).delete(resume::delete_skill),
        )
        .route("/educations", post(resume::create_education))
        .route(
            "/educations/{id}",
            put(resume::update_education).delete(resume::delete_education),
        )
        .route("/courses", post(resume::create_course))
        .route(
            "/courses/{id}",
            put(resume::update_course).delete(resume::delete_course),
        )
        .route("/experiences", post(showcase::create_experience))
        .route(
            "/experiences/{id}",
            put(showcase::update_experience).delete(showcase::delete_experience),
        )
        .route(
            "/experiences/{id}/images",
            post(showcase::add_experience_image),
        )
        .route(
            "/experiences/{id}/images/{image_id}",
            axum::routing::delete(showcase::delete_experience_image),
        )
        .route("/projects", post(showcase::create_project))
        .route(
            "/projects/{id}",
            put(showcase::update_project).delete(showcase::delete_project),
        )
        .route("/projects/{id}/images", post(showcase::add_project_image))
        .route(
            "/projects/{id}/images/{image_id}",
            axum::routing::delete(showcase::delete_project_image),
        )
        .route("/tags", post(blog::create_tag))
        .route("/tags/{id}", put(blog::update_tag).delete(blog::delete_tag))
        .route("/blogs", post(blog::create_blog))
        .route("/blogs/all", get(blog::list_all_blogs))
        .route("/blogs/stats", get(blog::blog_stats))
        .route("/blogs/bulk", post(blog::bulk_blogs))
        .route("/blogs/generate", post(blog::generate_blogs))
        .route("/blogs/stream", get(blog::stream))
        .route(
            "/blogs/{id}",
            put(blog::update_blog).delete(blog::delete_blog),
        )
        .route("/blogs/{id}/publish", put(blog::publish_blog))
        .route("/blogs/{id}/reject", put(blog::reject_blog))
        .route("/blogs/{id}/archive", put(blog::archive_blog))
        .route("/bookmarks/sync", post(bookmark::sync_bookmarks))
        .route(
            "/bookmarks/{id}",
            axum::routing::delete(bookmark::delete_bookmark),
        )
        .route("/contacts", get(contact::list_contacts))
        .route(
            "/contacts/{id}",
            get(contact::get_contact).delete(contact::delete_contact),
        )
        .route(
            "/contacts/{id}/status",
            put(contact::update_contact_status),
        )
        .route("/settings", put(setting::update_settings))
        .route("/tools", post(tool::create_tool))
        .route("/tools/all", get(tool::list_all_tools))
        .route("/tools/stats", get(tool::tool_stats))
        .route(
            "/tools/{id}",
            put(tool::update_tool).delete(tool::delete_tool),
        )
        .route("/tools/{id}/toggle", put(tool::toggle_tool))
        .route_layer(from_fn_with_state(state.clone(), crate::auth::require_auth));

    let api = public_routes
        .merge(tool_routes)
        .merge(contact_routes)
        .merge(protected_routes);

    let upload_dir = state.uploads.root().to_path_buf();

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
///
/// Serves with peer addresses attached so the rate limiter can fall back
/// to them when no proxy headers are present. Returns after Ctrl+C.
pub async fn start_server(config: &PortfolioConfig, state: AppState) -> Result<(), PortfolioError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PortfolioError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| PortfolioError::External(format!("Server error: {}", e)))?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
