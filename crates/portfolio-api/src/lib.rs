//! Portfolio API crate - axum HTTP server, route handlers, SSE streaming.
//!
//! Provides the REST API for the portfolio site: public content reads, the
//! JWT-protected admin CMS, file uploads, public utility tools, the contact
//! form, and the AI blog writer with its live progress stream.

pub mod auth;
pub mod error;
pub mod form;
pub mod handlers;
pub mod rate_limit;
pub mod response;
pub mod revalidate;
pub mod routes;
pub mod state;
pub mod upload;
pub mod validate;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::{AppState, ExternalClients};
