//! Public utility tools for the portfolio site.
//!
//! Each tool is a `ToolHandler` registered by slug in a `ToolRegistry`,
//! together with the input schema and docs a front-end needs to render it.

pub mod args;
pub mod error;
pub mod handler;
pub mod schema;

pub use args::ToolArgs;
pub use error::ToolError;
pub use handler::{RegistryEntry, ToolHandler, ToolRegistry};
pub use schema::{DocStep, FieldSchema, FieldType, ToolDocs};
