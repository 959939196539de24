//! Error types for tool execution.

use portfolio_core::error::PortfolioError;

/// Errors from running a tool. The display form is shown to the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("handler for '{0}' not found")]
    UnknownTool(String),
    #[error("request failed: {0}")]
    Http(String),
    #[error("{0}")]
    Upstream(String),
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        ToolError::Http(e.to_string())
    }
}

impl From<ToolError> for PortfolioError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::InvalidInput(msg) => PortfolioError::Validation(msg),
            ToolError::UnknownTool(slug) => PortfolioError::NotFound(format!("Tool '{}'", slug)),
            other => PortfolioError::External(other.to_string()),
        }
    }
}
