//! Error types for the AI writer and its external clients.

use portfolio_core::error::PortfolioError;

/// Errors from the language model, search, scraping and GitHub clients.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("language model error: {0}")]
    Llm(String),
    #[error("search error: {0}")]
    Search(String),
    #[error("fetch error: {0}")]
    Fetch(String),
    #[error("github api returned status {0}")]
    GithubStatus(u16),
    #[error("github user not found")]
    GithubUserNotFound,
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("http error: {0}")]
    Http(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        AiError::Http(e.to_string())
    }
}

impl From<PortfolioError> for AiError {
    fn from(e: PortfolioError) -> Self {
        AiError::Storage(e.to_string())
    }
}

impl From<AiError> for PortfolioError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::NotConfigured(what) => {
                PortfolioError::Config(format!("{} is not configured", what))
            }
            AiError::Storage(msg) => PortfolioError::Storage(msg),
            other => PortfolioError::External(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_error_display() {
        assert_eq!(AiError::GithubUserNotFound.to_string(), "github user not found");
        assert_eq!(
            AiError::GithubStatus(500).to_string(),
            "github api returned status 500"
        );
        assert_eq!(
            AiError::NotConfigured("github.username").to_string(),
            "github.username is not configured"
        );
        assert_eq!(
            AiError::Llm("ollama returned status 502".into()).to_string(),
            "language model error: ollama returned status 502"
        );
    }

    #[test]
    fn test_conversions() {
        let err: PortfolioError = AiError::NotConfigured("ai.brave_api_key").into();
        assert!(matches!(err, PortfolioError::Config(_)));

        let err: PortfolioError = AiError::GithubUserNotFound.into();
        assert!(matches!(err, PortfolioError::External(_)));

        let err: AiError = PortfolioError::Storage("locked".into()).into();
        assert!(matches!(err, AiError::Storage(_)));
    }
}
