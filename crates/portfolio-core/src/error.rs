use thiserror::Error;

/// Top-level error type for the portfolio backend.
///
/// Subsystem crates (tools, ai) define their own error types and implement
/// `From<SubsystemError> for PortfolioError` so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PortfolioError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("External service error: {0}")]
    External(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for PortfolioError {
    fn from(err: toml::de::Error) -> Self {
        PortfolioError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for PortfolioError {
    fn from(err: toml::ser::Error) -> Self {
        PortfolioError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PortfolioError {
    fn from(err: serde_json::Error) -> Self {
        PortfolioError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for portfolio operations.
pub type Result<T> = std::result::Result<T, PortfolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortfolioError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_not_found_display_reads_naturally() {
        let err = PortfolioError::NotFound("Blog".to_string());
        assert_eq!(err.to_string(), "Blog not found");
    }

    #[test]
    fn test_conflict_display_is_message_only() {
        let err = PortfolioError::Conflict("Tag already exists".to_string());
        assert_eq!(err.to_string(), "Tag already exists");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PortfolioError = io_err.into();
        assert!(matches!(err, PortfolioError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(PortfolioError, &str)> = vec![
            (
                PortfolioError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                PortfolioError::Validation("name is required".to_string()),
                "Validation error: name is required",
            ),
            (
                PortfolioError::Upload("file type not allowed".to_string()),
                "Upload error: file type not allowed",
            ),
            (
                PortfolioError::External("ollama unreachable".to_string()),
                "External service error: ollama unreachable",
            ),
            (
                PortfolioError::Auth("bad signature".to_string()),
                "Authentication error: bad signature",
            ),
            (
                PortfolioError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: PortfolioError = err.unwrap_err().into();
        assert!(matches!(err, PortfolioError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: PortfolioError = err.unwrap_err().into();
        assert!(matches!(err, PortfolioError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
