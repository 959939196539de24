//! Outbound HTTP GET for poking at public APIs.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::args::ToolArgs;
use crate::error::ToolError;
use crate::handler::ToolHandler;
use crate::schema::{FieldSchema, FieldType, ToolDocs};

const TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpGet {
    client: reqwest::Client,
}

impl HttpGet {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Check that `url` is present and uses an http(s) scheme.
pub fn validate_url(url: &str) -> Result<(), ToolError> {
    if url.is_empty() {
        return Err(ToolError::InvalidInput("url is required".into()));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ToolError::InvalidInput(
            "url must start with http:// or https://".into(),
        ));
    }
    Ok(())
}

/// Parse a response body as JSON, falling back to the raw text.
pub fn body_value(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

#[async_trait]
impl ToolHandler for HttpGet {
    fn slug(&self) -> &'static str {
        "http-get"
    }

    fn name(&self) -> &'static str {
        "HTTP GET Request"
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        vec![FieldSchema::new("url", "URL", FieldType::Url)
            .placeholder("https://api.example.com/data")
            .required()]
    }

    fn docs(&self) -> Option<ToolDocs> {
        Some(
            ToolDocs::new("Send a GET request to a public URL and show the status and body.")
                .step("Enter a URL", "Use the full URL including https://.")
                .step("Send", "The status code and response body appear below.")
                .note("GET only")
                .note("Requests time out after 10 seconds")
                .note("JSON bodies are returned parsed")
                .example("https://api.github.com/users/github"),
        )
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let url = args.string("url");
        validate_url(&url)?;

        let resp = self.client.get(&url).timeout(TIMEOUT).send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;

        Ok(json!({ "status": status, "body": body_value(&body) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/x?y=1").is_ok());
        assert_eq!(validate_url("").unwrap_err().to_string(), "url is required");
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_body_value() {
        assert_eq!(body_value(r#"{"ok":true}"#), json!({"ok": true}));
        assert_eq!(body_value("<html></html>"), json!("<html></html>"));
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_scheme_without_network() {
        let tool = HttpGet::new(reqwest::Client::new());
        let args = ToolArgs::from_value(json!({ "url": "javascript:alert(1)" }));
        let err = tool.execute(&args).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
