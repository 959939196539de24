//! Ollama `/api/generate` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::LanguageModel;
use crate::error::AiError;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Non-streaming completion against a local Ollama server.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(client: reqwest::Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Llm(format!("failed to connect to ollama: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AiError::Llm(format!(
                "ollama returned status {}",
                status.as_u16()
            )));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| AiError::Llm(format!("failed to decode ollama response: {}", e)))?;
        tracing::debug!(model = %self.model, chars = parsed.response.len(), "Ollama completion received");
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = OllamaClient::new(reqwest::Client::new(), "http://localhost:11434/", "llama3");
        assert_eq!(client.endpoint(), "http://localhost:11434/api/generate");
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            model: "llama3",
            prompt: "halo",
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"model": "llama3", "prompt": "halo", "stream": false}));
    }

    #[test]
    fn test_response_missing_field_is_empty() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert_eq!(parsed.response, "");
    }
}
