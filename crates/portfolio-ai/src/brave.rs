//! Brave web search client.

use async_trait::async_trait;
use serde::Deserialize;

use crate::client::{SearchProvider, SearchResult};
use crate::error::AiError;
use crate::text::clean_query;

const SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const RESULT_COUNT: &str = "2";
const SEARCH_LANG: &str = "ms";

#[derive(Deserialize, Default)]
struct SearchResponse {
    #[serde(default)]
    web: WebResults,
}

#[derive(Deserialize, Default)]
struct WebResults {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Clone, Debug)]
pub struct BraveSearch {
    client: reqwest::Client,
    api_key: String,
}

impl BraveSearch {
    pub fn new(client: reqwest::Client, api_key: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
        }
    }
}

/// Map a non-200 search status to an error.
fn status_error(status: u16) -> AiError {
    match status {
        422 => AiError::Search("brave api 422 - invalid request".into()),
        429 => AiError::Search("brave api rate limit exceeded".into()),
        other => AiError::Search(format!("brave api returned status {}", other)),
    }
}

#[async_trait]
impl SearchProvider for BraveSearch {
    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::Search("BRAVE_API_KEY is not set".into()));
        }
        let query = clean_query(query);

        let resp = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", query.as_str()),
                ("count", RESULT_COUNT),
                ("search_lang", SEARCH_LANG),
            ])
            .header(reqwest::header::ACCEPT, "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(status_error(status));
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| AiError::Search(format!("failed to decode brave response: {}", e)))?;
        tracing::debug!(query = %query, hits = parsed.web.results.len(), "Brave search finished");
        Ok(parsed.web.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors() {
        assert_eq!(
            status_error(422).to_string(),
            "search error: brave api 422 - invalid request"
        );
        assert!(status_error(429).to_string().contains("rate limit"));
        assert!(status_error(500).to_string().ends_with("status 500"));
    }

    #[test]
    fn test_configured_only_with_key() {
        let client = reqwest::Client::new();
        assert!(!BraveSearch::new(client.clone(), "").is_configured());
        assert!(BraveSearch::new(client, "key").is_configured());
    }

    #[test]
    fn test_response_parsing_tolerates_missing_sections() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.web.results.is_empty());

        let parsed: SearchResponse = serde_json::from_str(
            r#"{"web":{"results":[{"title":"A","url":"https://a.id","description":"desc","age":"1d"}]}}"#,
        )
        .unwrap();
        assert_eq!(parsed.web.results[0].url, "https://a.id");
        assert_eq!(parsed.web.results[0].description, "desc");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let brave = BraveSearch::new(reqwest::Client::new(), "");
        let err = brave.search("rust").await.unwrap_err();
        assert!(err.to_string().contains("BRAVE_API_KEY is not set"));
    }
}
