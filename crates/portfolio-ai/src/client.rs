//! Traits over the external services the blog writer and bookmark sync use.
//!
//! The generator holds these as `Arc<dyn ...>` so tests can swap in
//! scripted fakes without touching the network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AiError;

/// A text-completion model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one prompt and return the full reply.
    async fn complete(&self, prompt: &str) -> Result<String, AiError>;
}

/// One web search hit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, AiError>;

    /// Whether a search can be made at all, e.g. an API key is present.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Downloads a page and reduces it to its readable article text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_article(&self, url: &str) -> Result<String, AiError>;
}

/// A public repository, as used for bookmark sync.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub private: bool,
}

/// Lists a user's repositories.
#[async_trait]
pub trait RepoSource: Send + Sync {
    /// Public repositories of `username`, most recently updated first.
    async fn public_repos(&self, username: &str) -> Result<Vec<RepoInfo>, AiError>;
}
