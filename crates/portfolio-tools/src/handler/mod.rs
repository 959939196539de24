//! Tool handler trait and registry.
//!
//! Each tool is an async `ToolHandler` addressed by slug. The registry maps
//! slugs to handlers and is the single source of truth for which tools a
//! database row may point at.

pub mod encode;
pub mod game;
pub mod generate;
pub mod hash;
pub mod http;
pub mod json;
pub mod text;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::args::ToolArgs;
use crate::error::ToolError;
use crate::schema::{FieldSchema, ToolDocs};

/// A runnable tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// URL slug the tool is registered under.
    fn slug(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    fn input_schema(&self) -> Vec<FieldSchema>;

    fn docs(&self) -> Option<ToolDocs> {
        None
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError>;
}

/// Serializable description of a registered tool.
#[derive(Clone, Debug, Serialize)]
pub struct RegistryEntry {
    pub slug: &'static str,
    pub name: &'static str,
    pub input_schema: Vec<FieldSchema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<ToolDocs>,
}

/// Slug-keyed collection of tool handlers.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<&'static str, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    /// Register a handler, replacing any previous one with the same slug.
    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        self.handlers.insert(handler.slug(), handler);
    }

    pub fn register_defaults(&mut self) {
        let client = reqwest::Client::new();

        for handler in hash::handlers() {
            self.register(handler);
        }
        self.register(Arc::new(encode::Base64Encode));
        self.register(Arc::new(encode::Base64Decode));
        self.register(Arc::new(text::WordCounter));
        self.register(Arc::new(text::TextReverse));
        self.register(Arc::new(generate::UuidGenerator));
        self.register(Arc::new(generate::PasswordGenerator));
        self.register(Arc::new(json::JsonFormatter));
        self.register(Arc::new(json::JsonMinifier));
        self.register(Arc::new(http::HttpGet::new(client.clone())));
        for handler in game::handlers(client) {
            self.register(handler);
        }
    }

    pub fn get(&self, slug: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(slug).cloned()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.handlers.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// All registered tools, sorted by slug.
    pub fn entries(&self) -> Vec<RegistryEntry> {
        let mut entries: Vec<RegistryEntry> = self
            .handlers
            .values()
            .map(|h| RegistryEntry {
                slug: h.slug(),
                name: h.name(),
                input_schema: h.input_schema(),
                docs: h.docs(),
            })
            .collect();
        entries.sort_by(|a, b| a.slug.cmp(b.slug));
        entries
    }

    /// Run the tool registered under `slug`.
    pub async fn execute(&self, slug: &str, args: &ToolArgs) -> Result<Value, ToolError> {
        let handler = self
            .get(slug)
            .ok_or_else(|| ToolError::UnknownTool(slug.to_string()))?;
        let result = handler.execute(args).await;
        if let Err(ref e) = result {
            tracing::debug!(tool = slug, error = %e, "Tool execution failed");
        }
        result
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut slugs: Vec<&&str> = self.handlers.keys().collect();
        slugs.sort();
        f.debug_struct("ToolRegistry").field("slugs", &slugs).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        fn slug(&self) -> &'static str {
            "echo"
        }
        fn name(&self) -> &'static str {
            "Echo"
        }
        fn input_schema(&self) -> Vec<FieldSchema> {
            Vec::new()
        }
        async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
            Ok(json!({ "text": args.string("text") }))
        }
    }

    #[test]
    fn test_defaults_cover_every_builtin() {
        let registry = ToolRegistry::with_defaults();
        for slug in [
            "md5",
            "sha1",
            "sha256",
            "base64-encode",
            "base64-decode",
            "word-counter",
            "text-reverse",
            "uuid-generator",
            "password-generator",
            "json-formatter",
            "json-minifier",
            "http-get",
            "check-ign-ml",
            "check-ign-ff",
            "check-ign-cod",
            "check-ign-bloodstrike",
        ] {
            assert!(registry.contains(slug), "missing {}", slug);
        }
        assert_eq!(registry.len(), 16);
    }

    #[test]
    fn test_entries_sorted_by_slug() {
        let registry = ToolRegistry::with_defaults();
        let slugs: Vec<&str> = registry.entries().iter().map(|e| e.slug).collect();
        let mut sorted = slugs.clone();
        sorted.sort();
        assert_eq!(slugs, sorted);
    }

    #[tokio::test]
    async fn test_execute_custom_handler() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        let args = ToolArgs::from_value(json!({"text": "hi"}));
        let out = registry.execute("echo", &args).await.unwrap();
        assert_eq!(out["text"], "hi");
    }

    #[tokio::test]
    async fn test_execute_unknown_slug() {
        let registry = ToolRegistry::new();
        let err = registry
            .execute("missing", &ToolArgs::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }
}
