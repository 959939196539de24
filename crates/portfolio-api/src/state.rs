//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use portfolio_ai::{
    ArticleFetcher, BlogGenerator, BraveSearch, GithubClient, LanguageModel, OllamaClient,
    PageFetcher, RepoSource, SearchProvider,
};
use portfolio_core::config::PortfolioConfig;
use portfolio_storage::Database;
use portfolio_tools::ToolRegistry;

use crate::auth::JwtKeys;
use crate::rate_limit::RateLimiter;
use crate::revalidate::Revalidator;
use crate::upload::UploadStore;

/// The outbound services: language model, web search, page scraper and
/// GitHub. Tests substitute fakes.
#[derive(Clone)]
pub struct ExternalClients {
    pub llm: Arc<dyn LanguageModel>,
    pub search: Arc<dyn SearchProvider>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub repos: Arc<dyn RepoSource>,
}

impl ExternalClients {
    /// Production clients built from config, sharing one HTTP client.
    pub fn from_config(config: &PortfolioConfig) -> Self {
        let http = reqwest::Client::new();
        Self {
            llm: Arc::new(OllamaClient::new(
                http.clone(),
                &config.ai.ollama_url,
                &config.ai.ollama_model,
            )),
            search: Arc::new(BraveSearch::new(http.clone(), &config.ai.brave_api_key)),
            fetcher: Arc::new(ArticleFetcher::new(
                http.clone(),
                Duration::from_secs(config.ai.scrape_timeout_secs),
            )),
            repos: Arc::new(GithubClient::new(http)),
        }
    }
}

/// Shared application state.
///
/// All fields use `Arc` (or are cheap handles) for cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<PortfolioConfig>,
    /// SQLite database for persistent storage.
    pub database: Arc<Database>,
    /// Token signing keys.
    pub jwt: Arc<JwtKeys>,
    /// Built-in tool handlers.
    pub tools: Arc<ToolRegistry>,
    /// Background blog writer.
    pub generator: Arc<BlogGenerator>,
    /// GitHub repository listing for bookmark sync.
    pub repos: Arc<dyn RepoSource>,
    /// Uploaded file storage.
    pub uploads: UploadStore,
    /// Front-end cache invalidation.
    pub revalidator: Revalidator,
    pub tool_limiter: RateLimiter,
    pub contact_limiter: RateLimiter,
    /// Broadcast sender for SSE events.
    pub event_tx: tokio::sync::broadcast::Sender<serde_json::Value>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with production external clients.
    pub fn new(config: PortfolioConfig, database: Database) -> Self {
        let clients = ExternalClients::from_config(&config);
        Self::with_clients(config, database, clients)
    }

    /// Create a new AppState with the given external clients.
    pub fn with_clients(
        config: PortfolioConfig,
        database: Database,
        clients: ExternalClients,
    ) -> Self {
        let (event_tx, _) = tokio::sync::broadcast::channel(config.ai.event_buffer.max(1));
        let database = Arc::new(database);

        let generator = BlogGenerator::new(
            database.clone(),
            clients.llm,
            clients.search,
            clients.fetcher,
            event_tx.clone(),
        )
        .with_search_delay(Duration::from_millis(config.ai.search_delay_ms));

        let limits = &config.rate_limit;
        Self {
            jwt: Arc::new(JwtKeys::from_config(&config.auth)),
            tools: Arc::new(ToolRegistry::with_defaults()),
            generator: Arc::new(generator),
            repos: clients.repos,
            uploads: UploadStore::new(&config.server.upload_dir),
            revalidator: Revalidator::new(reqwest::Client::new(), config.revalidate.clone()),
            tool_limiter: RateLimiter::for_tools(limits.tool_max, limits.tool_window_secs),
            contact_limiter: RateLimiter::for_contact(limits.contact_max, limits.contact_window_secs),
            event_tx,
            start_time: Instant::now(),
            database,
            config: Arc::new(config),
        }
    }
}
