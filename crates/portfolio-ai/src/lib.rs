//! AI blog writer and the external clients behind it.
//!
//! - `BlogGenerator` drives keyword -> titles -> references -> article.
//! - `OllamaClient`, `BraveSearch`, `ArticleFetcher` and `GithubClient` are
//!   the production implementations of the traits in [`client`].

pub mod brave;
pub mod client;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod github;
pub mod ollama;
pub mod prompts;
pub mod text;

pub use brave::BraveSearch;
pub use client::{LanguageModel, PageFetcher, RepoInfo, RepoSource, SearchProvider, SearchResult};
pub use error::AiError;
pub use fetch::ArticleFetcher;
pub use generator::{BlogGenerator, GenerateReport};
pub use github::GithubClient;
pub use ollama::OllamaClient;
