use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PortfolioError, Result};

/// Top-level configuration for the portfolio backend.
///
/// Loaded from `portfolio.toml` by default, then overlaid with environment
/// variables (see [`PortfolioConfig::apply_env`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub revalidate: RevalidateConfig,
    #[serde(default)]
    pub github: GithubConfig,
}

impl PortfolioConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PortfolioConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PortfolioError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup.
    ///
    /// Empty values are ignored. Unparseable numbers are logged and ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("APP_PORT") {
            match port.trim().parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid APP_PORT"),
            }
        }
        if let Some(host) = get("APP_HOST") {
            self.server.host = host;
        }
        if let Some(dir) = get("UPLOAD_DIR") {
            self.server.upload_dir = dir;
        }
        if let Some(path) = get("DB_PATH") {
            self.database.path = path;
        }
        if let Some(secret) = get("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(url) = get("FRONTEND_URL") {
            self.revalidate.frontend_url = url;
        }
        if let Some(secret) = get("REVALIDATE_SECRET") {
            self.revalidate.secret = secret;
        }
        if let Some(url) = get("OLLAMA_URL") {
            self.ai.ollama_url = url;
        }
        if let Some(model) = get("OLLAMA_MODEL") {
            self.ai.ollama_model = model;
        }
        if let Some(key) = get("BRAVE_API_KEY") {
            self.ai.brave_api_key = key;
        }
        if let Some(user) = get("GITHUB_USERNAME") {
            self.github.username = user;
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory uploaded files are written to and served from.
    pub upload_dir: String,
    /// Global request body limit (multipart uploads included).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            upload_dir: "uploads".to_string(),
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

/// SQLite database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "portfolio.db".to_string(),
        }
    }
}

/// JWT signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "secret_key".to_string(),
            access_token_minutes: 60,
            refresh_token_days: 7,
        }
    }
}

/// Per-IP sliding-window limits for the public routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub tool_max: usize,
    pub tool_window_secs: u64,
    pub contact_max: usize,
    pub contact_window_secs: u64,
    /// How often idle client entries are swept.
    pub cleanup_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            tool_max: 20,
            tool_window_secs: 60,
            contact_max: 5,
            contact_window_secs: 600,
            cleanup_interval_secs: 300,
        }
    }
}

/// AI blog generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub ollama_url: String,
    pub ollama_model: String,
    /// Brave Search subscription token. Searches fail when empty.
    pub brave_api_key: String,
    /// Pause before each search request.
    pub search_delay_ms: u64,
    pub scrape_timeout_secs: u64,
    /// Capacity of the progress broadcast channel.
    pub event_buffer: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3".to_string(),
            brave_api_key: String::new(),
            search_delay_ms: 1000,
            scrape_timeout_secs: 15,
            event_buffer: 10,
        }
    }
}

/// Front-end cache revalidation webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevalidateConfig {
    pub frontend_url: String,
    pub secret: String,
}

impl RevalidateConfig {
    /// The webhook only fires when both values are set.
    pub fn is_enabled(&self) -> bool {
        !self.frontend_url.is_empty() && !self.secret.is_empty()
    }
}

/// GitHub account whose public repositories are synced as bookmarks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PortfolioConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.upload_dir, "uploads");
        assert_eq!(config.auth.jwt_secret, "secret_key");
        assert_eq!(config.auth.access_token_minutes, 60);
        assert_eq!(config.auth.refresh_token_days, 7);
        assert_eq!(config.rate_limit.tool_max, 20);
        assert_eq!(config.rate_limit.contact_max, 5);
        assert_eq!(config.rate_limit.contact_window_secs, 600);
        assert_eq!(config.ai.ollama_model, "llama3");
        assert_eq!(config.ai.event_buffer, 10);
        assert!(!config.revalidate.is_enabled());
    }

    #[test]
    fn test_load_partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8080

[ai]
ollama_model = "mistral"
"#
        )
        .unwrap();

        let config = PortfolioConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.ai.ollama_model, "mistral");
        assert_eq!(config.ai.ollama_url, "http://localhost:11434");
        assert_eq!(config.database.path, "portfolio.db");
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server = [[[").unwrap();
        let err = PortfolioConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, PortfolioError::Config(_)));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = PortfolioConfig::load_or_default(Path::new("/nonexistent/portfolio.toml"));
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("portfolio.toml");

        let mut config = PortfolioConfig::default();
        config.github.username = "octocat".to_string();
        config.rate_limit.tool_max = 50;
        config.save(&path).unwrap();

        let loaded = PortfolioConfig::load(&path).unwrap();
        assert_eq!(loaded.github.username, "octocat");
        assert_eq!(loaded.rate_limit.tool_max, 50);
    }

    #[test]
    fn test_apply_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("APP_PORT", "4000"),
            ("JWT_SECRET", "s3cret"),
            ("FRONTEND_URL", "https://example.com"),
            ("REVALIDATE_SECRET", "abc"),
            ("OLLAMA_MODEL", "qwen"),
            ("BRAVE_API_KEY", "brave"),
            ("GITHUB_USERNAME", "someone"),
            ("DB_PATH", "/tmp/p.db"),
        ]
        .into_iter()
        .collect();

        let mut config = PortfolioConfig::default();
        config.apply_env_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert!(config.revalidate.is_enabled());
        assert_eq!(config.ai.ollama_model, "qwen");
        assert_eq!(config.ai.brave_api_key, "brave");
        assert_eq!(config.github.username, "someone");
        assert_eq!(config.database.path, "/tmp/p.db");
    }

    #[test]
    fn test_apply_env_ignores_bad_port_and_empty_values() {
        let mut config = PortfolioConfig::default();
        config.apply_env_from(|k| match k {
            "APP_PORT" => Some("not-a-port".to_string()),
            "JWT_SECRET" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.jwt_secret, "secret_key");
    }

    #[test]
    fn test_revalidate_requires_both_values() {
        let config = RevalidateConfig {
            frontend_url: "https://example.com".to_string(),
            secret: String::new(),
        };
        assert!(!config.is_enabled());
    }
}
