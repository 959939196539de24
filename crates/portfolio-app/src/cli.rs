//! CLI argument definitions for the portfolio server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use portfolio_core::config::PortfolioConfig;

/// Portfolio backend: content CMS, public tools and the AI blog writer.
#[derive(Parser, Debug)]
#[command(name = "portfolio", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// SQLite database file.
    #[arg(long = "db", global = true)]
    pub db: Option<PathBuf>,

    /// Directory uploaded files are stored in.
    #[arg(long = "upload-dir", global = true)]
    pub upload_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (the default).
    Serve,
    /// Create an admin user. Registration over HTTP needs an existing login.
    CreateUser(CreateUserArgs),
}

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub password: String,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PORTFOLIO_CONFIG env var > ./config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PORTFOLIO_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("config.toml")
    }

    /// Apply flag overrides on top of a config that already has env values.
    pub fn apply_overrides(&self, config: &mut PortfolioConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref db) = self.db {
            config.database.path = db.to_string_lossy().to_string();
        }
        if let Some(ref dir) = self.upload_dir {
            config.server.upload_dir = dir.to_string_lossy().to_string();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let args = CliArgs::try_parse_from(["portfolio"]).unwrap();
        assert!(args.command.is_none());
        assert!(args.port.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let args = CliArgs::try_parse_from([
            "portfolio",
            "--port",
            "8080",
            "--db",
            "/tmp/site.db",
            "--log-level",
            "debug",
            "serve",
        ])
        .unwrap();
        let mut config = PortfolioConfig::default();
        config.server.upload_dir = "from-file".into();
        args.apply_overrides(&mut config);

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "/tmp/site.db");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.server.upload_dir, "from-file");
        assert!(matches!(args.command, Some(Command::Serve)));
    }

    #[test]
    fn test_create_user_args() {
        let args = CliArgs::try_parse_from([
            "portfolio",
            "create-user",
            "--name",
            "Ada",
            "--username",
            "ada",
            "--email",
            "ada@example.com",
            "--password",
            "correct-horse",
        ])
        .unwrap();
        match args.command {
            Some(Command::CreateUser(user)) => {
                assert_eq!(user.username, "ada");
                assert_eq!(user.email, "ada@example.com");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let args = CliArgs::try_parse_from(["portfolio", "-c", "/etc/portfolio.toml"]).unwrap();
        assert_eq!(
            args.resolve_config_path(),
            PathBuf::from("/etc/portfolio.toml")
        );
    }
}
