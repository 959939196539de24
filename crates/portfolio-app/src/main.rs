//! Portfolio application binary - composition root.
//!
//! 1. Load `.env`, then configuration (CLI > env > TOML file > defaults)
//! 2. Open the SQLite database and run migrations
//! 3. Either create an admin user, or
//! 4. Start the limiter sweeper and the axum REST API server

mod cli;

use std::path::Path;
use std::time::Duration;

use clap::Parser;

use portfolio_api::auth::hash_password;
use portfolio_api::state::AppState;
use portfolio_core::config::PortfolioConfig;
use portfolio_core::types::NewUser;
use portfolio_storage::{Database, UserRepository};

use cli::{CliArgs, Command, CreateUserArgs};

/// Drop idle client entries from both limiters on a fixed interval.
async fn limiter_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    interval.tick().await;

    loop {
        interval.tick().await;
        let tools = state.tool_limiter.cleanup();
        let contact = state.contact_limiter.cleanup();
        if tools + contact > 0 {
            tracing::debug!(tools, contact, "Rate limiter entries expired");
        }
    }
}

fn create_user(database: Database, args: &CreateUserArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.password.chars().count() < 6 {
        return Err("password must be at least 6 characters".into());
    }
    let user = UserRepository::new(std::sync::Arc::new(database)).create(&NewUser {
        name: args.name.clone(),
        username: args.username.clone(),
        email: args.email.clone(),
        password_hash: hash_password(&args.password)?,
    })?;
    tracing::info!(user_id = user.id, username = %user.username, "User created");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // A missing .env is fine.
    let dotenv = dotenvy::dotenv();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = if config_file.exists() {
        PortfolioConfig::load(&config_file)?
    } else {
        PortfolioConfig::default()
    };
    config.apply_env();
    args.apply_overrides(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting portfolio v{}", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        tracing::info!(path = %path.display(), "Environment file loaded");
    }
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    // Storage.
    let db_path = Path::new(&config.database.path);
    let database = Database::new(db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    match args.command {
        Some(Command::CreateUser(ref user)) => create_user(database, user),
        Some(Command::Serve) | None => {
            std::fs::create_dir_all(&config.server.upload_dir)?;
            if config.auth.jwt_secret == "secret_key" {
                tracing::warn!("JWT secret is the built-in default; set JWT_SECRET");
            }

            let state = AppState::new(config.clone(), database);

            let sweeper = state.clone();
            let cleanup_secs = config.rate_limit.cleanup_interval_secs;
            tokio::spawn(async move {
                limiter_cleanup_loop(sweeper, cleanup_secs).await;
            });

            portfolio_api::start_server(&config, state).await?;
            Ok(())
        }
    }
}
