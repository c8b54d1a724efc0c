//! Store Rating API server
//! Accounts with roles, stores and 1-5 star ratings over HTTP/JSON

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use store_rating_backend::{
    auth::{JwtHandler, PasswordHasher},
    build_router,
    config::Config,
    db::Database,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let config = Config::parse();
    config.check();

    info!(db_path = %config.db_path, "Opening database");
    let db = Database::open(&config.db_path)?;

    let state = AppState::new(
        db,
        JwtHandler::with_ttl_hours(&config.jwt_secret, config.token_ttl_hours),
        PasswordHasher::new(config.bcrypt_cost),
    );
    let app = build_router(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "store_rating_backend=debug,store_rating=debug,tower_http=info".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also the crate root, when started from elsewhere
    let env_file = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if env_file.exists() {
        let _ = dotenv::from_path(&env_file);
    }
}
