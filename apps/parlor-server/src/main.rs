//! # Parlor Server
//!
//! Match relay server for two-player turn-based games.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! parlor
//!
//! # Run with a config file
//! parlor --config /path/to/parlor.toml
//!
//! # Run with environment variables
//! PARLOR_PORT=5491 PARLOR_HOST=0.0.0.0 parlor
//! ```

mod config;

use anyhow::{Context, Result};
use parlor::ParlorServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parlor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::load()?;

    tracing::info!(
        addr = %config.bind_addr(),
        accounts = %config.accounts.display(),
        replays = %config.replay_dir.display(),
        "starting parlor server"
    );

    let server = ParlorServer::builder()
        .bind(&config.bind_addr())
        .accounts_file(&config.accounts)
        .replay_dir(&config.replay_dir)
        .build()
        .await
        .context("failed to start server")?;

    tokio::select! {
        result = server.run() => result.context("server stopped")?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}
