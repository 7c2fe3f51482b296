mod bot;
mod config;
mod extractor;
mod llm;
mod media;
mod platform;
mod router;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::Relay;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,idp_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Provider: {} ({})", config.llm.provider, config.llm.model);
    info!(
        "  Scrim: watch {} -> post {}",
        config.scrim.watch_channel_id, config.scrim.post_channel_id
    );
    info!(
        "  Tournament: watch {} -> post {}",
        config.tournament.watch_channel_id, config.tournament.post_channel_id
    );
    info!("  Authorized role: {}", config.discord.authorized_role_id);

    let relay = Arc::new(Relay::new(config));

    info!("Bot is starting...");
    platform::discord::run(relay).await?;

    Ok(())
}
