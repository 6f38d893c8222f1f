mod command;
mod config;
mod dispatcher;
mod error;
mod handlers;
mod server;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::handlers::Builtin;
use crate::webhook::WebhookClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,slashbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!(
        "Starting slashbot {} with config {}",
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let webhook = if config.webhook.is_configured() {
        let client = WebhookClient::new(config.webhook.url.trim(), config.webhook.timeout())?;
        info!("  Webhook: {} (timeout {}s)", client.url(), config.webhook.timeout_secs);
        Some(client)
    } else {
        warn!("No webhook configured; public responses will fail");
        None
    };

    let dispatcher = Dispatcher::new(webhook);
    for command in &config.commands {
        dispatcher.register(
            command.name.as_str(),
            command.token.as_str(),
            Builtin::new(command.handler, command.public),
        );
        info!(
            "  /{} -> {}{}",
            command.name,
            command.handler,
            if command.public { " (public)" } else { "" }
        );
    }
    if dispatcher.commands().is_empty() {
        warn!("No commands configured; every request will be rejected");
    }

    server::run(&config.server.bind, &config.server.path, Arc::new(dispatcher)).await
}
