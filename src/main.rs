//! Relaybot entry point.

use anyhow::Context as _;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting relaybot...");

    let config = relaybot::config::Config::load()
        .with_context(|| "failed to load configuration from environment")?;

    let mode = if config.webhook.is_some() {
        "webhook"
    } else {
        "polling"
    };
    tracing::info!(model = %config.gateway.model, mode, "Configuration loaded");

    let store = Arc::new(relaybot::conversation::ConversationStore::new(
        config.history.max_entries,
    ));
    let gateway = relaybot::llm::OpenAiGateway::new(config.gateway.clone())
        .with_context(|| "failed to initialize completion gateway")?;
    let relay = Arc::new(relaybot::relay::Relay::new(store, gateway));

    let bot = teloxide::Bot::new(config.telegram_token.clone());
    relaybot::messaging::telegram::run(bot, relay, config.webhook.clone())
        .await
        .with_context(|| "telegram transport failed")?;

    tracing::info!("relaybot stopped");
    Ok(())
}
