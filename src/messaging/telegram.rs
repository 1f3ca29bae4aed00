//! Telegram transport: command dispatch, polling and webhook delivery.

use crate::config::WebhookConfig;
use crate::error::ConfigError;
use crate::llm::OpenAiGateway;
use crate::relay::Relay;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ChatAction;
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;

/// Commands dispatched by the transport layer. Everything else on the core
/// side is a plain text message.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase")]
enum Command {
    #[command(description = "start a fresh conversation")]
    Start,
    #[command(description = "clear the chat history")]
    Clear,
    #[command(description = "show help")]
    Help,
}

type BotRelay = Arc<Relay<OpenAiGateway>>;

/// Run the Telegram transport until shutdown.
///
/// Delivery mode is chosen by `webhook`: `Some` registers a webhook with
/// Telegram and serves updates over HTTP, `None` long-polls. Per-message
/// handler failures are logged by the dispatcher and never stop the loop.
pub async fn run(bot: Bot, relay: BotRelay, webhook: Option<WebhookConfig>) -> crate::Result<()> {
    if let Err(error) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!(%error, "failed to register bot commands");
    }

    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_text));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![relay])
        .enable_ctrlc_handler()
        .build();

    match webhook {
        Some(config) => {
            let address = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
            // Use the bot token as the callback path so the endpoint is not
            // guessable, matching common Telegram webhook practice.
            let url = format!(
                "{}/{}",
                config.public_url.trim_end_matches('/'),
                bot.token()
            )
            .parse::<url::Url>()
            .map_err(|error| {
                ConfigError::Invalid(format!("invalid webhook URL: {error}"))
            })?;

            tracing::info!(%address, "starting webhook update listener");
            let listener = webhooks::axum(bot, webhooks::Options::new(address, url)).await?;

            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("webhook update listener error"),
                )
                .await;
        }
        None => {
            tracing::info!("starting long polling");
            dispatcher.dispatch().await;
        }
    }

    Ok(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    command: Command,
    relay: BotRelay,
) -> ResponseResult<()> {
    // Updates without a sender (channel posts) carry no user identity.
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;

    let reply = match command {
        Command::Start => {
            relay.reset(user_id).await;
            relay.welcome_text()
        }
        Command::Clear => {
            relay.reset(user_id).await;
            relay.cleared_text()
        }
        Command::Help => relay.help_text(),
    };

    tracing::debug!(user_id, ?command, "handled command");
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

async fn handle_text(bot: Bot, msg: Message, relay: BotRelay) -> ResponseResult<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user_id = user.id.0;

    // Cosmetic typing indicator while the gateway call is in flight.
    if let Err(error) = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await {
        tracing::debug!(%error, "failed to send typing action");
    }

    let reply = relay.handle_message(user_id, text).await;
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}
