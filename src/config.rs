//! Configuration loading and validation.

use crate::error::{ConfigError, Result};

/// Relaybot configuration, assembled from process environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    pub telegram_token: String,

    /// Webhook delivery settings. `None` selects long polling.
    pub webhook: Option<WebhookConfig>,

    /// Completion gateway settings.
    pub gateway: GatewayConfig,

    /// Conversation history settings.
    pub history: HistoryConfig,
}

/// Webhook delivery mode settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Externally reachable base URL Telegram should deliver updates to.
    pub public_url: String,

    /// Local port the webhook listener binds.
    pub port: u16,
}

/// Completion gateway settings. Sampling parameters are static configuration,
/// never user-controlled.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Provider API key.
    pub api_key: String,

    /// Base URL of the chat-completions API.
    pub base_url: String,

    /// Model name sent with every request.
    pub model: String,

    /// Maximum completion length in tokens.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,
}

/// Conversation history settings.
#[derive(Debug, Clone, Copy)]
pub struct HistoryConfig {
    /// Maximum entries retained per user (two per exchange).
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_entries: 20 }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Missing required secrets are a fatal startup condition surfaced as
    /// [`ConfigError::MissingKey`].
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration through an environment lookup function.
    fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_token = env("TELEGRAM_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::MissingKey("TELEGRAM_TOKEN"))?;

        let api_key = env("OPENAI_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingKey("OPENAI_API_KEY"))?;

        let webhook = match env("WEBHOOK_URL") {
            Some(public_url) if !public_url.is_empty() => {
                let port = match env("PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|_| {
                        ConfigError::Invalid(format!("PORT must be a port number, got {raw:?}"))
                    })?,
                    None => 5000,
                };
                Some(WebhookConfig { public_url, port })
            }
            _ => None,
        };

        let gateway = GatewayConfig {
            api_key,
            base_url: env("RELAYBOT_API_BASE")
                .unwrap_or_else(|| "https://api.openai.com/v1".into()),
            model: env("RELAYBOT_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".into()),
            max_tokens: 1000,
            temperature: 0.7,
        };

        Ok(Self {
            telegram_token,
            webhook,
            gateway,
            history: HistoryConfig::default(),
        })
    }
}
