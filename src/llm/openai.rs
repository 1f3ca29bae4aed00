//! OpenAI-compatible chat-completions client.

use crate::config::GatewayConfig;
use crate::conversation::ConversationEntry;
use crate::error::GatewayError;
use crate::llm::CompletionGateway;
use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Completion gateway backed by an OpenAI-compatible HTTP API.
pub struct OpenAiGateway {
    config: GatewayConfig,
    http_client: reqwest::Client,
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ConversationEntry],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Error envelope returned by the provider on non-success statuses.
#[derive(Debug, Deserialize, Default)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiErrorDetail {
    message: Option<String>,
    code: Option<String>,
}

impl OpenAiGateway {
    /// Create a gateway client for the given configuration.
    pub fn new(config: GatewayConfig) -> crate::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .with_context(|| "failed to build HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

impl CompletionGateway for OpenAiGateway {
    async fn complete(
        &self,
        messages: &[ConversationEntry],
    ) -> std::result::Result<String, GatewayError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // The body may be a structured error envelope or arbitrary text.
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            let detail = body.error.unwrap_or_default();
            let message = detail
                .message
                .unwrap_or_else(|| "no error detail".to_string());

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                || detail.code.as_deref() == Some("insufficient_quota")
            {
                return Err(GatewayError::Quota(message));
            }

            return Err(GatewayError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(GatewayError::EmptyResponse)
    }
}
