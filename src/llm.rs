//! Completion gateway trait and provider client.

pub mod openai;

pub use openai::OpenAiGateway;

use crate::conversation::ConversationEntry;
use crate::error::GatewayError;

/// A stateless chat-completion backend.
///
/// Implementations receive the fully assembled message list (system persona
/// plus truncated history) and return either one reply string or a
/// classified error. No streaming, no retries; a failed call is surfaced
/// immediately.
pub trait CompletionGateway: Send + Sync + 'static {
    /// Request one completion for the given message list.
    fn complete(
        &self,
        messages: &[ConversationEntry],
    ) -> impl std::future::Future<Output = std::result::Result<String, GatewayError>> + Send;
}
