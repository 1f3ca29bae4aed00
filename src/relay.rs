//! Reply orchestration: store updates around a single gateway call.

use crate::UserId;
use crate::conversation::{ConversationEntry, ConversationStore};
use crate::error::GatewayError;
use crate::llm::CompletionGateway;
use std::sync::Arc;

/// Persona instruction prepended to every gateway payload.
const SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Answer concisely, in the language the user writes in.";

/// Fixed reply when the provider reports quota or rate-limit exhaustion.
const QUOTA_MESSAGE: &str =
    "I'm over my usage quota right now. Please try again in a little while.";

/// Fixed reply for any other gateway failure.
const GATEWAY_MESSAGE: &str = "Something went wrong while generating a reply. Please try again.";

const WELCOME_MESSAGE: &str = "Hi! I'm a chat assistant.\n\n\
    Available commands:\n\
    /start - start a fresh conversation\n\
    /clear - clear the chat history\n\
    /help - show this help\n\n\
    Just send me a message and I'll reply!";

const CLEARED_MESSAGE: &str = "Chat history cleared.";

/// Orchestrates one inbound message into one reply, updating the per-user
/// history around the gateway call.
pub struct Relay<G> {
    store: Arc<ConversationStore>,
    gateway: G,
}

impl<G: CompletionGateway> Relay<G> {
    pub fn new(store: Arc<ConversationStore>, gateway: G) -> Self {
        Self { store, gateway }
    }

    /// Produce a reply for one user message.
    ///
    /// The incoming message is appended before the gateway call and stays in
    /// history even when the call fails; the assistant entry is appended only
    /// on success. Always returns a displayable string, never an error.
    pub async fn handle_message(&self, user_id: UserId, text: &str) -> String {
        self.store
            .append(user_id, ConversationEntry::user(text))
            .await;

        let mut payload = vec![ConversationEntry::system(SYSTEM_PROMPT)];
        payload.extend(self.store.history(user_id).await);

        match self.gateway.complete(&payload).await {
            Ok(reply) => {
                self.store
                    .append(user_id, ConversationEntry::assistant(reply.as_str()))
                    .await;
                reply
            }
            Err(GatewayError::Quota(detail)) => {
                tracing::warn!(user_id, %detail, "completion quota exhausted");
                QUOTA_MESSAGE.to_string()
            }
            Err(error) => {
                tracing::error!(user_id, %error, "completion gateway call failed");
                GATEWAY_MESSAGE.to_string()
            }
        }
    }

    /// Clear a user's history. Backs both `/start` and `/clear`.
    pub async fn reset(&self, user_id: UserId) {
        self.store.clear(user_id).await;
    }

    /// Static greeting for `/start`.
    pub fn welcome_text(&self) -> &'static str {
        WELCOME_MESSAGE
    }

    /// Static confirmation for `/clear`.
    pub fn cleared_text(&self) -> &'static str {
        CLEARED_MESSAGE
    }

    /// Static help text for `/help`.
    pub fn help_text(&self) -> &'static str {
        WELCOME_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const USER: UserId = 7;

    /// Gateway double that replays scripted outcomes and records payloads.
    struct ScriptedGateway {
        outcomes: Mutex<VecDeque<Result<String, GatewayError>>>,
        payloads: Mutex<Vec<Vec<ConversationEntry>>>,
    }

    impl ScriptedGateway {
        fn new(outcomes: Vec<Result<String, GatewayError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                payloads: Mutex::new(Vec::new()),
            }
        }

        fn echoing(count: usize) -> Self {
            Self::new((0..count).map(|i| Ok(format!("reply {}", i + 1))).collect())
        }
    }

    impl CompletionGateway for ScriptedGateway {
        async fn complete(
            &self,
            messages: &[ConversationEntry],
        ) -> Result<String, GatewayError> {
            self.payloads.lock().unwrap().push(messages.to_vec());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("gateway called more times than scripted")
        }
    }

    fn relay_with(gateway: ScriptedGateway) -> Relay<ScriptedGateway> {
        Relay::new(Arc::new(ConversationStore::new(20)), gateway)
    }

    #[tokio::test]
    async fn success_appends_user_then_assistant() {
        let relay = relay_with(ScriptedGateway::new(vec![Ok("hi there".into())]));

        let reply = relay.handle_message(USER, "hello").await;
        assert_eq!(reply, "hi there");

        let history = relay.store.history(USER).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], ConversationEntry::user("hello"));
        assert_eq!(history[1], ConversationEntry::assistant("hi there"));
    }

    #[tokio::test]
    async fn payload_is_system_prompt_plus_history() {
        let gateway = ScriptedGateway::echoing(2);
        let relay = relay_with(gateway);

        relay.handle_message(USER, "one").await;
        relay.handle_message(USER, "two").await;

        let payloads = relay.gateway.payloads.lock().unwrap();
        let last = payloads.last().expect("payload recorded");
        assert_eq!(last[0], ConversationEntry::system(SYSTEM_PROMPT));
        // System prompt, then the full history including the new message.
        assert_eq!(last.len(), 4);
        assert_eq!(last[1], ConversationEntry::user("one"));
        assert_eq!(last[2], ConversationEntry::assistant("reply 1"));
        assert_eq!(last[3], ConversationEntry::user("two"));
    }

    #[tokio::test]
    async fn quota_failure_keeps_user_entry_and_returns_fixed_text() {
        let relay = relay_with(ScriptedGateway::new(vec![Err(GatewayError::Quota(
            "You exceeded your current quota".into(),
        ))]));

        let reply = relay.handle_message(USER, "hello").await;
        assert_eq!(reply, QUOTA_MESSAGE);
        assert!(!reply.contains("exceeded"), "raw provider text must not leak");

        let history = relay.store.history(USER).await;
        assert_eq!(history, vec![ConversationEntry::user("hello")]);
    }

    #[tokio::test]
    async fn provider_failure_returns_generic_text() {
        let relay = relay_with(ScriptedGateway::new(vec![Err(GatewayError::Provider {
            status: 500,
            message: "internal".into(),
        })]));

        let reply = relay.handle_message(USER, "hello").await;
        assert_eq!(reply, GATEWAY_MESSAGE);

        let history = relay.store.history(USER).await;
        assert_eq!(history, vec![ConversationEntry::user("hello")]);
    }

    #[tokio::test]
    async fn empty_completion_returns_generic_text() {
        let relay = relay_with(ScriptedGateway::new(vec![Err(GatewayError::EmptyResponse)]));

        let reply = relay.handle_message(USER, "hello").await;
        assert_eq!(reply, GATEWAY_MESSAGE);
    }

    #[tokio::test]
    async fn long_conversations_keep_the_ten_most_recent_exchanges() {
        let relay = relay_with(ScriptedGateway::echoing(25));

        for i in 1..=25 {
            relay.handle_message(USER, &format!("message {i}")).await;
        }

        let history = relay.store.history(USER).await;
        assert_eq!(history.len(), 20);
        assert_eq!(history[0], ConversationEntry::user("message 16"));
        assert_eq!(history[1], ConversationEntry::assistant("reply 16"));
        assert_eq!(history[18], ConversationEntry::user("message 25"));
        assert_eq!(history[19], ConversationEntry::assistant("reply 25"));
        for (i, entry) in history.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(entry.role, expected, "entry {i}");
        }
    }

    #[tokio::test]
    async fn clear_then_message_leaves_exactly_one_exchange() {
        let relay = relay_with(ScriptedGateway::echoing(4));

        for i in 1..=3 {
            relay.handle_message(USER, &format!("message {i}")).await;
        }
        relay.reset(USER).await;
        relay.handle_message(USER, "hello").await;

        let history = relay.store.history(USER).await;
        assert_eq!(
            history,
            vec![
                ConversationEntry::user("hello"),
                ConversationEntry::assistant("reply 4"),
            ]
        );
    }

    #[tokio::test]
    async fn failed_exchange_still_consumes_history_slots() {
        let relay = relay_with(ScriptedGateway::new(vec![
            Err(GatewayError::Provider {
                status: 502,
                message: "bad gateway".into(),
            }),
            Ok("recovered".into()),
        ]));

        relay.handle_message(USER, "first").await;
        relay.handle_message(USER, "second").await;

        let history = relay.store.history(USER).await;
        assert_eq!(
            history,
            vec![
                ConversationEntry::user("first"),
                ConversationEntry::user("second"),
                ConversationEntry::assistant("recovered"),
            ]
        );
    }
}
