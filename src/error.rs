//! Top-level error types for relaybot.

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error enum wrapping domain-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration loading errors. All are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingKey(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Completion gateway call errors, classified so the orchestrator can pick
/// a user-facing message by kind instead of inspecting provider payloads.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The provider rejected the request for quota or rate-limit reasons.
    #[error("completion quota exhausted: {0}")]
    Quota(String),

    /// The provider answered with a non-success status.
    #[error("provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    /// The request never produced a usable HTTP response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered OK but returned no completion text.
    #[error("provider returned an empty completion")]
    EmptyResponse,
}
