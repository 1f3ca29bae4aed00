//! Messaging transports (Telegram).

pub mod telegram;
