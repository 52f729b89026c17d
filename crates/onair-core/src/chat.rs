//! Chat transport port and the normalized message shape.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::ChatError;

/// Which chat surface a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatPlatform {
    /// Twitch IRC chat. Write-capable.
    Twitch,
    /// YouTube live chat. Read-only.
    YouTube,
}

impl fmt::Display for ChatPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Twitch => f.write_str("TWITCH"),
            Self::YouTube => f.write_str("YOUTUBE"),
        }
    }
}

/// A chat message normalized across transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Originating transport.
    pub source: ChatPlatform,
    /// Channel (Twitch) or live-chat id (YouTube).
    pub channel: String,
    /// Display name of the author.
    pub author: String,
    /// Raw message text.
    pub text: String,
    /// Whether the message was sent by this process's own identity.
    pub is_self: bool,
}

/// A live chat connection.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Which platform this transport speaks to.
    fn platform(&self) -> ChatPlatform;

    /// Whether [`ChatTransport::reply`] can post messages.
    fn can_reply(&self) -> bool;

    /// Whether the connection is established and delivering messages.
    fn is_connected(&self) -> bool;

    /// Connects and forwards every inbound message to `inbound` until the
    /// connection ends or the receiver is dropped.
    async fn listen(&self, inbound: mpsc::Sender<ChatMessage>) -> Result<(), ChatError>;

    /// Posts `text` to `channel`.
    async fn reply(&self, channel: &str, text: &str) -> Result<(), ChatError>;
}
