//! Test chat transport.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use onair_core::chat::{ChatMessage, ChatPlatform, ChatTransport};
use onair_core::error::ChatError;
use tokio::sync::mpsc;

/// A transport that replays a scripted inbox on `listen` and records replies.
#[derive(Debug)]
pub struct RecordingChatTransport {
    platform: ChatPlatform,
    can_reply: bool,
    inbox: Mutex<Vec<ChatMessage>>,
    replies: Mutex<Vec<(String, String)>>,
    fail_connect: bool,
    connect_delay: Duration,
    stay_open: bool,
    connected: AtomicBool,
}

impl RecordingChatTransport {
    /// A write-capable transport for `platform`.
    #[must_use]
    pub fn writable(platform: ChatPlatform) -> Self {
        Self {
            platform,
            can_reply: true,
            inbox: Mutex::new(Vec::new()),
            replies: Mutex::new(Vec::new()),
            fail_connect: false,
            connect_delay: Duration::ZERO,
            stay_open: false,
            connected: AtomicBool::new(false),
        }
    }

    /// A read-only transport for `platform`.
    #[must_use]
    pub fn read_only(platform: ChatPlatform) -> Self {
        Self {
            can_reply: false,
            ..Self::writable(platform)
        }
    }

    /// A transport whose `listen` fails immediately.
    #[must_use]
    pub fn unreachable(platform: ChatPlatform) -> Self {
        Self {
            fail_connect: true,
            ..Self::writable(platform)
        }
    }

    /// Spend `delay` connecting before succeeding or failing.
    #[must_use]
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        Self {
            connect_delay: delay,
            ..self
        }
    }

    /// Keep the connection open after the inbox is drained, until the
    /// receiving side goes away.
    #[must_use]
    pub fn staying_open(self) -> Self {
        Self {
            stay_open: true,
            ..self
        }
    }

    /// Queue messages to emit when `listen` is called.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_inbox(self, messages: Vec<ChatMessage>) -> Self {
        self.inbox.lock().unwrap().extend(messages);
        self
    }

    /// Returns every `(channel, text)` reply posted.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingChatTransport {
    fn platform(&self) -> ChatPlatform {
        self.platform
    }

    fn can_reply(&self) -> bool {
        self.can_reply
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn listen(&self, inbound: mpsc::Sender<ChatMessage>) -> Result<(), ChatError> {
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }
        if self.fail_connect {
            return Err(ChatError::Connect("authentication failed".into()));
        }
        self.connected.store(true, Ordering::SeqCst);
        let messages: Vec<ChatMessage> = self.inbox.lock().unwrap().drain(..).collect();
        for message in messages {
            if inbound.send(message).await.is_err() {
                break;
            }
        }
        if self.stay_open {
            inbound.closed().await;
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn reply(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        if !self.can_reply {
            return Err(ChatError::ReadOnly);
        }
        self.replies
            .lock()
            .unwrap()
            .push((channel.to_owned(), text.to_owned()));
        Ok(())
    }
}
