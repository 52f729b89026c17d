//! The Chat Ingestion Hub.

use std::collections::HashMap;
use std::sync::Arc;

use onair_core::chat::{ChatMessage, ChatPlatform, ChatTransport};
use onair_core::error::{ChatError, GenerationError};
use onair_core::generation::TextGenerator;
use onair_speech::channel::{SpeechChannel, SpeechError};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::domain::command::Command;

const INBOUND_CAPACITY: usize = 256;

/// How an answered command was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Posted as a chat reply.
    ChatReply,
    /// Spoken on air.
    OnAir,
}

/// Why a command went unanswered.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// The answer could not be generated.
    #[error("answer generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Posting the reply failed.
    #[error("chat reply failed: {0}")]
    Reply(#[from] ChatError),

    /// Speaking the answer failed.
    #[error("on-air answer failed: {0}")]
    Speech(#[from] SpeechError),

    /// No transport is registered for the reply target.
    #[error("no transport for {0}")]
    NoTransport(ChatPlatform),
}

/// Fans in every transport's messages and answers commands.
pub struct ChatHub {
    generator: Arc<dyn TextGenerator>,
    speech: SpeechChannel,
    transports: HashMap<ChatPlatform, Arc<dyn ChatTransport>>,
}

impl ChatHub {
    /// Creates a hub over the configured transports. An empty list is valid.
    #[must_use]
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        speech: SpeechChannel,
        transports: Vec<Arc<dyn ChatTransport>>,
    ) -> Self {
        let transports = transports
            .into_iter()
            .map(|transport| (transport.platform(), transport))
            .collect();
        Self {
            generator,
            speech,
            transports,
        }
    }

    /// Transports that are connected right now.
    #[must_use]
    pub fn active_transports(&self) -> usize {
        self.transports
            .values()
            .filter(|transport| transport.is_connected())
            .count()
    }

    /// Starts every transport's listen loop and the dispatcher.
    ///
    /// Returns the dispatcher's handle. It finishes once every transport has
    /// stopped and every in-progress answer has completed.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let (inbound, mut messages) = mpsc::channel(INBOUND_CAPACITY);

        if self.transports.is_empty() {
            info!("no chat transports configured");
        }
        for transport in self.transports.values() {
            let transport = Arc::clone(transport);
            let inbound = inbound.clone();
            tokio::spawn(async move {
                let platform = transport.platform();
                info!(%platform, "chat transport connecting");
                match transport.listen(inbound).await {
                    Ok(()) => info!(%platform, "chat transport stopped"),
                    Err(e) => error!(%platform, error = %e, "chat transport inactive"),
                }
            });
        }
        drop(inbound);

        tokio::spawn(async move {
            let mut handlers = JoinSet::new();
            loop {
                tokio::select! {
                    next = messages.recv() => {
                        let Some(message) = next else { break };
                        let hub = Arc::clone(&self);
                        handlers.spawn(async move { hub.handle_message(message).await; });
                    }
                    Some(finished) = handlers.join_next(), if !handlers.is_empty() => {
                        log_handler_exit(&finished);
                    }
                }
            }
            while let Some(finished) = handlers.join_next().await {
                log_handler_exit(&finished);
            }
            debug!("chat dispatcher stopped");
        })
    }

    /// Handles one inbound message. Returns the delivery if it was a command
    /// that got answered.
    pub async fn handle_message(&self, message: ChatMessage) -> Option<Delivery> {
        if message.is_self {
            debug!(platform = %message.source, "ignoring own message");
            return None;
        }
        info!(
            platform = %message.source,
            channel = %message.channel,
            author = %message.author,
            "[{}:{}] <{}> {}",
            message.source,
            message.channel,
            message.author,
            message.text
        );

        let can_reply = self
            .transports
            .get(&message.source)
            .is_some_and(|transport| transport.can_reply());
        let command = Command::from_message(&message, can_reply)?;

        match self.answer(&command).await {
            Ok(delivery) => {
                info!(author = %command.author, ?delivery, "question answered");
                Some(delivery)
            }
            Err(e) => {
                warn!(author = %command.author, error = %e, "question unanswered");
                None
            }
        }
    }

    async fn answer(&self, command: &Command) -> Result<Delivery, AnswerError> {
        let answer = self.generator.generate(&command.answer_request()).await?;

        match &command.reply_target {
            Some(target) => {
                let transport = self
                    .transports
                    .get(&target.platform)
                    .ok_or(AnswerError::NoTransport(target.platform))?;
                transport
                    .reply(&target.channel, &command.reply_text(&answer))
                    .await?;
                Ok(Delivery::ChatReply)
            }
            None => {
                self.speech.submit(answer).await?;
                Ok(Delivery::OnAir)
            }
        }
    }
}

fn log_handler_exit(finished: &Result<(), tokio::task::JoinError>) {
    if let Err(e) = finished {
        error!(error = %e, "chat handler crashed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use onair_control::application::arbiter::ControlArbiter;
    use onair_control::domain::source::SourceKey;
    use onair_core::chat::{ChatMessage, ChatPlatform, ChatTransport};
    use onair_core::synthesis::AudioFormat;
    use onair_speech::channel::{SpeechChannel, SpeechConfig};
    use onair_test_support::{
        FailingTextGenerator, RecordingChatTransport, RecordingControlPlane, RecordingSynthesizer,
        RecordingVoiceSink, ScriptedTextGenerator,
    };

    use super::{ChatHub, Delivery};

    struct Fixture {
        generator: Arc<ScriptedTextGenerator>,
        synthesizer: Arc<RecordingSynthesizer>,
        speech: SpeechChannel,
    }

    fn fixture() -> Fixture {
        let generator = Arc::new(ScriptedTextGenerator::new("Son las diez"));
        let synthesizer = Arc::new(RecordingSynthesizer::new());
        let plane = Arc::new(RecordingControlPlane::new().with_source("Radio", 3, "Voz"));
        let config = SpeechConfig {
            voice_source: SourceKey::new("Radio", "Voz"),
            duck_source: None,
            voice_profile: "alloy".into(),
            format: AudioFormat::Mp3,
            language: "es".into(),
            words_per_minute: 0,
            queue_capacity: 8,
        };
        let (speech, _) = SpeechChannel::spawn(
            config,
            synthesizer.clone(),
            Arc::new(RecordingVoiceSink::new()),
            Arc::new(ControlArbiter::new(plane)),
        );
        Fixture {
            generator,
            synthesizer,
            speech,
        }
    }

    fn message(source: ChatPlatform, text: &str, is_self: bool) -> ChatMessage {
        ChatMessage {
            source,
            channel: "#radio".into(),
            author: "ana".into(),
            text: text.into(),
            is_self,
        }
    }

    #[tokio::test]
    async fn test_question_on_write_capable_transport_is_replied_in_chat() {
        // Arrange
        let f = fixture();
        let twitch = Arc::new(RecordingChatTransport::writable(ChatPlatform::Twitch));
        let hub = ChatHub::new(
            f.generator.clone(),
            f.speech.clone(),
            vec![twitch.clone() as Arc<dyn ChatTransport>],
        );

        // Act
        let delivery = hub
            .handle_message(message(ChatPlatform::Twitch, "!pregunta what time is it", false))
            .await;

        // Assert
        assert_eq!(delivery, Some(Delivery::ChatReply));
        assert_eq!(
            twitch.replies(),
            vec![("#radio".to_owned(), "@ana Son las diez".to_owned())]
        );
        let requests = f.generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].user_prompt, "Responde a: what time is it");
        assert!(f.synthesizer.texts().is_empty());
    }

    #[tokio::test]
    async fn test_question_on_read_only_transport_goes_on_air() {
        // Arrange
        let f = fixture();
        let youtube = Arc::new(RecordingChatTransport::read_only(ChatPlatform::YouTube));
        let hub = ChatHub::new(
            f.generator.clone(),
            f.speech.clone(),
            vec![youtube.clone() as Arc<dyn ChatTransport>],
        );

        // Act
        let delivery = hub
            .handle_message(message(ChatPlatform::YouTube, "!pregunta what time is it", false))
            .await;

        // Assert
        assert_eq!(delivery, Some(Delivery::OnAir));
        assert!(youtube.replies().is_empty());
        assert_eq!(f.synthesizer.texts(), vec!["Son las diez".to_owned()]);
        assert_eq!(f.generator.requests()[0].user_prompt, "Responde a: what time is it");
    }

    #[tokio::test]
    async fn test_self_messages_are_discarded_on_every_transport() {
        // Arrange
        let f = fixture();
        let twitch = Arc::new(RecordingChatTransport::writable(ChatPlatform::Twitch));
        let youtube = Arc::new(RecordingChatTransport::read_only(ChatPlatform::YouTube));
        let transports: Vec<Arc<dyn ChatTransport>> = vec![twitch.clone(), youtube.clone()];
        let hub = ChatHub::new(f.generator.clone(), f.speech.clone(), transports);

        // Act
        let from_twitch = hub
            .handle_message(message(ChatPlatform::Twitch, "!pregunta eco", true))
            .await;
        let from_youtube = hub
            .handle_message(message(ChatPlatform::YouTube, "!pregunta eco", true))
            .await;

        // Assert
        assert_eq!(from_twitch, None);
        assert_eq!(from_youtube, None);
        assert!(f.generator.requests().is_empty());
        assert!(twitch.replies().is_empty());
    }

    #[tokio::test]
    async fn test_plain_chat_is_not_answered() {
        let f = fixture();
        let hub = ChatHub::new(f.generator.clone(), f.speech.clone(), vec![]);

        let delivery = hub
            .handle_message(message(ChatPlatform::YouTube, "hola a todos", false))
            .await;

        assert_eq!(delivery, None);
        assert!(f.generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_question_is_still_answered() {
        let f = fixture();
        let twitch = Arc::new(RecordingChatTransport::writable(ChatPlatform::Twitch));
        let hub = ChatHub::new(
            f.generator.clone(),
            f.speech.clone(),
            vec![twitch.clone() as Arc<dyn ChatTransport>],
        );

        let delivery = hub
            .handle_message(message(ChatPlatform::Twitch, "!pregunta", false))
            .await;

        assert_eq!(delivery, Some(Delivery::ChatReply));
        assert_eq!(f.generator.requests()[0].user_prompt, "Responde a: ");
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_command_unanswered() {
        // Arrange
        let f = fixture();
        let twitch = Arc::new(RecordingChatTransport::writable(ChatPlatform::Twitch));
        let hub = ChatHub::new(
            Arc::new(FailingTextGenerator),
            f.speech.clone(),
            vec![twitch.clone() as Arc<dyn ChatTransport>],
        );

        // Act
        let delivery = hub
            .handle_message(message(ChatPlatform::Twitch, "!pregunta hola", false))
            .await;

        // Assert
        assert_eq!(delivery, None);
        assert!(twitch.replies().is_empty());
    }

    #[tokio::test]
    async fn test_start_serves_live_transports_despite_one_failing_to_connect() {
        // Arrange
        let f = fixture();
        let twitch = Arc::new(RecordingChatTransport::unreachable(ChatPlatform::Twitch));
        let youtube = Arc::new(
            RecordingChatTransport::read_only(ChatPlatform::YouTube).with_inbox(vec![
                message(ChatPlatform::YouTube, "hola", false),
                message(ChatPlatform::YouTube, "!pregunta ¿qué suena?", false),
            ]),
        );
        let transports: Vec<Arc<dyn ChatTransport>> = vec![twitch, youtube];
        let hub = Arc::new(ChatHub::new(f.generator.clone(), f.speech.clone(), transports));

        // Act
        Arc::clone(&hub).start().await.unwrap();

        // Assert
        assert_eq!(f.generator.requests().len(), 1);
        assert_eq!(f.synthesizer.texts(), vec!["Son las diez".to_owned()]);
        assert_eq!(hub.active_transports(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_counts_as_active_only_once_connected() {
        // Arrange
        let f = fixture();
        let twitch = Arc::new(
            RecordingChatTransport::unreachable(ChatPlatform::Twitch)
                .with_connect_delay(Duration::from_secs(10)),
        );
        let youtube =
            Arc::new(RecordingChatTransport::read_only(ChatPlatform::YouTube).staying_open());
        let transports: Vec<Arc<dyn ChatTransport>> = vec![twitch, youtube];
        let hub = Arc::new(ChatHub::new(f.generator.clone(), f.speech.clone(), transports));

        // Act
        let dispatcher = Arc::clone(&hub).start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let while_connecting = hub.active_transports();
        tokio::time::sleep(Duration::from_secs(20)).await;
        let after_failure = hub.active_transports();
        dispatcher.abort();

        // Assert
        assert_eq!(while_connecting, 1);
        assert_eq!(after_failure, 1);
    }
}
