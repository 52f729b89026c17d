//! Command detection and answer prompts.

use onair_core::chat::{ChatMessage, ChatPlatform};
use onair_core::generation::GenerationRequest;

/// Chat token that asks the station a question.
pub const TRIGGER: &str = "!pregunta";

/// Persona used for every chat answer.
pub const HOST_DIRECTIVE: &str =
    "Eres un locutor de radio amigable y entretenido, en español, conciso.";

/// Where a write-capable transport should post the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTarget {
    /// Transport to reply through.
    pub platform: ChatPlatform,
    /// Channel to post in.
    pub channel: String,
}

/// A viewer question extracted from chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Who asked.
    pub author: String,
    /// Present only when the originating transport can post replies.
    pub reply_target: Option<ReplyTarget>,
    /// The question with the trigger stripped. May be empty.
    pub question: String,
}

impl Command {
    /// Derives a command from `message`.
    ///
    /// Self-originated messages never produce a command.
    #[must_use]
    pub fn from_message(message: &ChatMessage, can_reply: bool) -> Option<Self> {
        if message.is_self {
            return None;
        }
        let question = parse_question(&message.text)?;
        Some(Self {
            author: message.author.clone(),
            reply_target: can_reply.then(|| ReplyTarget {
                platform: message.source,
                channel: message.channel.clone(),
            }),
            question,
        })
    }

    /// The generation request that answers this command.
    #[must_use]
    pub fn answer_request(&self) -> GenerationRequest {
        GenerationRequest::new(HOST_DIRECTIVE, format!("Responde a: {}", self.question))
    }

    /// Chat text posted back for `answer`.
    #[must_use]
    pub fn reply_text(&self, answer: &str) -> String {
        format!("@{} {answer}", self.author)
    }
}

/// Returns the question if `text` starts with the trigger as a whole word,
/// case-insensitively.
#[must_use]
pub fn parse_question(text: &str) -> Option<String> {
    let head = text.get(..TRIGGER.len())?;
    if !head.eq_ignore_ascii_case(TRIGGER) {
        return None;
    }
    let rest = &text[TRIGGER.len()..];
    if rest
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return None;
    }
    Some(rest.trim().to_owned())
}
