//! Twitch chat over IRC.
//!
//! Speaks the IRC protocol Twitch exposes over a TLS WebSocket, with the
//! `tags` capability so display names are available. Each frame carries one
//! or more IRC lines.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use onair_core::chat::{ChatMessage, ChatPlatform, ChatTransport};
use onair_core::error::ChatError;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default Twitch IRC endpoint.
pub const DEFAULT_URL: &str = "wss://irc-ws.chat.twitch.tv:443";
/// Hosts that may be reached without TLS.
const LOOPBACK_URLS: [&str; 3] = ["ws://127.0.0.1", "ws://localhost", "ws://[::1]"];
/// Longest chat message Twitch accepts.
const MAX_MESSAGE_CHARS: usize = 500;

/// Connection settings for the Twitch transport.
#[derive(Debug, Clone)]
pub struct TwitchConfig {
    /// Bot account login.
    pub username: String,
    /// OAuth token, with or without the `oauth:` prefix.
    pub oauth_token: String,
    /// Channels to join, with or without `#`.
    pub channels: Vec<String>,
    /// IRC WebSocket endpoint. Must be `wss://` unless it is a loopback address.
    pub url: String,
}

impl TwitchConfig {
    /// Settings for the public Twitch endpoint.
    #[must_use]
    pub fn new(username: String, oauth_token: String, channels: Vec<String>) -> Self {
        Self {
            username,
            oauth_token,
            channels,
            url: DEFAULT_URL.to_owned(),
        }
    }
}

/// One parsed server line we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrcEvent {
    /// Keep-alive that must be answered with `PONG`.
    Ping(String),
    /// A chat message.
    Privmsg {
        /// Login of the sender.
        login: String,
        /// `display-name` tag, if present and non-empty.
        display_name: Option<String>,
        /// Channel, including `#`.
        channel: String,
        /// Message text.
        text: String,
    },
    /// The server rejected our credentials.
    LoginFailed(String),
}

/// Parses one IRC line. Returns `None` for lines the transport ignores.
#[must_use]
pub fn parse_line(line: &str) -> Option<IrcEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (tags, rest) = match line.strip_prefix('@') {
        Some(tagged) => {
            let (raw_tags, rest) = tagged.split_once(' ')?;
            (parse_tags(raw_tags), rest)
        }
        None => (HashMap::new(), line),
    };

    if let Some(token) = rest.strip_prefix("PING ") {
        return Some(IrcEvent::Ping(token.trim_start_matches(':').to_owned()));
    }

    let (prefix, rest) = match rest.strip_prefix(':') {
        Some(prefixed) => prefixed.split_once(' ')?,
        None => ("", rest),
    };
    let (verb, params) = rest.split_once(' ').unwrap_or((rest, ""));

    match verb {
        "PRIVMSG" => {
            let (channel, text) = params.split_once(" :")?;
            let login = prefix.split('!').next().unwrap_or_default().to_owned();
            let display_name = tags
                .get("display-name")
                .filter(|name| !name.is_empty())
                .cloned();
            Some(IrcEvent::Privmsg {
                login,
                display_name,
                channel: channel.to_owned(),
                text: text.to_owned(),
            })
        }
        "NOTICE" => {
            let (_, notice) = params.split_once(" :")?;
            let lowered = notice.to_ascii_lowercase();
            (lowered.contains("login authentication failed")
                || lowered.contains("improperly formatted auth"))
            .then(|| IrcEvent::LoginFailed(notice.to_owned()))
        }
        _ => None,
    }
}

fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key.to_owned(), unescape_tag(value))
        })
        .collect()
}

fn unescape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some(':') => out.push(';'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn channel_name(channel: &str) -> String {
    let trimmed = channel.trim();
    if trimmed.starts_with('#') {
        trimmed.to_ascii_lowercase()
    } else {
        format!("#{}", trimmed.to_ascii_lowercase())
    }
}

/// Flattens `text` onto one line and caps it at Twitch's length limit.
fn sanitize_outgoing(text: &str) -> String {
    text.split(['\r', '\n'])
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_MESSAGE_CHARS)
        .collect()
}

/// Refuses endpoints that would carry the OAuth token in cleartext.
fn require_tls(url: &str) -> Result<(), ChatError> {
    if url.starts_with("wss://") {
        return Ok(());
    }
    let loopback = LOOPBACK_URLS.iter().any(|prefix| {
        url.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([':', '/']))
    });
    if loopback {
        Ok(())
    } else {
        Err(ChatError::Connect(format!(
            "refusing to send credentials to {url} without TLS"
        )))
    }
}

/// Write-capable Twitch chat transport.
pub struct TwitchTransport {
    config: TwitchConfig,
    writer: Mutex<Option<SplitSink<Socket, Message>>>,
    connected: AtomicBool,
}

impl TwitchTransport {
    /// Creates an unconnected transport.
    #[must_use]
    pub fn new(config: TwitchConfig) -> Self {
        Self {
            config,
            writer: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    async fn send_raw(&self, line: &str) -> Result<(), ChatError> {
        let mut writer = self.writer.lock().await;
        let Some(writer) = writer.as_mut() else {
            return Err(ChatError::Connect("not connected".into()));
        };
        writer
            .send(Message::Text(line.to_owned().into()))
            .await
            .map_err(|e| ChatError::Connect(e.to_string()))
    }

    async fn session(&self, inbound: mpsc::Sender<ChatMessage>) -> Result<(), ChatError> {
        let (socket, _) = connect_async(self.config.url.as_str())
            .await
            .map_err(|e| ChatError::Connect(format!("{}: {e}", self.config.url)))?;
        let (writer, mut frames) = socket.split();
        *self.writer.lock().await = Some(writer);

        let token = if self.config.oauth_token.starts_with("oauth:") {
            self.config.oauth_token.clone()
        } else {
            format!("oauth:{}", self.config.oauth_token)
        };
        self.send_raw("CAP REQ :twitch.tv/tags").await?;
        self.send_raw(&format!("PASS {token}")).await?;
        self.send_raw(&format!("NICK {}", self.config.username.to_ascii_lowercase()))
            .await?;
        for channel in &self.config.channels {
            self.send_raw(&format!("JOIN {}", channel_name(channel))).await?;
        }
        self.connected.store(true, Ordering::SeqCst);
        info!(channels = ?self.config.channels, "twitch connected");

        'frames: loop {
            let text = match frames.next().await {
                None | Some(Ok(Message::Close(_))) => break Ok(()),
                Some(Ok(Message::Text(text))) => text,
                Some(Ok(_)) => continue,
                Some(Err(e)) => break Err(ChatError::Connect(e.to_string())),
            };
            for line in text.as_str().lines().filter(|line| !line.is_empty()) {
                match parse_line(line) {
                    Some(IrcEvent::Ping(token)) => {
                        self.send_raw(&format!("PONG :{token}")).await?;
                    }
                    Some(IrcEvent::LoginFailed(notice)) => {
                        break 'frames Err(ChatError::Connect(notice));
                    }
                    Some(event) => {
                        let Some(message) = self.to_message(event) else {
                            continue;
                        };
                        if inbound.send(message).await.is_err() {
                            break 'frames Ok(());
                        }
                    }
                    None => debug!(%line, "ignored irc line"),
                }
            }
        }
    }

    fn to_message(&self, event: IrcEvent) -> Option<ChatMessage> {
        let IrcEvent::Privmsg {
            login,
            display_name,
            channel,
            text,
        } = event
        else {
            return None;
        };
        let is_self = login.eq_ignore_ascii_case(&self.config.username);
        Some(ChatMessage {
            source: ChatPlatform::Twitch,
            channel,
            author: display_name.unwrap_or(login),
            text,
            is_self,
        })
    }
}

#[async_trait]
impl ChatTransport for TwitchTransport {
    fn platform(&self) -> ChatPlatform {
        ChatPlatform::Twitch
    }

    fn can_reply(&self) -> bool {
        true
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn listen(&self, inbound: mpsc::Sender<ChatMessage>) -> Result<(), ChatError> {
        require_tls(&self.config.url)?;
        let result = self.session(inbound).await;
        self.connected.store(false, Ordering::SeqCst);
        *self.writer.lock().await = None;
        result
    }

    async fn reply(&self, channel: &str, text: &str) -> Result<(), ChatError> {
        self.send_raw(&format!(
            "PRIVMSG {} :{}",
            channel_name(channel),
            sanitize_outgoing(text)
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use super::*;

    #[test]
    fn test_parse_privmsg_with_display_name_tag() {
        let line = "@badge-info=;color=#FF0000;display-name=Ana\\sMaría;mod=0 \
                    :ana!ana@ana.tmi.twitch.tv PRIVMSG #radio :!pregunta hola :)\r\n";

        let event = parse_line(line);

        assert_eq!(
            event,
            Some(IrcEvent::Privmsg {
                login: "ana".into(),
                display_name: Some("Ana María".into()),
                channel: "#radio".into(),
                text: "!pregunta hola :)".into(),
            })
        );
    }

    #[test]
    fn test_parse_privmsg_without_tags_falls_back_to_login() {
        let event = parse_line(":bob!bob@bob.tmi.twitch.tv PRIVMSG #radio :hola");

        assert!(matches!(
            event,
            Some(IrcEvent::Privmsg { ref login, display_name: None, .. }) if login == "bob"
        ));
    }

    #[test]
    fn test_parse_ping() {
        assert_eq!(
            parse_line("PING :tmi.twitch.tv"),
            Some(IrcEvent::Ping("tmi.twitch.tv".into()))
        );
    }

    #[test]
    fn test_parse_login_failure_notice() {
        let event = parse_line(":tmi.twitch.tv NOTICE * :Login authentication failed");
        assert!(matches!(event, Some(IrcEvent::LoginFailed(_))));
    }

    #[test]
    fn test_parse_ignores_membership_noise() {
        assert_eq!(parse_line(":tmi.twitch.tv 001 bot :Welcome, GLHF!"), None);
        assert_eq!(parse_line(":bot!bot@bot.tmi.twitch.tv JOIN #radio"), None);
    }

    #[test]
    fn test_own_login_is_flagged_self() {
        let transport = TwitchTransport::new(TwitchConfig::new(
            "RadioBot".into(),
            "token".into(),
            vec!["radio".into()],
        ));
        let event =
            parse_line(":radiobot!radiobot@radiobot.tmi.twitch.tv PRIVMSG #radio :hola").unwrap();

        let message = transport.to_message(event).unwrap();

        assert!(message.is_self);
        assert_eq!(message.source, ChatPlatform::Twitch);
    }

    #[test]
    fn test_channel_name_normalizes_prefix_and_case() {
        assert_eq!(channel_name("Radio"), "#radio");
        assert_eq!(channel_name("#radio"), "#radio");
    }

    #[test]
    fn test_outgoing_text_is_single_line_and_capped() {
        let long = format!("línea uno\r\nlínea dos\n{}", "x".repeat(600));

        let sanitized = sanitize_outgoing(&long);

        assert!(!sanitized.contains('\n'));
        assert!(sanitized.starts_with("línea uno línea dos "));
        assert_eq!(sanitized.chars().count(), MAX_MESSAGE_CHARS);
    }

    #[tokio::test]
    async fn test_reply_before_connect_fails() {
        let transport = TwitchTransport::new(TwitchConfig::new(
            "bot".into(),
            "token".into(),
            vec![],
        ));

        let result = transport.reply("#radio", "hola").await;

        assert!(matches!(result, Err(ChatError::Connect(_))));
    }

    #[test]
    fn test_default_endpoint_uses_tls() {
        let config = TwitchConfig::new("bot".into(), "token".into(), vec![]);

        assert!(config.url.starts_with("wss://"));
        assert!(require_tls(&config.url).is_ok());
    }

    #[test]
    fn test_plaintext_is_only_allowed_on_loopback() {
        assert!(require_tls("ws://127.0.0.1:4000").is_ok());
        assert!(require_tls("ws://localhost").is_ok());
        assert!(require_tls("ws://irc-ws.chat.twitch.tv:80").is_err());
        assert!(require_tls("ws://127.0.0.1.example.com").is_err());
    }

    #[tokio::test]
    async fn test_listen_refuses_plaintext_remote_endpoint() {
        // Arrange
        let mut config = TwitchConfig::new("bot".into(), "token".into(), vec!["radio".into()]);
        config.url = "ws://irc-ws.chat.twitch.tv:80".into();
        let transport = TwitchTransport::new(config);
        let (inbound, _messages) = mpsc::channel(1);

        // Act
        let result = transport.listen(inbound).await;

        // Assert
        assert!(matches!(result, Err(ChatError::Connect(ref reason)) if reason.contains("TLS")));
    }

    #[tokio::test]
    async fn test_listen_logs_in_answers_ping_and_forwards_chat() {
        // Arrange
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config =
            TwitchConfig::new("RadioBot".into(), "secreto".into(), vec!["Radio".into()]);
        config.url = format!("ws://{}", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            let mut received = Vec::new();
            while received.len() < 4 {
                let Some(Ok(Message::Text(line))) = ws.next().await else {
                    break;
                };
                received.push(line.as_str().to_owned());
            }
            let burst = "PING :tmi.twitch.tv\r\n\
                         :ana!ana@ana.tmi.twitch.tv PRIVMSG #radio :!pregunta hola\r\n";
            ws.send(Message::Text(burst.to_owned().into())).await.unwrap();
            if let Some(Ok(Message::Text(pong))) = ws.next().await {
                received.push(pong.as_str().to_owned());
            }
            received
        });
        let transport = Arc::new(TwitchTransport::new(config));
        let (inbound, mut messages) = mpsc::channel(8);

        // Act
        let listener_task = tokio::spawn({
            let transport = Arc::clone(&transport);
            async move { transport.listen(inbound).await }
        });
        let wait = Duration::from_secs(5);
        let message = tokio::time::timeout(wait, messages.recv()).await.unwrap().unwrap();
        let connected = transport.is_connected();
        let received = tokio::time::timeout(wait, server).await.unwrap().unwrap();
        listener_task.abort();

        // Assert
        assert_eq!(
            received,
            vec![
                "CAP REQ :twitch.tv/tags",
                "PASS oauth:secreto",
                "NICK radiobot",
                "JOIN #radio",
                "PONG :tmi.twitch.tv",
            ]
        );
        assert_eq!(message.author, "ana");
        assert_eq!(message.text, "!pregunta hola");
        assert!(!message.is_self);
        assert!(connected);
    }
}
