//! YouTube live chat via the Data API polling endpoint.
//!
//! Read-only: the API key grants no write scope, so replies are refused.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use onair_core::chat::{ChatMessage, ChatPlatform, ChatTransport};
use onair_core::error::ChatError;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Public Data API root.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
/// Lower bound on the wait between polls, whatever the API suggests.
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Connection settings for the YouTube transport.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    /// Data API key.
    pub api_key: String,
    /// Live chat to follow.
    pub live_chat_id: String,
    /// API root, overridable for tests.
    pub base_url: String,
}

impl YouTubeConfig {
    /// Settings for the public Data API.
    #[must_use]
    pub fn new(api_key: String, live_chat_id: String) -> Self {
        Self {
            api_key,
            live_chat_id,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveChatPage {
    next_page_token: Option<String>,
    polling_interval_millis: Option<u64>,
    #[serde(default)]
    items: Vec<LiveChatItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveChatItem {
    snippet: Snippet,
    author_details: AuthorDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    display_message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorDetails {
    display_name: String,
}

impl LiveChatPage {
    fn parse(body: &str) -> Result<Self, ChatError> {
        serde_json::from_str(body).map_err(|e| ChatError::Api {
            status: 200,
            message: format!("unreadable live chat page: {e}"),
        })
    }

    fn poll_interval(&self) -> Duration {
        self.polling_interval_millis
            .map_or(MIN_POLL_INTERVAL, Duration::from_millis)
            .max(MIN_POLL_INTERVAL)
    }

    fn into_messages(self, live_chat_id: &str) -> Vec<ChatMessage> {
        self.items
            .into_iter()
            .filter_map(|item| {
                let text = item.snippet.display_message?;
                Some(ChatMessage {
                    source: ChatPlatform::YouTube,
                    channel: live_chat_id.to_owned(),
                    author: item.author_details.display_name,
                    text,
                    is_self: false,
                })
            })
            .collect()
    }
}

/// Read-only YouTube live chat transport.
pub struct YouTubeTransport {
    config: YouTubeConfig,
    client: Client,
    connected: AtomicBool,
}

impl YouTubeTransport {
    /// Creates a transport with its own HTTP client.
    #[must_use]
    pub fn new(config: YouTubeConfig) -> Self {
        Self {
            config,
            client: Client::new(),
            connected: AtomicBool::new(false),
        }
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<LiveChatPage, ChatError> {
        let url = format!("{}/liveChat/messages", self.config.base_url);
        let mut query = vec![
            ("liveChatId", self.config.live_chat_id.as_str()),
            ("part", "snippet,authorDetails"),
            ("key", self.config.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ChatError::Connect(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Connect(e.to_string()))?;
        if !status.is_success() {
            return Err(ChatError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        LiveChatPage::parse(&body)
    }
}

#[async_trait]
impl ChatTransport for YouTubeTransport {
    fn platform(&self) -> ChatPlatform {
        ChatPlatform::YouTube
    }

    fn can_reply(&self) -> bool {
        false
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn listen(&self, inbound: mpsc::Sender<ChatMessage>) -> Result<(), ChatError> {
        let backlog = self.fetch_page(None).await?;
        self.connected.store(true, Ordering::SeqCst);
        info!(live_chat_id = %self.config.live_chat_id, "youtube polling started");
        debug!(skipped = backlog.items.len(), "skipping live chat backlog");
        let mut wait = backlog.poll_interval();
        let mut page_token = backlog.next_page_token;

        loop {
            tokio::time::sleep(wait).await;
            let page = match self.fetch_page(page_token.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, retry_in = ?wait, "live chat poll failed");
                    continue;
                }
            };
            wait = page.poll_interval();
            page_token.clone_from(&page.next_page_token);

            for message in page.into_messages(&self.config.live_chat_id) {
                if inbound.send(message).await.is_err() {
                    self.connected.store(false, Ordering::SeqCst);
                    return Ok(());
                }
            }
        }
    }

    async fn reply(&self, _channel: &str, _text: &str) -> Result<(), ChatError> {
        Err(ChatError::ReadOnly)
    }
}
