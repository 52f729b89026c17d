//! WebSocket connection to OBS Studio.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use onair_core::control::{ControlPlane, SceneItemId, SceneSource};
use onair_core::error::ControlPlaneError;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{
    self, Hello, OP_HELLO, OP_IDENTIFIED, OP_REQUEST_RESPONSE, RequestResponse,
    STATUS_RESOURCE_NOT_FOUND,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Waiters = Arc<Mutex<Option<HashMap<String, oneshot::Sender<RequestResponse>>>>>;

/// How long a single request may wait for its response.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where and how to reach OBS.
#[derive(Debug, Clone)]
pub struct ObsConfig {
    /// Host name or address.
    pub host: String,
    /// WebSocket server port.
    pub port: u16,
    /// Server password, if authentication is enabled.
    pub password: Option<String>,
}

impl ObsConfig {
    fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

/// A live, identified OBS WebSocket session.
///
/// Requests are correlated with responses by id, so calls may run
/// concurrently. Once the socket closes every call fails as unavailable.
pub struct ObsControlPlane {
    sink: AsyncMutex<SplitSink<Socket, Message>>,
    waiters: Waiters,
    reader: JoinHandle<()>,
}

impl ObsControlPlane {
    /// Connects, authenticates and identifies.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::Unavailable`] when OBS cannot be reached
    /// or rejects the handshake.
    pub async fn connect(config: &ObsConfig) -> Result<Self, ControlPlaneError> {
        let url = config.url();
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ControlPlaneError::Unavailable(format!("{url}: {e}")))?;
        let (mut sink, mut stream) = socket.split();

        let hello: Hello = protocol::payload(expect_op(&mut stream, OP_HELLO).await?)?;
        let authentication = match (hello.authentication, config.password.as_deref()) {
            (Some(auth), Some(password)) => Some(protocol::authentication_string(
                password,
                &auth.salt,
                &auth.challenge,
            )),
            (Some(_), None) => {
                return Err(ControlPlaneError::Unavailable(
                    "OBS requires a password but none is configured".into(),
                ));
            }
            (None, _) => None,
        };

        sink.send(Message::Text(protocol::identify_frame(authentication).into()))
            .await
            .map_err(|e| ControlPlaneError::Unavailable(e.to_string()))?;
        expect_op(&mut stream, OP_IDENTIFIED).await?;
        info!(
            %url,
            version = hello.obs_web_socket_version.as_deref().unwrap_or("unknown"),
            "connected to OBS"
        );

        let waiters: Waiters = Arc::new(Mutex::new(Some(HashMap::new())));
        let reader = tokio::spawn(read_responses(stream, Arc::clone(&waiters)));
        Ok(Self {
            sink: AsyncMutex::new(sink),
            waiters,
            reader,
        })
    }

    /// Whether the socket is still open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        lock(&self.waiters).is_some()
    }

    async fn call(&self, request_type: &str, data: Value) -> Result<Value, ControlPlaneError> {
        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        match lock(&self.waiters).as_mut() {
            Some(waiters) => waiters.insert(request_id.clone(), tx),
            None => return Err(disconnected()),
        };

        let frame = protocol::request_frame(request_type, &request_id, data);
        let sent = self.sink.lock().await.send(Message::Text(frame.into())).await;
        if let Err(e) = sent {
            self.forget(&request_id);
            return Err(ControlPlaneError::Unavailable(e.to_string()));
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(response)) => response.into_data(),
            Ok(Err(_)) => Err(disconnected()),
            Err(_) => {
                self.forget(&request_id);
                Err(ControlPlaneError::Unavailable(format!(
                    "{request_type} timed out after {}s",
                    REQUEST_TIMEOUT.as_secs()
                )))
            }
        }
    }

    fn forget(&self, request_id: &str) {
        if let Some(waiters) = lock(&self.waiters).as_mut() {
            waiters.remove(request_id);
        }
    }
}

impl Drop for ObsControlPlane {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl ControlPlane for ObsControlPlane {
    async fn scene_sources(&self, scene: &str) -> Result<Vec<SceneSource>, ControlPlaneError> {
        let data = self
            .call("GetSceneItemList", json!({ "sceneName": scene }))
            .await?;
        protocol::scene_sources(data)
    }

    async fn set_source_enabled(
        &self,
        scene: &str,
        item_id: SceneItemId,
        enabled: bool,
    ) -> Result<(), ControlPlaneError> {
        let result = self
            .call(
                "SetSceneItemEnabled",
                json!({
                    "sceneName": scene,
                    "sceneItemId": item_id,
                    "sceneItemEnabled": enabled,
                }),
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(ControlPlaneError::Request { code, .. }) if code == STATUS_RESOURCE_NOT_FOUND => {
                Err(ControlPlaneError::UnknownItem {
                    scene: scene.to_owned(),
                    item_id,
                })
            }
            Err(e) => Err(e),
        }
    }
}

fn lock(
    waiters: &Waiters,
) -> MutexGuard<'_, Option<HashMap<String, oneshot::Sender<RequestResponse>>>> {
    waiters.lock().unwrap_or_else(PoisonError::into_inner)
}

fn disconnected() -> ControlPlaneError {
    ControlPlaneError::Unavailable("OBS connection closed".into())
}

async fn expect_op(
    stream: &mut SplitStream<Socket>,
    op: u8,
) -> Result<protocol::Envelope, ControlPlaneError> {
    while let Some(frame) = stream.next().await {
        match frame.map_err(|e| ControlPlaneError::Unavailable(e.to_string()))? {
            Message::Text(text) => {
                let envelope = protocol::decode(text.as_str())?;
                if envelope.op == op {
                    return Ok(envelope);
                }
                debug!(op = envelope.op, expected = op, "skipping frame during handshake");
            }
            Message::Close(frame) => {
                let reason = frame.map(|f| f.reason.as_str().to_owned()).unwrap_or_default();
                return Err(ControlPlaneError::Unavailable(format!(
                    "OBS closed the handshake: {reason}"
                )));
            }
            _ => {}
        }
    }
    Err(disconnected())
}

async fn read_responses(mut stream: SplitStream<Socket>, waiters: Waiters) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let envelope = match protocol::decode(text.as_str()) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!(error = %e, "unreadable OBS frame");
                        continue;
                    }
                };
                if envelope.op != OP_REQUEST_RESPONSE {
                    continue;
                }
                match protocol::payload::<RequestResponse>(envelope) {
                    Ok(response) => {
                        let waiter = lock(&waiters)
                            .as_mut()
                            .and_then(|w| w.remove(&response.request_id));
                        if let Some(waiter) = waiter {
                            let _ = waiter.send(response);
                        }
                    }
                    Err(e) => warn!(error = %e, "unreadable OBS response"),
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "OBS connection error");
                break;
            }
        }
    }
    warn!("OBS connection closed");
    // Dropping the map fails every outstanding call.
    lock(&waiters).take();
}
