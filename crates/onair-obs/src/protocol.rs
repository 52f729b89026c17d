//! OBS WebSocket v5 message shapes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use onair_core::control::SceneSource;
use onair_core::error::ControlPlaneError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

/// Negotiated RPC version.
pub const RPC_VERSION: u32 = 1;

/// Server greeting.
pub const OP_HELLO: u8 = 0;
/// Client identification.
pub const OP_IDENTIFY: u8 = 1;
/// Server accepted identification.
pub const OP_IDENTIFIED: u8 = 2;
/// Client request.
pub const OP_REQUEST: u8 = 6;
/// Server response to a request.
pub const OP_REQUEST_RESPONSE: u8 = 7;

/// Status code OBS uses when a requested resource does not exist.
pub const STATUS_RESOURCE_NOT_FOUND: u16 = 600;

/// Every frame is `{ "op": ..., "d": ... }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    /// Opcode.
    pub op: u8,
    /// Opcode-specific payload.
    pub d: Value,
}

/// Authentication parameters announced in `Hello`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthChallenge {
    /// Per-session challenge.
    pub challenge: String,
    /// Per-password salt.
    pub salt: String,
}

/// `Hello` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    /// Server version string.
    #[serde(default)]
    pub obs_web_socket_version: Option<String>,
    /// Present when the server requires a password.
    #[serde(default)]
    pub authentication: Option<AuthChallenge>,
}

/// Outcome carried by every `RequestResponse`.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestStatus {
    /// Whether the request succeeded.
    pub result: bool,
    /// Status code.
    pub code: u16,
    /// Human-readable failure detail.
    #[serde(default)]
    pub comment: Option<String>,
}

/// `RequestResponse` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    /// Request type being answered.
    pub request_type: String,
    /// Correlates with the request's id.
    pub request_id: String,
    /// Outcome.
    pub request_status: RequestStatus,
    /// Response body, if any.
    #[serde(default)]
    pub response_data: Option<Value>,
}

impl RequestResponse {
    /// Converts a failed status into [`ControlPlaneError::Request`].
    ///
    /// # Errors
    ///
    /// Returns the request failure when `result` is false.
    pub fn into_data(self) -> Result<Value, ControlPlaneError> {
        if !self.request_status.result {
            return Err(ControlPlaneError::Request {
                request: self.request_type,
                code: self.request_status.code,
                message: self.request_status.comment.unwrap_or_default(),
            });
        }
        Ok(self.response_data.unwrap_or(Value::Null))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneItemList {
    #[serde(default)]
    scene_items: Vec<SceneItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneItem {
    scene_item_id: i64,
    source_name: String,
}

/// `base64(sha256(base64(sha256(password + salt)) + challenge))`.
#[must_use]
pub fn authentication_string(password: &str, salt: &str, challenge: &str) -> String {
    let secret = STANDARD.encode(Sha256::digest(format!("{password}{salt}").as_bytes()));
    STANDARD.encode(Sha256::digest(format!("{secret}{challenge}").as_bytes()))
}

/// Encodes an `Identify` frame. Events are not subscribed to.
#[must_use]
pub fn identify_frame(authentication: Option<String>) -> String {
    let mut d = json!({ "rpcVersion": RPC_VERSION, "eventSubscriptions": 0 });
    if let Some(authentication) = authentication {
        d["authentication"] = Value::String(authentication);
    }
    encode(OP_IDENTIFY, d)
}

/// Encodes a `Request` frame.
#[must_use]
pub fn request_frame(request_type: &str, request_id: &str, request_data: Value) -> String {
    encode(
        OP_REQUEST,
        json!({
            "requestType": request_type,
            "requestId": request_id,
            "requestData": request_data,
        }),
    )
}

fn encode(op: u8, d: Value) -> String {
    // Serializing a `Value` cannot fail.
    serde_json::to_string(&Envelope { op, d }).unwrap_or_default()
}

/// Decodes any frame into its envelope.
///
/// # Errors
///
/// Returns [`ControlPlaneError::Protocol`] for malformed JSON.
pub fn decode(text: &str) -> Result<Envelope, ControlPlaneError> {
    serde_json::from_str(text).map_err(|e| ControlPlaneError::Protocol(e.to_string()))
}

/// Reads an envelope payload as `T`.
///
/// # Errors
///
/// Returns [`ControlPlaneError::Protocol`] when the payload does not match.
pub fn payload<T: for<'de> Deserialize<'de>>(envelope: Envelope) -> Result<T, ControlPlaneError> {
    serde_json::from_value(envelope.d).map_err(|e| ControlPlaneError::Protocol(e.to_string()))
}

/// Reads the `GetSceneItemList` response body.
///
/// # Errors
///
/// Returns [`ControlPlaneError::Protocol`] when the body does not match.
pub fn scene_sources(data: Value) -> Result<Vec<SceneSource>, ControlPlaneError> {
    let list: SceneItemList =
        serde_json::from_value(data).map_err(|e| ControlPlaneError::Protocol(e.to_string()))?;
    Ok(list
        .scene_items
        .into_iter()
        .map(|item| SceneSource {
            id: item.scene_item_id,
            name: item.source_name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_string_matches_reference_vector() {
        let auth = authentication_string(
            "supersecretpassword",
            "lM1GncleQOaCu9lT1yeUZhFYnqhsLLP1G5lAGo3ixaI=",
            "+IxH4CnCiqpX1rM9scsNynZzbOe4KhDeYcTNS3PDaeY=",
        );

        assert_eq!(auth, "1Ct943GAT+6YQUUX47Ia/ncufilbe6+oD6lY+5kaCu4=");
    }

    #[test]
    fn test_identify_frame_includes_auth_only_when_given() {
        let with_auth = decode(&identify_frame(Some("abc".into()))).unwrap();
        let without = decode(&identify_frame(None)).unwrap();

        assert_eq!(with_auth.op, OP_IDENTIFY);
        assert_eq!(with_auth.d["authentication"], "abc");
        assert_eq!(with_auth.d["rpcVersion"], 1);
        assert!(without.d.get("authentication").is_none());
    }

    #[test]
    fn test_request_frame_shape() {
        let frame = decode(&request_frame(
            "SetSceneItemEnabled",
            "req-1",
            json!({ "sceneName": "Radio", "sceneItemId": 7, "sceneItemEnabled": true }),
        ))
        .unwrap();

        assert_eq!(frame.op, OP_REQUEST);
        assert_eq!(frame.d["requestType"], "SetSceneItemEnabled");
        assert_eq!(frame.d["requestId"], "req-1");
        assert_eq!(frame.d["requestData"]["sceneItemId"], 7);
    }

    #[test]
    fn test_hello_with_authentication_is_read() {
        let envelope = decode(
            r#"{"op":0,"d":{"obsWebSocketVersion":"5.5.0","rpcVersion":1,
                "authentication":{"challenge":"c","salt":"s"}}}"#,
        )
        .unwrap();

        let hello: Hello = payload(envelope).unwrap();

        let auth = hello.authentication.unwrap();
        assert_eq!((auth.challenge.as_str(), auth.salt.as_str()), ("c", "s"));
    }

    #[test]
    fn test_scene_item_list_maps_to_sources() {
        let envelope = decode(
            r#"{"op":7,"d":{"requestType":"GetSceneItemList","requestId":"1",
                "requestStatus":{"result":true,"code":100},
                "responseData":{"sceneItems":[
                    {"sceneItemId":3,"sourceName":"Voz","sceneItemEnabled":true},
                    {"sceneItemId":5,"sourceName":"Musica","sceneItemEnabled":false}]}}}"#,
        )
        .unwrap();
        let response: RequestResponse = payload(envelope).unwrap();

        let sources = scene_sources(response.into_data().unwrap()).unwrap();

        assert_eq!(
            sources,
            vec![
                SceneSource { id: 3, name: "Voz".into() },
                SceneSource { id: 5, name: "Musica".into() },
            ]
        );
    }

    #[test]
    fn test_failed_status_becomes_request_error() {
        let envelope = decode(
            r#"{"op":7,"d":{"requestType":"SetSceneItemEnabled","requestId":"2",
                "requestStatus":{"result":false,"code":600,"comment":"No scene items were found"}}}"#,
        )
        .unwrap();
        let response: RequestResponse = payload(envelope).unwrap();

        let err = response.into_data().unwrap_err();

        assert!(matches!(
            err,
            ControlPlaneError::Request { code: STATUS_RESOURCE_NOT_FOUND, .. }
        ));
    }

    #[test]
    fn test_malformed_frame_is_protocol_error() {
        assert!(matches!(decode("not json"), Err(ControlPlaneError::Protocol(_))));
    }
}
