//! On-Air OBS: control plane client for OBS Studio's WebSocket v5 server.
//!
//! [`protocol`] holds the message shapes and authentication; [`client`]
//! owns the connection and implements the `ControlPlane` port.

pub mod client;
pub mod protocol;
