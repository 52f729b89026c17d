//! On-Air: Chat Ingestion Hub.
//!
//! Brings up whichever chat transports are configured, normalizes their
//! messages, detects `!pregunta` commands and routes each generated answer
//! either back to the chat (write-capable transports) or onto the air
//! (read-only transports).

pub mod application;
pub mod domain;
pub mod transports;
