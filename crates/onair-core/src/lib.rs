//! On-Air Core: shared collaborator abstractions.
//!
//! This crate defines the ports every component of the broadcast engine
//! depends on: text generation, speech synthesis, the live-production
//! control plane, the voice resource, narrative persistence and chat
//! transports. It contains no infrastructure code.

pub mod chat;
pub mod clock;
pub mod control;
pub mod error;
pub mod generation;
pub mod store;
pub mod synthesis;
pub mod voice;
