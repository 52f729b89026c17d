//! Shared test fakes and utilities for the On-Air broadcast engine.

mod chat;
mod clock;
mod control;
mod generation;
mod store;
mod synthesis;
mod voice;

pub use chat::RecordingChatTransport;
pub use clock::FixedClock;
pub use control::{RecordingControlPlane, SetCall};
pub use generation::{FailingTextGenerator, ScriptedTextGenerator};
pub use store::{FailingNarrativeStore, InMemoryNarrativeStore};
pub use synthesis::RecordingSynthesizer;
pub use voice::RecordingVoiceSink;
