//! On-Air: Speech Output Channel.
//!
//! Every spoken segment, scheduled or chat-triggered, goes through one
//! [`channel::SpeechChannel`], which synthesizes and publishes jobs strictly
//! one at a time onto the single voice resource.

pub mod channel;
pub mod file_sink;
