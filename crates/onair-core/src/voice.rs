//! The single well-known voice resource.

use async_trait::async_trait;

use crate::error::PublishError;

/// Destination the live-production tool plays spoken audio from.
///
/// Every publish overwrites the previous content. Only the speech channel
/// may hold a `VoiceSink`.
#[async_trait]
pub trait VoiceSink: Send + Sync {
    /// Replaces the resource content with `audio`.
    async fn publish(&self, audio: &[u8]) -> Result<(), PublishError>;
}
