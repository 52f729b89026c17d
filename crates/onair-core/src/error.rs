//! Collaborator error types.
//!
//! Each external collaborator gets its own error enum so callers can log the
//! precise failure at the boundary that contains it. None of these errors is
//! allowed to terminate the process.

use thiserror::Error;

/// Text generation failures.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider returned a non-success status.
    #[error("generation API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or provider message.
        message: String,
    },

    /// The provider could not be reached.
    #[error("generation network error: {0}")]
    Network(String),

    /// The provider answered with something we could not read.
    #[error("generation response unreadable: {0}")]
    Parse(String),
}

/// Speech synthesis failures.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The provider returned a non-success status.
    #[error("synthesis API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or provider message.
        message: String,
    },

    /// The provider could not be reached.
    #[error("synthesis network error: {0}")]
    Network(String),
}

/// Live-production control plane failures.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// No control-plane connection is available.
    #[error("control plane unavailable: {0}")]
    Unavailable(String),

    /// The control plane rejected a request.
    #[error("control plane request {request} failed ({code}): {message}")]
    Request {
        /// Request type that failed.
        request: String,
        /// Protocol status code.
        code: u16,
        /// Comment returned by the control plane.
        message: String,
    },

    /// The control plane reports that an item id no longer exists.
    #[error("scene item {item_id} not found in scene {scene}")]
    UnknownItem {
        /// Scene the item was expected in.
        scene: String,
        /// The id that was rejected.
        item_id: i64,
    },

    /// A cached source id went stale mid-run.
    #[error("cached id for {scene}/{source_name} is stale")]
    StaleSource {
        /// Scene name.
        scene: String,
        /// Logical source name.
        source_name: String,
    },

    /// The control plane sent a malformed message.
    #[error("control plane protocol error: {0}")]
    Protocol(String),
}

/// Voice resource write failures.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Writing the audio bytes failed.
    #[error("voice resource write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Narrative persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing record could not be read or written.
    #[error("narrative store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing record exists but does not hold a valid state.
    #[error("narrative record corrupt: {0}")]
    Corrupt(String),
}

/// Chat transport failures.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Connecting or authenticating failed.
    #[error("chat connect failed: {0}")]
    Connect(String),

    /// The connection dropped or a read/write failed.
    #[error("chat I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport's remote API returned an error.
    #[error("chat API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The transport cannot post replies.
    #[error("transport is read-only")]
    ReadOnly,
}
