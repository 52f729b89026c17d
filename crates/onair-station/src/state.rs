//! Shared state behind the status routes.

use std::sync::Arc;

use onair_chat::application::hub::ChatHub;
use onair_control::application::arbiter::ControlArbiter;
use onair_control::domain::source::SourceKey;
use onair_schedule::application::scheduler::BlockScheduler;
use onair_speech::channel::SpeechChannel;

/// Read-only handles on the running components.
#[derive(Clone)]
pub struct AppState {
    /// Cycle counters and last aired chapter.
    pub scheduler: Arc<BlockScheduler>,
    /// Shared-source arbitration.
    pub arbiter: Arc<ControlArbiter>,
    /// The arbitrated music source.
    pub music: SourceKey,
    /// Chat transports.
    pub hub: Arc<ChatHub>,
    /// Speech queue.
    pub speech: SpeechChannel,
}
