//! Broadcast status endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use chrono::{DateTime, Utc};
use onair_control::domain::shared_source::SharedSourceState;
use serde::Serialize;

use crate::state::AppState;

/// Music arbitration view.
#[derive(Debug, Serialize)]
pub struct MusicStatus {
    /// `scene/source`.
    pub source: String,
    /// Current arbitration state.
    pub state: SharedSourceState,
}

/// GET /status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Chapter aired by the last successful narrative block.
    pub chapter: Option<u32>,
    /// Cycles that ran.
    pub cycles_fired: u64,
    /// Ticks dropped because an airing was still running.
    pub cycles_skipped: u64,
    /// Next scheduled cycle.
    pub next_cycle_at: DateTime<Utc>,
    /// Music source arbitration.
    pub music: MusicStatus,
    /// Chat transports currently connected.
    pub active_transports: usize,
    /// Speech jobs accepted but not finished.
    pub pending_speech: usize,
}

/// GET /status
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let schedule = state.scheduler.snapshot();
    Json(StatusResponse {
        chapter: schedule.last_aired_chapter,
        cycles_fired: schedule.cycles_fired,
        cycles_skipped: schedule.cycles_skipped,
        next_cycle_at: schedule.next_cycle_at,
        music: MusicStatus {
            source: state.music.to_string(),
            state: state.arbiter.shared_state(&state.music).await,
        },
        active_transports: state.hub.active_transports(),
        pending_speech: state.speech.pending(),
    })
}

/// Returns the status router.
#[must_use]
pub fn router() -> Router<AppState> {
    Router::new().route("/status", get(status))
}
