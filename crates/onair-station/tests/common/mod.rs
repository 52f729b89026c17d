//! Shared test helpers for status route integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use onair_chat::application::hub::ChatHub;
use onair_control::application::arbiter::ControlArbiter;
use onair_control::domain::source::SourceKey;
use onair_core::chat::{ChatPlatform, ChatTransport};
use onair_core::store::NarrativeState;
use onair_core::synthesis::AudioFormat;
use onair_schedule::application::cycle::ProgramCycle;
use onair_schedule::application::scheduler::BlockScheduler;
use onair_schedule::domain::cadence::Cadence;
use onair_speech::channel::{SpeechChannel, SpeechConfig};
use onair_station::routes;
use onair_station::state::AppState;
use onair_test_support::{
    FixedClock, InMemoryNarrativeStore, RecordingChatTransport, RecordingControlPlane,
    RecordingSynthesizer, RecordingVoiceSink, ScriptedTextGenerator,
};
use tower::ServiceExt;

/// A station assembled from in-memory fakes.
pub struct TestStation {
    pub state: AppState,
    pub plane: Arc<RecordingControlPlane>,
}

impl TestStation {
    /// The full status router over this station.
    pub fn app(&self) -> Router {
        routes::router(self.state.clone())
    }
}

/// Builds a station whose scene holds `Voz` (3) and `Musica` (5), with the
/// narrative record at `chapter`. Must run inside a tokio runtime.
pub fn build_test_station(chapter: u32) -> TestStation {
    let plane = Arc::new(
        RecordingControlPlane::new()
            .with_source("Radio", 3, "Voz")
            .with_source("Radio", 5, "Musica"),
    );
    let arbiter = Arc::new(ControlArbiter::new(plane.clone()));
    let generator = Arc::new(ScriptedTextGenerator::new("En el aire."));
    let music = SourceKey::new("Radio", "Musica");

    let (speech, _worker) = SpeechChannel::spawn(
        SpeechConfig {
            voice_source: SourceKey::new("Radio", "Voz"),
            duck_source: Some(music.clone()),
            voice_profile: "alloy".into(),
            format: AudioFormat::Mp3,
            language: "es".into(),
            words_per_minute: 0,
            queue_capacity: 4,
        },
        Arc::new(RecordingSynthesizer::new()),
        Arc::new(RecordingVoiceSink::new()),
        arbiter.clone(),
    );
    let hub = Arc::new(ChatHub::new(
        generator.clone(),
        speech.clone(),
        vec![
            Arc::new(RecordingChatTransport::writable(ChatPlatform::Twitch))
                as Arc<dyn ChatTransport>,
        ],
    ));
    let cycle = ProgramCycle::new(
        generator,
        speech.clone(),
        Arc::new(InMemoryNarrativeStore::with_state(NarrativeState { chapter })),
        arbiter.clone(),
        music.clone(),
        Duration::from_secs(300),
    );
    let scheduler = Arc::new(BlockScheduler::new(
        Arc::new(cycle),
        Arc::new(FixedClock(
            chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 10, 0).unwrap(),
        )),
        Cadence::parse("0,30").unwrap(),
    ));

    TestStation {
        state: AppState {
            scheduler,
            arbiter,
            music,
            hub,
            speech,
        },
        plane,
    }
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
