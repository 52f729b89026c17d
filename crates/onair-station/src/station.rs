//! Component wiring and process lifetime.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use onair_chat::application::hub::ChatHub;
use onair_chat::transports::twitch::TwitchTransport;
use onair_chat::transports::youtube::YouTubeTransport;
use onair_control::application::arbiter::ControlArbiter;
use onair_control::domain::source::SourceKey;
use onair_control::offline::OfflineControlPlane;
use onair_core::chat::ChatTransport;
use onair_core::clock::SystemClock;
use onair_core::control::ControlPlane;
use onair_core::error::ControlPlaneError;
use onair_core::generation::TextGenerator;
use onair_core::synthesis::{AudioFormat, SpeechSynthesizer};
use onair_narrative::application::file_store::JsonFileNarrativeStore;
use onair_obs::client::ObsControlPlane;
use onair_openai::chat::OpenAiTextGenerator;
use onair_openai::simulated::{SilentSynthesizer, SimulatedTextGenerator};
use onair_openai::speech::OpenAiSynthesizer;
use onair_schedule::application::cycle::ProgramCycle;
use onair_schedule::application::scheduler::BlockScheduler;
use onair_speech::channel::{SpeechChannel, SpeechConfig};
use onair_speech::file_sink::FileVoiceSink;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::StationConfig;
use crate::routes;
use crate::state::AppState;

const OBS_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Every long-lived component, constructed once at startup.
pub struct Station {
    config: StationConfig,
    arbiter: Arc<ControlArbiter>,
    speech: SpeechChannel,
    speech_worker: JoinHandle<()>,
    hub: Arc<ChatHub>,
    scheduler: Arc<BlockScheduler>,
}

impl Station {
    /// Builds every component, degrading to offline stand-ins for any
    /// integration that is unconfigured or unreachable.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the data or runtime directories cannot be
    /// created.
    pub async fn assemble(config: StationConfig) -> io::Result<Self> {
        let voice_path = config.voice_path();
        tokio::fs::create_dir_all(&config.data_dir).await?;
        if let Some(voice_dir) = voice_path.parent() {
            tokio::fs::create_dir_all(voice_dir).await?;
        }

        let plane = connect_control_plane(&config).await;
        let arbiter = Arc::new(ControlArbiter::new(plane));
        let (generator, synthesizer) = providers(&config);

        let music = SourceKey::new(config.scene.as_str(), config.music_source.as_str());
        let speech_config = SpeechConfig {
            voice_source: SourceKey::new(config.scene.as_str(), config.voice_source.as_str()),
            duck_source: Some(music.clone()),
            voice_profile: config.voice_name.clone(),
            format: AudioFormat::Mp3,
            language: config.language.clone(),
            words_per_minute: config.words_per_minute,
            queue_capacity: config.speech_queue_capacity,
        };
        let (speech, speech_worker) = SpeechChannel::spawn(
            speech_config,
            synthesizer,
            Arc::new(FileVoiceSink::new(voice_path)),
            Arc::clone(&arbiter),
        );

        let hub = Arc::new(ChatHub::new(
            Arc::clone(&generator),
            speech.clone(),
            transports(&config),
        ));

        let cycle = ProgramCycle::new(
            generator,
            speech.clone(),
            Arc::new(JsonFileNarrativeStore::new(config.state_path())),
            Arc::clone(&arbiter),
            music,
            config.music_window,
        );
        let scheduler = Arc::new(BlockScheduler::new(
            Arc::new(cycle),
            Arc::new(SystemClock),
            config.cadence.clone(),
        ));

        Ok(Self {
            config,
            arbiter,
            speech,
            speech_worker,
            hub,
            scheduler,
        })
    }

    /// Handles for the status routes.
    #[must_use]
    pub fn app_state(&self) -> AppState {
        AppState {
            scheduler: Arc::clone(&self.scheduler),
            arbiter: Arc::clone(&self.arbiter),
            music: SourceKey::new(self.config.scene.as_str(), self.config.music_source.as_str()),
            hub: Arc::clone(&self.hub),
            speech: self.speech.clone(),
        }
    }

    /// Starts chat, the scheduler, the welcome and the status server, then
    /// runs until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the status server cannot bind or fails.
    pub async fn run(self) -> io::Result<()> {
        let listener = TcpListener::bind(self.config.status_addr).await?;
        info!(addr = %self.config.status_addr, "status server listening");
        let app = routes::router(self.app_state());

        let chat = Arc::clone(&self.hub).start();
        let mut schedule = Arc::clone(&self.scheduler).start();
        let scheduler = Arc::clone(&self.scheduler);
        supervise(
            "welcome",
            tokio::spawn(async move {
                let aired = scheduler.welcome().await;
                info!(aired, "welcome finished");
            }),
        );
        let mut speech_worker = self.speech_worker;

        let server = async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
        };
        tokio::select! {
            result = server => result?,
            finished = &mut schedule => {
                error!(result = ?finished.err(), "scheduler stopped unexpectedly");
            }
            finished = &mut speech_worker => {
                error!(result = ?finished.err(), "speech worker stopped unexpectedly");
            }
        }

        info!("shutting down");
        schedule.abort();
        chat.abort();
        self.arbiter.shutdown();
        Ok(())
    }
}

async fn connect_control_plane(config: &StationConfig) -> Arc<dyn ControlPlane> {
    let connecting = ObsControlPlane::connect(&config.obs);
    let connected = tokio::time::timeout(OBS_CONNECT_TIMEOUT, connecting)
        .await
        .unwrap_or_else(|_| {
            Err(ControlPlaneError::Unavailable(format!(
                "no answer within {}s",
                OBS_CONNECT_TIMEOUT.as_secs()
            )))
        });
    match connected {
        Ok(plane) => Arc::new(plane),
        Err(e) => {
            warn!(
                host = %config.obs.host,
                port = config.obs.port,
                error = %e,
                "OBS unavailable, source toggles will be skipped"
            );
            Arc::new(OfflineControlPlane::new(e.to_string()))
        }
    }
}

fn providers(config: &StationConfig) -> (Arc<dyn TextGenerator>, Arc<dyn SpeechSynthesizer>) {
    let Some(openai) = &config.openai else {
        warn!("OPENAI_API_KEY not set, using simulated text and silent audio");
        let generator: Arc<dyn TextGenerator> = Arc::new(SimulatedTextGenerator);
        let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(SilentSynthesizer);
        return (generator, synthesizer);
    };
    info!(
        text_model = %openai.text_model,
        voice_model = %openai.voice_model,
        "OpenAI providers enabled"
    );
    let generator: Arc<dyn TextGenerator> = Arc::new(OpenAiTextGenerator::new(
        openai.api_key.as_str(),
        openai.text_model.as_str(),
    ));
    let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(OpenAiSynthesizer::new(
        openai.api_key.as_str(),
        openai.voice_model.as_str(),
    ));
    (generator, synthesizer)
}

fn transports(config: &StationConfig) -> Vec<Arc<dyn ChatTransport>> {
    let mut transports: Vec<Arc<dyn ChatTransport>> = Vec::new();
    match &config.twitch {
        Some(twitch) => transports.push(Arc::new(TwitchTransport::new(twitch.clone()))),
        None => info!(
            "Twitch not configured (TWITCH_USERNAME, TWITCH_OAUTH_TOKEN, TWITCH_CHANNELS), skipped"
        ),
    }
    match &config.youtube {
        Some(youtube) => transports.push(Arc::new(YouTubeTransport::new(youtube.clone()))),
        None => info!("YouTube not configured (YT_API_KEY, YT_LIVE_CHAT_ID), skipped"),
    }
    transports
}

fn supervise(task: &'static str, handle: JoinHandle<()>) {
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            error!(task, error = %e, "task crashed");
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
}
