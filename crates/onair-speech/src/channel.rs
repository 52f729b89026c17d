//! The Speech Output Channel.
//!
//! Callers hold a cheap [`SpeechChannel`] handle; a single worker task owns
//! the synthesizer, the voice sink and the duck of the music source. Jobs
//! are serviced in submission order and never overlap.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use onair_control::application::arbiter::ControlArbiter;
use onair_control::domain::source::{SetOutcome, SourceKey};
use onair_core::error::{PublishError, SynthesisError};
use onair_core::synthesis::{AudioFormat, SpeechSynthesizer, SynthesisRequest};
use onair_core::voice::VoiceSink;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Why a submission did not make it on air.
#[derive(Debug, Error)]
pub enum SpeechError {
    /// The queue is full.
    #[error("speech queue is full")]
    Busy,

    /// The worker has stopped.
    #[error("speech channel closed")]
    Closed,

    /// Synthesis failed; nothing was published.
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// Writing the voice resource failed.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Static settings of the speech channel.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// The voice source to enable after each publish.
    pub voice_source: SourceKey,
    /// Source to duck while speech plays, if any.
    pub duck_source: Option<SourceKey>,
    /// Synthesizer voice profile.
    pub voice_profile: String,
    /// Synthesizer output codec.
    pub format: AudioFormat,
    /// Synthesizer locale tag.
    pub language: String,
    /// Estimated narration pace. `0` disables the playback hold.
    pub words_per_minute: u32,
    /// Pending jobs accepted before submissions are rejected as busy.
    pub queue_capacity: usize,
}

impl SpeechConfig {
    /// Estimated time the published audio keeps the voice resource busy.
    #[must_use]
    pub fn playback_hold(&self, text: &str) -> Duration {
        if self.words_per_minute == 0 {
            return Duration::ZERO;
        }
        let words = u64::try_from(text.split_whitespace().count()).unwrap_or(u64::MAX);
        Duration::from_millis(words.saturating_mul(60_000) / u64::from(self.words_per_minute))
    }
}

struct SpeechJob {
    id: Uuid,
    text: String,
    done: oneshot::Sender<Result<(), SpeechError>>,
}

/// Handle used to submit text to be spoken on air.
#[derive(Clone)]
pub struct SpeechChannel {
    jobs: mpsc::Sender<SpeechJob>,
    pending: Arc<AtomicUsize>,
}

impl SpeechChannel {
    /// Starts the worker and returns the submission handle together with the
    /// worker's task handle. The worker stops once every handle is dropped.
    pub fn spawn(
        config: SpeechConfig,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        sink: Arc<dyn VoiceSink>,
        arbiter: Arc<ControlArbiter>,
    ) -> (Self, JoinHandle<()>) {
        let (jobs, queue) = mpsc::channel(config.queue_capacity.max(1));
        let pending = Arc::new(AtomicUsize::new(0));
        let worker = SpeechWorker {
            config,
            synthesizer,
            sink,
            arbiter,
            pending: Arc::clone(&pending),
        };
        let handle = tokio::spawn(worker.run(queue));
        (Self { jobs, pending }, handle)
    }

    /// Speaks `text` on air, waiting until its turn has been serviced.
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Busy` if the queue is full, or the synthesis or
    /// publish failure that made the job abandon.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), SpeechError> {
        let (done, outcome) = oneshot::channel();
        let job = SpeechJob {
            id: Uuid::new_v4(),
            text: text.into(),
            done,
        };
        let job_id = job.id;

        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self.jobs.try_send(job) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => {
                    warn!(%job_id, "speech queue full, job rejected");
                    SpeechError::Busy
                }
                mpsc::error::TrySendError::Closed(_) => SpeechError::Closed,
            });
        }

        outcome.await.unwrap_or(Err(SpeechError::Closed))
    }

    /// Jobs accepted but not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

struct SpeechWorker {
    config: SpeechConfig,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn VoiceSink>,
    arbiter: Arc<ControlArbiter>,
    pending: Arc<AtomicUsize>,
}

impl SpeechWorker {
    async fn run(self, mut queue: mpsc::Receiver<SpeechJob>) {
        while let Some(job) = queue.recv().await {
            let span = info_span!("speech_job", job_id = %job.id);
            let result = self.process(&job.text).instrument(span).await;
            self.pending.fetch_sub(1, Ordering::SeqCst);
            // The submitter may have given up waiting.
            let _ = job.done.send(result);
        }
        debug!("speech worker stopped");
    }

    async fn process(&self, text: &str) -> Result<(), SpeechError> {
        let request = SynthesisRequest {
            text: text.to_owned(),
            voice: self.config.voice_profile.clone(),
            format: self.config.format,
            language: self.config.language.clone(),
        };
        let audio = match self.synthesizer.synthesize(&request).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(
                    provider = self.synthesizer.name(),
                    error = %e,
                    "synthesis failed, job abandoned"
                );
                return Err(e.into());
            }
        };

        self.duck().await;
        if let Err(e) = self.sink.publish(&audio).await {
            warn!(error = %e, "voice publish failed, job abandoned");
            self.restore().await;
            return Err(e.into());
        }

        match self.arbiter.set_enabled(&self.config.voice_source, true).await {
            Ok(SetOutcome::SourceMissing) => {
                warn!(
                    source = %self.config.voice_source,
                    "voice source missing, audio published without toggle"
                );
            }
            Ok(_) => {}
            Err(e) => warn!(
                source = %self.config.voice_source,
                error = %e,
                "voice source enable failed"
            ),
        }
        info!(bytes = audio.len(), "voice published");

        let hold = self.config.playback_hold(text);
        if !hold.is_zero() {
            tokio::time::sleep(hold).await;
        }
        self.restore().await;
        Ok(())
    }

    async fn duck(&self) {
        let Some(source) = &self.config.duck_source else {
            return;
        };
        if let Err(e) = self.arbiter.duck(source).await {
            warn!(%source, error = %e, "duck failed");
        }
    }

    async fn restore(&self) {
        let Some(source) = &self.config.duck_source else {
            return;
        };
        if let Err(e) = self.arbiter.restore(source).await {
            warn!(%source, error = %e, "restore failed");
        }
    }
}
