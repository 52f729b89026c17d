//! Test voice sink that detects overlapping writes.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use onair_core::error::PublishError;
use onair_core::voice::VoiceSink;

/// Records every publish and the highest number of publishes that were in
/// progress at the same time.
#[derive(Debug, Default)]
pub struct RecordingVoiceSink {
    fail: bool,
    write_time: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    published: Mutex<Vec<Vec<u8>>>,
}

impl RecordingVoiceSink {
    /// Create a sink that always succeeds instantly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink whose writes always fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Make every write take `write_time`, widening the window in which an
    /// overlapping write would be observed.
    #[must_use]
    pub fn with_write_time(mut self, write_time: Duration) -> Self {
        self.write_time = Some(write_time);
        self
    }

    /// Returns every payload published so far, in completion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<Vec<u8>> {
        self.published.lock().unwrap().clone()
    }

    /// Returns the published payloads decoded as UTF-8 text.
    pub fn published_texts(&self) -> Vec<String> {
        self.published()
            .into_iter()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .collect()
    }

    /// Highest number of concurrent publishes observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceSink for RecordingVoiceSink {
    async fn publish(&self, audio: &[u8]) -> Result<(), PublishError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(write_time) = self.write_time {
            tokio::time::sleep(write_time).await;
        }

        let result = if self.fail {
            Err(PublishError::Io(std::io::Error::other("disk full")))
        } else {
            self.published.lock().unwrap().push(audio.to_vec());
            Ok(())
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
