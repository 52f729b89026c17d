//! The AV Control Arbiter.
//!
//! Owns the (scene, source) → item-id cache and every enable/disable that
//! reaches the control plane. Sources opened through [`ControlArbiter::open_window`]
//! become shared: their physical state is derived from a [`SharedSource`]
//! record rather than from whichever caller toggled them last.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use onair_core::control::{ControlPlane, SceneItemId};
use onair_core::error::ControlPlaneError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::shared_source::{SharedSource, SharedSourceState};
use crate::domain::source::{SetOutcome, SourceKey};

/// Arbitrates access to control-plane sources.
pub struct ControlArbiter {
    plane: Arc<dyn ControlPlane>,
    ids: Mutex<HashMap<SourceKey, SceneItemId>>,
    shared: Mutex<HashMap<SourceKey, SharedSource>>,
    closers: StdMutex<HashMap<SourceKey, JoinHandle<()>>>,
}

impl ControlArbiter {
    /// Creates an arbiter over `plane`.
    #[must_use]
    pub fn new(plane: Arc<dyn ControlPlane>) -> Self {
        Self {
            plane,
            ids: Mutex::new(HashMap::new()),
            shared: Mutex::new(HashMap::new()),
            closers: StdMutex::new(HashMap::new()),
        }
    }

    /// Resolves `key` to its control-plane id, from cache when possible.
    ///
    /// Returns `Ok(None)` when the scene has no such source.
    ///
    /// # Errors
    ///
    /// Returns `ControlPlaneError` if the scene listing cannot be fetched.
    pub async fn resolve(&self, key: &SourceKey) -> Result<Option<SceneItemId>, ControlPlaneError> {
        if let Some(id) = self.ids.lock().await.get(key) {
            return Ok(Some(*id));
        }

        let sources = self.plane.scene_sources(&key.scene).await?;
        let Some(found) = sources.into_iter().find(|s| s.name == key.source) else {
            warn!(scene = %key.scene, source = %key.source, "source not found in scene");
            return Ok(None);
        };

        debug!(scene = %key.scene, source = %key.source, item_id = found.id, "resolved source");
        self.ids.lock().await.insert(key.clone(), found.id);
        Ok(Some(found.id))
    }

    /// Shows or hides `key`.
    ///
    /// A missing source is a no-op reported as [`SetOutcome::SourceMissing`].
    ///
    /// # Errors
    ///
    /// Returns `ControlPlaneError` if the control plane is unreachable,
    /// rejects the call, or reports that the cached id went stale.
    pub async fn set_enabled(
        &self,
        key: &SourceKey,
        enabled: bool,
    ) -> Result<SetOutcome, ControlPlaneError> {
        let Some(item_id) = self.resolve(key).await? else {
            return Ok(SetOutcome::SourceMissing);
        };
        self.send(key, item_id, enabled).await?;
        Ok(SetOutcome::Applied)
    }

    /// Opens the owner's window on a shared source for `duration`, then
    /// closes it. Reopening before the close fires cancels and replaces the
    /// pending close.
    ///
    /// # Errors
    ///
    /// Returns `ControlPlaneError` if resolution or the enable call fails.
    /// The window is still recorded as open and its close still scheduled.
    pub async fn open_window(
        self: &Arc<Self>,
        key: &SourceKey,
        duration: Duration,
    ) -> Result<SetOutcome, ControlPlaneError> {
        let Some(item_id) = self.resolve(key).await? else {
            return Ok(SetOutcome::SourceMissing);
        };

        let mut shared = self.shared.lock().await;
        let source = shared.entry(key.clone()).or_default();
        let generation = source.open_window();

        let this = Arc::clone(self);
        let close_key = key.clone();
        let closer = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            match this.close_window(&close_key, generation).await {
                Ok(_) => info!(source = %close_key, "window closed"),
                Err(e) => warn!(source = %close_key, error = %e, "window close failed"),
            }
        });
        if let Some(previous) = self.lock_closers().insert(key.clone(), closer) {
            previous.abort();
        }

        info!(source = %key, minutes = duration.as_secs() / 60, "window opened");
        self.apply(key, item_id, source).await
    }

    /// Closes window `generation` on `key` if it is still the current one.
    ///
    /// # Errors
    ///
    /// Returns `ControlPlaneError` if the disable call fails.
    pub async fn close_window(
        &self,
        key: &SourceKey,
        generation: u64,
    ) -> Result<SetOutcome, ControlPlaneError> {
        let mut shared = self.shared.lock().await;
        let Some(source) = shared.get_mut(key) else {
            return Ok(SetOutcome::Unchanged);
        };
        if !source.close_window(generation) {
            debug!(source = %key, generation, "stale window close ignored");
            return Ok(SetOutcome::Unchanged);
        }
        let Some(item_id) = self.resolve(key).await? else {
            return Ok(SetOutcome::SourceMissing);
        };
        self.apply(key, item_id, source).await
    }

    /// Temporarily holds a shared source down.
    ///
    /// # Errors
    ///
    /// Returns `ControlPlaneError` if resolution or the disable call fails.
    pub async fn duck(&self, key: &SourceKey) -> Result<SetOutcome, ControlPlaneError> {
        self.override_shared(key, SharedSource::duck).await
    }

    /// Releases one duck. The source only comes back on if its owner still
    /// wants it on.
    ///
    /// # Errors
    ///
    /// Returns `ControlPlaneError` if resolution or the enable call fails.
    pub async fn restore(&self, key: &SourceKey) -> Result<SetOutcome, ControlPlaneError> {
        self.override_shared(key, SharedSource::restore).await
    }

    /// Current arbitration state of `key`.
    pub async fn shared_state(&self, key: &SourceKey) -> SharedSourceState {
        self.shared
            .lock()
            .await
            .get(key)
            .map_or(SharedSourceState::OwnerOff, SharedSource::state)
    }

    /// Cancels every pending window close.
    pub fn shutdown(&self) {
        for (key, closer) in self.lock_closers().drain() {
            debug!(source = %key, "cancelling pending window close");
            closer.abort();
        }
    }

    async fn override_shared(
        &self,
        key: &SourceKey,
        transition: fn(&mut SharedSource),
    ) -> Result<SetOutcome, ControlPlaneError> {
        let Some(item_id) = self.resolve(key).await? else {
            return Ok(SetOutcome::SourceMissing);
        };
        let mut shared = self.shared.lock().await;
        let source = shared.entry(key.clone()).or_default();
        transition(source);
        self.apply(key, item_id, source).await
    }

    async fn apply(
        &self,
        key: &SourceKey,
        item_id: SceneItemId,
        source: &mut SharedSource,
    ) -> Result<SetOutcome, ControlPlaneError> {
        let Some(enabled) = source.pending_command() else {
            return Ok(SetOutcome::Unchanged);
        };
        self.send(key, item_id, enabled).await?;
        source.mark_applied(enabled);
        Ok(SetOutcome::Applied)
    }

    async fn send(
        &self,
        key: &SourceKey,
        item_id: SceneItemId,
        enabled: bool,
    ) -> Result<(), ControlPlaneError> {
        match self.plane.set_source_enabled(&key.scene, item_id, enabled).await {
            Ok(()) => {
                debug!(source = %key, item_id, enabled, "source toggled");
                Ok(())
            }
            Err(ControlPlaneError::UnknownItem { .. }) => {
                self.ids.lock().await.remove(key);
                Err(ControlPlaneError::StaleSource {
                    scene: key.scene.clone(),
                    source_name: key.source.clone(),
                })
            }
            Err(e) => Err(e),
        }
    }

    fn lock_closers(&self) -> std::sync::MutexGuard<'_, HashMap<SourceKey, JoinHandle<()>>> {
        self.closers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
