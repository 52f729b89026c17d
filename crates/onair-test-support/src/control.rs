//! Test control plane.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use onair_core::control::{ControlPlane, SceneItemId, SceneSource};
use onair_core::error::ControlPlaneError;

/// One recorded `set_source_enabled` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCall {
    /// Scene the call targeted.
    pub scene: String,
    /// Item id the call targeted.
    pub item_id: SceneItemId,
    /// Requested visibility.
    pub enabled: bool,
}

/// An in-memory control plane that serves a configurable scene listing and
/// records every enable/disable call.
#[derive(Debug, Default)]
pub struct RecordingControlPlane {
    scenes: Mutex<HashMap<String, Vec<SceneSource>>>,
    calls: Mutex<Vec<SetCall>>,
    listings: AtomicUsize,
    unavailable: AtomicBool,
}

impl RecordingControlPlane {
    /// Create a control plane with no scenes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a source named `name` with id `id` in `scene`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_source(self, scene: &str, id: SceneItemId, name: &str) -> Self {
        self.scenes
            .lock()
            .unwrap()
            .entry(scene.to_owned())
            .or_default()
            .push(SceneSource {
                id,
                name: name.to_owned(),
            });
        self
    }

    /// Re-create the source named `name` under a new id, as happens when an
    /// operator deletes and re-adds it mid-run.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn replace_source_id(&self, scene: &str, name: &str, new_id: SceneItemId) {
        let mut scenes = self.scenes.lock().unwrap();
        if let Some(sources) = scenes.get_mut(scene) {
            for source in sources.iter_mut().filter(|s| s.name == name) {
                source.id = new_id;
            }
        }
    }

    /// Make every call fail as if the connection were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns a snapshot of all enable/disable calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_calls(&self) -> Vec<SetCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of scene listings served.
    pub fn listing_count(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// The last visibility set for `item_id`, if any.
    pub fn last_state(&self, item_id: SceneItemId) -> Option<bool> {
        self.set_calls()
            .iter()
            .rev()
            .find(|call| call.item_id == item_id)
            .map(|call| call.enabled)
    }

    fn check_available(&self) -> Result<(), ControlPlaneError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ControlPlaneError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ControlPlane for RecordingControlPlane {
    async fn scene_sources(&self, scene: &str) -> Result<Vec<SceneSource>, ControlPlaneError> {
        self.check_available()?;
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .scenes
            .lock()
            .unwrap()
            .get(scene)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_source_enabled(
        &self,
        scene: &str,
        item_id: SceneItemId,
        enabled: bool,
    ) -> Result<(), ControlPlaneError> {
        self.check_available()?;
        let known = self
            .scenes
            .lock()
            .unwrap()
            .get(scene)
            .is_some_and(|sources| sources.iter().any(|s| s.id == item_id));
        if !known {
            return Err(ControlPlaneError::UnknownItem {
                scene: scene.to_owned(),
                item_id,
            });
        }
        self.calls.lock().unwrap().push(SetCall {
            scene: scene.to_owned(),
            item_id,
            enabled,
        });
        Ok(())
    }
}
