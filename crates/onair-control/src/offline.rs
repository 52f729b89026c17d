//! Control plane used when the production tool cannot be reached.

use async_trait::async_trait;
use onair_core::control::{ControlPlane, SceneItemId, SceneSource};
use onair_core::error::ControlPlaneError;

/// A control plane whose every call fails as unavailable.
///
/// Installed at startup when the real connection could not be established,
/// so the rest of the engine keeps running and logs each skipped toggle.
#[derive(Debug, Clone)]
pub struct OfflineControlPlane {
    reason: String,
}

impl OfflineControlPlane {
    /// Creates an offline plane that reports `reason` on every call.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ControlPlane for OfflineControlPlane {
    async fn scene_sources(&self, _scene: &str) -> Result<Vec<SceneSource>, ControlPlaneError> {
        Err(ControlPlaneError::Unavailable(self.reason.clone()))
    }

    async fn set_source_enabled(
        &self,
        _scene: &str,
        _item_id: SceneItemId,
        _enabled: bool,
    ) -> Result<(), ControlPlaneError> {
        Err(ControlPlaneError::Unavailable(self.reason.clone()))
    }
}
