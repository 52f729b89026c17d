//! Live-production control plane port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ControlPlaneError;

/// Control-plane identifier of a source placed in a scene.
pub type SceneItemId = i64;

/// One entry of a scene's source listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSource {
    /// Control-plane identifier.
    pub id: SceneItemId,
    /// Human-facing source name.
    pub name: String,
}

/// The live-production tool's remote control surface.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Lists the sources placed in `scene`.
    async fn scene_sources(&self, scene: &str) -> Result<Vec<SceneSource>, ControlPlaneError>;

    /// Shows or hides a source.
    async fn set_source_enabled(
        &self,
        scene: &str,
        item_id: SceneItemId,
        enabled: bool,
    ) -> Result<(), ControlPlaneError>;
}
