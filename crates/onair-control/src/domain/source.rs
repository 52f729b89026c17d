//! Logical source addressing.

use std::fmt;

use serde::Serialize;

/// A logical (scene, source-name) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SourceKey {
    /// Scene the source is placed in.
    pub scene: String,
    /// Source name as shown in the production tool.
    pub source: String,
}

impl SourceKey {
    /// Creates a key.
    #[must_use]
    pub fn new(scene: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scene, self.source)
    }
}

/// What a control call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOutcome {
    /// A command was sent and accepted.
    Applied,
    /// The physical state already matched; nothing was sent.
    Unchanged,
    /// The source does not exist in the scene; the call was a no-op.
    SourceMissing,
}
