//! The seam between the scheduler and what it airs.

use async_trait::async_trait;
use onair_control::domain::source::SetOutcome;
use serde::Serialize;
use uuid::Uuid;

/// What one cycle managed to air.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Correlation id shared by the cycle's log lines.
    pub cycle_id: Uuid,
    /// Whether the open block went on air.
    pub opened: bool,
    /// The chapter that aired, if the narrative block succeeded.
    pub chapter: Option<u32>,
    /// The music window outcome, if the control call succeeded.
    pub music: Option<SetOutcome>,
}

/// Programming fired by the scheduler.
#[async_trait]
pub trait Program: Send + Sync {
    /// Runs Open, Narrative and Music in order. Never fails as a whole;
    /// each block's failure is contained and reflected in the report.
    async fn run_cycle(&self) -> CycleReport;

    /// Runs the open block alone. Returns whether it went on air.
    async fn welcome(&self) -> bool;
}
