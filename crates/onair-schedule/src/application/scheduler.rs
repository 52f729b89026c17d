//! The Block Scheduler.
//!
//! One guard covers every airing the scheduler starts. A tick that finds
//! the guard held is dropped with a log line rather than queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use onair_core::clock::Clock;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use super::program::{CycleReport, Program};
use crate::domain::cadence::Cadence;

/// What happened when the trigger fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// The cycle ran to completion.
    Completed(CycleReport),
    /// Another airing held the guard; the tick was dropped.
    Skipped,
}

/// Point-in-time scheduler counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleSnapshot {
    /// Cycles that ran.
    pub cycles_fired: u64,
    /// Ticks dropped because a previous airing was still running.
    pub cycles_skipped: u64,
    /// Chapter aired by the most recent successful narrative block.
    pub last_aired_chapter: Option<u32>,
    /// When the trigger fires next.
    pub next_cycle_at: DateTime<Utc>,
}

/// Fires the program cycle on a cadence with run-exclusivity.
pub struct BlockScheduler {
    program: Arc<dyn Program>,
    clock: Arc<dyn Clock>,
    cadence: Cadence,
    on_air: Mutex<()>,
    fired: AtomicU64,
    skipped: AtomicU64,
    // 0 until a chapter airs; chapters start at 1.
    last_chapter: AtomicU32,
}

impl BlockScheduler {
    /// Creates a scheduler. Nothing fires until [`BlockScheduler::start`].
    #[must_use]
    pub fn new(program: Arc<dyn Program>, clock: Arc<dyn Clock>, cadence: Cadence) -> Self {
        Self {
            program,
            clock,
            cadence,
            on_air: Mutex::new(()),
            fired: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            last_chapter: AtomicU32::new(0),
        }
    }

    /// Fires one cycle now unless another airing is in progress.
    pub async fn fire(&self) -> FireOutcome {
        let Ok(_on_air) = self.on_air.try_lock() else {
            self.skipped.fetch_add(1, Ordering::SeqCst);
            warn!("previous airing still running, tick skipped");
            return FireOutcome::Skipped;
        };
        self.fired.fetch_add(1, Ordering::SeqCst);

        let report = self.program.run_cycle().await;
        if let Some(chapter) = report.chapter {
            self.last_chapter.store(chapter, Ordering::SeqCst);
        }
        FireOutcome::Completed(report)
    }

    /// Airs the startup welcome, waiting for the guard if needed.
    pub async fn welcome(&self) -> bool {
        let _on_air = self.on_air.lock().await;
        self.program.welcome().await
    }

    /// Current counters.
    #[must_use]
    pub fn snapshot(&self) -> ScheduleSnapshot {
        let last = self.last_chapter.load(Ordering::SeqCst);
        ScheduleSnapshot {
            cycles_fired: self.fired.load(Ordering::SeqCst),
            cycles_skipped: self.skipped.load(Ordering::SeqCst),
            last_aired_chapter: (last > 0).then_some(last),
            next_cycle_at: self.cadence.next_after(self.clock.now()),
        }
    }

    /// Runs the trigger loop until the returned task is aborted.
    ///
    /// Each firing runs in its own task so a slow cycle never delays the
    /// next tick; the guard decides whether that tick airs.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(cadence = %self.cadence, "scheduler started");
        tokio::spawn(self.run())
    }

    async fn run(self: Arc<Self>) {
        let mut firings = JoinSet::new();
        let mut last_tick: Option<DateTime<Utc>> = None;
        loop {
            let now = self.clock.now();
            let from = last_tick.map_or(now, |tick| tick.max(now));
            let next = self.cadence.next_after(from);
            let wait = (next - now).to_std().unwrap_or_default();
            debug!(%next, "next cycle scheduled");

            tokio::select! {
                () = tokio::time::sleep(wait) => {
                    last_tick = Some(next);
                    let scheduler = Arc::clone(&self);
                    firings.spawn(async move { scheduler.fire().await });
                }
                Some(finished) = firings.join_next(), if !firings.is_empty() => {
                    if let Err(e) = finished {
                        error!(error = %e, "cycle task crashed");
                    }
                }
            }
        }
    }
}
