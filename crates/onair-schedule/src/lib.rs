//! On-Air: Block Scheduler.
//!
//! Fires the Open → Narrative → Music cycle on a wall-clock cadence, never
//! letting two cycles (or a cycle and the startup welcome) run at once.

pub mod application;
pub mod domain;
