//! Scheduling application services.

pub mod cycle;
pub mod program;
pub mod scheduler;
