//! Scheduling domain types.

pub mod cadence;
pub mod open;
