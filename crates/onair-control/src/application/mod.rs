//! Application services for source control.

pub mod arbiter;
