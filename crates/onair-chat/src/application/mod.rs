//! Application services for chat ingestion.

pub mod hub;
