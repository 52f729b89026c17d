//! On-Air station: the process that puts the broadcast engine on the air.
//!
//! Reads configuration, builds every component with whichever external
//! integrations are available, and serves a small status surface.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;
pub mod station;
