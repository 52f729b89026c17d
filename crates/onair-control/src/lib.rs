//! On-Air: AV Control Arbiter.
//!
//! Translates logical (scene, source) pairs into control-plane identifiers,
//! caches them, and arbitrates sources that more than one trigger wants to
//! toggle.

pub mod application;
pub mod domain;
pub mod offline;
