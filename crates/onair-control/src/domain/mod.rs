//! Domain types for source control.

pub mod shared_source;
pub mod source;
