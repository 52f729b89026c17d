//! Domain types for the narrative block.

pub mod script;
