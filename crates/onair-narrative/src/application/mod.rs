//! Application services for the narrative block.

pub mod block;
pub mod file_store;
