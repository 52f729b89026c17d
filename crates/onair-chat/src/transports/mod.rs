//! Chat transport implementations.

pub mod twitch;
pub mod youtube;
