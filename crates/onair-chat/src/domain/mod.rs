//! Domain types for chat commands.

pub mod command;
