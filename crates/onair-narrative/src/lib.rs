//! On-Air: Narrative block.
//!
//! Responsible for the serialized radio drama: building each chapter's
//! prompt, speaking it, and advancing the durable chapter counter only once
//! the chapter has actually gone on air.

pub mod application;
pub mod domain;
