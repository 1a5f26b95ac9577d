//! The PetMeet appointment scheduling engine.
//!
//! Composes the domain rules, persistence layer, and external collaborators
//! into the transport-agnostic operation surface, and hosts the background
//! expiry sweep.

pub mod config;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod logging;
