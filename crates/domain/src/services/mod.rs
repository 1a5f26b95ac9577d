//! Business rules and external-collaborator contracts.

pub mod directory;
pub mod negotiation;
pub mod notification;
pub mod preconditions;
