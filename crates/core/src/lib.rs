//! `rxconsole-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{ConflictKind, DomainError, DomainResult};
pub use id::{ActivityId, OrganizationId, UserId};
