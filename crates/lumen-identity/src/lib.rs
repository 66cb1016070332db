//! # lumen-identity — Persistent identity over the catalog
//!
//! Builds stable ids for items and actions ([`PersistentId`]) and resolves
//! them back into live objects, searching the catalog with a call-local
//! recursion guard and reconstructing snapshots through the sandboxed
//! deserializer.
//!
//! ## Module Overview
//!
//! - [`resolver`] — `IdentityResolver`, the recursion guard, reference forms
//! - [`actions`] — `ActionRegistry`: global and per-item-type action tables

pub mod actions;
pub mod resolver;

pub use actions::ActionRegistry;
pub use resolver::{IdentityResolver, VisitGuard, action_id, reference_for};

pub use lumen_protocol::{IdentityError, PersistentId};
