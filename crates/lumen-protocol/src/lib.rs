//! # lumen-protocol — Catalog contract
//!
//! Shared types and trait interfaces for the catalog identity and caching
//! subsystem. Provider plugins implement the item/action traits here; the
//! catalog, identity, and sandbox crates consume them.
//!
//! Intentionally dependency-light (no tokio, no runtime deps) so it can be
//! used as a pure contract crate.
//!
//! ## Module Overview
//!
//! - [`item`] — `CatalogItem` plus the capability traits (`Addressable`,
//!   `SnapshotCapable`, `MultiRepresentable`)
//! - [`action`] — `ActionItem`, identified by signature
//! - [`signature`] — `Signature` and `ItemKey`, instance-independent identity
//! - [`ident`] — `PersistentId` and the tagged snapshot wire envelope
//! - [`error`] — `SnapshotError`, `SandboxError`, `IdentityError`

pub mod action;
pub mod error;
pub mod ident;
pub mod item;
pub mod signature;

pub use action::{ActionItem, ActionItemRef, actions_equal};
pub use error::{IdentityError, SandboxError, SnapshotError};
pub use ident::{PersistentId, SnapshotEnvelope, split_type_tag};
pub use item::{
    Addressable, CatalogItem, CatalogItemRef, MultiRepresentable, SnapshotCapable, items_equal,
};
pub use signature::{ItemKey, Signature};
