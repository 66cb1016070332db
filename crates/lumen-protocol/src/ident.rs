//! Persistent identity: references and snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SandboxError;

/// Durable name for a catalog item or action.
///
/// A `Reference` is an address the catalog can re-discover by walking or
/// scanning; a `Snapshot` is a self-contained, versioned payload
/// reconstructed through the sandboxed deserializer. Both are pure data:
/// they can be persisted byte-for-byte and handed back unchanged across a
/// process restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistentId {
    Reference(String),
    Snapshot { version: u32, payload: Vec<u8> },
}

impl PersistentId {
    /// True iff the id is not a snapshot.
    pub fn is_reference(&self) -> bool {
        matches!(self, PersistentId::Reference(_))
    }
}

/// Tagged wire format for snapshot payloads: `{type_tag, version, fields}`.
///
/// Decoded through a per-type decoder registry, never a generic object-graph
/// deserializer, so the trusted surface stays exhaustive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub type_tag: String,
    pub version: u32,
    pub fields: Value,
}

impl SnapshotEnvelope {
    pub fn new(type_tag: impl Into<String>, version: u32, fields: Value) -> Self {
        Self {
            type_tag: type_tag.into(),
            version,
            fields,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SandboxError> {
        serde_json::from_slice(bytes).map_err(|err| SandboxError::Malformed(err.to_string()))
    }

    /// Wrap into a persistent id, duplicating the version at the top level
    /// for cheap staleness checks.
    pub fn into_id(self) -> PersistentId {
        PersistentId::Snapshot {
            version: self.version,
            payload: self.to_bytes(),
        }
    }

    /// `(module, symbol)` halves of the type tag.
    pub fn split_tag(&self) -> (&str, &str) {
        split_type_tag(&self.type_tag)
    }
}

/// Split a `module::Symbol` tag. A tag without a separator is treated as a
/// bare module with an empty symbol.
pub fn split_type_tag(tag: &str) -> (&str, &str) {
    match tag.rsplit_once("::") {
        Some((module, symbol)) => (module, symbol),
        None => (tag, ""),
    }
}
