//! Catalog item contract and capability traits.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::action::ActionItemRef;
use crate::error::SnapshotError;
use crate::signature::ItemKey;

/// Shared handle to a catalog item.
pub type CatalogItemRef = Arc<dyn CatalogItem>;

/// A domain object exposed by a provider: a file, an application, a text
/// fragment, a bookmark, a running window.
///
/// Identity is `(concrete type, payload)`; the display name is presentation
/// only. Capability traits are probed explicitly rather than by reflection:
/// a concrete type that supports a capability returns `Some(self)` from the
/// matching probe.
pub trait CatalogItem: Send + Sync + fmt::Debug {
    /// Stable `module::Symbol` tag naming the concrete type. Doubles as the
    /// snapshot wire tag, so it must never change across releases without a
    /// version bump.
    fn type_tag(&self) -> &'static str;

    /// Human-readable name. Never part of item identity.
    fn display_name(&self) -> &str;

    /// Opaque identity payload. Two items of the same type with equal
    /// payloads are interchangeable, whatever their display names say.
    fn payload(&self) -> Value;

    /// Identity key combining type tag and canonical payload.
    fn key(&self) -> ItemKey {
        ItemKey::new(self.type_tag(), &self.payload())
    }

    /// Actions the item itself declares.
    fn actions(&self) -> Vec<ActionItemRef> {
        Vec::new()
    }

    fn as_addressable(&self) -> Option<&dyn Addressable> {
        None
    }

    fn as_snapshot_capable(&self) -> Option<&dyn SnapshotCapable> {
        None
    }

    fn as_multi(&self) -> Option<&dyn MultiRepresentable> {
        None
    }
}

/// Items with a stable external locator: a rooted catalog path such as
/// `/Applications/Browser`. Resolvable by a direct walk instead of a scan.
pub trait Addressable {
    fn address(&self) -> String;
}

/// Items that can serialize themselves into a self-contained, versioned
/// snapshot.
pub trait SnapshotCapable {
    /// Current wire format version of the producing type.
    fn snapshot_version(&self) -> u32;

    /// Serialize the item's fields. `Unsupported` degrades the caller to a
    /// best-effort reference; resource failures propagate.
    fn snapshot(&self) -> Result<Value, SnapshotError>;
}

/// Items standing for a set of other items, e.g. a multi-selection.
pub trait MultiRepresentable {
    fn representations(&self) -> Vec<CatalogItemRef>;
}

/// Identity comparison: `(concrete type, payload)`, display name excluded.
pub fn items_equal(a: &dyn CatalogItem, b: &dyn CatalogItem) -> bool {
    a.key() == b.key()
}
