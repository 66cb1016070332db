//! Registered-action tables.

use indexmap::IndexMap;
use lumen_protocol::{ActionItemRef, Signature};
use parking_lot::RwLock;

/// Injected registry of actions: a global table plus actions decorating a
/// specific item type.
///
/// Decorator actions extend what an item's own type declares, without the
/// item type knowing about them — the action side of content decoration.
#[derive(Default)]
pub struct ActionRegistry {
    global: RwLock<IndexMap<Signature, ActionItemRef>>,
    by_item_type: RwLock<IndexMap<String, Vec<ActionItemRef>>>,
}

impl ActionRegistry {
    pub fn register(&self, action: ActionItemRef) {
        self.global.write().insert(action.signature(), action);
    }

    pub fn register_decorator(&self, item_type_tag: impl Into<String>, action: ActionItemRef) {
        self.by_item_type
            .write()
            .entry(item_type_tag.into())
            .or_default()
            .push(action);
    }

    /// The whole registered-action table, in registration order.
    pub fn global(&self) -> Vec<ActionItemRef> {
        self.global.read().values().cloned().collect()
    }

    /// Actions decorating items of `item_type_tag`.
    pub fn decorating(&self, item_type_tag: &str) -> Vec<ActionItemRef> {
        self.by_item_type
            .read()
            .get(item_type_tag)
            .cloned()
            .unwrap_or_default()
    }
}
