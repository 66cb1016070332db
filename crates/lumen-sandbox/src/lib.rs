//! # lumen-sandbox — Sandboxed snapshot deserialization
//!
//! Reconstructs [`SnapshotEnvelope`] payloads under an ordered allowlist
//! policy. The payload can only name decoders the host already registered;
//! serialized bytes can never cause new code to load, only reference types
//! the host chose to trust.
//!
//! ## Module Overview
//!
//! - [`policy`] — `SandboxPolicy`, ordered `(module-pattern, symbols)` rules
//! - [`decoders`] — builtin decoders, the `Restore` helper, `SnapshotItem`

pub mod decoders;
pub mod policy;

use std::sync::Arc;

use indexmap::IndexMap;
use lumen_protocol::{
    ActionItemRef, CatalogItemRef, SandboxError, SnapshotEnvelope, split_type_tag,
};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, instrument, warn};

pub use decoders::{
    RESTORE_TAG, RestoreDecoder, SNAPSHOT_TAG, SnapshotItem, register_builtin_decoders,
};
pub use policy::{PolicyRule, SandboxPolicy, Symbols};

/// Object reconstructed from a snapshot payload.
#[derive(Debug, Clone)]
pub enum DecodedObject {
    Item(CatalogItemRef),
    Action(ActionItemRef),
}

/// Per-type snapshot decoder.
///
/// Registering a decoder is how the host "loads" a type into the sandbox;
/// the explicit per-type registry replaces a generic object-graph
/// deserializer so the trusted surface stays exhaustive.
pub trait SnapshotDecoder: Send + Sync {
    /// Current wire version of the type.
    fn current_version(&self) -> u32;

    /// Reconstruct from envelope fields recorded at `version`. Decoders may
    /// migrate historic versions; staleness enforcement is the caller's.
    fn decode(&self, version: u32, fields: &Value) -> Result<DecodedObject, SandboxError>;
}

/// Decoders keyed by type tag, in registration order.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: RwLock<IndexMap<String, Arc<dyn SnapshotDecoder>>>,
}

impl DecoderRegistry {
    pub fn register(&self, type_tag: impl Into<String>, decoder: Arc<dyn SnapshotDecoder>) {
        self.decoders.write().insert(type_tag.into(), decoder);
    }

    pub fn get(&self, type_tag: &str) -> Option<Arc<dyn SnapshotDecoder>> {
        self.decoders.read().get(type_tag).cloned()
    }

    /// Whether any decoder lives under `module` — the analogue of "this
    /// module is already loaded in the running process".
    pub fn module_loaded(&self, module: &str) -> bool {
        self.decoders
            .read()
            .keys()
            .any(|tag| split_type_tag(tag).0 == module)
    }
}

/// A successful sandboxed decode. The recorded and current versions travel
/// together so the caller can fail closed on mismatch.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub object: DecodedObject,
    pub recorded_version: u32,
    pub current_version: u32,
}

impl Decoded {
    pub fn version_current(&self) -> bool {
        self.recorded_version == self.current_version
    }
}

/// Reconstructs snapshot payloads under an allowlist policy.
///
/// Stateless apart from the shared registry; safe for concurrent use.
#[derive(Clone)]
pub struct SandboxedDeserializer {
    policy: SandboxPolicy,
    registry: Arc<DecoderRegistry>,
}

impl SandboxedDeserializer {
    pub fn new(policy: SandboxPolicy, registry: Arc<DecoderRegistry>) -> Self {
        Self { policy, registry }
    }

    /// Decode a snapshot payload.
    ///
    /// Refusals are loud on purpose: they mark possibly-hostile persisted
    /// data, distinct from ordinary corruption.
    #[instrument(skip(self, payload))]
    pub fn deserialize(&self, payload: &[u8]) -> Result<Decoded, SandboxError> {
        let envelope = SnapshotEnvelope::from_bytes(payload)?;
        let (module, symbol) = envelope.split_tag();

        if !self.registry.module_loaded(module) {
            warn!(module, "refused: module not loaded");
            return Err(SandboxError::Refused(format!("module not loaded: {module}")));
        }

        if !self.policy.allows(module, symbol) {
            warn!(module, symbol, "refused by policy");
            return Err(SandboxError::Refused(format!(
                "symbol not allowed: {}",
                envelope.type_tag
            )));
        }

        let decoder = self
            .registry
            .get(&envelope.type_tag)
            .ok_or_else(|| SandboxError::UnknownType(envelope.type_tag.clone()))?;

        let object = decoder.decode(envelope.version, &envelope.fields)?;
        debug!(type_tag = %envelope.type_tag, version = envelope.version, "snapshot decoded");
        Ok(Decoded {
            object,
            recorded_version: envelope.version,
            current_version: decoder.current_version(),
        })
    }
}
