//! Builtin decoders and the bootstrap restore path.

use std::sync::Arc;

use lumen_catalog::{TEXT_TAG, TextItem, URL_TAG, UrlItem};
use lumen_protocol::{
    CatalogItem, SandboxError, SnapshotCapable, SnapshotEnvelope, SnapshotError,
};
use serde_json::{Value, json};

use crate::{DecodedObject, DecoderRegistry, SnapshotDecoder};

/// Type tag of [`SnapshotItem`], the opaque snapshot wrapper.
pub const SNAPSHOT_TAG: &str = "lumen.ident::Snapshot";
/// Type tag of the bootstrap reconstruction helper.
pub const RESTORE_TAG: &str = "lumen.ident::Restore";

struct TextDecoder;

impl SnapshotDecoder for TextDecoder {
    fn current_version(&self) -> u32 {
        1
    }

    fn decode(&self, _version: u32, fields: &Value) -> Result<DecodedObject, SandboxError> {
        let text = fields
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| SandboxError::Malformed("text snapshot missing text field".into()))?;
        Ok(DecodedObject::Item(Arc::new(TextItem::new(text))))
    }
}

struct UrlDecoder;

impl SnapshotDecoder for UrlDecoder {
    fn current_version(&self) -> u32 {
        1
    }

    fn decode(&self, _version: u32, fields: &Value) -> Result<DecodedObject, SandboxError> {
        let url = fields
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| SandboxError::Malformed("url snapshot missing url field".into()))?;
        let item = match fields.get("title").and_then(Value::as_str) {
            Some(title) => UrlItem::titled(url, title),
            None => UrlItem::new(url),
        };
        Ok(DecodedObject::Item(Arc::new(item)))
    }
}

/// Opaque wrapper carrying a snapshot whose concrete type is not yet
/// trusted.
///
/// Produced by the bootstrap restore path: the inner envelope rides along
/// unreconstructed and can be resolved again once a broader deserializer is
/// available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotItem {
    envelope: SnapshotEnvelope,
}

impl SnapshotItem {
    pub fn new(envelope: SnapshotEnvelope) -> Self {
        Self { envelope }
    }

    pub fn envelope(&self) -> &SnapshotEnvelope {
        &self.envelope
    }
}

impl CatalogItem for SnapshotItem {
    fn type_tag(&self) -> &'static str {
        SNAPSHOT_TAG
    }

    fn display_name(&self) -> &str {
        &self.envelope.type_tag
    }

    fn payload(&self) -> Value {
        json!({
            "type_tag": self.envelope.type_tag,
            "version": self.envelope.version,
            "fields": self.envelope.fields,
        })
    }

    fn as_snapshot_capable(&self) -> Option<&dyn SnapshotCapable> {
        Some(self)
    }
}

impl SnapshotCapable for SnapshotItem {
    fn snapshot_version(&self) -> u32 {
        1
    }

    fn snapshot(&self) -> Result<Value, SnapshotError> {
        Ok(self.payload())
    }
}

fn envelope_from_fields(fields: &Value) -> Result<SnapshotEnvelope, SandboxError> {
    serde_json::from_value(fields.clone())
        .map_err(|err| SandboxError::Malformed(format!("inner envelope: {err}")))
}

/// Decoder for the [`SnapshotItem`] wrapper type itself.
struct SnapshotItemDecoder;

impl SnapshotDecoder for SnapshotItemDecoder {
    fn current_version(&self) -> u32 {
        1
    }

    fn decode(&self, _version: u32, fields: &Value) -> Result<DecodedObject, SandboxError> {
        Ok(DecodedObject::Item(Arc::new(SnapshotItem::new(
            envelope_from_fields(fields)?,
        ))))
    }
}

/// Bootstrap reconstruction helper: wraps an arbitrary inner envelope into
/// a [`SnapshotItem`] without decoding it, so untrusted payloads survive a
/// bootstrap pass intact.
pub struct RestoreDecoder;

impl RestoreDecoder {
    /// Build a restore envelope around `inner`, preserving it verbatim.
    pub fn wrap(inner: &SnapshotEnvelope) -> SnapshotEnvelope {
        SnapshotEnvelope::new(
            RESTORE_TAG,
            1,
            json!({
                "type_tag": inner.type_tag,
                "version": inner.version,
                "fields": inner.fields,
            }),
        )
    }
}

impl SnapshotDecoder for RestoreDecoder {
    fn current_version(&self) -> u32 {
        1
    }

    fn decode(&self, _version: u32, fields: &Value) -> Result<DecodedObject, SandboxError> {
        Ok(DecodedObject::Item(Arc::new(SnapshotItem::new(
            envelope_from_fields(fields)?,
        ))))
    }
}

/// Register the decoders for the builtin value types, the snapshot wrapper,
/// and the restore helper.
pub fn register_builtin_decoders(registry: &DecoderRegistry) {
    registry.register(TEXT_TAG, Arc::new(TextDecoder));
    registry.register(URL_TAG, Arc::new(UrlDecoder));
    registry.register(SNAPSHOT_TAG, Arc::new(SnapshotItemDecoder));
    registry.register(RESTORE_TAG, Arc::new(RestoreDecoder));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SandboxPolicy, SandboxedDeserializer};
    use lumen_protocol::items_equal;

    fn bootstrap_sandbox() -> SandboxedDeserializer {
        let registry = Arc::new(DecoderRegistry::default());
        register_builtin_decoders(&registry);
        SandboxedDeserializer::new(SandboxPolicy::bootstrap(), registry)
    }

    #[test]
    fn url_decoder_restores_title() {
        let registry = Arc::new(DecoderRegistry::default());
        register_builtin_decoders(&registry);
        let decoder = registry.get(URL_TAG).unwrap();
        let decoded = decoder
            .decode(1, &json!({ "url": "https://example.com", "title": "Example" }))
            .unwrap();
        match decoded {
            DecodedObject::Item(item) => {
                assert!(items_equal(
                    item.as_ref(),
                    &UrlItem::titled("https://example.com", "Example")
                ));
                assert_eq!(item.display_name(), "Example");
            }
            DecodedObject::Action(_) => panic!("expected item"),
        }
    }

    #[test]
    fn restore_carries_untrusted_payload_through_bootstrap() {
        // An envelope for a type the bootstrap policy does not trust.
        let inner = SnapshotEnvelope::new("lumen.files::File", 2, json!({ "path": "/tmp/x" }));
        let wrapped = RestoreDecoder::wrap(&inner);

        let sandbox = bootstrap_sandbox();
        let decoded = sandbox.deserialize(&wrapped.to_bytes()).unwrap();
        match decoded.object {
            DecodedObject::Item(item) => {
                assert_eq!(item.type_tag(), SNAPSHOT_TAG);
                // The inner envelope survives byte-for-byte for a later,
                // broader resolution.
                let reparsed = envelope_from_fields(&item.payload()).unwrap();
                assert_eq!(reparsed, inner);
            }
            DecodedObject::Action(_) => panic!("expected item"),
        }
    }

    #[test]
    fn bootstrap_refuses_the_inner_type_directly() {
        let inner = SnapshotEnvelope::new("lumen.files::File", 2, json!({ "path": "/tmp/x" }));
        let sandbox = bootstrap_sandbox();
        assert!(sandbox.deserialize(&inner.to_bytes()).is_err());
    }

    #[test]
    fn snapshot_item_roundtrips_as_snapshot() {
        let inner = SnapshotEnvelope::new("lumen.files::File", 2, json!({ "path": "/tmp/x" }));
        let item = SnapshotItem::new(inner.clone());
        let fields = item.as_snapshot_capable().unwrap().snapshot().unwrap();

        let registry = Arc::new(DecoderRegistry::default());
        register_builtin_decoders(&registry);
        let decoder = registry.get(SNAPSHOT_TAG).unwrap();
        match decoder.decode(1, &fields).unwrap() {
            DecodedObject::Item(back) => {
                assert!(items_equal(back.as_ref(), &item));
            }
            DecodedObject::Action(_) => panic!("expected item"),
        }
    }
}
