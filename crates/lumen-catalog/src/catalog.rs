//! Catalog merge and the source registry.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use lumen_protocol::{CatalogItem, CatalogItemRef, Signature};
use parking_lot::RwLock;
use serde_json::{Value, json};
use tracing::warn;

use crate::source::{ItemProvider, Source};

/// Type tag of [`CollectionItem`].
pub const COLLECTION_TAG: &str = "lumen.catalog::Collection";

/// Every source known to the process, keyed by signature, in registration
/// (priority) order.
///
/// Top-level sources are the always-visible roots; the rest — content
/// sources, hidden providers — are reachable only through browsing or
/// resolution. An explicit injected object, never an ambient global.
#[derive(Default)]
pub struct SourceRegistry {
    sources: RwLock<IndexMap<Signature, RegisteredSource>>,
}

struct RegisteredSource {
    source: Arc<Source>,
    top_level: bool,
}

impl SourceRegistry {
    pub fn register(&self, source: Arc<Source>, top_level: bool) {
        self.sources
            .write()
            .insert(source.signature(), RegisteredSource { source, top_level });
    }

    pub fn get(&self, signature: &Signature) -> Option<Arc<Source>> {
        self.sources
            .read()
            .get(signature)
            .map(|registered| registered.source.clone())
    }

    /// Always-visible sources, in priority order.
    pub fn top_level(&self) -> Vec<Arc<Source>> {
        self.sources
            .read()
            .values()
            .filter(|registered| registered.top_level)
            .map(|registered| registered.source.clone())
            .collect()
    }

    /// Registered sources outside the top level, in registration order.
    pub fn non_top_level(&self) -> Vec<Arc<Source>> {
        self.sources
            .read()
            .values()
            .filter(|registered| !registered.top_level)
            .map(|registered| registered.source.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.read().is_empty()
    }
}

/// Union of many sources presented as one browsable source.
///
/// Always dynamic: a union must reflect whichever children are, so the
/// merged sequence is recomputed on every browse while each static child
/// still serves from its own cache.
pub struct Catalog {
    name: String,
    children: Vec<Arc<Source>>,
}

impl Catalog {
    pub fn new(name: impl Into<String>, children: Vec<Arc<Source>>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

}

#[async_trait]
impl ItemProvider for Catalog {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> Signature {
        Signature::new("lumen.catalog::Catalog", &json!({ "name": self.name }))
    }

    async fn produce(&self) -> Result<Vec<CatalogItemRef>> {
        let mut merged = Vec::new();
        for child in &self.children {
            match child.get_items(false).await {
                Ok(items) => merged.extend(items.iter().cloned()),
                Err(err) => {
                    warn!(source = %child.name(), error = %err, "child source failed, skipping");
                }
            }
        }
        Ok(merged)
    }

    fn is_dynamic(&self) -> bool {
        true
    }
}

/// "Enter this collection" leaf exposing a source back into the merged
/// sequence.
///
/// Browsing it descends into the named source's items, which makes the
/// catalog a recursively browsable tree — and is where content cycles can
/// arise.
#[derive(Debug, Clone)]
pub struct CollectionItem {
    name: String,
    signature: Signature,
}

impl CollectionItem {
    pub fn for_source(source: &Source) -> Self {
        Self {
            name: source.name().to_owned(),
            signature: source.signature(),
        }
    }

    pub fn source_signature(&self) -> &Signature {
        &self.signature
    }
}

impl CatalogItem for CollectionItem {
    fn type_tag(&self) -> &'static str {
        COLLECTION_TAG
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn payload(&self) -> Value {
        json!({ "source": &self.signature })
    }
}
