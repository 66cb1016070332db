//! Content decoration: binding a source to an anchor item.

use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use lumen_protocol::{CatalogItem, ItemKey};
use parking_lot::RwLock;
use tracing::debug;

use crate::catalog::SourceRegistry;
use crate::source::Source;

/// Declares a source type as the canonical contents of one anchor item.
///
/// The anchor is named by identity key, so the anchor's own type needs no
/// knowledge of its decorator. Implementations should memoize their anchor
/// prototype; building it can itself require a provider lookup.
pub trait ContentDecorator: Send + Sync {
    fn anchor(&self) -> ItemKey;
    fn construct(&self) -> Arc<Source>;
}

struct ContentBinding {
    decorator: Arc<dyn ContentDecorator>,
    instance: OnceLock<Arc<Source>>,
}

/// Sparse item-key to content-source dispatch, bound at catalog composition
/// time.
///
/// Instances are constructed lazily on first hit, memoized, and registered
/// in the [`SourceRegistry`] so resolver scans can reach them.
#[derive(Default)]
pub struct ContentRegistry {
    bindings: RwLock<IndexMap<ItemKey, ContentBinding>>,
}

impl ContentRegistry {
    pub fn register(&self, decorator: Arc<dyn ContentDecorator>) {
        let anchor = decorator.anchor();
        self.bindings.write().insert(
            anchor,
            ContentBinding {
                decorator,
                instance: OnceLock::new(),
            },
        );
    }

    /// Content source for an item, constructing and memoizing on first hit.
    pub fn content_for(
        &self,
        item: &dyn CatalogItem,
        sources: &SourceRegistry,
    ) -> Option<Arc<Source>> {
        let key = item.key();
        let bindings = self.bindings.read();
        let binding = bindings.get(&key)?;
        let source = binding.instance.get_or_init(|| {
            let source = binding.decorator.construct();
            sources.register(source.clone(), false);
            debug!(
                anchor = %item.display_name(),
                source = %source.name(),
                "content source bound"
            );
            source
        });
        Some(source.clone())
    }

    pub fn is_decorated(&self, key: &ItemKey) -> bool {
        self.bindings.read().contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::TextItem;
    use crate::source::ItemProvider;
    use anyhow::Result;
    use async_trait::async_trait;
    use lumen_protocol::{CatalogItemRef, Signature};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EmptyProvider {
        name: String,
    }

    #[async_trait]
    impl ItemProvider for EmptyProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn signature(&self) -> Signature {
            Signature::new("lumen.test::EmptyProvider", &json!({ "name": self.name }))
        }

        async fn produce(&self) -> Result<Vec<CatalogItemRef>> {
            Ok(Vec::new())
        }
    }

    struct MusicContents {
        constructed: AtomicUsize,
    }

    impl ContentDecorator for MusicContents {
        fn anchor(&self) -> ItemKey {
            TextItem::new("Music").key()
        }

        fn construct(&self) -> Arc<Source> {
            self.constructed.fetch_add(1, Ordering::SeqCst);
            Source::new(Arc::new(EmptyProvider {
                name: "Music contents".into(),
            }))
        }
    }

    #[test]
    fn dispatch_is_by_item_identity() {
        let registry = ContentRegistry::default();
        let sources = SourceRegistry::default();
        registry.register(Arc::new(MusicContents {
            constructed: AtomicUsize::new(0),
        }));

        // Display-name wrapper differences do not matter; payload does.
        assert!(
            registry
                .content_for(&TextItem::new("Music"), &sources)
                .is_some()
        );
        assert!(
            registry
                .content_for(&TextItem::new("Videos"), &sources)
                .is_none()
        );
    }

    #[test]
    fn instance_is_memoized_and_registered() {
        let registry = ContentRegistry::default();
        let sources = SourceRegistry::default();
        let decorator = Arc::new(MusicContents {
            constructed: AtomicUsize::new(0),
        });
        registry.register(decorator.clone());

        let anchor = TextItem::new("Music");
        let first = registry.content_for(&anchor, &sources).unwrap();
        let second = registry.content_for(&anchor, &sources).unwrap();

        assert_eq!(decorator.constructed.load(Ordering::SeqCst), 1);
        assert_eq!(first.signature(), second.signature());
        // Lazily constructed instances become reachable for resolver scans.
        assert!(sources.get(&first.signature()).is_some());
        assert_eq!(sources.top_level().len(), 0);
    }

    #[test]
    fn undecorated_items_are_a_cheap_miss() {
        let registry = ContentRegistry::default();
        let sources = SourceRegistry::default();
        assert!(
            registry
                .content_for(&TextItem::new("anything"), &sources)
                .is_none()
        );
        assert!(!registry.is_decorated(&TextItem::new("anything").key()));
    }
}
