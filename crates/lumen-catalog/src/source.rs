//! Lazily-caching item sources.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use lumen_protocol::{CatalogItemRef, Signature};
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

/// Provider half of a source: produces the items and declares behavior.
///
/// Implemented by provider plugins; the caching machinery lives in
/// [`Source`]. `produce` may be expensive (I/O) and is expected to run as a
/// cancellable background task on the interactive path.
#[async_trait]
pub trait ItemProvider: Send + Sync {
    /// Display name; also the path segment rooted references use.
    fn name(&self) -> &str;

    /// Instance-independent identity: `(type, constructor parameters)`.
    fn signature(&self) -> Signature;

    /// Produce the full item sequence.
    async fn produce(&self) -> Result<Vec<CatalogItemRef>>;

    /// Dynamic content depends on external "now" state (clipboard, window
    /// list) and is never cached.
    fn is_dynamic(&self) -> bool {
        false
    }

    /// Lexical ordering instead of provider-declared relevance order.
    fn sort_lexically(&self) -> bool {
        false
    }
}

enum CacheSlot {
    Empty,
    Materializing,
    Ready(Arc<[CatalogItemRef]>),
}

/// Lazily-caching wrapper around an [`ItemProvider`].
///
/// The cached sequence is an `Arc` slice, so any number of callers can
/// iterate it repeatedly and partially without re-invoking `produce`. The
/// only shared mutable state is the cache slot; staleness is tolerable, so
/// the discipline is "last write wins, next read sees it".
pub struct Source {
    provider: Arc<dyn ItemProvider>,
    cache: RwLock<CacheSlot>,
}

impl Source {
    pub fn new(provider: Arc<dyn ItemProvider>) -> Arc<Self> {
        Arc::new(Self {
            provider,
            cache: RwLock::new(CacheSlot::Empty),
        })
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn signature(&self) -> Signature {
        self.provider.signature()
    }

    pub fn is_dynamic(&self) -> bool {
        self.provider.is_dynamic()
    }

    /// Invalidate the cache. Safe to call at any time, including while a
    /// materialization is in flight; the contract is that the next
    /// `get_items` call sees the dirty mark, not that in-flight calls abort.
    pub fn mark_dirty(&self) {
        *self.cache.write() = CacheSlot::Empty;
        debug!(source = %self.provider.name(), "cache invalidated");
    }

    /// Current items, honoring the cache and sort policy.
    ///
    /// Dynamic sources always re-produce and never retain a cache. Static
    /// sources produce once and serve the cached sequence until invalidated.
    /// `force` bypasses a ready cache and reports the reloaded item count.
    pub async fn get_items(&self, force: bool) -> Result<Arc<[CatalogItemRef]>> {
        if self.provider.is_dynamic() {
            let items = self.materialize().await?;
            if force {
                info!(source = %self.provider.name(), items = items.len(), "source reloaded");
            }
            return Ok(items);
        }

        if !force {
            if let CacheSlot::Ready(items) = &*self.cache.read() {
                return Ok(items.clone());
            }
        }

        *self.cache.write() = CacheSlot::Materializing;
        let items = self.materialize().await?;

        // A mark_dirty that landed mid-flight left the slot Empty; the dirty
        // mark wins, so the next call re-produces.
        {
            let mut slot = self.cache.write();
            if !matches!(*slot, CacheSlot::Empty) {
                *slot = CacheSlot::Ready(items.clone());
            }
        }

        if force {
            info!(source = %self.provider.name(), items = items.len(), "source reloaded");
        }
        Ok(items)
    }

    #[instrument(skip(self), fields(source = %self.provider.name()))]
    async fn materialize(&self) -> Result<Arc<[CatalogItemRef]>> {
        let mut items = self.provider.produce().await?;
        if self.provider.sort_lexically() {
            // Stable sort on the case-folded display name; otherwise the
            // provider-declared relevance order is preserved verbatim.
            items.sort_by_key(|item| item.display_name().to_lowercase());
        }
        debug!(source = %self.provider.name(), items = items.len(), "source materialized");
        Ok(items.into())
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("signature", &self.provider.signature())
            .field("dynamic", &self.provider.is_dynamic())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::TextItem;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ListingProvider {
        name: String,
        entries: Mutex<Vec<String>>,
        produced: AtomicUsize,
        dynamic: bool,
        sorted: bool,
    }

    impl ListingProvider {
        fn new(name: &str, entries: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_owned(),
                entries: Mutex::new(entries.iter().map(|e| e.to_string()).collect()),
                produced: AtomicUsize::new(0),
                dynamic: false,
                sorted: false,
            })
        }

        fn dynamic(name: &str, entries: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                dynamic: true,
                ..Arc::try_unwrap(Self::new(name, entries)).ok().unwrap()
            })
        }

        fn sorted(name: &str, entries: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                sorted: true,
                ..Arc::try_unwrap(Self::new(name, entries)).ok().unwrap()
            })
        }

        fn produce_count(&self) -> usize {
            self.produced.load(Ordering::SeqCst)
        }

        fn set_entries(&self, entries: &[&str]) {
            *self.entries.lock() = entries.iter().map(|e| e.to_string()).collect();
        }
    }

    #[async_trait]
    impl ItemProvider for ListingProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn signature(&self) -> Signature {
            Signature::new("lumen.test::ListingProvider", &json!({ "name": self.name }))
        }

        async fn produce(&self) -> Result<Vec<CatalogItemRef>> {
            self.produced.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .entries
                .lock()
                .iter()
                .map(|entry| Arc::new(TextItem::new(entry.clone())) as CatalogItemRef)
                .collect())
        }

        fn is_dynamic(&self) -> bool {
            self.dynamic
        }

        fn sort_lexically(&self) -> bool {
            self.sorted
        }
    }

    fn names(items: &[CatalogItemRef]) -> Vec<String> {
        items.iter().map(|i| i.display_name().to_owned()).collect()
    }

    #[tokio::test]
    async fn cache_idempotence() {
        let provider = ListingProvider::new("Downloads", &["A", "B", "C"]);
        let source = Source::new(provider.clone());

        let first = source.get_items(false).await.unwrap();
        let second = source.get_items(false).await.unwrap();
        let third = source.get_items(false).await.unwrap();

        assert_eq!(names(&first), vec!["A", "B", "C"]);
        assert_eq!(names(&second), names(&first));
        assert_eq!(names(&third), names(&first));
        assert_eq!(provider.produce_count(), 1);
    }

    #[tokio::test]
    async fn dirty_invalidation_reproduces() {
        let provider = ListingProvider::new("Downloads", &["A", "B", "C"]);
        let source = Source::new(provider.clone());

        for _ in 0..3 {
            let items = source.get_items(false).await.unwrap();
            assert_eq!(names(&items), vec!["A", "B", "C"]);
        }
        assert_eq!(provider.produce_count(), 1);

        provider.set_entries(&["A", "C"]);
        source.mark_dirty();

        let items = source.get_items(false).await.unwrap();
        assert_eq!(names(&items), vec!["A", "C"]);
        assert_eq!(provider.produce_count(), 2);
    }

    #[tokio::test]
    async fn mid_flight_dirty_mark_wins() {
        use tokio::sync::Semaphore;

        struct GatedProvider {
            gate: Semaphore,
            produced: AtomicUsize,
        }

        #[async_trait]
        impl ItemProvider for GatedProvider {
            fn name(&self) -> &str {
                "Gated"
            }

            fn signature(&self) -> Signature {
                Signature::new("lumen.test::GatedProvider", &json!({ "name": "Gated" }))
            }

            async fn produce(&self) -> Result<Vec<CatalogItemRef>> {
                self.produced.fetch_add(1, Ordering::SeqCst);
                let _permit = self.gate.acquire().await?;
                Ok(vec![Arc::new(TextItem::new("late")) as CatalogItemRef])
            }
        }

        let provider = Arc::new(GatedProvider {
            gate: Semaphore::new(0),
            produced: AtomicUsize::new(0),
        });
        let source = Source::new(provider.clone());

        let in_flight = tokio::spawn({
            let source = source.clone();
            async move { source.get_items(false).await }
        });
        while provider.produced.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // Invalidation lands while produce is still parked on the gate.
        source.mark_dirty();
        provider.gate.add_permits(1);

        // The in-flight call still gets its items.
        let items = in_flight.await.unwrap().unwrap();
        assert_eq!(names(&items), vec!["late"]);

        // But the dirty mark survived: the next read re-produces.
        provider.gate.add_permits(1);
        source.get_items(false).await.unwrap();
        assert_eq!(provider.produced.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn dynamic_source_never_caches() {
        let provider = ListingProvider::dynamic("Clipboard", &["now"]);
        let source = Source::new(provider.clone());

        source.get_items(false).await.unwrap();
        source.get_items(false).await.unwrap();
        assert_eq!(provider.produce_count(), 2);
    }

    #[tokio::test]
    async fn force_bypasses_ready_cache() {
        let provider = ListingProvider::new("Apps", &["editor"]);
        let source = Source::new(provider.clone());

        source.get_items(false).await.unwrap();
        source.get_items(true).await.unwrap();
        assert_eq!(provider.produce_count(), 2);
    }

    #[tokio::test]
    async fn lexical_sort_is_case_folded() {
        let provider = ListingProvider::sorted("Apps", &["banana", "Apple", "cherry"]);
        let source = Source::new(provider);

        let items = source.get_items(false).await.unwrap();
        assert_eq!(names(&items), vec!["Apple", "banana", "cherry"]);
    }

    #[tokio::test]
    async fn relevance_order_preserved_without_sort_policy() {
        let provider = ListingProvider::new("Recent", &["zeta", "alpha"]);
        let source = Source::new(provider);

        let items = source.get_items(false).await.unwrap();
        assert_eq!(names(&items), vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn cached_sequence_is_restartable() {
        let provider = ListingProvider::new("Docs", &["a", "b", "c"]);
        let source = Source::new(provider.clone());

        let items = source.get_items(false).await.unwrap();
        // Partial and repeated iteration over the same cached slice.
        let mut partial = items.iter();
        let _ = partial.next();
        drop(partial);
        assert_eq!(items.iter().count(), 3);
        assert_eq!(source.get_items(false).await.unwrap().iter().count(), 3);
        assert_eq!(provider.produce_count(), 1);
    }
}
