//! Building persistent ids and resolving them back into live objects.

use std::collections::HashSet;
use std::sync::Arc;

use lumen_catalog::{COLLECTION_TAG, ContentRegistry, Source, SourceRegistry};
use lumen_protocol::{
    ActionItem, ActionItemRef, CatalogItem, CatalogItemRef, IdentityError, PersistentId,
    SandboxError, Signature, SnapshotEnvelope, SnapshotError,
};
use lumen_sandbox::{DecodedObject, SandboxedDeserializer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::actions::ActionRegistry;

/// Call-local set of sources already visited by one resolve walk.
///
/// Threaded as a value, never process-global, so concurrent resolutions
/// cannot interfere with or falsely short-circuit each other. Guarantees
/// each distinct source is visited at most once per top-level resolve,
/// which is what terminates content cycles.
#[derive(Debug, Default)]
pub struct VisitGuard {
    visited: HashSet<Signature>,
}

impl VisitGuard {
    /// True if newly entered; false if the source is already on this call's
    /// visiting stack and must be skipped outright.
    pub fn enter(&mut self, signature: &Signature) -> bool {
        self.visited.insert(signature.clone())
    }
}

/// Reference string for an item: the address for addressable items, a
/// display-derived best-effort form for everything else.
///
/// Resolution scans compare against exactly this, so a degraded id built
/// from the display form still matches its item.
pub fn reference_for(item: &dyn CatalogItem) -> String {
    match item.as_addressable() {
        Some(addressable) => addressable.address(),
        None => display_reference(item),
    }
}

fn display_reference(item: &dyn CatalogItem) -> String {
    format!("{} {}", item.type_tag(), item.display_name())
}

/// Durable id for an action: a reference derived from its signature, since
/// most actions are stateless singletons per provider.
pub fn action_id(action: &dyn ActionItem) -> PersistentId {
    PersistentId::Reference(format!("action:{}", action.signature()))
}

/// Resolves persistent ids against the catalog.
///
/// Snapshot ids go through the sandboxed deserializer; reference ids are
/// re-discovered by an address walk or a guarded linear scan. No hidden
/// global mutation: all walk state lives in the per-call [`VisitGuard`].
pub struct IdentityResolver {
    sources: Arc<SourceRegistry>,
    content: Arc<ContentRegistry>,
    actions: Arc<ActionRegistry>,
    deserializer: SandboxedDeserializer,
}

impl IdentityResolver {
    pub fn new(
        sources: Arc<SourceRegistry>,
        content: Arc<ContentRegistry>,
        actions: Arc<ActionRegistry>,
        deserializer: SandboxedDeserializer,
    ) -> Self {
        Self {
            sources,
            content,
            actions,
            deserializer,
        }
    }

    /// Build a persistent id for an item.
    ///
    /// Addressable items get their address; snapshot-capable items get a
    /// self-contained snapshot, degrading to a display-derived reference if
    /// the item declines to serialize (resource failures still propagate);
    /// everything else gets the best-effort display reference.
    pub fn persistent_id(
        &self,
        item: Option<&dyn CatalogItem>,
    ) -> Result<Option<PersistentId>, IdentityError> {
        let Some(item) = item else {
            return Ok(None);
        };

        if let Some(addressable) = item.as_addressable() {
            return Ok(Some(PersistentId::Reference(addressable.address())));
        }

        if let Some(capable) = item.as_snapshot_capable() {
            match capable.snapshot() {
                Ok(fields) => {
                    let envelope = SnapshotEnvelope::new(
                        item.type_tag(),
                        capable.snapshot_version(),
                        fields,
                    );
                    return Ok(Some(envelope.into_id()));
                }
                Err(SnapshotError::Unsupported(reason)) => {
                    debug!(
                        item = %item.display_name(),
                        reason,
                        "snapshot declined, degrading to display reference"
                    );
                }
                Err(err @ SnapshotError::Resource(_)) => return Err(err.into()),
            }
        }

        Ok(Some(PersistentId::Reference(display_reference(item))))
    }

    /// Resolve an id back into a live item.
    ///
    /// "Not found" and "stale snapshot version" come back as `Ok(None)` so a
    /// batch restore can skip individual items; sandbox refusals stay `Err`.
    /// A caller that is itself a source resolving something inside itself
    /// passes its own signature as `excluding`.
    #[instrument(skip(self, id, token), fields(excluding = ?excluding.map(Signature::type_tag)))]
    pub async fn resolve(
        &self,
        id: Option<&PersistentId>,
        excluding: Option<&Signature>,
        token: &CancellationToken,
    ) -> Result<Option<CatalogItemRef>, IdentityError> {
        let Some(id) = id else {
            return Ok(None);
        };

        match id {
            PersistentId::Snapshot { payload, .. } => self.resolve_snapshot_item(payload),
            PersistentId::Reference(reference) => {
                let mut guard = VisitGuard::default();
                if let Some(signature) = excluding {
                    guard.enter(signature);
                }
                if reference.starts_with('/') {
                    self.resolve_address(reference, &mut guard, token).await
                } else {
                    self.resolve_by_scan(reference, &mut guard, token).await
                }
            }
        }
    }

    /// Resolve an action id.
    ///
    /// With a selection, the search is restricted to actions applicable to
    /// every selected item: each item's own declared actions plus registered
    /// decorator actions, intersected across the selection. Without one, the
    /// global registered-action table. Snapshot ids deserialize directly.
    #[instrument(skip(self, id, selection), fields(selection_len = selection.len()))]
    pub fn resolve_action(
        &self,
        id: Option<&PersistentId>,
        selection: &[CatalogItemRef],
    ) -> Result<Option<ActionItemRef>, IdentityError> {
        let Some(id) = id else {
            return Ok(None);
        };

        if let PersistentId::Snapshot { payload, .. } = id {
            return self.resolve_snapshot_action(payload);
        }

        let candidates = if selection.is_empty() {
            self.actions.global()
        } else {
            intersect(
                selection
                    .iter()
                    .map(|item| self.applicable_actions(item.as_ref()))
                    .collect(),
            )
        };

        Ok(candidates
            .into_iter()
            .find(|candidate| action_id(candidate.as_ref()) == *id))
    }

    fn resolve_snapshot_item(
        &self,
        payload: &[u8],
    ) -> Result<Option<CatalogItemRef>, IdentityError> {
        match self.decode_snapshot(payload)? {
            Some(DecodedObject::Item(item)) => Ok(Some(item)),
            Some(DecodedObject::Action(_)) => {
                warn!("snapshot decoded to an action, expected an item");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn resolve_snapshot_action(
        &self,
        payload: &[u8],
    ) -> Result<Option<ActionItemRef>, IdentityError> {
        match self.decode_snapshot(payload)? {
            Some(DecodedObject::Action(action)) => Ok(Some(action)),
            Some(DecodedObject::Item(_)) => {
                warn!("snapshot decoded to an item, expected an action");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Shared snapshot path: refusals propagate, corruption and stale
    /// versions fail closed to `None`.
    fn decode_snapshot(&self, payload: &[u8]) -> Result<Option<DecodedObject>, IdentityError> {
        match self.deserializer.deserialize(payload) {
            Ok(decoded) => {
                if !decoded.version_current() {
                    warn!(
                        recorded = decoded.recorded_version,
                        current = decoded.current_version,
                        "stale snapshot version, failing closed"
                    );
                    return Ok(None);
                }
                Ok(Some(decoded.object))
            }
            Err(err @ SandboxError::Refused(_)) => Err(err.into()),
            Err(err) => {
                warn!(error = %err, "snapshot payload unusable");
                Ok(None)
            }
        }
    }

    /// Direct O(depth) walk of a rooted catalog path.
    async fn resolve_address(
        &self,
        path: &str,
        guard: &mut VisitGuard,
        token: &CancellationToken,
    ) -> Result<Option<CatalogItemRef>, IdentityError> {
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        let Some(root) = segments.next() else {
            return Ok(None);
        };
        let Some(mut source) = self
            .sources
            .top_level()
            .into_iter()
            .find(|source| source.name() == root)
        else {
            return Ok(None);
        };

        loop {
            if token.is_cancelled() {
                return Err(IdentityError::Cancelled);
            }
            if !guard.enter(&source.signature()) {
                debug!(source = %source.name(), "cyclic address, giving up");
                return Ok(None);
            }

            // The address named a source with no item segment left.
            let Some(segment) = segments.next() else {
                return Ok(None);
            };

            let items = match source.get_items(false).await {
                Ok(items) => items,
                Err(err) => {
                    warn!(source = %source.name(), error = %err, "source failed during walk");
                    return Ok(None);
                }
            };
            let Some(item) = items
                .iter()
                .find(|item| item.display_name() == segment)
                .cloned()
            else {
                return Ok(None);
            };

            if segments.peek().is_none() {
                return Ok(Some(item));
            }
            let Some(next) = self.content_source_for(item.as_ref()) else {
                return Ok(None);
            };
            source = next;
        }
    }

    /// Linear scan: top-level sources first, then the remaining registered
    /// sources, comparing each item's freshly computed reference.
    async fn resolve_by_scan(
        &self,
        reference: &str,
        guard: &mut VisitGuard,
        token: &CancellationToken,
    ) -> Result<Option<CatalogItemRef>, IdentityError> {
        let candidates = self
            .sources
            .top_level()
            .into_iter()
            .chain(self.sources.non_top_level());

        for source in candidates {
            if token.is_cancelled() {
                return Err(IdentityError::Cancelled);
            }
            if !guard.enter(&source.signature()) {
                debug!(source = %source.name(), "already visiting, skipped");
                continue;
            }

            let items = match source.get_items(false).await {
                Ok(items) => items,
                Err(err) => {
                    warn!(source = %source.name(), error = %err, "source failed during scan, skipped");
                    continue;
                }
            };
            for item in items.iter() {
                if reference_for(item.as_ref()) == reference {
                    return Ok(Some(item.clone()));
                }
            }
        }

        debug!(reference, "reference matched nothing");
        Ok(None)
    }

    /// The browsable contents of an item: an explicit collection leaf or a
    /// decorator-bound content source.
    fn content_source_for(&self, item: &dyn CatalogItem) -> Option<Arc<Source>> {
        if item.type_tag() == COLLECTION_TAG {
            let signature: Signature =
                serde_json::from_value(item.payload().get("source")?.clone()).ok()?;
            return self.sources.get(&signature);
        }
        self.content.content_for(item, &self.sources)
    }

    /// Actions applicable to one item. A stand-in for several items offers
    /// only what all of its representations offer.
    fn applicable_actions(&self, item: &dyn CatalogItem) -> Vec<ActionItemRef> {
        if let Some(multi) = item.as_multi() {
            return intersect(
                multi
                    .representations()
                    .iter()
                    .map(|repr| self.applicable_actions(repr.as_ref()))
                    .collect(),
            );
        }
        let mut actions = item.actions();
        actions.extend(self.actions.decorating(item.type_tag()));
        actions
    }
}

/// Intersection of action sets by signature, keeping the first set's order.
fn intersect(sets: Vec<Vec<ActionItemRef>>) -> Vec<ActionItemRef> {
    let mut sets = sets.into_iter();
    let Some(first) = sets.next() else {
        return Vec::new();
    };
    sets.fold(first, |kept, next| {
        let signatures: HashSet<Signature> =
            next.iter().map(|action| action.signature()).collect();
        kept.into_iter()
            .filter(|action| signatures.contains(&action.signature()))
            .collect()
    })
}
