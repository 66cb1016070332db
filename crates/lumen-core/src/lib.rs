//! # lumen-core — Catalog service facade
//!
//! Wires the source registry, content decoration, action tables, sandboxed
//! deserializer, and identity resolver into one handle. Providers and
//! decorators are injected at build time; nothing here is an ambient
//! global.

use std::sync::Arc;

use anyhow::Result;
use lumen_catalog::{
    Catalog, ContentDecorator, ContentRegistry, ItemProvider, Source, SourceRegistry,
};
use lumen_identity::{ActionRegistry, IdentityResolver};
use lumen_protocol::{
    ActionItemRef, CatalogItem, CatalogItemRef, IdentityError, PersistentId, Signature,
};
use lumen_sandbox::{
    DecoderRegistry, SandboxPolicy, SandboxedDeserializer, SnapshotDecoder,
    register_builtin_decoders,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Assembles a [`CatalogService`].
///
/// Collects providers, decorators, actions, and decoders, then builds the
/// registries and resolver in one pass.
pub struct CatalogBuilder {
    name: String,
    top_level: Vec<Arc<dyn ItemProvider>>,
    hidden: Vec<Arc<dyn ItemProvider>>,
    decorators: Vec<Arc<dyn ContentDecorator>>,
    actions: Vec<ActionItemRef>,
    action_decorators: Vec<(String, ActionItemRef)>,
    decoders: Vec<(String, Arc<dyn SnapshotDecoder>)>,
    policy: SandboxPolicy,
}

impl CatalogBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            top_level: Vec::new(),
            hidden: Vec::new(),
            decorators: Vec::new(),
            actions: Vec::new(),
            action_decorators: Vec::new(),
            decoders: Vec::new(),
            policy: SandboxPolicy::catalog_default(),
        }
    }

    /// Add an always-visible source, in priority order.
    pub fn source(mut self, provider: Arc<dyn ItemProvider>) -> Self {
        self.top_level.push(provider);
        self
    }

    /// Add a source reachable only through browsing or resolution.
    pub fn hidden_source(mut self, provider: Arc<dyn ItemProvider>) -> Self {
        self.hidden.push(provider);
        self
    }

    pub fn content_decorator(mut self, decorator: Arc<dyn ContentDecorator>) -> Self {
        self.decorators.push(decorator);
        self
    }

    pub fn action(mut self, action: ActionItemRef) -> Self {
        self.actions.push(action);
        self
    }

    pub fn action_decorator(
        mut self,
        item_type_tag: impl Into<String>,
        action: ActionItemRef,
    ) -> Self {
        self.action_decorators.push((item_type_tag.into(), action));
        self
    }

    pub fn decoder(
        mut self,
        type_tag: impl Into<String>,
        decoder: Arc<dyn SnapshotDecoder>,
    ) -> Self {
        self.decoders.push((type_tag.into(), decoder));
        self
    }

    /// Sandbox policy for snapshot resolution. Defaults to the broad
    /// catalog policy; pass [`SandboxPolicy::bootstrap`] for handling data
    /// whose types are not yet trusted.
    pub fn sandbox_policy(mut self, policy: SandboxPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> CatalogService {
        let sources = Arc::new(SourceRegistry::default());
        for provider in self.top_level {
            sources.register(Source::new(provider), true);
        }
        for provider in self.hidden {
            sources.register(Source::new(provider), false);
        }

        let content = Arc::new(ContentRegistry::default());
        for decorator in self.decorators {
            content.register(decorator);
        }

        let actions = Arc::new(ActionRegistry::default());
        for action in self.actions {
            actions.register(action);
        }
        for (item_type_tag, action) in self.action_decorators {
            actions.register_decorator(item_type_tag, action);
        }

        let decoders = Arc::new(DecoderRegistry::default());
        register_builtin_decoders(&decoders);
        for (type_tag, decoder) in self.decoders {
            decoders.register(type_tag, decoder);
        }

        let catalog = Source::new(Arc::new(Catalog::new(self.name, sources.top_level())));
        let resolver = IdentityResolver::new(
            sources.clone(),
            content,
            actions,
            SandboxedDeserializer::new(self.policy, decoders),
        );

        info!(sources = sources.len(), "catalog composed");
        CatalogService {
            catalog,
            sources,
            resolver,
        }
    }
}

/// The catalog subsystem handle the UI/command layer talks to.
pub struct CatalogService {
    catalog: Arc<Source>,
    sources: Arc<SourceRegistry>,
    resolver: IdentityResolver,
}

impl CatalogService {
    /// Merged view over all top-level sources.
    pub async fn browse(&self, force: bool) -> Result<Arc<[CatalogItemRef]>> {
        self.catalog.get_items(force).await
    }

    /// Invalidate one source's cache; called by watch collaborators.
    /// Returns false if no source with that signature is registered.
    pub fn mark_dirty(&self, signature: &Signature) -> bool {
        match self.sources.get(signature) {
            Some(source) => {
                source.mark_dirty();
                true
            }
            None => false,
        }
    }

    pub fn persistent_id(
        &self,
        item: Option<&dyn CatalogItem>,
    ) -> Result<Option<PersistentId>, IdentityError> {
        self.resolver.persistent_id(item)
    }

    pub async fn resolve(
        &self,
        id: Option<&PersistentId>,
        excluding: Option<&Signature>,
        token: &CancellationToken,
    ) -> Result<Option<CatalogItemRef>, IdentityError> {
        self.resolver.resolve(id, excluding, token).await
    }

    pub fn resolve_action(
        &self,
        id: Option<&PersistentId>,
        selection: &[CatalogItemRef],
    ) -> Result<Option<ActionItemRef>, IdentityError> {
        self.resolver.resolve_action(id, selection)
    }
}
