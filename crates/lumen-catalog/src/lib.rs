//! # lumen-catalog — Sources, merge, and content decoration
//!
//! A [`Source`] lazily produces and caches the items of one provider. A
//! [`Catalog`] unions many sources into a single browsable, recursively
//! nested collection. A [`ContentRegistry`] binds a source to an anchor item
//! so browsing the item reveals that source's contents.
//!
//! ## Module Overview
//!
//! - [`source`] — `ItemProvider`, `Source`, the cache slot state machine
//! - [`catalog`] — `Catalog` merge, `SourceRegistry`, `CollectionItem`
//! - [`content`] — `ContentDecorator`, `ContentRegistry`
//! - [`builtin`] — plain text and URL value leaves with their actions

pub mod builtin;
pub mod catalog;
pub mod content;
pub mod source;

pub use builtin::{CopyText, OpenUrl, TEXT_TAG, TextItem, URL_TAG, UrlItem};
pub use catalog::{COLLECTION_TAG, Catalog, CollectionItem, SourceRegistry};
pub use content::{ContentDecorator, ContentRegistry};
pub use source::{ItemProvider, Source};
