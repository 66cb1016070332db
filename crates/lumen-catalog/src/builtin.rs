//! Builtin value leaves: plain text and URLs.
//!
//! These are the value types the bootstrap sandbox policy trusts. Real
//! providers (files, applications, windows) live outside this subsystem.

use std::sync::Arc;

use lumen_protocol::{
    ActionItem, ActionItemRef, CatalogItem, Signature, SnapshotCapable, SnapshotError,
};
use serde_json::{Value, json};

pub const TEXT_TAG: &str = "lumen.builtin::Text";
pub const URL_TAG: &str = "lumen.builtin::Url";

/// A plain text fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    text: String,
}

impl TextItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl CatalogItem for TextItem {
    fn type_tag(&self) -> &'static str {
        TEXT_TAG
    }

    fn display_name(&self) -> &str {
        &self.text
    }

    fn payload(&self) -> Value {
        json!({ "text": self.text })
    }

    fn actions(&self) -> Vec<ActionItemRef> {
        vec![Arc::new(CopyText)]
    }

    fn as_snapshot_capable(&self) -> Option<&dyn SnapshotCapable> {
        Some(self)
    }
}

impl SnapshotCapable for TextItem {
    fn snapshot_version(&self) -> u32 {
        1
    }

    fn snapshot(&self) -> Result<Value, SnapshotError> {
        Ok(json!({ "text": self.text }))
    }
}

/// A web address, optionally titled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlItem {
    url: String,
    title: Option<String>,
}

impl UrlItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }

    pub fn titled(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: Some(title.into()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CatalogItem for UrlItem {
    fn type_tag(&self) -> &'static str {
        URL_TAG
    }

    fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }

    fn payload(&self) -> Value {
        // The title is presentation only; identity is the address.
        json!({ "url": self.url })
    }

    fn actions(&self) -> Vec<ActionItemRef> {
        vec![Arc::new(OpenUrl)]
    }

    fn as_snapshot_capable(&self) -> Option<&dyn SnapshotCapable> {
        Some(self)
    }
}

impl SnapshotCapable for UrlItem {
    fn snapshot_version(&self) -> u32 {
        1
    }

    fn snapshot(&self) -> Result<Value, SnapshotError> {
        Ok(json!({ "url": self.url, "title": self.title }))
    }
}

/// Copy a text leaf to the clipboard. Execution is the command layer's job.
#[derive(Debug, Clone, Copy)]
pub struct CopyText;

impl ActionItem for CopyText {
    fn type_tag(&self) -> &'static str {
        "lumen.builtin::CopyText"
    }

    fn display_name(&self) -> &str {
        "Copy"
    }

    fn signature(&self) -> Signature {
        Signature::new(self.type_tag(), &Value::Null)
    }
}

/// Open a URL leaf in the default handler.
#[derive(Debug, Clone, Copy)]
pub struct OpenUrl;

impl ActionItem for OpenUrl {
    fn type_tag(&self) -> &'static str {
        "lumen.builtin::OpenUrl"
    }

    fn display_name(&self) -> &str {
        "Open"
    }

    fn signature(&self) -> Signature {
        Signature::new(self.type_tag(), &Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_protocol::items_equal;

    #[test]
    fn url_identity_ignores_title() {
        let bare = UrlItem::new("https://example.com");
        let titled = UrlItem::titled("https://example.com", "Example");
        assert!(items_equal(&bare, &titled));
        assert_eq!(titled.display_name(), "Example");
        assert_eq!(bare.display_name(), "https://example.com");
    }

    #[test]
    fn text_snapshot_carries_fields() {
        let item = TextItem::new("hello");
        let capable = item.as_snapshot_capable().unwrap();
        assert_eq!(capable.snapshot_version(), 1);
        assert_eq!(capable.snapshot().unwrap(), json!({ "text": "hello" }));
    }

    #[test]
    fn builtin_actions_are_signature_singletons() {
        assert_eq!(CopyText.signature(), CopyText.signature());
        assert_ne!(CopyText.signature(), OpenUrl.signature());
        assert_eq!(TextItem::new("x").actions().len(), 1);
    }
}
