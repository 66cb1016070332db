//! Instance-independent identity for sources, actions, and items.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `(concrete type, constructor parameters)` identity for a source or an
/// action.
///
/// Two instances with equal signatures are the same logical object, even
/// across catalog rebuilds or process restarts, which is what lets caches
/// and learning keyed by source survive a re-scan. Parameters are stored as
/// canonical JSON so equality and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    type_tag: String,
    params: String,
}

impl Signature {
    pub fn new(type_tag: impl Into<String>, params: &Value) -> Self {
        Self {
            type_tag: type_tag.into(),
            params: canonical(params),
        }
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn params(&self) -> &str {
        &self.params
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?{}", self.type_tag, self.params)
    }
}

/// `(concrete type, payload)` identity for a catalog item.
///
/// The display name is deliberately excluded: cosmetically different
/// wrappers of the same resource compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    type_tag: String,
    payload: String,
}

impl ItemKey {
    pub fn new(type_tag: impl Into<String>, payload: &Value) -> Self {
        Self {
            type_tag: type_tag.into(),
            payload: canonical(payload),
        }
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_tag, self.payload)
    }
}

/// Canonical JSON text: object keys sorted recursively so structurally
/// equal values always render to equal strings.
fn canonical(value: &Value) -> String {
    serde_json::to_string(&sorted(value)).unwrap_or_default()
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> = map
                .iter()
                .map(|(key, value)| (key.clone(), sorted(value)))
                .collect();
            serde_json::to_value(ordered).unwrap_or(Value::Null)
        }
        Value::Array(values) => Value::Array(values.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
