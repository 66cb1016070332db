//! Action contract.

use std::fmt;
use std::sync::Arc;

use crate::signature::Signature;

/// Shared handle to an action.
pub type ActionItemRef = Arc<dyn ActionItem>;

/// An operation over catalog items.
///
/// Most actions are stateless singletons per provider, so identity for
/// resolution purposes is the signature, not a payload. Execution itself is
/// the command layer's job and stays outside this subsystem.
pub trait ActionItem: Send + Sync + fmt::Debug {
    /// Stable `module::Symbol` tag naming the concrete type.
    fn type_tag(&self) -> &'static str;

    /// Human-readable name.
    fn display_name(&self) -> &str;

    /// `(concrete type, constructor parameters)` identity.
    fn signature(&self) -> Signature;
}

pub fn actions_equal(a: &dyn ActionItem, b: &dyn ActionItem) -> bool {
    a.signature() == b.signature()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[derive(Debug)]
    struct OpenWith {
        application: String,
    }

    impl ActionItem for OpenWith {
        fn type_tag(&self) -> &'static str {
            "lumen.test::OpenWith"
        }

        fn display_name(&self) -> &str {
            "Open With…"
        }

        fn signature(&self) -> Signature {
            Signature::new(self.type_tag(), &json!({ "application": self.application }))
        }
    }

    #[derive(Debug)]
    struct Reveal;

    impl ActionItem for Reveal {
        fn type_tag(&self) -> &'static str {
            "lumen.test::Reveal"
        }

        fn display_name(&self) -> &str {
            "Reveal"
        }

        fn signature(&self) -> Signature {
            Signature::new(self.type_tag(), &Value::Null)
        }
    }

    #[test]
    fn identity_is_signature_not_instance() {
        let a = OpenWith {
            application: "editor".into(),
        };
        let b = OpenWith {
            application: "editor".into(),
        };
        let c = OpenWith {
            application: "viewer".into(),
        };
        assert!(actions_equal(&a, &b));
        assert!(!actions_equal(&a, &c));
        assert!(!actions_equal(&a, &Reveal));
    }
}
