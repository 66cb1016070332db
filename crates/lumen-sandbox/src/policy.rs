//! Allowlist policy for snapshot deserialization.

use serde::{Deserialize, Serialize};

/// Symbols a rule admits within its module pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Symbols {
    All,
    Only(Vec<String>),
}

/// One allow rule: a module pattern plus the symbols it admits.
///
/// Patterns use the trailing-`*` prefix form, so `"lumen.*"` covers the
/// whole builtin namespace and `"lumen.builtin"` exactly one module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    pub module_pattern: String,
    pub symbols: Symbols,
}

impl PolicyRule {
    pub fn all(module_pattern: impl Into<String>) -> Self {
        Self {
            module_pattern: module_pattern.into(),
            symbols: Symbols::All,
        }
    }

    pub fn only<S: Into<String>>(
        module_pattern: impl Into<String>,
        symbols: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            module_pattern: module_pattern.into(),
            symbols: Symbols::Only(symbols.into_iter().map(Into::into).collect()),
        }
    }
}

/// Ordered allowlist over `(module, symbol)` pairs; the first rule whose
/// module pattern matches decides. Stateless and safe to share across
/// concurrent resolutions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxPolicy {
    rules: Vec<PolicyRule>,
}

impl SandboxPolicy {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// Broad policy trusting the whole catalog item type namespace.
    pub fn catalog_default() -> Self {
        Self::new(vec![PolicyRule::all("lumen.*")])
    }

    /// Minimal bootstrap trust: builtin value types, the restore helper, and
    /// the snapshot wrapper itself. For deserializing data whose expected
    /// type is not otherwise trusted yet.
    pub fn bootstrap() -> Self {
        Self::new(vec![
            PolicyRule::only("lumen.builtin", ["Text", "Url"]),
            PolicyRule::only("lumen.ident", ["Snapshot", "Restore"]),
        ])
    }

    pub fn allows(&self, module: &str, symbol: &str) -> bool {
        for rule in &self.rules {
            if Self::matches(&rule.module_pattern, module) {
                return match &rule.symbols {
                    Symbols::All => true,
                    Symbols::Only(symbols) => symbols.iter().any(|allowed| allowed == symbol),
                };
            }
        }
        false
    }

    fn matches(pattern: &str, actual: &str) -> bool {
        if let Some(prefix) = pattern.strip_suffix('*') {
            prefix.is_empty() || actual.starts_with(prefix)
        } else {
            pattern == actual
        }
    }
}
