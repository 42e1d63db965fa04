//! Per-scope enablement checks.
//!
//! Before a listener runs, the [`EventManager`](crate::EventManager) asks the
//! configured [`ScopeGate`] whether the listener's module is enabled in the
//! scope the event occurred in. Events without a scope are never gated.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axon_core::ScopeId;
use parking_lot::RwLock;

/// Answers whether a module's listener may run in a scope.
pub trait ScopeGate: Send + Sync {
    /// Returns `true` if `listener` of `module` is enabled in `scope`.
    fn is_enabled(&self, scope: &ScopeId, module: &str, listener: &str) -> bool;
}

/// Shared pointer to a scope gate.
pub type BoxedGate = Arc<dyn ScopeGate>;

/// Gate that enables everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ScopeGate for AllowAll {
    fn is_enabled(&self, _: &ScopeId, _: &str, _: &str) -> bool {
        true
    }
}

/// In-memory table of modules disabled per scope.
#[derive(Debug, Default)]
pub struct DisabledModules {
    disabled: RwLock<HashMap<ScopeId, HashSet<String>>>,
}

impl DisabledModules {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables `module` in `scope`. Returns `false` if it already was.
    pub fn disable(&self, scope: ScopeId, module: impl Into<String>) -> bool {
        self.disabled
            .write()
            .entry(scope)
            .or_default()
            .insert(module.into())
    }

    /// Re-enables `module` in `scope`. Returns `false` if it was not disabled.
    pub fn enable(&self, scope: &ScopeId, module: &str) -> bool {
        let mut disabled = self.disabled.write();
        let Some(modules) = disabled.get_mut(scope) else {
            return false;
        };
        let removed = modules.remove(module);
        if modules.is_empty() {
            disabled.remove(scope);
        }
        removed
    }

    /// Returns `true` if `module` is disabled in `scope`.
    pub fn is_disabled(&self, scope: &ScopeId, module: &str) -> bool {
        self.disabled
            .read()
            .get(scope)
            .is_some_and(|modules| modules.contains(module))
    }
}

impl ScopeGate for DisabledModules {
    fn is_enabled(&self, scope: &ScopeId, module: &str, _: &str) -> bool {
        !self.is_disabled(scope, module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_modules_are_per_scope() {
        let gate = DisabledModules::new();
        let a = ScopeId::new("1");
        let b = ScopeId::new("2");

        assert!(gate.disable(a.clone(), "moderation"));
        assert!(!gate.disable(a.clone(), "moderation"));

        assert!(!gate.is_enabled(&a, "moderation", "ban-logger"));
        assert!(gate.is_enabled(&a, "fun", "ban-logger"));
        assert!(gate.is_enabled(&b, "moderation", "ban-logger"));

        assert!(gate.enable(&a, "moderation"));
        assert!(!gate.enable(&a, "moderation"));
        assert!(gate.is_enabled(&a, "moderation", "ban-logger"));
    }
}
