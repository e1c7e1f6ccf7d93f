//! Reference lifecycle policies.
//!
//! A policy is the set of hooks governing a reference's lifecycle: it can
//! veto creation or deletion, react before either endpoint disappears, and
//! manage resources the reference owns. Records name their policy; the
//! catalog looks it up in the [`PolicyRegistry`] when it needs to run a
//! hook.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ReferenceError;
use crate::reference::record::Reference;
use crate::tree::{ContentObject, ContentTree};

/// Name of the default no-op policy.
pub const BASIC_POLICY: &str = "basic";

/// Name of the content-carrying policy.
pub const CONTENT_POLICY: &str = "content";

/// Context handed to policy hooks.
///
/// Endpoints are resolved eagerly by the catalog; either may be `None` when
/// the hook runs against a half-gone edge (a delete racing an endpoint
/// removal).
pub struct PolicyContext<'a> {
    /// The content tree the catalog operates against.
    pub tree: &'a dyn ContentTree,
    /// The record the hook concerns.
    pub record: &'a Reference,
    /// The live source object, when it resolves.
    pub source: Option<Arc<dyn ContentObject>>,
    /// The live target object, when it resolves.
    pub target: Option<Arc<dyn ContentObject>>,
}

/// Lifecycle hooks for a class of references.
///
/// `on_add` and `on_delete` may veto by returning
/// [`ReferenceError::ReferenceRejected`]; the veto is a policy's only means
/// of steering the catalog. The `before_*_delete` hooks inform the policy
/// that an endpoint is about to disappear and run before the record is
/// removed.
pub trait ReferencePolicy: Send + Sync {
    /// Runs before a record is cataloged; a veto aborts creation.
    fn on_add(&self, _ctx: &PolicyContext<'_>) -> Result<(), ReferenceError> {
        Ok(())
    }

    /// Runs before a record is removed; a veto keeps the record.
    fn on_delete(&self, _ctx: &PolicyContext<'_>) -> Result<(), ReferenceError> {
        Ok(())
    }

    /// The source object is about to be deleted.
    fn before_source_delete(&self, _ctx: &PolicyContext<'_>) -> Result<(), ReferenceError> {
        Ok(())
    }

    /// The target object is about to be deleted.
    fn before_target_delete(&self, _ctx: &PolicyContext<'_>) -> Result<(), ReferenceError> {
        Ok(())
    }
}

/// The default policy: plain metadata-only edges, no hooks.
pub struct BasicReference;

impl ReferencePolicy for BasicReference {}

/// A policy for references that own a nested content object.
///
/// On creation the policy attaches a child object under the source's path;
/// on deletion it removes it. This models relationships that carry rich
/// attached content rather than bare metadata.
pub struct ContentReference;

impl ContentReference {
    /// Path of the nested content object for a record.
    pub fn content_path(source_path: &str, record: &Reference) -> String {
        format!(
            "{}/ref-{}",
            source_path.trim_end_matches('/'),
            record.uid
        )
    }
}

impl ReferencePolicy for ContentReference {
    fn on_add(&self, ctx: &PolicyContext<'_>) -> Result<(), ReferenceError> {
        let source = ctx
            .source
            .as_ref()
            .ok_or_else(|| ReferenceError::ReferenceRejected {
                reason: "content reference requires a live source".to_string(),
            })?;
        ctx.tree
            .attach_child(&source.path(), &format!("ref-{}", ctx.record.uid))
            .map_err(|e| ReferenceError::ReferenceRejected {
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn on_delete(&self, ctx: &PolicyContext<'_>) -> Result<(), ReferenceError> {
        let Some(source) = ctx.source.as_ref() else {
            // The source is already gone and took the nested object with it.
            return Ok(());
        };
        let path = Self::content_path(&source.path(), ctx.record);
        if ctx.tree.resolve(&path).is_some() {
            ctx.tree
                .remove_child(&path)
                .map_err(|e| ReferenceError::ReferenceRejected {
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }
}

/// Registry of reference policies, keyed by name.
///
/// One registry per catalog, passed by reference where needed; there is no
/// ambient global. Pre-seeded with [`BasicReference`] and
/// [`ContentReference`].
pub struct PolicyRegistry {
    policies: RwLock<HashMap<String, Arc<dyn ReferencePolicy>>>,
}

impl PolicyRegistry {
    /// Create a registry seeded with the built-in policies.
    pub fn new() -> Self {
        let mut policies: HashMap<String, Arc<dyn ReferencePolicy>> = HashMap::new();
        policies.insert(BASIC_POLICY.to_string(), Arc::new(BasicReference));
        policies.insert(CONTENT_POLICY.to_string(), Arc::new(ContentReference));
        Self {
            policies: RwLock::new(policies),
        }
    }

    /// Register a policy under a name, replacing any existing registration.
    pub fn register(&self, name: impl Into<String>, policy: Arc<dyn ReferencePolicy>) {
        self.policies.write().insert(name.into(), policy);
    }

    /// Look up a policy.
    pub fn get(&self, name: &str) -> Result<Arc<dyn ReferencePolicy>, ReferenceError> {
        self.policies
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ReferenceError::UnknownPolicy {
                name: name.to_string(),
            })
    }

    /// Whether a policy is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.policies.read().contains_key(name)
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_seeds_builtins() {
        let registry = PolicyRegistry::new();

        assert!(registry.contains(BASIC_POLICY));
        assert!(registry.contains(CONTENT_POLICY));
        assert!(registry.get(BASIC_POLICY).is_ok());
        assert!(matches!(
            registry.get("bespoke"),
            Err(ReferenceError::UnknownPolicy { .. })
        ));
    }

    #[test]
    fn test_register_custom_policy() {
        struct RejectAll;
        impl ReferencePolicy for RejectAll {
            fn on_add(&self, _ctx: &PolicyContext<'_>) -> Result<(), ReferenceError> {
                Err(ReferenceError::ReferenceRejected {
                    reason: "closed".to_string(),
                })
            }
        }

        let registry = PolicyRegistry::new();
        registry.register("reject-all", Arc::new(RejectAll));
        assert!(registry.contains("reject-all"));
    }
}
