//! Object-store collaborator interfaces.
//!
//! The reference subsystem does not own the content tree; it consumes it
//! through these traits. The store provides path-based resolution, a full
//! traversal for catalog rebuilds, and synchronous lifecycle notifications
//! with defined ordering: `after_add` fires after an object is inserted,
//! `before_delete` fires before it is removed.

use std::sync::Arc;

use stencil_model::Uid;

use crate::error::Error;
use crate::schema::ContentInstance;

/// A content object living in the tree.
///
/// Extends [`ContentInstance`] with addressing and the identity capability
/// the UID catalog needs. Objects are internally synchronized and shared
/// behind `Arc`.
pub trait ContentObject: ContentInstance + Send + Sync {
    /// The object's local id (the last path segment).
    fn id(&self) -> &str;

    /// The object's current path in the tree. Paths change on move and
    /// rename; UIDs do not.
    fn path(&self) -> String;

    /// Human-readable title, used as target metadata on references.
    fn title(&self) -> String {
        self.id().to_string()
    }

    /// The stable identifier, if one has been assigned.
    fn uid(&self) -> Option<Uid>;

    /// Attach a stable identifier. Called once by the UID catalog.
    fn set_uid(&self, uid: Uid);

    /// Whether this object participates in the UID/reference machinery.
    fn is_referenceable(&self) -> bool;
}

/// The object store the catalog operates against.
pub trait ContentTree: Send + Sync {
    /// Resolve a path to a live object.
    fn resolve(&self, path: &str) -> Option<Arc<dyn ContentObject>>;

    /// Visit every object in the tree, in a stable traversal order. Drives
    /// catalog rebuilds.
    fn walk(
        &self,
        visitor: &mut dyn FnMut(&Arc<dyn ContentObject>) -> Result<(), Error>,
    ) -> Result<(), Error>;

    /// Create a child object under a parent path. Used by reference
    /// policies that own nested content.
    fn attach_child(&self, parent_path: &str, id: &str) -> Result<Arc<dyn ContentObject>, Error>;

    /// Remove the object at a path. Used by reference policies that own
    /// nested content.
    fn remove_child(&self, path: &str) -> Result<(), Error>;
}

/// Synchronous lifecycle notifications from the store.
///
/// The store must call `after_add` after an object has been inserted and
/// `before_delete` before an object is removed, in that order relative to
/// the mutation. Objects removed without firing `before_delete` leave the
/// catalog stale until the next rebuild.
pub trait LifecycleObserver: Send + Sync {
    /// An object was just inserted (or moved) into the tree.
    fn after_add(
        &self,
        tree: &dyn ContentTree,
        object: &Arc<dyn ContentObject>,
    ) -> Result<(), Error>;

    /// An object is about to be removed from the tree.
    fn before_delete(
        &self,
        tree: &dyn ContentTree,
        object: &Arc<dyn ContentObject>,
    ) -> Result<(), Error>;
}
