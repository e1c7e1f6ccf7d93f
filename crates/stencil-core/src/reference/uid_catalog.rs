//! UID catalog: stable identity assignment and resolution.

use std::sync::Arc;

use sled::{Db, Tree};
use tracing::debug;

use stencil_model::Uid;

use crate::error::{Error, ReferenceError};
use crate::tree::{ContentObject, ContentTree};

/// Tree name for the UID index.
const UID_TREE: &str = "catalog:uids";

/// The index mapping UID to object location.
///
/// Registration is idempotent: an object keeps the same UID for its whole
/// lifetime, and re-registering after a move or rename refreshes the stored
/// path under that UID. UIDs are never reused after deletion; nothing
/// compacts or reassigns them.
pub struct UidCatalog {
    tree: Tree,
}

impl UidCatalog {
    /// Open or create the UID index on the given database.
    pub fn open(db: &Db) -> Result<Self, Error> {
        Ok(Self {
            tree: db.open_tree(UID_TREE)?,
        })
    }

    /// Ensure the object has a UID, minting one when absent, and index its
    /// current path under it.
    pub fn register(&self, object: &Arc<dyn ContentObject>) -> Result<Uid, Error> {
        if !object.is_referenceable() {
            return Err(ReferenceError::NotReferenceable {
                path: object.path(),
            }
            .into());
        }
        let uid = match object.uid() {
            Some(uid) => uid,
            None => {
                let uid = Uid::mint();
                object.set_uid(uid);
                uid
            }
        };
        self.tree.insert(uid.as_bytes(), object.path().as_bytes())?;
        debug!(%uid, path = %object.path(), "object registered");
        Ok(uid)
    }

    /// Refresh the indexed path after a move or rename.
    pub fn reindex(&self, object: &Arc<dyn ContentObject>) -> Result<(), Error> {
        self.register(object).map(|_| ())
    }

    /// Remove the object's index entry. A no-op for objects that were never
    /// registered.
    pub fn unregister(&self, object: &Arc<dyn ContentObject>) -> Result<(), Error> {
        if let Some(uid) = object.uid() {
            self.unregister_uid(uid)?;
        }
        Ok(())
    }

    /// Remove an index entry by UID.
    pub fn unregister_uid(&self, uid: Uid) -> Result<(), Error> {
        self.tree.remove(uid.as_bytes())?;
        Ok(())
    }

    /// The indexed path for a UID, if any.
    pub fn path_of(&self, uid: Uid) -> Result<Option<String>, Error> {
        match self.tree.get(uid.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| Error::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Resolve a UID to a live object, `None` when the entry is missing or
    /// the path no longer resolves.
    pub fn resolve(
        &self,
        uid: Uid,
        tree: &dyn ContentTree,
    ) -> Result<Option<Arc<dyn ContentObject>>, Error> {
        Ok(self.path_of(uid)?.and_then(|path| tree.resolve(&path)))
    }

    /// Resolve a UID to a live object or fail with
    /// [`ReferenceError::ObjectNotFound`].
    pub fn lookup(
        &self,
        uid: Uid,
        tree: &dyn ContentTree,
    ) -> Result<Arc<dyn ContentObject>, Error> {
        self.resolve(uid, tree)?
            .ok_or_else(|| ReferenceError::ObjectNotFound { uid }.into())
    }

    /// Whether a UID is indexed.
    pub fn contains(&self, uid: Uid) -> Result<bool, Error> {
        Ok(self.tree.contains_key(uid.as_bytes())?)
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Drop every entry. Used by rebuild.
    pub fn clear(&self) -> Result<(), Error> {
        self.tree.clear()?;
        Ok(())
    }

    /// Flush to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.tree.flush()?;
        Ok(())
    }
}
