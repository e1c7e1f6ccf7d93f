//! In-memory collaborators for tests and examples.
//!
//! [`MemoryTree`] and [`MemoryObject`] are reference implementations of the
//! object-store interfaces in [`crate::tree`]: a flat, path-keyed tree with
//! insertion-ordered traversal and synchronous lifecycle notifications.
//! They back this crate's own test suite and are handy for embedding
//! applications to prototype against; they are not a production store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use stencil_model::{Uid, Value};

use crate::error::Error;
use crate::schema::{AccessMode, ContentInstance};
use crate::tree::{ContentObject, ContentTree, LifecycleObserver};

/// A content object held entirely in memory.
pub struct MemoryObject {
    id: String,
    path: String,
    referenceable: bool,
    title: RwLock<String>,
    uid: RwLock<Option<Uid>>,
    attrs: RwLock<HashMap<String, Value>>,
    locked: RwLock<HashSet<String>>,
}

impl MemoryObject {
    /// Create an object at the given path. The id is the last path segment.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let id = path.rsplit('/').next().unwrap_or_default().to_string();
        Self {
            title: RwLock::new(id.clone()),
            id,
            path,
            referenceable: true,
            uid: RwLock::new(None),
            attrs: RwLock::new(HashMap::new()),
            locked: RwLock::new(HashSet::new()),
        }
    }

    /// Opt out of the UID/reference machinery.
    pub fn not_referenceable(mut self) -> Self {
        self.referenceable = false;
        self
    }

    /// Set the title.
    pub fn with_title(self, title: impl Into<String>) -> Self {
        *self.title.write() = title.into();
        self
    }

    /// Mark a field as not editable, for permission-check tests.
    pub fn lock_field(self, field: impl Into<String>) -> Self {
        self.locked.write().insert(field.into());
        self
    }
}

impl ContentInstance for MemoryObject {
    fn get(&self, field: &str) -> Option<Value> {
        self.attrs.read().get(field).cloned()
    }

    fn set(&self, field: &str, value: Value) -> Result<(), Error> {
        self.attrs.write().insert(field.to_string(), value);
        Ok(())
    }

    fn allowed(&self, mode: AccessMode, field: &str) -> bool {
        match mode {
            AccessMode::View => true,
            AccessMode::Edit => !self.locked.read().contains(field),
        }
    }
}

impl ContentObject for MemoryObject {
    fn id(&self) -> &str {
        &self.id
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn title(&self) -> String {
        self.title.read().clone()
    }

    fn uid(&self) -> Option<Uid> {
        *self.uid.read()
    }

    fn set_uid(&self, uid: Uid) {
        *self.uid.write() = Some(uid);
    }

    fn is_referenceable(&self) -> bool {
        self.referenceable
    }
}

/// A flat, path-keyed in-memory content tree.
#[derive(Default)]
pub struct MemoryTree {
    objects: DashMap<String, Arc<dyn ContentObject>>,
    order: RwLock<Vec<String>>,
    observers: RwLock<Vec<Arc<dyn LifecycleObserver>>>,
}

impl MemoryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lifecycle observer.
    pub fn subscribe(&self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.write().push(observer);
    }

    /// Insert an object and fire `after_add`.
    pub fn add(&self, object: Arc<dyn ContentObject>) -> Result<Arc<dyn ContentObject>, Error> {
        let path = object.path();
        self.objects.insert(path.clone(), object.clone());
        {
            let mut order = self.order.write();
            if !order.contains(&path) {
                order.push(path);
            }
        }
        let observers: Vec<_> = self.observers.read().clone();
        for observer in observers {
            observer.after_add(self, &object)?;
        }
        Ok(object)
    }

    /// Convenience for [`MemoryTree::add`].
    pub fn add_object(&self, object: MemoryObject) -> Result<Arc<dyn ContentObject>, Error> {
        self.add(Arc::new(object))
    }

    /// Remove the object at a path and everything under it, firing
    /// `before_delete` for each, deepest first.
    pub fn remove(&self, path: &str) -> Result<(), Error> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut doomed: Vec<String> = self
            .order
            .read()
            .iter()
            .filter(|p| p.as_str() == path || p.starts_with(&prefix))
            .cloned()
            .collect();
        doomed.sort_by_key(|p| std::cmp::Reverse(p.matches('/').count()));

        for p in &doomed {
            let object = self.objects.get(p).map(|entry| entry.value().clone());
            if let Some(object) = object {
                let observers: Vec<_> = self.observers.read().clone();
                for observer in observers {
                    observer.before_delete(self, &object)?;
                }
                self.objects.remove(p);
                self.order.write().retain(|q| q != p);
            }
        }
        Ok(())
    }

    /// Remove an object without firing lifecycle notifications, simulating
    /// low-level bulk removal that bypasses the deletion machinery.
    pub fn remove_unobserved(&self, path: &str) {
        self.objects.remove(path);
        self.order.write().retain(|q| q != path);
    }

    /// Whether a path is occupied.
    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    /// Number of objects in the tree.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ContentTree for MemoryTree {
    fn resolve(&self, path: &str) -> Option<Arc<dyn ContentObject>> {
        self.objects.get(path).map(|entry| entry.value().clone())
    }

    fn walk(
        &self,
        visitor: &mut dyn FnMut(&Arc<dyn ContentObject>) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let paths: Vec<String> = self.order.read().clone();
        for path in paths {
            if let Some(object) = self.resolve(&path) {
                visitor(&object)?;
            }
        }
        Ok(())
    }

    fn attach_child(&self, parent_path: &str, id: &str) -> Result<Arc<dyn ContentObject>, Error> {
        let path = format!("{}/{}", parent_path.trim_end_matches('/'), id);
        self.add(Arc::new(MemoryObject::new(path)))
    }

    fn remove_child(&self, path: &str) -> Result<(), Error> {
        self.remove(path)
    }
}
