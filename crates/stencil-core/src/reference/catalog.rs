//! The reference catalog: identity assignment, reference lifecycle,
//! bidirectional queries, deletion cascade and rebuild.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use stencil_model::{Uid, Value};

use crate::config::CatalogConfig;
use crate::error::Error;
use crate::reference::index::ReferenceIndex;
use crate::reference::policy::{PolicyContext, PolicyRegistry, ReferencePolicy, BASIC_POLICY};
use crate::reference::query::RefQuery;
use crate::reference::record::Reference;
use crate::reference::uid_catalog::UidCatalog;
use crate::tree::{ContentObject, ContentTree, LifecycleObserver};

/// An operand of a reference operation: a live object or a UID to resolve.
pub enum Endpoint {
    /// A live content object.
    Object(Arc<dyn ContentObject>),
    /// A UID resolved through the catalog at the point of use.
    Uid(Uid),
}

impl From<Uid> for Endpoint {
    fn from(uid: Uid) -> Self {
        Endpoint::Uid(uid)
    }
}

impl From<Arc<dyn ContentObject>> for Endpoint {
    fn from(object: Arc<dyn ContentObject>) -> Self {
        Endpoint::Object(object)
    }
}

impl<T: ContentObject + 'static> From<Arc<T>> for Endpoint {
    fn from(object: Arc<T>) -> Self {
        Endpoint::Object(object)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Object(object) => write!(f, "Endpoint::Object({})", object.path()),
            Endpoint::Uid(uid) => write!(f, "Endpoint::Uid({uid})"),
        }
    }
}

/// How far an explicit reference-deletion cascade reaches.
///
/// The legacy catalogs also tore down references *pointing at* the object
/// when asked to delete the object's own references. That reach is
/// surprising enough to be opt-in by name here rather than implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeScope {
    /// Delete only references from the object.
    Outgoing,
    /// Additionally delete references pointing at the object.
    WithBackReferences,
}

/// Counters reported by a catalog rebuild.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RebuildStats {
    /// Referenceable objects re-registered from the tree walk.
    pub objects: usize,
    /// Reference records re-indexed.
    pub references: usize,
    /// Records evicted because an endpoint no longer resolves.
    pub evicted: usize,
}

/// The catalog tying UIDs, reference records and the query index together.
///
/// All mutating operations take the content tree explicitly; the catalog
/// holds no handle to the tree itself. Wire it into the store's lifecycle
/// notifications via its [`LifecycleObserver`] implementation so deletions
/// cascade and moves refresh the UID index.
pub struct ReferenceCatalog {
    db: sled::Db,
    uids: UidCatalog,
    index: ReferenceIndex,
    policies: PolicyRegistry,
    config: CatalogConfig,
}

impl ReferenceCatalog {
    /// Open a catalog with the given storage configuration.
    pub fn open(config: CatalogConfig) -> Result<Self, Error> {
        let db = config.open_db()?;
        let uids = UidCatalog::open(&db)?;
        let index = ReferenceIndex::open(&db)?;
        Ok(Self {
            db,
            uids,
            index,
            policies: PolicyRegistry::new(),
            config,
        })
    }

    /// The UID index.
    pub fn uids(&self) -> &UidCatalog {
        &self.uids
    }

    /// The policy registry.
    pub fn policies(&self) -> &PolicyRegistry {
        &self.policies
    }

    /// Number of stored reference records.
    pub fn reference_count(&self) -> usize {
        self.index.len()
    }

    fn maybe_flush(&self) -> Result<(), Error> {
        if self.config.flush_on_write {
            self.db.flush()?;
        }
        Ok(())
    }

    /// Ensure the object has a UID and index it.
    pub fn register_object(&self, object: &Arc<dyn ContentObject>) -> Result<Uid, Error> {
        let uid = self.uids.register(object)?;
        self.maybe_flush()?;
        Ok(uid)
    }

    /// Remove the object's outgoing references, then its UID entry. A
    /// silent no-op for objects that were never registered.
    pub fn unregister_object(
        &self,
        tree: &dyn ContentTree,
        object: &Arc<dyn ContentObject>,
    ) -> Result<(), Error> {
        let Some(uid) = object.uid() else {
            return Ok(());
        };
        if !self.uids.contains(uid)? {
            return Ok(());
        }
        self.delete_references_by_uid(tree, uid, None, CascadeScope::Outgoing)?;
        self.uids.unregister_uid(uid)?;
        self.maybe_flush()
    }

    fn resolve_endpoint(
        &self,
        tree: &dyn ContentTree,
        endpoint: &Endpoint,
    ) -> Result<Arc<dyn ContentObject>, Error> {
        match endpoint {
            Endpoint::Object(object) => Ok(object.clone()),
            Endpoint::Uid(uid) => self.uids.lookup(*uid, tree),
        }
    }

    fn endpoint_uid(&self, endpoint: &Endpoint) -> Option<Uid> {
        match endpoint {
            Endpoint::Object(object) => object.uid(),
            Endpoint::Uid(uid) => Some(*uid),
        }
    }

    /// Establish a reference under the basic policy.
    pub fn add_reference(
        &self,
        tree: &dyn ContentTree,
        source: impl Into<Endpoint>,
        target: impl Into<Endpoint>,
        relationship: Option<&str>,
        metadata: Vec<(String, Value)>,
    ) -> Result<Reference, Error> {
        self.add_reference_with(BASIC_POLICY, tree, source, target, relationship, metadata)
    }

    /// Establish a reference governed by a named policy.
    ///
    /// Endpoints may be live objects or UIDs; UIDs that fail to resolve
    /// fail the call. Both endpoints are assigned UIDs when missing. The
    /// policy's `on_add` hook runs before the record is cataloged and may
    /// veto. An existing record for the same (source, target, relationship)
    /// triple is replaced.
    pub fn add_reference_with(
        &self,
        policy_name: &str,
        tree: &dyn ContentTree,
        source: impl Into<Endpoint>,
        target: impl Into<Endpoint>,
        relationship: Option<&str>,
        metadata: Vec<(String, Value)>,
    ) -> Result<Reference, Error> {
        let policy = self.policies.get(policy_name)?;
        let source = self.resolve_endpoint(tree, &source.into())?;
        let target = self.resolve_endpoint(tree, &target.into())?;
        let source_uid = self.uids.register(&source)?;
        let target_uid = self.uids.register(&target)?;

        let existing = self
            .index
            .query(&RefQuery::new().source(source_uid).target(target_uid))?;
        for record in existing
            .into_iter()
            .filter(|r| r.relationship.as_deref() == relationship)
        {
            self.delete_record(tree, &record)?;
        }

        let record = Reference::new(source_uid, target_uid, relationship)
            .with_policy(policy_name)
            .with_target_id(target.id())
            .with_metadata(metadata);

        let ctx = PolicyContext {
            tree,
            record: &record,
            source: Some(source),
            target: Some(target),
        };
        policy.on_add(&ctx)?;

        self.index.insert(&record)?;
        self.maybe_flush()?;
        debug!(
            source = %record.source,
            target = %record.target,
            relationship = ?record.relationship,
            "reference added"
        );
        Ok(record)
    }

    /// Remove one record, best-effort.
    ///
    /// This is the one documented path where a policy veto is swallowed:
    /// the record survives, cleanup is skipped and the veto is logged.
    /// Returns whether the record was removed.
    fn delete_record(&self, tree: &dyn ContentTree, record: &Reference) -> Result<bool, Error> {
        let policy = match self.policies.get(&record.policy) {
            Ok(policy) => policy,
            Err(error) => {
                warn!(%error, reference = %record.uid, "unknown policy at delete; removing without hooks");
                self.index.remove(record)?;
                return Ok(true);
            }
        };
        let ctx = PolicyContext {
            tree,
            record,
            source: self.uids.resolve(record.source, tree)?,
            target: self.uids.resolve(record.target, tree)?,
        };
        if let Err(error) = policy.on_delete(&ctx) {
            warn!(%error, reference = %record.uid, "reference delete vetoed; cleanup skipped");
            return Ok(false);
        }
        self.index.remove(record)?;
        Ok(true)
    }

    /// Remove references between two endpoints. A `None` relationship is
    /// unconstrained and matches every label. Returns how many records were
    /// removed.
    pub fn delete_reference(
        &self,
        tree: &dyn ContentTree,
        source: impl Into<Endpoint>,
        target: impl Into<Endpoint>,
        relationship: Option<&str>,
    ) -> Result<usize, Error> {
        let (Some(source_uid), Some(target_uid)) = (
            self.endpoint_uid(&source.into()),
            self.endpoint_uid(&target.into()),
        ) else {
            return Ok(0);
        };

        let matches = self
            .index
            .query(&RefQuery::new().source(source_uid).target(target_uid))?;
        let mut deleted = 0;
        for record in matches
            .into_iter()
            .filter(|r| r.matches_relationship(relationship))
        {
            if self.delete_record(tree, &record)? {
                deleted += 1;
            }
        }
        self.maybe_flush()?;
        Ok(deleted)
    }

    /// Remove an object's references, with an explicit cascade scope.
    pub fn delete_references(
        &self,
        tree: &dyn ContentTree,
        object: impl Into<Endpoint>,
        relationship: Option<&str>,
        scope: CascadeScope,
    ) -> Result<usize, Error> {
        let Some(uid) = self.endpoint_uid(&object.into()) else {
            return Ok(0);
        };
        self.delete_references_by_uid(tree, uid, relationship, scope)
    }

    fn delete_references_by_uid(
        &self,
        tree: &dyn ContentTree,
        uid: Uid,
        relationship: Option<&str>,
        scope: CascadeScope,
    ) -> Result<usize, Error> {
        let mut deleted = 0;

        let outgoing = self.index.query(&RefQuery::new().source(uid))?;
        for record in outgoing
            .into_iter()
            .filter(|r| r.matches_relationship(relationship))
        {
            if self.delete_record(tree, &record)? {
                deleted += 1;
            }
        }

        if scope == CascadeScope::WithBackReferences {
            let incoming = self.index.query(&RefQuery::new().target(uid))?;
            for record in incoming
                .into_iter()
                .filter(|r| r.matches_relationship(relationship))
            {
                if self.delete_record(tree, &record)? {
                    deleted += 1;
                }
            }
        }

        self.maybe_flush()?;
        Ok(deleted)
    }

    /// Drop records whose endpoints no longer resolve. Staleness is never
    /// an error in query paths; stale entries are filtered and logged, and
    /// only a rebuild repairs them.
    fn live(&self, tree: &dyn ContentTree, records: Vec<Reference>) -> Result<Vec<Reference>, Error> {
        let mut result = Vec::with_capacity(records.len());
        for record in records {
            let source_live = self.uids.resolve(record.source, tree)?.is_some();
            let target_live = self.uids.resolve(record.target, tree)?.is_some();
            if source_live && target_live {
                result.push(record);
            } else {
                warn!(reference = %record.uid, "stale reference dropped from query results");
            }
        }
        Ok(result)
    }

    /// Run a query, returning only records whose endpoints resolve.
    pub fn query(&self, tree: &dyn ContentTree, query: &RefQuery) -> Result<Vec<Reference>, Error> {
        let records = self.index.query(query)?;
        self.live(tree, records)
    }

    /// References from an object, optionally constrained to a relationship.
    pub fn get_references(
        &self,
        tree: &dyn ContentTree,
        object: impl Into<Endpoint>,
        relationship: Option<&str>,
    ) -> Result<Vec<Reference>, Error> {
        let Some(uid) = self.endpoint_uid(&object.into()) else {
            return Ok(Vec::new());
        };
        let mut query = RefQuery::new().source(uid);
        if let Some(relationship) = relationship {
            query = query.relationship(relationship);
        }
        self.query(tree, &query)
    }

    /// References pointing at an object, optionally constrained to a
    /// relationship.
    pub fn get_back_references(
        &self,
        tree: &dyn ContentTree,
        object: impl Into<Endpoint>,
        relationship: Option<&str>,
    ) -> Result<Vec<Reference>, Error> {
        let Some(uid) = self.endpoint_uid(&object.into()) else {
            return Ok(Vec::new());
        };
        let mut query = RefQuery::new().target(uid);
        if let Some(relationship) = relationship {
            query = query.relationship(relationship);
        }
        self.query(tree, &query)
    }

    /// Whether a relationship exists between two endpoints.
    pub fn has_relationship_to(
        &self,
        tree: &dyn ContentTree,
        source: impl Into<Endpoint>,
        target: impl Into<Endpoint>,
        relationship: &str,
    ) -> Result<bool, Error> {
        let (Some(source_uid), Some(target_uid)) = (
            self.endpoint_uid(&source.into()),
            self.endpoint_uid(&target.into()),
        ) else {
            return Ok(false);
        };
        let found = self.query(
            tree,
            &RefQuery::new()
                .source(source_uid)
                .target(target_uid)
                .relationship(relationship),
        )?;
        Ok(!found.is_empty())
    }

    /// Distinct relationship labels from an object, in first-appearance
    /// order.
    pub fn relationships(
        &self,
        tree: &dyn ContentTree,
        object: impl Into<Endpoint>,
    ) -> Result<Vec<String>, Error> {
        let references = self.get_references(tree, object.into(), None)?;
        Ok(distinct_labels(&references))
    }

    /// Distinct relationship labels pointing at an object, in
    /// first-appearance order.
    pub fn back_relationships(
        &self,
        tree: &dyn ContentTree,
        object: impl Into<Endpoint>,
    ) -> Result<Vec<String>, Error> {
        let references = self.get_back_references(tree, object.into(), None)?;
        Ok(distinct_labels(&references))
    }

    /// Resolve a UID to a live object.
    pub fn lookup_object(
        &self,
        tree: &dyn ContentTree,
        uid: Uid,
    ) -> Result<Arc<dyn ContentObject>, Error> {
        self.uids.lookup(uid, tree)
    }

    /// Point-fetch a reference record by its own UID.
    pub fn reference(&self, uid: Uid) -> Result<Option<Reference>, Error> {
        self.index.get(uid)
    }

    /// Resolve a record's source object.
    pub fn source_object(
        &self,
        tree: &dyn ContentTree,
        record: &Reference,
    ) -> Result<Arc<dyn ContentObject>, Error> {
        self.uids.lookup(record.source, tree)
    }

    /// Resolve a record's target object.
    pub fn target_object(
        &self,
        tree: &dyn ContentTree,
        record: &Reference,
    ) -> Result<Arc<dyn ContentObject>, Error> {
        self.uids.lookup(record.target, tree)
    }

    /// Recompute the catalog from the tree.
    ///
    /// Clears the UID index and the query postings, re-registers every
    /// referenceable object found by the walk, then re-indexes every stored
    /// record whose endpoints both resolve. Records with a dangling
    /// endpoint are evicted; this is the only path that repairs staleness.
    /// Idempotent: rebuilding a consistent catalog reproduces it.
    #[instrument(skip(self, tree))]
    pub fn rebuild(&self, tree: &dyn ContentTree) -> Result<RebuildStats, Error> {
        let mut stats = RebuildStats::default();

        self.uids.clear()?;
        self.index.clear_postings()?;

        tree.walk(&mut |object| {
            if object.is_referenceable() {
                self.uids.register(object)?;
                stats.objects += 1;
            }
            Ok(())
        })?;

        for mut record in self.index.all_records()? {
            let source_live = self.uids.resolve(record.source, tree)?.is_some();
            let target = self.uids.resolve(record.target, tree)?;
            match target {
                Some(target) if source_live => {
                    record.target_id = target.id().to_string();
                    self.index.insert(&record)?;
                    stats.references += 1;
                }
                _ => {
                    warn!(reference = %record.uid, "dangling reference evicted during rebuild");
                    self.index.remove(&record)?;
                    stats.evicted += 1;
                }
            }
        }

        self.db.flush()?;
        info!(
            objects = stats.objects,
            references = stats.references,
            evicted = stats.evicted,
            "catalog rebuilt"
        );
        Ok(stats)
    }

    /// Flush all trees to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }
}

fn distinct_labels(references: &[Reference]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for reference in references {
        if let Some(relationship) = &reference.relationship {
            if !labels.iter().any(|l| l == relationship) {
                labels.push(relationship.clone());
            }
        }
    }
    labels
}

impl LifecycleObserver for ReferenceCatalog {
    /// Register (or re-index after a move) any referenceable object the
    /// store inserts.
    fn after_add(
        &self,
        _tree: &dyn ContentTree,
        object: &Arc<dyn ContentObject>,
    ) -> Result<(), Error> {
        if object.is_referenceable() {
            self.uids.register(object)?;
        }
        Ok(())
    }

    /// Cascade before an observed deletion: let every edge at the doomed
    /// object run its endpoint hooks, remove the edges, then drop the UID
    /// entry. No dangling index entry survives a deletion that goes through
    /// the store's lifecycle machinery.
    fn before_delete(
        &self,
        tree: &dyn ContentTree,
        object: &Arc<dyn ContentObject>,
    ) -> Result<(), Error> {
        let Some(uid) = object.uid() else {
            return Ok(());
        };

        for record in self.index.query(&RefQuery::new().source(uid))? {
            let ctx = PolicyContext {
                tree,
                record: &record,
                source: Some(object.clone()),
                target: self.uids.resolve(record.target, tree)?,
            };
            match self.policies.get(&record.policy) {
                Ok(policy) => {
                    if let Err(error) = policy.before_source_delete(&ctx) {
                        warn!(%error, reference = %record.uid, "before_source_delete hook failed");
                    }
                }
                Err(error) => warn!(%error, reference = %record.uid, "unknown policy in cascade"),
            }
            self.delete_record(tree, &record)?;
        }

        for record in self.index.query(&RefQuery::new().target(uid))? {
            let ctx = PolicyContext {
                tree,
                record: &record,
                source: self.uids.resolve(record.source, tree)?,
                target: Some(object.clone()),
            };
            match self.policies.get(&record.policy) {
                Ok(policy) => {
                    if let Err(error) = policy.before_target_delete(&ctx) {
                        warn!(%error, reference = %record.uid, "before_target_delete hook failed");
                    }
                }
                Err(error) => warn!(%error, reference = %record.uid, "unknown policy in cascade"),
            }
            self.delete_record(tree, &record)?;
        }

        self.uids.unregister_uid(uid)?;
        self.maybe_flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReferenceError;
    use crate::testing::{MemoryObject, MemoryTree};

    fn test_catalog() -> ReferenceCatalog {
        ReferenceCatalog::open(CatalogConfig::temporary()).unwrap()
    }

    fn two_documents(tree: &MemoryTree) -> (Arc<dyn ContentObject>, Arc<dyn ContentObject>) {
        let a = tree.add_object(MemoryObject::new("/site/a")).unwrap();
        let b = tree.add_object(MemoryObject::new("/site/b")).unwrap();
        (a, b)
    }

    #[test]
    fn test_register_object_is_idempotent() {
        let catalog = test_catalog();
        let tree = MemoryTree::new();
        let (a, _) = two_documents(&tree);

        let first = catalog.register_object(&a).unwrap();
        let second = catalog.register_object(&a).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_add_reference_and_query() {
        let catalog = test_catalog();
        let tree = MemoryTree::new();
        let (a, b) = two_documents(&tree);

        catalog
            .add_reference(
                &tree,
                a.clone(),
                b.clone(),
                Some("seeAlso"),
                vec![("note".to_string(), Value::from("hi"))],
            )
            .unwrap();

        let refs = catalog
            .get_references(&tree, a.clone(), Some("seeAlso"))
            .unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].relationship.as_deref(), Some("seeAlso"));
        assert_eq!(
            refs[0].metadata_value("note"),
            Some(&Value::String("hi".into()))
        );

        let resolved = catalog.target_object(&tree, &refs[0]).unwrap();
        assert_eq!(resolved.path(), "/site/b");

        let back = catalog
            .get_back_references(&tree, b.clone(), Some("seeAlso"))
            .unwrap();
        assert_eq!(back.len(), 1);
        assert!(catalog
            .has_relationship_to(&tree, a, b, "seeAlso")
            .unwrap());
    }

    #[test]
    fn test_add_reference_by_uid_endpoint() {
        let catalog = test_catalog();
        let tree = MemoryTree::new();
        let (a, b) = two_documents(&tree);

        let a_uid = catalog.register_object(&a).unwrap();
        let b_uid = catalog.register_object(&b).unwrap();

        catalog
            .add_reference(&tree, a_uid, b_uid, Some("seeAlso"), Vec::new())
            .unwrap();
        assert_eq!(catalog.reference_count(), 1);

        let err = catalog
            .add_reference(&tree, Uid::mint(), b_uid, Some("seeAlso"), Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Reference(ReferenceError::ObjectNotFound { .. })
        ));
    }

    #[test]
    fn test_add_reference_replaces_same_triple() {
        let catalog = test_catalog();
        let tree = MemoryTree::new();
        let (a, b) = two_documents(&tree);

        catalog
            .add_reference(
                &tree,
                a.clone(),
                b.clone(),
                Some("seeAlso"),
                vec![("note".to_string(), Value::from("old"))],
            )
            .unwrap();
        catalog
            .add_reference(
                &tree,
                a.clone(),
                b.clone(),
                Some("seeAlso"),
                vec![("note".to_string(), Value::from("new"))],
            )
            .unwrap();
        // A different relationship is a different edge.
        catalog
            .add_reference(&tree, a.clone(), b.clone(), Some("linksTo"), Vec::new())
            .unwrap();

        assert_eq!(catalog.reference_count(), 2);
        let refs = catalog
            .get_references(&tree, a, Some("seeAlso"))
            .unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(
            refs[0].metadata_value("note"),
            Some(&Value::String("new".into()))
        );
    }

    #[test]
    fn test_policy_can_veto_add() {
        struct RejectAll;
        impl ReferencePolicy for RejectAll {
            fn on_add(&self, _ctx: &PolicyContext<'_>) -> Result<(), ReferenceError> {
                Err(ReferenceError::ReferenceRejected {
                    reason: "closed for writing".to_string(),
                })
            }
        }

        let catalog = test_catalog();
        let tree = MemoryTree::new();
        let (a, b) = two_documents(&tree);
        catalog.policies().register("reject-all", Arc::new(RejectAll));

        let err = catalog
            .add_reference_with("reject-all", &tree, a, b, Some("seeAlso"), Vec::new())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Reference(ReferenceError::ReferenceRejected { .. })
        ));
        assert_eq!(catalog.reference_count(), 0);
    }

    #[test]
    fn test_delete_reference() {
        let catalog = test_catalog();
        let tree = MemoryTree::new();
        let (a, b) = two_documents(&tree);

        catalog
            .add_reference(&tree, a.clone(), b.clone(), Some("seeAlso"), Vec::new())
            .unwrap();
        catalog
            .add_reference(&tree, a.clone(), b.clone(), Some("linksTo"), Vec::new())
            .unwrap();

        let deleted = catalog
            .delete_reference(&tree, a.clone(), b.clone(), Some("seeAlso"))
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(catalog.reference_count(), 1);

        // Unconstrained relationship removes the rest.
        let deleted = catalog.delete_reference(&tree, a, b, None).unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(catalog.reference_count(), 0);
    }

    #[test]
    fn test_cascade_scope_is_explicit() {
        let catalog = test_catalog();
        let tree = MemoryTree::new();
        let (a, b) = two_documents(&tree);
        let c = tree.add_object(MemoryObject::new("/site/c")).unwrap();

        catalog
            .add_reference(&tree, a.clone(), b.clone(), Some("out"), Vec::new())
            .unwrap();
        catalog
            .add_reference(&tree, c.clone(), a.clone(), Some("in"), Vec::new())
            .unwrap();

        // Outgoing scope leaves the incoming edge alone.
        catalog
            .delete_references(&tree, a.clone(), None, CascadeScope::Outgoing)
            .unwrap();
        assert_eq!(catalog.reference_count(), 1);
        assert_eq!(
            catalog.get_back_references(&tree, a.clone(), None).unwrap().len(),
            1
        );

        catalog
            .add_reference(&tree, a.clone(), b, Some("out"), Vec::new())
            .unwrap();
        catalog
            .delete_references(&tree, a, None, CascadeScope::WithBackReferences)
            .unwrap();
        assert_eq!(catalog.reference_count(), 0);
    }

    #[test]
    fn test_relationships_listing() {
        let catalog = test_catalog();
        let tree = MemoryTree::new();
        let (a, b) = two_documents(&tree);
        let c = tree.add_object(MemoryObject::new("/site/c")).unwrap();

        catalog
            .add_reference(&tree, a.clone(), b.clone(), Some("seeAlso"), Vec::new())
            .unwrap();
        catalog
            .add_reference(&tree, a.clone(), c.clone(), Some("seeAlso"), Vec::new())
            .unwrap();
        catalog
            .add_reference(&tree, a.clone(), c.clone(), Some("linksTo"), Vec::new())
            .unwrap();

        assert_eq!(
            catalog.relationships(&tree, a).unwrap(),
            vec!["seeAlso", "linksTo"]
        );
        assert_eq!(catalog.back_relationships(&tree, c).unwrap(), vec!["seeAlso", "linksTo"]);
    }
}
