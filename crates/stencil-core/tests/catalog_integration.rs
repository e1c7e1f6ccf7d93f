//! Integration tests for the reference catalog wired to a content tree.

use std::sync::Arc;

use stencil_core::testing::{MemoryObject, MemoryTree};
use stencil_core::{
    CascadeScope, CatalogConfig, ContentObject, ContentReference, RefQuery, ReferenceCatalog,
    CONTENT_POLICY,
};
use stencil_model::Value;

struct TestContext {
    catalog: Arc<ReferenceCatalog>,
    tree: MemoryTree,
}

impl TestContext {
    /// A temporary catalog subscribed to the tree's lifecycle notifications.
    fn new() -> Self {
        let catalog = Arc::new(ReferenceCatalog::open(CatalogConfig::temporary()).unwrap());
        let tree = MemoryTree::new();
        tree.subscribe(catalog.clone());
        Self { catalog, tree }
    }

    fn add_document(&self, path: &str) -> Arc<dyn ContentObject> {
        self.tree.add_object(MemoryObject::new(path)).unwrap()
    }
}

#[test]
fn test_after_add_assigns_uids() {
    let ctx = TestContext::new();
    let a = ctx.add_document("/site/a");

    // Insertion through the observed tree registered the object.
    let uid = a.uid().expect("uid assigned on insertion");
    let resolved = ctx.catalog.lookup_object(&ctx.tree, uid).unwrap();
    assert_eq!(resolved.path(), "/site/a");
}

#[test]
fn test_reference_roundtrip_with_metadata() {
    let ctx = TestContext::new();
    let a = ctx.add_document("/site/a");
    let b = ctx.add_document("/site/b");

    ctx.catalog
        .add_reference(
            &ctx.tree,
            a.clone(),
            b.clone(),
            Some("seeAlso"),
            vec![("note".to_string(), Value::from("hi"))],
        )
        .unwrap();

    let refs = ctx
        .catalog
        .get_references(&ctx.tree, a.clone(), Some("seeAlso"))
        .unwrap();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].relationship.as_deref(), Some("seeAlso"));
    assert_eq!(refs[0].metadata_keys(), vec!["note"]);
    assert_eq!(
        refs[0].metadata_value("note"),
        Some(&Value::String("hi".into()))
    );

    let target = ctx.catalog.target_object(&ctx.tree, &refs[0]).unwrap();
    assert_eq!(target.path(), "/site/b");
    assert_eq!(refs[0].target_id, "b");
}

#[test]
fn test_observed_deletion_cascades() {
    let ctx = TestContext::new();
    let a = ctx.add_document("/site/a");
    let b = ctx.add_document("/site/b");

    ctx.catalog
        .add_reference(&ctx.tree, a.clone(), b.clone(), Some("seeAlso"), Vec::new())
        .unwrap();
    assert_eq!(ctx.catalog.reference_count(), 1);

    // Deleting the target through the store's lifecycle machinery removes
    // the edge entirely: no dangling entry survives.
    ctx.tree.remove("/site/b").unwrap();

    assert_eq!(ctx.catalog.reference_count(), 0);
    assert!(ctx
        .catalog
        .get_references(&ctx.tree, a.clone(), None)
        .unwrap()
        .is_empty());
    assert!(!ctx.catalog.uids().contains(b.uid().unwrap()).unwrap());
}

#[test]
fn test_source_deletion_cascades_outgoing() {
    let ctx = TestContext::new();
    let a = ctx.add_document("/site/a");
    let b = ctx.add_document("/site/b");

    ctx.catalog
        .add_reference(&ctx.tree, a.clone(), b.clone(), Some("seeAlso"), Vec::new())
        .unwrap();

    ctx.tree.remove("/site/a").unwrap();

    assert_eq!(ctx.catalog.reference_count(), 0);
    assert!(ctx
        .catalog
        .get_back_references(&ctx.tree, b, None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_bypass_deletion_stays_stale_until_rebuild() {
    let ctx = TestContext::new();
    let a = ctx.add_document("/site/a");
    let b = ctx.add_document("/site/b");

    ctx.catalog
        .add_reference(&ctx.tree, a.clone(), b.clone(), Some("seeAlso"), Vec::new())
        .unwrap();

    // Low-level removal bypasses the lifecycle hooks: the record survives...
    ctx.tree.remove_unobserved("/site/b");
    assert_eq!(ctx.catalog.reference_count(), 1);

    // ...but query results silently filter it.
    assert!(ctx
        .catalog
        .get_references(&ctx.tree, a.clone(), None)
        .unwrap()
        .is_empty());

    // Rebuild is the repair path: the dangling record is evicted.
    let stats = ctx.catalog.rebuild(&ctx.tree).unwrap();
    assert_eq!(stats.evicted, 1);
    assert_eq!(ctx.catalog.reference_count(), 0);
}

#[test]
fn test_rebuild_is_idempotent() {
    let ctx = TestContext::new();
    let a = ctx.add_document("/site/a");
    let b = ctx.add_document("/site/b");
    let c = ctx.add_document("/site/c");

    ctx.catalog
        .add_reference(&ctx.tree, a.clone(), b.clone(), Some("seeAlso"), Vec::new())
        .unwrap();
    ctx.catalog
        .add_reference(&ctx.tree, b.clone(), c.clone(), Some("linksTo"), Vec::new())
        .unwrap();

    let uid_before = a.uid().unwrap();

    let first = ctx.catalog.rebuild(&ctx.tree).unwrap();
    let after_first = ctx
        .catalog
        .query(&ctx.tree, &RefQuery::new())
        .unwrap();

    let second = ctx.catalog.rebuild(&ctx.tree).unwrap();
    let after_second = ctx.catalog.query(&ctx.tree, &RefQuery::new()).unwrap();

    assert_eq!(first, second);
    assert_eq!(after_first.len(), after_second.len());
    for reference in &after_first {
        assert!(after_second.contains(reference));
    }
    // Rebuild reuses the UIDs objects already carry.
    assert_eq!(a.uid().unwrap(), uid_before);
}

#[test]
fn test_content_reference_owns_nested_object() {
    let ctx = TestContext::new();
    let a = ctx.add_document("/site/a");
    let b = ctx.add_document("/site/b");

    let record = ctx
        .catalog
        .add_reference_with(
            CONTENT_POLICY,
            &ctx.tree,
            a.clone(),
            b.clone(),
            Some("annotates"),
            Vec::new(),
        )
        .unwrap();

    let content_path = ContentReference::content_path(&a.path(), &record);
    assert!(ctx.tree.contains(&content_path));

    // Deleting the reference destroys the nested object with it.
    let deleted = ctx
        .catalog
        .delete_reference(&ctx.tree, a.clone(), b, Some("annotates"))
        .unwrap();
    assert_eq!(deleted, 1);
    assert!(!ctx.tree.contains(&content_path));
}

#[test]
fn test_unregister_object_drops_outgoing_only() {
    let ctx = TestContext::new();
    let a = ctx.add_document("/site/a");
    let b = ctx.add_document("/site/b");
    let c = ctx.add_document("/site/c");

    ctx.catalog
        .add_reference(&ctx.tree, a.clone(), b.clone(), Some("out"), Vec::new())
        .unwrap();
    ctx.catalog
        .add_reference(&ctx.tree, c.clone(), a.clone(), Some("in"), Vec::new())
        .unwrap();

    ctx.catalog.unregister_object(&ctx.tree, &a).unwrap();

    // Outgoing edge gone, incoming edge still recorded.
    assert_eq!(ctx.catalog.reference_count(), 1);
    assert!(!ctx.catalog.uids().contains(a.uid().unwrap()).unwrap());

    // Unregistering twice is a silent no-op.
    ctx.catalog.unregister_object(&ctx.tree, &a).unwrap();
}

#[test]
fn test_explicit_back_reference_cascade() {
    let ctx = TestContext::new();
    let a = ctx.add_document("/site/a");
    let b = ctx.add_document("/site/b");
    let c = ctx.add_document("/site/c");

    ctx.catalog
        .add_reference(&ctx.tree, a.clone(), b.clone(), Some("out"), Vec::new())
        .unwrap();
    ctx.catalog
        .add_reference(&ctx.tree, c.clone(), a.clone(), Some("in"), Vec::new())
        .unwrap();

    ctx.catalog
        .delete_references(&ctx.tree, a, None, CascadeScope::WithBackReferences)
        .unwrap();
    assert_eq!(ctx.catalog.reference_count(), 0);
}

#[test]
fn test_persistence_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = CatalogConfig::new(dir.path()).flush_on_write(true);

    let (a_uid, b_uid);
    {
        let catalog = Arc::new(ReferenceCatalog::open(config.clone()).unwrap());
        let tree = MemoryTree::new();
        tree.subscribe(catalog.clone());
        let a = tree.add_object(MemoryObject::new("/site/a")).unwrap();
        let b = tree.add_object(MemoryObject::new("/site/b")).unwrap();
        a_uid = a.uid().unwrap();
        b_uid = b.uid().unwrap();

        catalog
            .add_reference(&tree, a, b, Some("seeAlso"), Vec::new())
            .unwrap();
        catalog.flush().unwrap();
    }

    // Reopen against a fresh tree holding the same paths.
    {
        let catalog = ReferenceCatalog::open(config).unwrap();
        let tree = MemoryTree::new();
        tree.add_object(MemoryObject::new("/site/a")).unwrap();
        tree.add_object(MemoryObject::new("/site/b")).unwrap();

        assert_eq!(catalog.reference_count(), 1);
        let refs = catalog
            .get_references(&tree, a_uid, Some("seeAlso"))
            .unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].target, b_uid);
        assert_eq!(catalog.lookup_object(&tree, b_uid).unwrap().path(), "/site/b");
    }
}

#[test]
fn test_uid_stable_across_moves() {
    let ctx = TestContext::new();
    let a = ctx.add_document("/site/a");
    let uid = a.uid().unwrap();

    // A move is a re-add under a new path with the same identity attribute.
    let moved = Arc::new(MemoryObject::new("/archive/a"));
    moved.set_uid(uid);
    ctx.tree.remove_unobserved("/site/a");
    ctx.tree.add(moved).unwrap();

    let resolved = ctx.catalog.lookup_object(&ctx.tree, uid).unwrap();
    assert_eq!(resolved.path(), "/archive/a");
    assert_eq!(resolved.uid(), Some(uid));
}
