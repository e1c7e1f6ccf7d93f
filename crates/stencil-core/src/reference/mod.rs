//! Reference subsystem: stable identity and bidirectional relationships.
//!
//! Content objects get stable UIDs through the [`UidCatalog`]; relationships
//! between them are first-class persistent [`Reference`] records, indexed
//! for point and range queries by source, target, relationship and target
//! id. The [`ReferenceCatalog`] ties it together: it assigns UIDs, runs
//! [`ReferencePolicy`] hooks, cascades deletions through the store's
//! lifecycle notifications, and can rebuild its index from the tree.

mod catalog;
mod index;
mod policy;
mod query;
mod record;
mod uid_catalog;

pub use catalog::{CascadeScope, Endpoint, RebuildStats, ReferenceCatalog};
pub use index::ReferenceIndex;
pub use policy::{
    BasicReference, ContentReference, PolicyContext, PolicyRegistry, ReferencePolicy,
    BASIC_POLICY, CONTENT_POLICY,
};
pub use query::RefQuery;
pub use record::Reference;
pub use uid_catalog::UidCatalog;
