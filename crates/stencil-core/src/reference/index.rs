//! Sled-backed reference store and query index.
//!
//! Two trees: one holding the reference records keyed by their own UID, and
//! one holding posting lists for the four queryable dimensions (source,
//! target, relationship, target id). A query intersects the posting lists
//! of its constrained dimensions.
//!
//! Posting key format: `[dimension tag:1][encoded value]`
//! Posting value format: `[ref_uid_1:16][ref_uid_2:16]...` (packed 16-byte UIDs)

use sled::{Db, Tree};
use tracing::debug;

use stencil_model::Uid;

use crate::error::Error;
use crate::reference::query::RefQuery;
use crate::reference::record::Reference;

/// Tree name for reference records.
const RECORDS_TREE: &str = "references:records";

/// Tree name for the dimension posting lists.
const POSTINGS_TREE: &str = "references:index";

/// Dimension tag for the source UID.
const DIM_SOURCE: u8 = 0x01;
/// Dimension tag for the target UID.
const DIM_TARGET: u8 = 0x02;
/// Dimension tag for the relationship label.
const DIM_RELATIONSHIP: u8 = 0x03;
/// Dimension tag for the target's local id.
const DIM_TARGET_ID: u8 = 0x04;

/// The reference record store plus its query index.
pub struct ReferenceIndex {
    records: Tree,
    postings: Tree,
}

impl ReferenceIndex {
    /// Open or create the index trees on the given database.
    pub fn open(db: &Db) -> Result<Self, Error> {
        Ok(Self {
            records: db.open_tree(RECORDS_TREE)?,
            postings: db.open_tree(POSTINGS_TREE)?,
        })
    }

    /// Build a posting key for a dimension value.
    fn dim_key(tag: u8, value: &[u8]) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + value.len());
        key.push(tag);
        key.extend_from_slice(value);
        key
    }

    /// Posting keys a record is indexed under. Absent relationship labels
    /// and empty target ids produce no posting for their dimension.
    fn posting_keys(record: &Reference) -> Vec<Vec<u8>> {
        let mut keys = vec![
            Self::dim_key(DIM_SOURCE, record.source.as_bytes()),
            Self::dim_key(DIM_TARGET, record.target.as_bytes()),
        ];
        if let Some(relationship) = record.relationship.as_deref() {
            if !relationship.is_empty() {
                keys.push(Self::dim_key(DIM_RELATIONSHIP, relationship.as_bytes()));
            }
        }
        if !record.target_id.is_empty() {
            keys.push(Self::dim_key(DIM_TARGET_ID, record.target_id.as_bytes()));
        }
        keys
    }

    /// Posting keys for a query's constrained dimensions.
    fn query_keys(query: &RefQuery) -> Vec<Vec<u8>> {
        let mut keys = Vec::new();
        if let Some(source) = &query.source {
            keys.push(Self::dim_key(DIM_SOURCE, source.as_bytes()));
        }
        if let Some(target) = &query.target {
            keys.push(Self::dim_key(DIM_TARGET, target.as_bytes()));
        }
        if let Some(relationship) = &query.relationship {
            keys.push(Self::dim_key(DIM_RELATIONSHIP, relationship.as_bytes()));
        }
        if let Some(target_id) = &query.target_id {
            keys.push(Self::dim_key(DIM_TARGET_ID, target_id.as_bytes()));
        }
        keys
    }

    /// Store a record and index it under every dimension.
    pub fn insert(&self, record: &Reference) -> Result<(), Error> {
        self.records
            .insert(record.uid.as_bytes(), record.to_bytes()?)?;
        for key in Self::posting_keys(record) {
            self.add_posting(&key, record.uid)?;
        }
        debug!(reference = %record.uid, "reference indexed");
        Ok(())
    }

    /// Remove a record and all of its postings.
    pub fn remove(&self, record: &Reference) -> Result<(), Error> {
        for key in Self::posting_keys(record) {
            self.remove_posting(&key, record.uid)?;
        }
        self.records.remove(record.uid.as_bytes())?;
        debug!(reference = %record.uid, "reference unindexed");
        Ok(())
    }

    /// Fetch a record by its UID.
    pub fn get(&self, uid: Uid) -> Result<Option<Reference>, Error> {
        match self.records.get(uid.as_bytes())? {
            Some(bytes) => Ok(Some(Reference::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Run a query: intersect the posting lists of every constrained
    /// dimension. An unconstrained query returns all records.
    pub fn query(&self, query: &RefQuery) -> Result<Vec<Reference>, Error> {
        let keys = Self::query_keys(query);
        if keys.is_empty() {
            return self.all_records();
        }

        let mut lists = Vec::with_capacity(keys.len());
        for key in &keys {
            lists.push(self.posting_list(key)?);
        }
        // Intersect starting from the smallest list.
        lists.sort_by_key(|list| list.len());
        let mut candidates = lists.remove(0);
        candidates.retain(|uid| lists.iter().all(|list| list.contains(uid)));

        let mut result = Vec::with_capacity(candidates.len());
        for id in candidates {
            if let Some(record) = self.get(Uid::from_bytes(id))? {
                if query.matches(&record) {
                    result.push(record);
                }
            }
        }
        Ok(result)
    }

    /// All stored records.
    pub fn all_records(&self) -> Result<Vec<Reference>, Error> {
        let mut records = Vec::new();
        for entry in self.records.iter() {
            let (_, value) = entry?;
            records.push(Reference::from_bytes(&value)?);
        }
        Ok(records)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every posting list, keeping the records. Rebuild re-derives the
    /// postings from the records.
    pub fn clear_postings(&self) -> Result<(), Error> {
        self.postings.clear()?;
        Ok(())
    }

    /// Drop everything.
    pub fn clear(&self) -> Result<(), Error> {
        self.records.clear()?;
        self.postings.clear()?;
        Ok(())
    }

    /// Flush both trees to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.records.flush()?;
        self.postings.flush()?;
        Ok(())
    }

    /// Add a reference UID to a posting list.
    fn add_posting(&self, key: &[u8], uid: Uid) -> Result<(), Error> {
        // Read-modify-write: get existing UIDs, add the new one, write back
        let mut ids = match self.postings.get(key)? {
            Some(bytes) => Self::decode_id_list(&bytes),
            None => Vec::new(),
        };
        let id = uid.into_bytes();
        if !ids.contains(&id) {
            ids.push(id);
            self.postings.insert(key, Self::encode_id_list(&ids))?;
        }
        Ok(())
    }

    /// Remove a reference UID from a posting list; the entry disappears
    /// with its last UID.
    fn remove_posting(&self, key: &[u8], uid: Uid) -> Result<(), Error> {
        if let Some(bytes) = self.postings.get(key)? {
            let id = uid.into_bytes();
            let mut ids = Self::decode_id_list(&bytes);
            ids.retain(|candidate| candidate != &id);

            if ids.is_empty() {
                self.postings.remove(key)?;
            } else {
                self.postings.insert(key, Self::encode_id_list(&ids))?;
            }
        }
        Ok(())
    }

    /// Fetch a posting list.
    fn posting_list(&self, key: &[u8]) -> Result<Vec<[u8; 16]>, Error> {
        match self.postings.get(key)? {
            Some(bytes) => Ok(Self::decode_id_list(&bytes)),
            None => Ok(Vec::new()),
        }
    }

    /// Encode a list of reference UIDs into bytes.
    fn encode_id_list(ids: &[[u8; 16]]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ids.len() * 16);
        for id in ids {
            buf.extend_from_slice(id);
        }
        buf
    }

    /// Decode a list of reference UIDs from bytes.
    fn decode_id_list(bytes: &[u8]) -> Vec<[u8; 16]> {
        let count = bytes.len() / 16;
        let mut ids = Vec::with_capacity(count);
        for i in 0..count {
            let offset = i * 16;
            if offset + 16 <= bytes.len() {
                let mut id = [0u8; 16];
                id.copy_from_slice(&bytes[offset..offset + 16]);
                ids.push(id);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_index() -> ReferenceIndex {
        let db = sled::Config::new().temporary(true).open().unwrap();
        ReferenceIndex::open(&db).unwrap()
    }

    fn sample_record(relationship: &str) -> Reference {
        Reference::new(Uid::mint(), Uid::mint(), Some(relationship)).with_target_id("doc-b")
    }

    #[test]
    fn test_insert_and_get() {
        let index = test_index();
        let record = sample_record("relatesTo");

        index.insert(&record).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(record.uid).unwrap(), Some(record));
    }

    #[test]
    fn test_query_by_each_dimension() {
        let index = test_index();
        let record = sample_record("relatesTo");
        index.insert(&record).unwrap();

        let by_source = index
            .query(&RefQuery::new().source(record.source))
            .unwrap();
        assert_eq!(by_source.len(), 1);

        let by_target = index.query(&RefQuery::new().target(record.target)).unwrap();
        assert_eq!(by_target.len(), 1);

        let by_rel = index
            .query(&RefQuery::new().relationship("relatesTo"))
            .unwrap();
        assert_eq!(by_rel.len(), 1);

        let by_target_id = index.query(&RefQuery::new().target_id("doc-b")).unwrap();
        assert_eq!(by_target_id.len(), 1);

        let miss = index
            .query(&RefQuery::new().relationship("unrelated"))
            .unwrap();
        assert!(miss.is_empty());
    }

    #[test]
    fn test_query_intersects_dimensions() {
        let index = test_index();
        let source = Uid::mint();
        let a = Reference::new(source, Uid::mint(), Some("relatesTo"));
        let b = Reference::new(source, Uid::mint(), Some("linksTo"));
        index.insert(&a).unwrap();
        index.insert(&b).unwrap();

        let both = index.query(&RefQuery::new().source(source)).unwrap();
        assert_eq!(both.len(), 2);

        let narrowed = index
            .query(&RefQuery::new().source(source).relationship("linksTo"))
            .unwrap();
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].uid, b.uid);
    }

    #[test]
    fn test_unnamed_relationship_not_in_relationship_dimension() {
        let index = test_index();
        let record = Reference::new(Uid::mint(), Uid::mint(), None);
        index.insert(&record).unwrap();

        let by_source = index.query(&RefQuery::new().source(record.source)).unwrap();
        assert_eq!(by_source.len(), 1);

        let by_rel = index
            .query(&RefQuery::new().relationship("anything"))
            .unwrap();
        assert!(by_rel.is_empty());
    }

    #[test]
    fn test_remove_cleans_postings() {
        let index = test_index();
        let record = sample_record("relatesTo");
        index.insert(&record).unwrap();
        index.remove(&record).unwrap();

        assert!(index.is_empty());
        assert!(index
            .query(&RefQuery::new().source(record.source))
            .unwrap()
            .is_empty());
        assert!(index
            .query(&RefQuery::new().relationship("relatesTo"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unconstrained_query_returns_all() {
        let index = test_index();
        index.insert(&sample_record("a")).unwrap();
        index.insert(&sample_record("b")).unwrap();

        let all = index.query(&RefQuery::new()).unwrap();
        assert_eq!(all.len(), 2);
    }
}
