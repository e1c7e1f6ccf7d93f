//! Persistent reference records.

use rkyv::{Archive, Deserialize, Serialize};

use stencil_model::{Uid, Value};

use crate::error::Error;
use crate::reference::policy::BASIC_POLICY;

/// A persistent edge connecting a source UID to a target UID under a named
/// relationship.
///
/// A reference is itself identified by a UID and never owns its endpoints:
/// it holds their UIDs and resolves to live objects lazily through the
/// catalog. Metadata is recorded at creation time, in insertion order, with
/// keys enumerable for introspection. The `policy` names the
/// [`crate::reference::ReferencePolicy`] governing the record's lifecycle
/// hooks.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Reference {
    /// The record's own stable identifier.
    pub uid: Uid,
    /// UID of the source object.
    pub source: Uid,
    /// UID of the target object.
    pub target: Uid,
    /// Relationship label; conventionally non-empty.
    pub relationship: Option<String>,
    /// The target's local id at creation (refreshed on rebuild), kept as
    /// queryable target metadata.
    pub target_id: String,
    /// Name of the governing reference policy.
    pub policy: String,
    metadata: Vec<(String, Value)>,
}

impl Reference {
    /// Create a record for a new edge under the basic policy.
    pub fn new(source: Uid, target: Uid, relationship: Option<&str>) -> Self {
        Self {
            uid: Uid::mint(),
            source,
            target,
            relationship: relationship.map(str::to_string),
            target_id: String::new(),
            policy: BASIC_POLICY.to_string(),
            metadata: Vec::new(),
        }
    }

    /// Set the governing policy.
    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = policy.into();
        self
    }

    /// Set the target's local id.
    pub fn with_target_id(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = target_id.into();
        self
    }

    /// Attach creation-time metadata.
    pub fn with_metadata(mut self, entries: Vec<(String, Value)>) -> Self {
        self.metadata = entries;
        self
    }

    /// Set one metadata entry, replacing an existing key in place.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.metadata.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.metadata.push((key, value));
        }
    }

    /// All metadata entries, in insertion order.
    pub fn metadata(&self) -> &[(String, Value)] {
        &self.metadata
    }

    /// Metadata keys, for introspection.
    pub fn metadata_keys(&self) -> Vec<&str> {
        self.metadata.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Look up one metadata value.
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Whether this record matches a relationship constraint; `None` is
    /// unconstrained.
    pub fn matches_relationship(&self, relationship: Option<&str>) -> bool {
        match relationship {
            None => true,
            Some(rel) => self.relationship.as_deref() == Some(rel),
        }
    }

    /// Serialize the record to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reference() -> Reference {
        Reference::new(Uid::mint(), Uid::mint(), Some("relatesTo"))
            .with_target_id("doc-b")
            .with_metadata(vec![
                ("note".to_string(), Value::from("hi")),
                ("weight".to_string(), Value::Int(3)),
            ])
    }

    #[test]
    fn test_metadata_introspection() {
        let reference = sample_reference();

        assert_eq!(reference.metadata_keys(), vec!["note", "weight"]);
        assert_eq!(
            reference.metadata_value("note"),
            Some(&Value::String("hi".into()))
        );
        assert_eq!(reference.metadata_value("missing"), None);
    }

    #[test]
    fn test_set_metadata_replaces_in_place() {
        let mut reference = sample_reference();
        reference.set_metadata("note", "updated");
        reference.set_metadata("extra", Value::Bool(true));

        assert_eq!(reference.metadata_keys(), vec!["note", "weight", "extra"]);
        assert_eq!(
            reference.metadata_value("note"),
            Some(&Value::String("updated".into()))
        );
    }

    #[test]
    fn test_relationship_matching() {
        let reference = sample_reference();

        assert!(reference.matches_relationship(None));
        assert!(reference.matches_relationship(Some("relatesTo")));
        assert!(!reference.matches_relationship(Some("other")));

        let unnamed = Reference::new(Uid::mint(), Uid::mint(), None);
        assert!(unnamed.matches_relationship(None));
        assert!(!unnamed.matches_relationship(Some("relatesTo")));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let reference = sample_reference();
        let bytes = reference.to_bytes().unwrap();
        let decoded = Reference::from_bytes(&bytes).unwrap();

        assert_eq!(reference, decoded);
    }
}
