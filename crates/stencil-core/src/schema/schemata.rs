//! Ordered, named field containers.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::schema::field::{AccessMode, ContentInstance, Field, FieldAttr, FieldKind};

/// An ordered collection of fields grouped under a name.
///
/// Iteration order is insertion order and is semantically significant: it
/// drives rendering order and validation order, and every structural
/// operation (concatenation, copy, reorder) preserves it. Re-adding a field
/// under an existing name replaces it in place.
#[derive(Clone)]
pub struct Schemata {
    name: String,
    order: Vec<String>,
    fields: HashMap<String, Box<dyn Field>>,
}

impl Schemata {
    /// Create an empty schemata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: Vec::new(),
            fields: HashMap::new(),
        }
    }

    /// Create a schemata from an initial field list.
    pub fn with_fields(
        name: impl Into<String>,
        fields: Vec<Box<dyn Field>>,
    ) -> Result<Self, SchemaError> {
        let mut schemata = Self::new(name);
        for field in fields {
            schemata.add_field(field)?;
        }
        Ok(schemata)
    }

    /// The schemata's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a field, or replace the field of the same name in place.
    ///
    /// Enforces the structural invariants: at most one primary field per
    /// container, and reference-kind fields must carry a non-empty
    /// relationship qualifier.
    pub fn add_field(&mut self, field: Box<dyn Field>) -> Result<(), SchemaError> {
        self.validate_on_add(field.as_ref())?;
        let name = field.name().to_string();
        if !self.fields.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.fields.insert(name, field);
        Ok(())
    }

    fn validate_on_add(&self, field: &dyn Field) -> Result<(), SchemaError> {
        if field.is_primary() {
            if let Some(existing) = self.primary_field() {
                if existing.name() != field.name() {
                    return Err(SchemaError::DuplicatePrimary {
                        field: field.name().to_string(),
                        existing: existing.name().to_string(),
                    });
                }
            }
        }
        if field.kind() == FieldKind::Reference
            && field.relationship().map_or(true, str::is_empty)
        {
            return Err(SchemaError::UnqualifiedRelationship {
                field: field.name().to_string(),
            });
        }
        Ok(())
    }

    /// Remove a field by name, returning it.
    pub fn del_field(&mut self, name: &str) -> Result<Box<dyn Field>, SchemaError> {
        let field = self.fields.remove(name).ok_or_else(|| SchemaError::UnknownField {
            field: name.to_string(),
        })?;
        self.order.retain(|n| n != name);
        Ok(field)
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&dyn Field> {
        self.fields.get(name).map(|f| f.as_ref())
    }

    /// Whether a field with the name exists.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All fields, in insertion order.
    pub fn fields(&self) -> Vec<&dyn Field> {
        self.order
            .iter()
            .filter_map(|name| self.field(name))
            .collect()
    }

    /// Field names, in insertion order.
    pub fn field_names(&self) -> &[String] {
        &self.order
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the container is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The primary field, if one is declared.
    pub fn primary_field(&self) -> Option<&dyn Field> {
        self.fields().into_iter().find(|f| f.is_primary())
    }

    /// Names of all searchable fields, in insertion order.
    pub fn searchable_names(&self) -> Vec<&str> {
        self.fields()
            .into_iter()
            .filter(|f| f.is_searchable())
            .map(|f| f.name())
            .collect()
    }

    /// Widget hints keyed by field name.
    pub fn widgets(&self) -> HashMap<&str, &str> {
        self.fields()
            .into_iter()
            .map(|f| (f.name(), f.widget()))
            .collect()
    }

    /// The subsequence of fields satisfying every attribute match and every
    /// predicate.
    pub fn filter_fields(
        &self,
        attrs: &[FieldAttr<'_>],
        predicates: &[&dyn Fn(&dyn Field) -> bool],
    ) -> Vec<&dyn Field> {
        self.fields()
            .into_iter()
            .filter(|f| attrs.iter().all(|a| a.matches(*f)))
            .filter(|f| predicates.iter().all(|p| p(*f)))
            .collect()
    }

    /// Fields currently writeable on the instance, optionally restricted to
    /// those visible in edit mode. Writability and visibility are the
    /// field's own business; this is pure partitioning.
    pub fn editable_fields(
        &self,
        instance: &dyn ContentInstance,
        visible_only: bool,
    ) -> Vec<&dyn Field> {
        self.fields()
            .into_iter()
            .filter(|f| f.writeable(instance))
            .filter(|f| !visible_only || f.visible(AccessMode::Edit))
            .collect()
    }

    /// Fields viewable on the instance per the field's own permission check.
    pub fn viewable_fields(&self, instance: &dyn ContentInstance) -> Vec<&dyn Field> {
        self.fields()
            .into_iter()
            .filter(|f| f.check_permission(AccessMode::View, instance))
            .collect()
    }

    /// Produce a new schemata with self's fields in order followed by
    /// other's, other's replacing self's on name collision. Fails when the
    /// combination violates a structural invariant (two primaries).
    pub fn concat(&self, other: &Schemata) -> Result<Schemata, SchemaError> {
        let mut combined = Schemata::new(self.name.clone());
        for field in self.fields() {
            combined.add_field(field.clone_field())?;
        }
        for field in other.fields() {
            combined.add_field(field.clone_field())?;
        }
        Ok(combined)
    }

    /// Deep copy: every field is independently cloned, so mutating the copy
    /// never affects the original.
    pub fn copy(&self) -> Schemata {
        self.clone()
    }

    /// Replace the order list. The new order must be a permutation of the
    /// current field names; used by the managed reorder operations.
    pub(crate) fn set_order(&mut self, order: Vec<String>) {
        debug_assert_eq!(order.len(), self.order.len());
        debug_assert!(order.iter().all(|n| self.fields.contains_key(n)));
        self.order = order;
    }
}

impl std::fmt::Debug for Schemata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schemata")
            .field("name", &self.name)
            .field("fields", &self.order)
            .finish()
    }
}
