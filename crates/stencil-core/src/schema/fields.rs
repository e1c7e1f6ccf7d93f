//! Basic concrete field implementations.
//!
//! These cover the two kinds the engine itself needs: a plain string field
//! (the placeholder the managed-schema operations insert, and the workhorse
//! of most content types) and a reference field carrying a relationship
//! qualifier. Richer field libraries are expected to live outside this
//! crate and implement [`Field`] themselves.

use std::sync::Arc;

use stencil_model::Value;

use crate::error::Error;
use crate::schema::field::{AccessMode, ContentInstance, Field, FieldKind};
use crate::schema::layer::{DefaultLayerContainer, Layer, LayerContainer};

/// A single-valued string field.
#[derive(Clone)]
pub struct StringField {
    name: String,
    schemata: String,
    widget: String,
    primary: bool,
    searchable: bool,
    metadata: bool,
    required: bool,
    default: Option<Value>,
    layers: DefaultLayerContainer,
}

impl StringField {
    /// Create a string field in the default schemata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schemata: "default".to_string(),
            widget: "string".to_string(),
            primary: false,
            searchable: false,
            metadata: false,
            required: false,
            default: None,
            layers: DefaultLayerContainer::new(),
        }
    }

    /// Place the field in a schemata group.
    pub fn in_schemata(mut self, schemata: impl Into<String>) -> Self {
        self.schemata = schemata.into();
        self
    }

    /// Set the widget hint.
    pub fn with_widget(mut self, widget: impl Into<String>) -> Self {
        self.widget = widget.into();
        self
    }

    /// Mark as the schema's primary field.
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Mark as searchable.
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Mark as a metadata field.
    pub fn metadata(mut self) -> Self {
        self.metadata = true;
        self
    }

    /// Require a non-empty value.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Register a layer on this field.
    pub fn with_layer(mut self, name: &str, layer: Arc<dyn Layer>) -> Self {
        self.layers.register_layer(name, layer);
        self
    }
}

impl Field for StringField {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> FieldKind {
        FieldKind::String
    }

    fn schemata(&self) -> &str {
        &self.schemata
    }

    fn widget(&self) -> &str {
        &self.widget
    }

    fn is_primary(&self) -> bool {
        self.primary
    }

    fn is_searchable(&self) -> bool {
        self.searchable
    }

    fn is_metadata(&self) -> bool {
        self.metadata
    }

    fn default_value(&self, _instance: &dyn ContentInstance) -> Option<Value> {
        self.default.clone()
    }

    fn read(&self, instance: &dyn ContentInstance) -> Option<Value> {
        instance.get(&self.name)
    }

    fn write(&self, instance: &dyn ContentInstance, value: Value) -> Result<(), Error> {
        instance.set(&self.name, value)
    }

    fn writeable(&self, instance: &dyn ContentInstance) -> bool {
        instance.allowed(AccessMode::Edit, &self.name)
    }

    fn check_permission(&self, mode: AccessMode, instance: &dyn ContentInstance) -> bool {
        instance.allowed(mode, &self.name)
    }

    fn validate(&self, value: &Value, _instance: &dyn ContentInstance) -> Option<String> {
        if self.required && value.is_empty() {
            return Some(format!("{} is required", self.name));
        }
        if !matches!(value, Value::String(_) | Value::Null) {
            return Some(format!("{} must be a string", self.name));
        }
        None
    }

    fn as_layer_container(&self) -> Option<&dyn LayerContainer> {
        Some(&self.layers)
    }

    fn clone_field(&self) -> Box<dyn Field> {
        Box::new(self.clone())
    }

    fn with_schemata(&self, schemata: &str) -> Box<dyn Field> {
        let mut copy = self.clone();
        copy.schemata = schemata.to_string();
        Box::new(copy)
    }
}

/// A field holding relationships to other content objects.
///
/// Values are UIDs (or UID lists for multi-valued fields). The relationship
/// qualifier is mandatory: schemas refuse reference fields without one.
#[derive(Clone)]
pub struct ReferenceField {
    name: String,
    schemata: String,
    widget: String,
    relationship: Option<String>,
    multi: bool,
    required: bool,
}

impl ReferenceField {
    /// Create a reference field. The relationship qualifier must still be
    /// supplied via [`ReferenceField::with_relationship`] before the field
    /// can join a schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schemata: "default".to_string(),
            widget: "reference".to_string(),
            relationship: None,
            multi: false,
            required: false,
        }
    }

    /// Set the relationship qualifier.
    pub fn with_relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    /// Place the field in a schemata group.
    pub fn in_schemata(mut self, schemata: impl Into<String>) -> Self {
        self.schemata = schemata.into();
        self
    }

    /// Allow multiple targets.
    pub fn multi_valued(mut self) -> Self {
        self.multi = true;
        self
    }

    /// Require at least one target.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl Field for ReferenceField {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Reference
    }

    fn schemata(&self) -> &str {
        &self.schemata
    }

    fn widget(&self) -> &str {
        &self.widget
    }

    fn relationship(&self) -> Option<&str> {
        self.relationship.as_deref()
    }

    fn read(&self, instance: &dyn ContentInstance) -> Option<Value> {
        instance.get(&self.name)
    }

    fn write(&self, instance: &dyn ContentInstance, value: Value) -> Result<(), Error> {
        instance.set(&self.name, value)
    }

    fn writeable(&self, instance: &dyn ContentInstance) -> bool {
        instance.allowed(AccessMode::Edit, &self.name)
    }

    fn check_permission(&self, mode: AccessMode, instance: &dyn ContentInstance) -> bool {
        instance.allowed(mode, &self.name)
    }

    fn validate(&self, value: &Value, _instance: &dyn ContentInstance) -> Option<String> {
        if self.required && value.is_empty() {
            return Some(format!("{} is required", self.name));
        }
        let acceptable = match value {
            Value::Null => true,
            Value::Uid(_) => true,
            Value::UidList(_) => self.multi,
            _ => false,
        };
        if !acceptable {
            return Some(format!("{} must hold object uids", self.name));
        }
        None
    }

    fn clone_field(&self) -> Box<dyn Field> {
        Box::new(self.clone())
    }

    fn with_schemata(&self, schemata: &str) -> Box<dyn Field> {
        let mut copy = self.clone();
        copy.schemata = schemata.to_string();
        Box::new(copy)
    }
}
