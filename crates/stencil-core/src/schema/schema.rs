//! Schema: field composition plus properties, layers and cross-field
//! operations.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tracing::debug;

use stencil_model::Value;

use crate::error::{Error, SchemaError};
use crate::schema::field::{ContentInstance, Field, FieldAttr, FieldKind};
use crate::schema::layer::{layer_seen, DefaultLayerContainer, Layer, LayerContainer};
use crate::schema::schemata::Schemata;

/// Submitted form input fed to validation.
///
/// A field may be absent (not submitted), present with a value, or present
/// as the empty marker (submitted blank by a widget that distinguishes
/// "blank" from "unchanged"). Validation prefers a submitted value and falls
/// back to the field's accessor for the other two cases.
#[derive(Debug, Default, Clone)]
pub struct FormInput {
    fieldset: Option<String>,
    values: HashMap<String, FormValue>,
}

/// A single submitted form value.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    /// The widget's empty marker: submitted, but carrying nothing.
    Empty,
    /// A submitted value.
    Set(Value),
}

impl FormInput {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict validation to one named schemata (a form tab).
    pub fn with_fieldset(mut self, fieldset: impl Into<String>) -> Self {
        self.fieldset = Some(fieldset.into());
        self
    }

    /// Record a submitted value.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values
            .insert(field.into(), FormValue::Set(value.into()));
        self
    }

    /// Record the empty marker for a field.
    pub fn set_empty(mut self, field: impl Into<String>) -> Self {
        self.values.insert(field.into(), FormValue::Empty);
        self
    }

    /// The named fieldset, if any.
    pub fn fieldset(&self) -> Option<&str> {
        self.fieldset.as_deref()
    }

    /// The submitted entry for a field.
    pub fn get(&self, field: &str) -> Option<&FormValue> {
        self.values.get(field)
    }
}

/// Which field partitions to validate when no fieldset is named.
#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    /// Validate document-data fields.
    pub data: bool,
    /// Validate metadata fields.
    pub metadata: bool,
}

impl ValidateOptions {
    /// Data fields only.
    pub fn data() -> Self {
        Self {
            data: true,
            metadata: false,
        }
    }

    /// Metadata fields only.
    pub fn metadata() -> Self {
        Self {
            data: false,
            metadata: true,
        }
    }

    /// Both partitions.
    pub fn all() -> Self {
        Self {
            data: true,
            metadata: true,
        }
    }
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self::data()
    }
}

/// Collected per-field validation failures, keyed by field name.
///
/// Never raised: the absence of an entry means the field validated. The
/// form layer renders this map back to the user.
#[derive(Debug, Default, Clone, serde::Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(HashMap<String, String>);

impl ValidationErrors {
    /// Create an empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether validation passed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The failure message for a field, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Record a failure.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    /// Iterate over `(field, message)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render as a JSON object for the form layer.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

/// An ordered composition of fields plus free-form properties and a layer
/// registry, describing a content type's data shape.
#[derive(Clone)]
pub struct Schema {
    container: Schemata,
    properties: HashMap<String, Value>,
    layers: DefaultLayerContainer,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self {
            container: Schemata::new("default"),
            properties: HashMap::new(),
            layers: DefaultLayerContainer::new(),
        }
    }

    /// Create a schema from an initial field list.
    pub fn with_fields(fields: Vec<Box<dyn Field>>) -> Result<Self, SchemaError> {
        let mut schema = Self::new();
        for field in fields {
            schema.add_field(field)?;
        }
        Ok(schema)
    }

    /// Set a property (builder form).
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Set a property.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Get a property.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// All properties.
    pub fn properties(&self) -> &HashMap<String, Value> {
        &self.properties
    }

    /// Concatenate: a new schema with self's fields in order followed by
    /// other's, and other's properties and layers overlaid onto self's on
    /// key collision. Non-destructive; fails when the combination violates
    /// a structural invariant.
    pub fn concat(&self, other: &Schema) -> Result<Schema, SchemaError> {
        let mut combined = Schema::new();
        for field in self.fields() {
            combined.add_field(field.clone_field())?;
        }
        for field in other.fields() {
            combined.add_field(field.clone_field())?;
        }
        combined.properties = self.properties.clone();
        combined
            .properties
            .extend(other.properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        for (name, layer) in self.layers.registered_layers() {
            combined.layers.register_layer(name, layer.clone());
        }
        for (name, layer) in other.layers.registered_layers() {
            combined.layers.register_layer(name, layer.clone());
        }
        Ok(combined)
    }

    /// Deep copy: every field independently cloned, properties and layer
    /// registrations carried over.
    pub fn copy(&self) -> Schema {
        self.clone()
    }

    /// Whether a field of this name may be edited through this schema.
    pub fn allow(&self, name: &str) -> bool {
        self.has_field(name)
    }

    /// Guarded single-field setter.
    pub fn edit(
        &self,
        instance: &dyn ContentInstance,
        name: &str,
        value: Value,
    ) -> Result<(), Error> {
        let field = self.field(name).ok_or_else(|| SchemaError::UnknownField {
            field: name.to_string(),
        })?;
        field.write(instance, value)
    }

    /// Schemata group names in order of first appearance.
    pub fn schemata_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for field in self.fields() {
            if !names.iter().any(|n| n == field.schemata()) {
                names.push(field.schemata().to_string());
            }
        }
        names
    }

    /// Fields belonging to the named schemata group, in order.
    pub fn schemata_fields(&self, name: &str) -> Vec<&dyn Field> {
        self.fields()
            .into_iter()
            .filter(|f| f.schemata() == name)
            .collect()
    }

    /// Split into per-schemata containers in first-appearance order.
    pub fn grouped_schematas(&self) -> Result<Vec<Schemata>, SchemaError> {
        let mut groups = Vec::new();
        for name in self.schemata_names() {
            let mut group = Schemata::new(name.clone());
            for field in self.schemata_fields(&name) {
                group.add_field(field.clone_field())?;
            }
            groups.push(group);
        }
        Ok(groups)
    }

    /// Move a field into another schemata group. The field is re-appended
    /// at the end of the order, matching remove-then-add semantics.
    pub fn change_schemata_for_field(
        &mut self,
        name: &str,
        schemata: &str,
    ) -> Result<(), SchemaError> {
        let field = self.container.del_field(name)?;
        self.container.add_field(field.with_schemata(schemata))
    }

    /// Validate the state of an instance.
    ///
    /// When the form names a fieldset, exactly that schemata's fields are
    /// validated; otherwise the data/metadata partitions selected by
    /// `options`. For each field, a submitted form value wins over the
    /// accessor value; the widget's empty marker and unsubmitted fields
    /// fall back to the accessor; a field with no obtainable value is
    /// skipped silently. Failures collect into the returned map.
    pub fn validate(
        &self,
        instance: &dyn ContentInstance,
        form: Option<&FormInput>,
        options: ValidateOptions,
    ) -> ValidationErrors {
        let selected: Vec<&dyn Field> = if let Some(fieldset) = form.and_then(FormInput::fieldset)
        {
            self.schemata_fields(fieldset)
        } else {
            let mut fields = Vec::new();
            if options.data {
                fields.extend(self.filter_fields(&[FieldAttr::Metadata(false)], &[]));
            }
            if options.metadata {
                fields.extend(self.filter_fields(&[FieldAttr::Metadata(true)], &[]));
            }
            fields
        };

        let mut errors = ValidationErrors::new();
        for field in selected {
            let value = match form.and_then(|f| f.get(field.name())) {
                Some(FormValue::Set(value)) => Some(value.clone()),
                Some(FormValue::Empty) | None => field.read(instance),
            };
            let Some(value) = value else {
                // No submitted value and no stored value: nothing to check.
                continue;
            };
            if let Some(message) = field.validate(&value, instance) {
                errors.insert(field.name(), message);
            }
        }
        errors
    }

    /// Best-effort bulk setter.
    ///
    /// Every entry whose name matches a field writeable on the instance is
    /// written through that field's mutator. Unknown names and non-writeable
    /// fields are silently ignored; an individual mutator error skips that
    /// entry without rolling back earlier writes.
    pub fn update_all(
        &self,
        instance: &dyn ContentInstance,
        values: impl IntoIterator<Item = (String, Value)>,
    ) {
        for (name, value) in values {
            let Some(field) = self.field(&name) else {
                continue;
            };
            if !field.writeable(instance) {
                continue;
            }
            if let Err(error) = field.write(instance, value) {
                debug!(field = %name, %error, "bulk update skipped field");
            }
        }
    }

    /// Write every field's default through its mutator.
    ///
    /// Only for instance initialization. Fields named `id` and reference
    /// fields keep their values; non-writeable fields are skipped.
    pub fn set_defaults(&self, instance: &dyn ContentInstance) {
        for field in self.fields() {
            if field.name().eq_ignore_ascii_case("id") {
                continue;
            }
            if field.kind() == FieldKind::Reference {
                continue;
            }
            if !field.writeable(instance) {
                continue;
            }
            let Some(default) = field.default_value(instance) else {
                continue;
            };
            if let Err(error) = field.write(instance, default) {
                debug!(field = %field.name(), %error, "default not applied");
            }
        }
    }

    /// Stable structural fingerprint, used to detect schema drift.
    pub fn signature(&self) -> String {
        blake3::hash(self.to_string().as_bytes())
            .to_hex()
            .to_string()
    }

    /// Two-phase layer activation across all fields.
    ///
    /// For every field acting as a layer container, each distinct
    /// `(name, layer)` pair gets instance-level initialization exactly once,
    /// at first encounter, then field-level initialization for the field at
    /// hand. Schema-level layers not already initialized follow.
    pub fn initialize_layers(
        &self,
        instance: &dyn ContentInstance,
        container: Option<&dyn ContentInstance>,
    ) -> Result<(), Error> {
        let mut initialized: Vec<(String, Arc<dyn Layer>)> = Vec::new();

        for field in self.fields() {
            if let Some(registry) = field.as_layer_container() {
                for (name, layer) in registry.registered_layers() {
                    if !layer_seen(&initialized, name, layer) {
                        layer.initialize_instance(instance, container)?;
                        // Layers may share a name but be different objects;
                        // each object still needs its own initialization.
                        initialized.push((name.clone(), layer.clone()));
                    }
                    layer.initialize_field(instance, field)?;
                }
            }
        }

        for (name, layer) in self.layers.registered_layers() {
            if !layer_seen(&initialized, name, layer) {
                layer.initialize_instance(instance, container)?;
                initialized.push((name.clone(), layer.clone()));
            }
        }
        Ok(())
    }

    /// Mirror of [`Schema::initialize_layers`], deliberately asymmetric:
    /// field-level cleanup runs first for every field, instance-level
    /// cleanup once per distinct pair afterwards, so a layer releases a
    /// shared resource exactly once.
    pub fn cleanup_layers(
        &self,
        instance: &dyn ContentInstance,
        container: Option<&dyn ContentInstance>,
    ) -> Result<(), Error> {
        let mut queued: Vec<(String, Arc<dyn Layer>)> = Vec::new();

        for field in self.fields() {
            if let Some(registry) = field.as_layer_container() {
                for (name, layer) in registry.registered_layers() {
                    if !layer_seen(&queued, name, layer) {
                        queued.push((name.clone(), layer.clone()));
                    }
                    layer.cleanup_field(instance, field)?;
                }
            }
        }

        for (_, layer) in &queued {
            layer.cleanup_instance(instance, container)?;
        }

        for (name, layer) in self.layers.registered_layers() {
            if !layer_seen(&queued, name, layer) {
                layer.cleanup_instance(instance, container)?;
                queued.push((name.clone(), layer.clone()));
            }
        }
        Ok(())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Schema {
    type Target = Schemata;

    fn deref(&self) -> &Schemata {
        &self.container
    }
}

impl DerefMut for Schema {
    fn deref_mut(&mut self) -> &mut Schemata {
        &mut self.container
    }
}

impl LayerContainer for Schema {
    fn register_layer(&mut self, name: &str, layer: Arc<dyn Layer>) {
        self.layers.register_layer(name, layer);
    }

    fn registered_layers(&self) -> &[(String, Arc<dyn Layer>)] {
        self.layers.registered_layers()
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Schema {{")?;
        for field in self.fields() {
            write!(
                f,
                "{}:{}:{}:{}:{}{}{},",
                field.name(),
                field.kind().as_str(),
                field.schemata(),
                field.widget(),
                if field.is_primary() { 'p' } else { '-' },
                if field.is_searchable() { 's' } else { '-' },
                if field.is_metadata() { 'm' } else { '-' },
            )?;
        }
        write!(f, "}}")
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.field_names())
            .field("properties", &self.properties.keys())
            .finish()
    }
}
