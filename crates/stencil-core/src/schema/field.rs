//! Field capability contract.
//!
//! The composition engine does not implement fields; it composes them. A
//! field owns its own accessor/mutator wiring, default-value logic and
//! validation, and exposes the flags the engine needs to enforce schema
//! invariants. Concrete field implementations live in [`crate::schema::fields`].

use stencil_model::Value;

use crate::error::Error;
use crate::schema::layer::LayerContainer;

/// The access mode a permission or visibility check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read access (rendering a view).
    View,
    /// Write access (rendering or submitting an edit form).
    Edit,
}

/// Type tag of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Single-line string.
    String,
    /// Multi-line text.
    Text,
    /// 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Boolean flag.
    Boolean,
    /// Timestamp.
    DateTime,
    /// List of strings.
    Lines,
    /// Relationship to other content objects. Fields of this kind must
    /// declare a non-empty relationship qualifier.
    Reference,
}

impl FieldKind {
    /// Stable textual tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::DateTime => "datetime",
            FieldKind::Lines => "lines",
            FieldKind::Reference => "reference",
        }
    }
}

/// A content instance a schema operates on.
///
/// Implementations are internally synchronized: mutation goes through
/// `&self`, which lets schemas drive instances shared behind `Arc`.
pub trait ContentInstance {
    /// Read the stored value for a field, if any.
    fn get(&self, field: &str) -> Option<Value>;

    /// Store a value for a field.
    fn set(&self, field: &str, value: Value) -> Result<(), Error>;

    /// Permission check for the given access mode on a field.
    fn allowed(&self, mode: AccessMode, field: &str) -> bool;
}

/// The field capability consumed by the composition engine.
pub trait Field: Send + Sync {
    /// Field name, unique within a schema.
    fn name(&self) -> &str;

    /// Type tag.
    fn kind(&self) -> FieldKind;

    /// Name of the schemata group this field belongs to.
    fn schemata(&self) -> &str {
        "default"
    }

    /// Opaque presentation hint for the form layer.
    fn widget(&self) -> &str {
        self.kind().as_str()
    }

    /// Whether this is the schema's primary field. At most one field per
    /// schema may answer true.
    fn is_primary(&self) -> bool {
        false
    }

    /// Whether this field participates in full-text search.
    fn is_searchable(&self) -> bool {
        false
    }

    /// Whether this field holds metadata rather than document data.
    fn is_metadata(&self) -> bool {
        false
    }

    /// Relationship qualifier. Required (and non-empty) for fields of kind
    /// [`FieldKind::Reference`].
    fn relationship(&self) -> Option<&str> {
        None
    }

    /// Produce the default value for an instance, if the field has one.
    fn default_value(&self, _instance: &dyn ContentInstance) -> Option<Value> {
        None
    }

    /// Read the current value from an instance.
    fn read(&self, instance: &dyn ContentInstance) -> Option<Value>;

    /// Write a value to an instance.
    fn write(&self, instance: &dyn ContentInstance, value: Value) -> Result<(), Error>;

    /// Whether the field can currently be written on the instance.
    fn writeable(&self, instance: &dyn ContentInstance) -> bool;

    /// Whether the field is visible in the given mode. Defaults to visible;
    /// fields backed by hidden widgets override this.
    fn visible(&self, _mode: AccessMode) -> bool {
        true
    }

    /// Permission check against the owning instance.
    fn check_permission(&self, mode: AccessMode, instance: &dyn ContentInstance) -> bool;

    /// Validate a candidate value. Returns a human-readable message on
    /// failure, `None` when the value is acceptable.
    fn validate(&self, value: &Value, instance: &dyn ContentInstance) -> Option<String>;

    /// Optional layer-container capability.
    fn as_layer_container(&self) -> Option<&dyn LayerContainer> {
        None
    }

    /// Deep-clone this field.
    fn clone_field(&self) -> Box<dyn Field>;

    /// Clone this field into a different schemata group.
    fn with_schemata(&self, schemata: &str) -> Box<dyn Field>;
}

impl Clone for Box<dyn Field> {
    fn clone(&self) -> Self {
        self.clone_field()
    }
}

impl std::fmt::Debug for Box<dyn Field> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name())
            .field("kind", &self.kind().as_str())
            .field("schemata", &self.schemata())
            .finish()
    }
}

/// An exact attribute match used by field filtering.
///
/// A field that does not carry the named attribute (a missing relationship,
/// for example) is excluded rather than treated as unequal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAttr<'a> {
    /// Match on the type tag.
    Kind(FieldKind),
    /// Match on the schemata group name.
    Schemata(&'a str),
    /// Match on the widget hint.
    Widget(&'a str),
    /// Match on the primary flag.
    Primary(bool),
    /// Match on the searchable flag.
    Searchable(bool),
    /// Match on the metadata flag.
    Metadata(bool),
    /// Match on the relationship qualifier; fields without one never match.
    Relationship(&'a str),
}

impl FieldAttr<'_> {
    /// Check the attribute against a field.
    pub fn matches(&self, field: &dyn Field) -> bool {
        match self {
            FieldAttr::Kind(kind) => field.kind() == *kind,
            FieldAttr::Schemata(name) => field.schemata() == *name,
            FieldAttr::Widget(widget) => field.widget() == *widget,
            FieldAttr::Primary(flag) => field.is_primary() == *flag,
            FieldAttr::Searchable(flag) => field.is_searchable() == *flag,
            FieldAttr::Metadata(flag) => field.is_metadata() == *flag,
            FieldAttr::Relationship(rel) => field.relationship() == Some(*rel),
        }
    }
}
