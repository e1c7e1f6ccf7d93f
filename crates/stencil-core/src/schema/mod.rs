//! Schema subsystem: typed, validated, ordered field composition.
//!
//! A content type declares a [`Schema`]: an ordered collection of fields
//! (grouped into named [`Schemata`]) plus free-form properties and a
//! registry of cross-cutting [`Layer`]s. The schema orchestrates validation,
//! bulk updates and layer lifecycle across its fields; each field owns its
//! own storage, defaults and validation logic behind the [`Field`] trait.

mod field;
mod fields;
mod layer;
mod managed;
#[allow(clippy::module_inception)]
mod schema;
mod schemata;

pub use field::{AccessMode, ContentInstance, Field, FieldAttr, FieldKind};
pub use fields::{ReferenceField, StringField};
pub use layer::{DefaultLayerContainer, Layer, LayerContainer};
pub use managed::{ManagedSchema, MoveDirection};
pub use schema::{FormInput, FormValue, Schema, ValidateOptions, ValidationErrors};
pub use schemata::Schemata;
