//! Stencil Core - content schema composition and the UID/reference catalog.
//!
//! This crate provides the two core subsystems of Stencil: declarative
//! content-type schemas (ordered, typed, validated field composition with
//! cross-cutting layers) and a reference catalog maintaining bidirectional,
//! queryable relationships between content objects under stable UIDs,
//! independent of their location in a mutable object tree.

pub mod config;
pub mod error;
pub mod reference;
pub mod schema;
pub mod testing;
pub mod tree;

pub use config::CatalogConfig;
pub use error::{Error, ReferenceError, SchemaError};
pub use reference::{
    BasicReference, CascadeScope, ContentReference, Endpoint, PolicyContext, PolicyRegistry,
    RebuildStats, RefQuery, Reference, ReferenceCatalog, ReferenceIndex, ReferencePolicy,
    UidCatalog, BASIC_POLICY, CONTENT_POLICY,
};
pub use schema::{
    AccessMode, ContentInstance, DefaultLayerContainer, Field, FieldAttr, FieldKind, FormInput,
    FormValue, Layer, LayerContainer, ManagedSchema, MoveDirection, ReferenceField, Schema,
    Schemata, StringField, ValidateOptions, ValidationErrors,
};
pub use tree::{ContentObject, ContentTree, LifecycleObserver};

/// Re-export the shared data-model types.
pub use stencil_model as model;
