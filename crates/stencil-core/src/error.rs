//! Core error types.

use stencil_model::Uid;
use thiserror::Error;

/// Structural schema-configuration errors.
///
/// These are developer errors surfaced at type-definition time. They are
/// returned immediately and are not recoverable at runtime.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A second primary field was added under a different name.
    #[error("cannot add '{field}' as primary field: '{existing}' is already the primary field")]
    DuplicatePrimary {
        /// Name of the field being added.
        field: String,
        /// Name of the existing primary field.
        existing: String,
    },

    /// A reference-kind field without a usable relationship qualifier.
    #[error(
        "unqualified relationship in field '{field}': the relationship qualifier must be a non-empty string"
    )]
    UnqualifiedRelationship {
        /// Name of the offending field.
        field: String,
    },

    /// A named field does not exist in the schema.
    #[error("schema has no field '{field}'")]
    UnknownField {
        /// The missing field name.
        field: String,
    },

    /// A schemata with this name already exists.
    #[error("schemata '{name}' already exists")]
    SchemataExists {
        /// The duplicate schemata name.
        name: String,
    },

    /// A named schemata does not exist in the schema.
    #[error("schema has no schemata '{name}'")]
    UnknownSchemata {
        /// The missing schemata name.
        name: String,
    },
}

/// Errors raised by the UID and reference catalog.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// The object does not expose the identity capability.
    #[error("object at '{path}' is not referenceable")]
    NotReferenceable {
        /// Path of the offending object.
        path: String,
    },

    /// A UID did not resolve to a live object.
    #[error("no object found for uid {uid}")]
    ObjectNotFound {
        /// The unresolvable UID.
        uid: Uid,
    },

    /// A policy hook vetoed the operation.
    #[error("reference rejected: {reason}")]
    ReferenceRejected {
        /// Why the hook vetoed.
        reason: String,
    },

    /// A reference record names a policy that is not registered.
    #[error("unknown reference policy '{name}'")]
    UnknownPolicy {
        /// The unregistered policy name.
        name: String,
    },
}

/// Top-level core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Schema-configuration error.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Reference/UID catalog error.
    #[error("reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}
