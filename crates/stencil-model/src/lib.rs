//! Stencil data-model types.
//!
//! This crate defines the logical data model shared by the Stencil schema
//! and reference subsystems, using rkyv for zero-copy serialization.
//!
//! # Modules
//!
//! - [`value`] - Runtime value types for field content and metadata
//! - [`uid`] - Stable, location-independent object identifiers
//!
//! # Serialization
//!
//! All types in this crate derive `rkyv::Archive`, `rkyv::Serialize`, and
//! `rkyv::Deserialize`. Use rkyv directly for serialization:
//!
//! ```ignore
//! use stencil_model::Value;
//!
//! // Serialize
//! let value = Value::String("hello".into());
//! let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&value).unwrap();
//!
//! // Deserialize
//! let archived = rkyv::access::<ArchivedValue, rkyv::rancor::Error>(&bytes).unwrap();
//! let deserialized: Value = rkyv::deserialize::<Value, rkyv::rancor::Error>(archived).unwrap();
//! ```

pub mod uid;
pub mod value;

pub use uid::{ParseUidError, Uid};
pub use value::Value;
