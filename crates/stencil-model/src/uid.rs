//! Stable, location-independent object identifiers.

use rkyv::{Archive, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Size of a UID in bytes.
pub const UID_SIZE: usize = 16;

/// A stable identifier assigned once per content object.
///
/// A UID identifies an object independently of its position in the content
/// tree: moves and renames change an object's path, never its UID. UIDs are
/// minted from random identity (UUID v4), not from content, so two distinct
/// objects can never be assigned colliding UIDs by construction. A UID is
/// never reused after its object is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Archive, Serialize, Deserialize)]
pub struct Uid([u8; UID_SIZE]);

/// Error returned when parsing a UID from a string fails.
#[derive(Debug, Error)]
#[error("invalid uid: {0}")]
pub struct ParseUidError(String);

impl Uid {
    /// Create a UID from raw bytes.
    pub fn from_bytes(bytes: [u8; UID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Mint a fresh UID.
    pub fn mint() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; UID_SIZE] {
        &self.0
    }

    /// Consume into raw bytes.
    pub fn into_bytes(self) -> [u8; UID_SIZE] {
        self.0
    }

    /// Decode a UID from a byte slice.
    ///
    /// Returns `None` unless the slice is exactly [`UID_SIZE`] bytes.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != UID_SIZE {
            return None;
        }
        let mut buf = [0u8; UID_SIZE];
        buf.copy_from_slice(bytes);
        Some(Self(buf))
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_bytes(self.0).hyphenated())
    }
}

impl FromStr for Uid {
    type Err = ParseUidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(*u.as_bytes()))
            .map_err(|_| ParseUidError(s.to_string()))
    }
}

impl From<[u8; UID_SIZE]> for Uid {
    fn from(bytes: [u8; UID_SIZE]) -> Self {
        Self(bytes)
    }
}

impl serde::Serialize for Uid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Uid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
