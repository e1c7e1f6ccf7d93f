//! Reference query builder.

use stencil_model::Uid;

use crate::reference::record::Reference;

/// A point/range query over the reference index.
///
/// Any subset of the four dimensions may be constrained; an unconstrained
/// dimension matches everything. An entirely unconstrained query returns
/// every record.
#[derive(Debug, Clone, Default)]
pub struct RefQuery {
    pub(crate) source: Option<Uid>,
    pub(crate) target: Option<Uid>,
    pub(crate) relationship: Option<String>,
    pub(crate) target_id: Option<String>,
}

impl RefQuery {
    /// Create an unconstrained query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain to references from this source.
    pub fn source(mut self, uid: Uid) -> Self {
        self.source = Some(uid);
        self
    }

    /// Constrain to references to this target.
    pub fn target(mut self, uid: Uid) -> Self {
        self.target = Some(uid);
        self
    }

    /// Constrain to this relationship label.
    pub fn relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    /// Constrain to targets with this local id.
    pub fn target_id(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    /// Whether no dimension is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.source.is_none()
            && self.target.is_none()
            && self.relationship.is_none()
            && self.target_id.is_none()
    }

    /// Check a record against every constrained dimension.
    pub(crate) fn matches(&self, record: &Reference) -> bool {
        if let Some(source) = self.source {
            if record.source != source {
                return false;
            }
        }
        if let Some(target) = self.target {
            if record.target != target {
                return false;
            }
        }
        if let Some(relationship) = &self.relationship {
            if record.relationship.as_deref() != Some(relationship.as_str()) {
                return false;
            }
        }
        if let Some(target_id) = &self.target_id {
            if record.target_id != *target_id {
                return false;
            }
        }
        true
    }
}
