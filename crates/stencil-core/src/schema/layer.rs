//! Layers: cross-cutting per-field and per-instance lifecycle concerns.
//!
//! A layer is a named resource a field (or a whole schema) needs set up when
//! a content instance comes to life and torn down when it goes away; a
//! storage backend is the canonical example. Layers are registered under a
//! name in a [`LayerContainer`]; the schema drives initialization and
//! cleanup across all of its fields in a defined order.

use std::sync::Arc;

use crate::error::Error;
use crate::schema::field::{ContentInstance, Field};

/// A named cross-cutting lifecycle concern.
///
/// Instance-level hooks run once per distinct registered layer regardless of
/// how many fields use it; field-level hooks run once per field. The
/// optional `container` is the instance's enclosing container, passed
/// explicitly by the caller.
pub trait Layer: Send + Sync {
    /// Instance-level setup. Runs once per distinct layer.
    fn initialize_instance(
        &self,
        _instance: &dyn ContentInstance,
        _container: Option<&dyn ContentInstance>,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Field-level setup. Runs for every field registering this layer.
    fn initialize_field(
        &self,
        _instance: &dyn ContentInstance,
        _field: &dyn Field,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Field-level teardown. Runs for every field registering this layer.
    fn cleanup_field(
        &self,
        _instance: &dyn ContentInstance,
        _field: &dyn Field,
    ) -> Result<(), Error> {
        Ok(())
    }

    /// Instance-level teardown. Runs once per distinct layer, after all
    /// field-level teardown.
    fn cleanup_instance(
        &self,
        _instance: &dyn ContentInstance,
        _container: Option<&dyn ContentInstance>,
    ) -> Result<(), Error> {
        Ok(())
    }
}

/// A registry of named layers.
pub trait LayerContainer {
    /// Register a layer under a name, replacing any layer already
    /// registered under that name (position preserved).
    fn register_layer(&mut self, name: &str, layer: Arc<dyn Layer>);

    /// All registered layers, in registration order.
    fn registered_layers(&self) -> &[(String, Arc<dyn Layer>)];

    /// Whether a layer is registered under the name.
    fn has_layer(&self, name: &str) -> bool {
        self.registered_layers().iter().any(|(n, _)| n == name)
    }
}

/// Default layer registry backed by an ordered list.
#[derive(Clone, Default)]
pub struct DefaultLayerContainer {
    layers: Vec<(String, Arc<dyn Layer>)>,
}

impl DefaultLayerContainer {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayerContainer for DefaultLayerContainer {
    fn register_layer(&mut self, name: &str, layer: Arc<dyn Layer>) {
        if let Some(slot) = self.layers.iter_mut().find(|(n, _)| n == name) {
            slot.1 = layer;
        } else {
            self.layers.push((name.to_string(), layer));
        }
    }

    fn registered_layers(&self) -> &[(String, Arc<dyn Layer>)] {
        &self.layers
    }
}

impl std::fmt::Debug for DefaultLayerContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.layers.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("DefaultLayerContainer")
            .field("layers", &names)
            .finish()
    }
}

/// Check whether a `(name, layer)` pair is already in a seen-list.
///
/// Layers may share a name while being different objects; identity is the
/// pair of name and Arc pointer.
pub(crate) fn layer_seen(
    seen: &[(String, Arc<dyn Layer>)],
    name: &str,
    layer: &Arc<dyn Layer>,
) -> bool {
    seen.iter()
        .any(|(n, l)| n == name && Arc::ptr_eq(l, layer))
}
