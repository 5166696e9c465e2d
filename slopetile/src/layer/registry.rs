//! Name → layer factory registry.

use super::{DirectImageLayer, ElevationSlopeLayer, Layer, LayerKind, MeshSlopeLayer};
use crate::config::SourceSettings;
use crate::provider::UrlTemplate;
use crate::tilespec::{self, LayerDescriptor, TilespecError, LAYER_DELIMITER, TOKEN_DELIMITER};
use std::collections::BTreeMap;

/// Builds a configured layer from a parsed descriptor.
pub type LayerFactory =
    Box<dyn Fn(&LayerDescriptor) -> Result<Box<dyn Layer>, TilespecError> + Send + Sync>;

struct Entry {
    kind: LayerKind,
    factory: LayerFactory,
}

/// Maps layer names to factories.
///
/// Built once at startup and shared read-only (e.g. behind an `Arc`).
#[derive(Default)]
pub struct LayerRegistry {
    entries: BTreeMap<String, Entry>,
}

impl LayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard layer catalogue over the configured sources.
    pub fn from_sources(sources: &SourceSettings) -> Self {
        let mut registry = Self::new();

        for (name, template) in [
            ("topo", &sources.topo),
            ("contour", &sources.contour),
            ("imagery", &sources.imagery),
        ] {
            registry.register_direct(name, LayerKind::DirectImage, UrlTemplate::new(template));
        }
        registry.register_direct(
            "slope",
            LayerKind::SlopeShading,
            UrlTemplate::new(&sources.slope),
        );

        let elevation = sources.elevation_template();
        let max_zoom = sources.elevation_max_zoom;
        registry.register("elevslope", LayerKind::ElevationRaster, move |descriptor| {
            let layer =
                ElevationSlopeLayer::from_descriptor(descriptor, elevation.clone(), max_zoom)?;
            Ok(Box::new(layer) as Box<dyn Layer>)
        });

        let mesh = UrlTemplate::new(&sources.mesh);
        registry.register("meshslope", LayerKind::QuantizedMeshSlope, move |descriptor| {
            let layer = MeshSlopeLayer::from_descriptor(descriptor, mesh.clone())?;
            Ok(Box::new(layer) as Box<dyn Layer>)
        });

        registry
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    ///
    /// Names must not contain the tilespec delimiters.
    pub fn register<F>(&mut self, name: &str, kind: LayerKind, factory: F)
    where
        F: Fn(&LayerDescriptor) -> Result<Box<dyn Layer>, TilespecError> + Send + Sync + 'static,
    {
        debug_assert!(
            !name.is_empty() && !name.contains([LAYER_DELIMITER, TOKEN_DELIMITER]),
            "layer name '{}' is not tilespec-safe",
            name
        );
        self.entries.insert(
            name.to_string(),
            Entry {
                kind,
                factory: Box::new(factory),
            },
        );
    }

    fn register_direct(&mut self, name: &str, kind: LayerKind, template: UrlTemplate) {
        self.register(name, kind, move |descriptor| {
            let layer = DirectImageLayer::from_descriptor(descriptor, kind, template.clone())?;
            Ok(Box::new(layer) as Box<dyn Layer>)
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<LayerKind> {
        self.entries.get(name).map(|entry| entry.kind)
    }

    /// Registered names with their kinds, sorted by name.
    pub fn layers(&self) -> impl Iterator<Item = (&str, LayerKind)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.kind))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds one layer.
    pub fn build(&self, descriptor: &LayerDescriptor) -> Result<Box<dyn Layer>, TilespecError> {
        let entry = self
            .entries
            .get(&descriptor.name)
            .ok_or_else(|| TilespecError::UnknownLayer {
                name: descriptor.name.clone(),
                segment: descriptor.segment.clone(),
            })?;
        (entry.factory)(descriptor)
    }

    /// Parses a tilespec and builds its layers, base layer first.
    pub fn parse(&self, tilespec: &str) -> Result<Vec<Box<dyn Layer>>, TilespecError> {
        tilespec::parse(tilespec)?
            .iter()
            .map(|descriptor| self.build(descriptor))
            .collect()
    }
}
