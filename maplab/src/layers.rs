//! Analysis layer store: owned references to every analysis artifact on the map.
//!
//! Each artifact is created through the store, so the store always knows what
//! it has to remove. At most one layer occupies each [`ArtifactSlot`];
//! intersection highlights are an unbounded list. [`AnalysisLayerStore::clear_all`]
//! removes everything and resets the result panels.

#[cfg(test)]
#[path = "layers_test.rs"]
mod layers_test;

use tracing::{debug, warn};

use crate::consts::{DISTANCE_PLACEHOLDER, MARKER_PLACEHOLDER, RESULT_PLACEHOLDER};
use crate::render::{Layer, LayerId, LayerTag, MapRenderer, OutputRegion, ResultSurface};

/// Single-occupancy artifact positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactSlot {
    /// Overlay buffer polygon.
    Buffer,
    /// Overlay analysis point or marker-tool pin.
    ClickMarker,
    /// Simulated route line.
    RouteLine,
    /// Route start marker.
    StartWaypoint,
    /// Route end marker.
    EndWaypoint,
}

impl ArtifactSlot {
    pub const ALL: [Self; 5] = [Self::Buffer, Self::ClickMarker, Self::RouteLine, Self::StartWaypoint, Self::EndWaypoint];
}

/// Tracks the analysis artifacts currently rendered.
#[derive(Debug, Default)]
pub struct AnalysisLayerStore {
    buffer: Option<LayerId>,
    click_marker: Option<LayerId>,
    route_line: Option<LayerId>,
    start_waypoint: Option<LayerId>,
    end_waypoint: Option<LayerId>,
    highlights: Vec<LayerId>,
}

impl AnalysisLayerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, slot: ArtifactSlot) -> &mut Option<LayerId> {
        match slot {
            ArtifactSlot::Buffer => &mut self.buffer,
            ArtifactSlot::ClickMarker => &mut self.click_marker,
            ArtifactSlot::RouteLine => &mut self.route_line,
            ArtifactSlot::StartWaypoint => &mut self.start_waypoint,
            ArtifactSlot::EndWaypoint => &mut self.end_waypoint,
        }
    }

    /// The layer occupying a slot, if any.
    #[must_use]
    pub fn get(&self, slot: ArtifactSlot) -> Option<LayerId> {
        match slot {
            ArtifactSlot::Buffer => self.buffer,
            ArtifactSlot::ClickMarker => self.click_marker,
            ArtifactSlot::RouteLine => self.route_line,
            ArtifactSlot::StartWaypoint => self.start_waypoint,
            ArtifactSlot::EndWaypoint => self.end_waypoint,
        }
    }

    /// Highlight layers from the last overlay analysis.
    #[must_use]
    pub fn highlights(&self) -> &[LayerId] {
        &self.highlights
    }

    /// Render `layer` into `slot`, removing the slot's previous occupant first.
    pub fn place(&mut self, renderer: &mut impl MapRenderer, slot: ArtifactSlot, layer: &Layer) -> LayerId {
        self.remove(renderer, slot);
        renderer.add_layer(layer);
        *self.slot_mut(slot) = Some(layer.id);
        debug!(?slot, id = %layer.id, "analysis artifact placed");
        layer.id
    }

    /// Remove whatever occupies `slot`.
    pub fn remove(&mut self, renderer: &mut impl MapRenderer, slot: ArtifactSlot) {
        if let Some(id) = self.slot_mut(slot).take() {
            renderer.remove_layer(id);
        }
    }

    /// Render an intersection highlight layer.
    pub fn add_highlight(&mut self, renderer: &mut impl MapRenderer, layer: &Layer) -> LayerId {
        renderer.add_layer(layer);
        self.highlights.push(layer.id);
        layer.id
    }

    /// Remove every intersection highlight.
    pub fn clear_highlights(&mut self, renderer: &mut impl MapRenderer) {
        for id in self.highlights.drain(..) {
            renderer.remove_layer(id);
        }
    }

    /// Remove the overlay result (buffer and highlights), keeping the click marker.
    pub fn clear_overlay_result(&mut self, renderer: &mut impl MapRenderer) {
        self.remove(renderer, ArtifactSlot::Buffer);
        self.clear_highlights(renderer);
    }

    /// Number of tracked artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        ArtifactSlot::ALL.iter().filter(|s| self.get(**s).is_some()).count() + self.highlights.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every tracked artifact and reset the result panels.
    ///
    /// Idempotent. After the owned references are removed, any layer still
    /// tagged [`LayerTag::Analysis`] is removed as well.
    pub fn clear_all(&mut self, renderer: &mut impl MapRenderer, surface: &mut impl ResultSurface) {
        for slot in ArtifactSlot::ALL {
            self.remove(renderer, slot);
        }
        self.clear_highlights(renderer);

        for id in renderer.tagged_layers(LayerTag::Analysis) {
            warn!(%id, "untracked analysis layer removed");
            renderer.remove_layer(id);
        }

        surface.write(OutputRegion::Result, RESULT_PLACEHOLDER);
        surface.write(OutputRegion::Distance, DISTANCE_PLACEHOLDER);
        surface.write(OutputRegion::Marker, MARKER_PLACEHOLDER);
    }
}
