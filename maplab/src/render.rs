//! Renderer and result-surface seams.
//!
//! The controller never touches the map library directly. It builds [`Layer`]
//! values and issues commands through [`MapRenderer`]; result text goes through
//! [`ResultSurface`]. The browser implementation lives in [`crate::bridge`];
//! tests use a recording fake.

use serde::Serialize;
use uuid::Uuid;

use crate::consts::MAX_ZOOM;
use crate::geo::{FeatureCollection, LatLng};

/// Unique identifier for a rendered layer.
pub type LayerId = Uuid;

/// Ownership tag set on every layer at creation time.
///
/// Cleanup relies on owned ids; the tag lets a renderer scan for analysis
/// layers the store lost track of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerTag {
    /// Tile basemap.
    Base,
    /// Loaded data collection or the hometown marker.
    Background,
    /// Created by an analysis tool; removed by `clear_all`.
    Analysis,
}

/// Stroke / fill styling for vector layers.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LayerStyle {
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
    /// Point features are drawn as circle markers of this radius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_radius: Option<f64>,
}

/// What a layer draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerData {
    Tiles { url: &'static str, attribution: &'static str, max_zoom: u8 },
    Marker { position: LatLng },
    GeoJson { collection: FeatureCollection },
}

/// Popup attached to a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "html", rename_all = "snake_case")]
pub enum Popup {
    None,
    /// Fixed HTML, opened immediately.
    Open(String),
    /// One popup per feature, built from its properties.
    FeatureProperties,
}

/// A layer as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub id: LayerId,
    pub tag: LayerTag,
    pub data: LayerData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<LayerStyle>,
    pub popup: Popup,
}

impl Layer {
    /// A new analysis-owned layer with a fresh id.
    #[must_use]
    pub fn analysis(data: LayerData, style: Option<LayerStyle>, popup: Popup) -> Self {
        Self { id: Uuid::new_v4(), tag: LayerTag::Analysis, data, style, popup }
    }

    /// An analysis-owned marker with an open popup.
    #[must_use]
    pub fn marker(position: LatLng, popup: impl Into<String>) -> Self {
        Self::analysis(LayerData::Marker { position }, None, Popup::Open(popup.into()))
    }
}

/// Which click handler is bound to the map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickHandler {
    Overlay,
    Marker,
    ShortestPath,
}

/// Tool-specific control panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlPanel {
    Overlay,
    Marker,
    ShortestPath,
}

impl ControlPanel {
    pub const ALL: [Self; 3] = [Self::Overlay, Self::Marker, Self::ShortestPath];

    #[must_use]
    pub fn dom_id(self) -> &'static str {
        match self {
            Self::Overlay => "overlay-controls",
            Self::Marker => "marker-controls",
            Self::ShortestPath => "shortest-path-controls",
        }
    }
}

/// Result text regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputRegion {
    /// Overlay and route results, and all error messages.
    Result,
    /// Route distance readout.
    Distance,
    /// Marker tool coordinates.
    Marker,
}

impl OutputRegion {
    #[must_use]
    pub fn dom_id(self) -> &'static str {
        match self {
            Self::Result => "result-content",
            Self::Distance => "distance-value",
            Self::Marker => "marker-results",
        }
    }
}

/// Tile basemaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseLayer {
    #[default]
    OpenStreetMap,
    EsriImagery,
    CartoLight,
}

impl BaseLayer {
    pub const ALL: [Self; 3] = [Self::OpenStreetMap, Self::EsriImagery, Self::CartoLight];

    /// Parse the `data-layer` key used by the layer panel.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "osm" => Some(Self::OpenStreetMap),
            "esri" => Some(Self::EsriImagery),
            "carto" => Some(Self::CartoLight),
            _ => None,
        }
    }

    #[must_use]
    pub fn url(self) -> &'static str {
        match self {
            Self::OpenStreetMap => "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            Self::EsriImagery => {
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
            }
            Self::CartoLight => "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
        }
    }

    #[must_use]
    pub fn attribution(self) -> &'static str {
        match self {
            Self::OpenStreetMap => "© OpenStreetMap contributors",
            Self::EsriImagery => "Tiles © Esri & contributors",
            Self::CartoLight => "© CartoDB",
        }
    }

    #[must_use]
    pub fn layer_data(self) -> LayerData {
        LayerData::Tiles { url: self.url(), attribution: self.attribution(), max_zoom: MAX_ZOOM }
    }
}

/// Commands the controller issues to the map library.
pub trait MapRenderer {
    /// Add a layer to the map.
    fn add_layer(&mut self, layer: &Layer);

    /// Remove a layer. Unknown ids are ignored.
    fn remove_layer(&mut self, id: LayerId);

    /// Ids of every rendered layer carrying `tag`.
    fn tagged_layers(&self, tag: LayerTag) -> Vec<LayerId>;

    /// Bind a click handler to the map surface.
    fn attach_click(&mut self, handler: ClickHandler);

    /// Unbind any click handler from the map surface.
    fn detach_click(&mut self);

    /// Bind or unbind the per-feature popups of a background layer.
    fn set_feature_popups(&mut self, id: LayerId, enabled: bool);

    /// Center the view.
    fn set_view(&mut self, center: LatLng, zoom: u8);

    /// Fit the view to a layer's bounds.
    fn fit_bounds(&mut self, id: LayerId);
}

/// Output regions and control panels outside the map.
pub trait ResultSurface {
    /// Replace the contents of an output region.
    fn write(&mut self, region: OutputRegion, html: &str);

    /// Show or hide a tool control panel.
    fn set_panel_visible(&mut self, panel: ControlPanel, visible: bool);
}
