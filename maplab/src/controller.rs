//! Map tool controller: the single owner of the lab map's interaction state.
//!
//! Exactly one [`ToolMode`] is active at a time. Every mode switch runs the
//! same transition: unbind the click handler, hide the control panels, clear
//! every analysis artifact, drop the partial route, bind the new handler, show
//! the new panel, and toggle background feature popups (off while any tool is
//! active). Clicks are routed to the handler bound for the current mode.
//!
//! All renderer mutations happen synchronously inside one call, and a failed
//! operation reports its error before touching the map.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::{self, OverlayReport, RouteProgress, RouteRequest, RouteResult};
use crate::consts::{
    ANALYSIS_POINT_POPUP, BUFFER_COLOR, DEFAULT_BUFFER_RADIUS_M, END_POINT_POPUP, HIGHLIGHT_COLOR, HOME,
    HOME_LABEL, HOME_ZOOM, MARKER_PLACEHOLDER, RESULT_PLACEHOLDER, ROUTE_COLOR, START_POINT_POPUP,
};
use crate::data::{CollectionKind, Collections, LoadedCollection};
use crate::error::AnalysisError;
use crate::geo::{self, AnalysisPoint, FeatureCollection, LatLng};
use crate::geometry::GeometryEngine;
use crate::layers::{AnalysisLayerStore, ArtifactSlot};
use crate::render::{
    BaseLayer, ClickHandler, ControlPanel, Layer, LayerData, LayerId, LayerStyle, LayerTag, MapRenderer,
    OutputRegion, Popup, ResultSurface,
};

/// The active map tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    /// No tool; background popups are enabled.
    #[default]
    None,
    /// Buffer a clicked point and list intersecting features.
    OverlayAnalysis,
    /// Drop a pin and show its coordinates.
    Marker,
    /// Two clicks produce a simulated route.
    ShortestPath,
}

impl ToolMode {
    /// Parse a tool button id.
    #[must_use]
    pub fn from_button_id(id: &str) -> Option<Self> {
        match id {
            "none" => Some(Self::None),
            "overlay-analysis" => Some(Self::OverlayAnalysis),
            "marker-tool" => Some(Self::Marker),
            "shortest-path" => Some(Self::ShortestPath),
            _ => None,
        }
    }

    /// Click handler bound while this mode is active.
    #[must_use]
    pub fn click_handler(self) -> Option<ClickHandler> {
        match self {
            Self::None => None,
            Self::OverlayAnalysis => Some(ClickHandler::Overlay),
            Self::Marker => Some(ClickHandler::Marker),
            Self::ShortestPath => Some(ClickHandler::ShortestPath),
        }
    }

    /// Control panel shown while this mode is active.
    #[must_use]
    pub fn panel(self) -> Option<ControlPanel> {
        match self {
            Self::None => None,
            Self::OverlayAnalysis => Some(ControlPanel::Overlay),
            Self::Marker => Some(ControlPanel::Marker),
            Self::ShortestPath => Some(ControlPanel::ShortestPath),
        }
    }

    /// Whether this is an analysis mode (anything but `None`).
    #[must_use]
    pub fn is_analysis(self) -> bool {
        self != Self::None
    }
}

fn require_geometry<'a>(
    geometry: Option<&'a dyn GeometryEngine>,
    operation: &'static str,
) -> Result<&'a dyn GeometryEngine, AnalysisError> {
    geometry
        .filter(|g| g.available())
        .ok_or(AnalysisError::MissingCapability { operation })
}

fn background_layer(id: LayerId, kind: CollectionKind, collection: &FeatureCollection) -> Layer {
    Layer {
        id,
        tag: LayerTag::Background,
        data: LayerData::GeoJson { collection: collection.clone() },
        style: Some(kind.style()),
        popup: Popup::FeatureProperties,
    }
}

fn buffer_style() -> LayerStyle {
    LayerStyle {
        color: BUFFER_COLOR,
        weight: Some(2.0),
        opacity: Some(0.5),
        fill_color: Some(BUFFER_COLOR),
        fill_opacity: Some(0.2),
        point_radius: None,
    }
}

fn highlight_style() -> LayerStyle {
    LayerStyle {
        color: HIGHLIGHT_COLOR,
        weight: Some(5.0),
        opacity: Some(0.7),
        fill_color: Some(HIGHLIGHT_COLOR),
        fill_opacity: Some(0.4),
        point_radius: Some(6.0),
    }
}

fn route_style() -> LayerStyle {
    LayerStyle { color: ROUTE_COLOR, weight: Some(4.0), ..LayerStyle::default() }
}

/// Owns the lab map session: renderer, result surface, geometry engine,
/// loaded collections, analysis artifacts and the active tool.
pub struct MapToolController<R, S> {
    pub renderer: R,
    pub surface: S,
    geometry: Option<Box<dyn GeometryEngine>>,
    layers: AnalysisLayerStore,
    collections: Collections,
    mode: ToolMode,
    buffer_radius_m: u32,
    overlay_point: Option<AnalysisPoint>,
    marker_point: Option<AnalysisPoint>,
    route: RouteRequest,
    last_route: Option<RouteResult>,
    base_layer: Option<(BaseLayer, LayerId)>,
    home_marker: Option<LayerId>,
}

impl<R: MapRenderer, S: ResultSurface> MapToolController<R, S> {
    #[must_use]
    pub fn new(renderer: R, surface: S) -> Self {
        Self {
            renderer,
            surface,
            geometry: None,
            layers: AnalysisLayerStore::new(),
            collections: Collections::new(),
            mode: ToolMode::None,
            buffer_radius_m: DEFAULT_BUFFER_RADIUS_M,
            overlay_point: None,
            marker_point: None,
            route: RouteRequest::default(),
            last_route: None,
            base_layer: None,
            home_marker: None,
        }
    }

    /// Install the geometry engine.
    pub fn set_geometry_engine(&mut self, engine: Box<dyn GeometryEngine>) {
        self.geometry = Some(engine);
    }

    // --- Map bootstrap ---

    /// Center on the hometown, install the default basemap and the hometown marker.
    pub fn init_map(&mut self) {
        self.renderer.set_view(HOME, HOME_ZOOM);
        self.set_base_layer(BaseLayer::default());
        if self.home_marker.is_none() {
            let marker = Layer {
                id: Uuid::new_v4(),
                tag: LayerTag::Background,
                data: LayerData::Marker { position: HOME },
                style: None,
                popup: Popup::Open(HOME_LABEL.to_owned()),
            };
            self.renderer.add_layer(&marker);
            self.home_marker = Some(marker.id);
        }
        info!("map lab initialized");
    }

    /// Replace the active basemap.
    pub fn set_base_layer(&mut self, base: BaseLayer) {
        if let Some((_, id)) = self.base_layer.take() {
            self.renderer.remove_layer(id);
        }
        let layer = Layer {
            id: Uuid::new_v4(),
            tag: LayerTag::Base,
            data: base.layer_data(),
            style: None,
            popup: Popup::None,
        };
        self.renderer.add_layer(&layer);
        self.base_layer = Some((base, layer.id));
    }

    /// The active basemap.
    #[must_use]
    pub fn base_layer(&self) -> Option<BaseLayer> {
        self.base_layer.map(|(base, _)| base)
    }

    /// Add a loaded collection to the map, replacing a previous load of the same kind.
    pub fn load_collection(&mut self, kind: CollectionKind, collection: FeatureCollection) {
        if let Some(old) = self.collections.get(kind) {
            self.renderer.remove_layer(old.layer_id);
        }
        let layer = background_layer(Uuid::new_v4(), kind, &collection);
        self.renderer.add_layer(&layer);
        self.renderer.set_feature_popups(layer.id, !self.mode.is_analysis());
        if kind == CollectionKind::Boundary {
            self.renderer.fit_bounds(layer.id);
        }
        info!(collection = kind.name(), features = collection.features.len(), "collection loaded");
        self.collections.insert(kind, LoadedCollection { collection, layer_id: layer.id, visible: true });
    }

    /// Show or hide a loaded collection. Returns the new visibility, or
    /// `None` if the collection never loaded.
    pub fn toggle_overlay(&mut self, kind: CollectionKind) -> Option<bool> {
        let popups = !self.mode.is_analysis();
        let loaded = self.collections.get_mut(kind)?;
        if loaded.visible {
            self.renderer.remove_layer(loaded.layer_id);
        } else {
            let layer = background_layer(loaded.layer_id, kind, &loaded.collection);
            self.renderer.add_layer(&layer);
            self.renderer.set_feature_popups(layer.id, popups);
        }
        loaded.visible = !loaded.visible;
        Some(loaded.visible)
    }

    // --- Tool mode ---

    /// Switch the active tool.
    pub fn select_tool(&mut self, mode: ToolMode) {
        self.renderer.detach_click();
        for panel in ControlPanel::ALL {
            self.surface.set_panel_visible(panel, false);
        }
        self.reset_analysis();
        if let Some(handler) = mode.click_handler() {
            self.renderer.attach_click(handler);
        }
        if let Some(panel) = mode.panel() {
            self.surface.set_panel_visible(panel, true);
        }
        for id in self.collections.visible_layers() {
            self.renderer.set_feature_popups(id, !mode.is_analysis());
        }
        info!(from = ?self.mode, to = ?mode, "tool selected");
        self.mode = mode;
    }

    /// Clear every artifact and all in-progress inputs.
    fn reset_analysis(&mut self) {
        self.layers.clear_all(&mut self.renderer, &mut self.surface);
        self.route.reset();
        self.last_route = None;
        self.overlay_point = None;
        self.marker_point = None;
    }

    /// Route a map click to the handler bound for the current mode.
    pub fn on_map_click(&mut self, at: LatLng) {
        match self.mode.click_handler() {
            None => debug!(?at, "map click with no tool active"),
            Some(ClickHandler::Overlay) => self.overlay_click(at),
            Some(ClickHandler::Marker) => self.marker_click(at),
            Some(ClickHandler::ShortestPath) => self.shortest_path_click(at),
        }
    }

    fn report(&mut self, err: &AnalysisError) {
        warn!(code = err.error_code(), error = %err, mode = ?self.mode, "operation aborted");
        self.surface.write(OutputRegion::Result, &err.to_html());
    }

    // --- Overlay analysis ---

    fn overlay_click(&mut self, at: LatLng) {
        self.layers.clear_overlay_result(&mut self.renderer);
        self.surface.write(OutputRegion::Result, RESULT_PLACEHOLDER);
        self.layers.place(&mut self.renderer, ArtifactSlot::ClickMarker, &Layer::marker(at, ANALYSIS_POINT_POPUP));
        self.overlay_point = Some(AnalysisPoint::labeled(at, ANALYSIS_POINT_POPUP));
        debug!(?at, "overlay analysis point set");
    }

    /// Set the overlay buffer radius in meters.
    pub fn set_buffer_radius(&mut self, meters: u32) {
        self.buffer_radius_m = meters;
    }

    #[must_use]
    pub fn buffer_radius(&self) -> u32 {
        self.buffer_radius_m
    }

    /// Buffer the analysis point and highlight intersecting features.
    ///
    /// Replaces the previous buffer and highlights; on error the map is untouched.
    ///
    /// # Errors
    ///
    /// Returns the [`AnalysisError`] that was also written to the result panel.
    pub fn run_overlay_analysis(&mut self) -> Result<OverlayReport, AnalysisError> {
        let outcome = require_geometry(self.geometry.as_deref(), "perform analysis").and_then(|engine| {
            let point = self
                .overlay_point
                .as_ref()
                .ok_or(AnalysisError::MissingInput("Please click on the map to set an analysis point first."))?;
            analysis::run_overlay(engine, point, self.buffer_radius_m, &self.collections)
        });
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };

        self.layers.clear_overlay_result(&mut self.renderer);
        let buffer = Layer::analysis(
            LayerData::GeoJson { collection: geo::collection(vec![geo::feature(outcome.buffer, None)]) },
            Some(buffer_style()),
            Popup::None,
        );
        self.layers.place(&mut self.renderer, ArtifactSlot::Buffer, &buffer);
        for (_, hits) in outcome.highlights {
            let highlight =
                Layer::analysis(LayerData::GeoJson { collection: hits }, Some(highlight_style()), Popup::None);
            self.layers.add_highlight(&mut self.renderer, &highlight);
        }

        let report = outcome.report;
        self.surface.write(OutputRegion::Result, &report.to_html());
        info!(radius_m = report.radius_m, found = report.total_found(), "overlay analysis complete");
        Ok(report)
    }

    // --- Marker tool ---

    fn marker_click(&mut self, at: LatLng) {
        let popup = format!("<b>Marker Location</b><br>Lat: {:.6}<br>Lng: {:.6}", at.lat, at.lng);
        let results =
            format!("<p><strong>Marker Coordinates</strong></p><p>Lat: {:.6}</p><p>Lng: {:.6}</p>", at.lat, at.lng);
        self.layers.place(&mut self.renderer, ArtifactSlot::ClickMarker, &Layer::marker(at, popup));
        self.surface.write(OutputRegion::Marker, &results);
        self.marker_point = Some(AnalysisPoint::new(at));
    }

    /// Remove the marker-tool pin and restore the placeholder text.
    pub fn reset_marker_tool(&mut self) {
        if self.marker_point.take().is_some() {
            self.layers.remove(&mut self.renderer, ArtifactSlot::ClickMarker);
        }
        self.surface.write(OutputRegion::Marker, MARKER_PLACEHOLDER);
    }

    // --- Shortest path ---

    fn shortest_path_click(&mut self, at: LatLng) {
        if self.route.is_complete() {
            debug!("route complete; restarting from new start point");
            self.clear_path();
        }
        let point = match self.route.start {
            None => AnalysisPoint::labeled(at, START_POINT_POPUP),
            Some(_) => AnalysisPoint::labeled(at, END_POINT_POPUP),
        };
        match self.route.push(point) {
            RouteProgress::StartSet => {
                self.layers.place(
                    &mut self.renderer,
                    ArtifactSlot::StartWaypoint,
                    &Layer::marker(at, START_POINT_POPUP),
                );
                self.surface.write(OutputRegion::Result, "<p>Start point set. Now click for the End Point.</p>");
            }
            RouteProgress::EndSet => match self.route_outcome() {
                Ok(result) => {
                    self.layers.place(
                        &mut self.renderer,
                        ArtifactSlot::EndWaypoint,
                        &Layer::marker(at, END_POINT_POPUP),
                    );
                    self.render_route(result);
                }
                Err(err) => {
                    self.route.end = None;
                    self.report_route_error(&err);
                }
            },
        }
    }

    fn route_outcome(&self) -> Result<RouteResult, AnalysisError> {
        let engine = require_geometry(self.geometry.as_deref(), "calculate shortest path")?;
        analysis::simulate_route(engine, &self.route)
    }

    fn report_route_error(&mut self, err: &AnalysisError) {
        if matches!(err, AnalysisError::MissingCapability { .. }) {
            self.surface.write(OutputRegion::Distance, "Error");
        }
        self.report(err);
    }

    fn render_route(&mut self, result: RouteResult) {
        let line = Layer::analysis(
            LayerData::GeoJson { collection: geo::collection(vec![geo::feature(result.path.clone(), None)]) },
            Some(route_style()),
            Popup::None,
        );
        self.layers.place(&mut self.renderer, ArtifactSlot::RouteLine, &line);
        let distance = result.distance_text();
        self.surface.write(OutputRegion::Distance, &distance);
        self.surface.write(OutputRegion::Result, &format!("<p>Shortest path calculated: {distance}.</p>"));
        info!(distance_km = result.distance_km, "route computed");
        self.last_route = Some(result);
    }

    /// Recompute the route from the current start and end points, replacing
    /// the rendered line.
    ///
    /// # Errors
    ///
    /// Returns the [`AnalysisError`] that was also written to the result panel.
    pub fn compute_route(&mut self) -> Result<RouteResult, AnalysisError> {
        match self.route_outcome() {
            Ok(result) => {
                self.render_route(result.clone());
                Ok(result)
            }
            Err(err) => {
                self.report_route_error(&err);
                Err(err)
            }
        }
    }

    /// Clear the route and every other analysis artifact.
    pub fn clear_path(&mut self) {
        self.reset_analysis();
    }

    /// The current route as a GeoJSON feature string.
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::MissingInput`] when no route has been computed.
    /// - [`AnalysisError::Export`] when serialization fails.
    pub fn export_path(&mut self) -> Result<String, AnalysisError> {
        let exported = self
            .last_route
            .as_ref()
            .ok_or(AnalysisError::MissingInput("No path to export. Set a start and an end point first."))
            .and_then(|route| {
                serde_json::to_string(&route.to_feature()).map_err(|e| AnalysisError::Export(e.to_string()))
            });
        match exported {
            Ok(json) => {
                self.surface.write(OutputRegion::Result, "<p class=\"info-message\">Path exported as GeoJSON.</p>");
                Ok(json)
            }
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    #[must_use]
    pub fn layers(&self) -> &AnalysisLayerStore {
        &self.layers
    }

    #[must_use]
    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    #[must_use]
    pub fn route(&self) -> &RouteRequest {
        &self.route
    }

    #[must_use]
    pub fn last_route(&self) -> Option<&RouteResult> {
        self.last_route.as_ref()
    }

    #[must_use]
    pub fn overlay_point(&self) -> Option<&AnalysisPoint> {
        self.overlay_point.as_ref()
    }

    #[must_use]
    pub fn marker_point(&self) -> Option<&AnalysisPoint> {
        self.marker_point.as_ref()
    }
}
