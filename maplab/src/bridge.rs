//! Browser bindings: the [`MapLab`] handle exported to JavaScript, a
//! [`MapRenderer`] / [`ResultSurface`] pair backed by the page's Leaflet host
//! object, and a [`GeometryEngine`] backed by the global `turf` namespace.
//!
//! Layers cross the boundary as JSON strings. The host keys Leaflet layers by
//! the id string it receives in `addLayer`.
//!
//! `tracing` events reach the browser console through its `log` bridge and
//! `console_log`; panics are routed there by `console_error_panic_hook`.

#[cfg(test)]
#[path = "bridge_test.rs"]
mod bridge_test;

use serde::Serialize;
use tracing::{error, warn};
use wasm_bindgen::prelude::*;

use crate::controller::{MapToolController, ToolMode};
use crate::data::{CollectionKind, popup_content};
use crate::error::AnalysisError;
use crate::geo::{self, Feature, Geometry, GeometryValue, LatLng};
use crate::geometry::GeometryEngine;
use crate::render::{
    BaseLayer, ClickHandler, ControlPanel, Layer, LayerData, LayerId, LayerTag, MapRenderer, OutputRegion, Popup,
    ResultSurface,
};

#[wasm_bindgen]
extern "C" {
    /// Page-side object wrapping the Leaflet map and the result panels.
    #[derive(Clone)]
    pub type MapHost;

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_layer(this: &MapHost, id: &str, message: &str);

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &MapHost, id: &str);

    #[wasm_bindgen(method, js_name = taggedLayers)]
    fn tagged_layers(this: &MapHost, tag: &str) -> js_sys::Array;

    #[wasm_bindgen(method, js_name = setClickHandler)]
    fn set_click_handler(this: &MapHost, handler: &str);

    #[wasm_bindgen(method, js_name = clearClickHandler)]
    fn clear_click_handler(this: &MapHost);

    #[wasm_bindgen(method, js_name = setFeaturePopups)]
    fn set_feature_popups(this: &MapHost, id: &str, enabled: bool);

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &MapHost, lat: f64, lng: f64, zoom: u8);

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &MapHost, id: &str);

    #[wasm_bindgen(method, js_name = setHtml)]
    fn set_html(this: &MapHost, element_id: &str, html: &str);

    #[wasm_bindgen(method, js_name = setPanelVisible)]
    fn set_panel_visible(this: &MapHost, element_id: &str, visible: bool);
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = turf, js_name = buffer, catch)]
    fn turf_buffer(geojson: &JsValue, radius: f64, options: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = turf, js_name = booleanIntersects, catch)]
    fn turf_boolean_intersects(a: &JsValue, b: &JsValue) -> Result<bool, JsValue>;

    #[wasm_bindgen(js_namespace = turf, js_name = distance, catch)]
    fn turf_distance(from: &JsValue, to: &JsValue, options: &JsValue) -> Result<f64, JsValue>;
}

// =============================================================
// Renderer
// =============================================================

/// `addLayer` payload: the layer plus prebuilt per-feature popups.
#[derive(Serialize)]
struct LayerMessage<'a> {
    layer: &'a Layer,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    feature_popups: Vec<String>,
}

fn tag_name(tag: LayerTag) -> &'static str {
    match tag {
        LayerTag::Base => "base",
        LayerTag::Background => "background",
        LayerTag::Analysis => "analysis",
    }
}

fn handler_name(handler: ClickHandler) -> &'static str {
    match handler {
        ClickHandler::Overlay => "overlay",
        ClickHandler::Marker => "marker",
        ClickHandler::ShortestPath => "shortest_path",
    }
}

/// [`MapRenderer`] backed by the page's Leaflet host.
pub struct JsMapRenderer {
    host: MapHost,
}

impl MapRenderer for JsMapRenderer {
    fn add_layer(&mut self, layer: &Layer) {
        let feature_popups = match (&layer.popup, &layer.data) {
            (Popup::FeatureProperties, LayerData::GeoJson { collection }) => {
                collection.features.iter().map(|f| popup_content(f.properties.as_ref())).collect()
            }
            _ => Vec::new(),
        };
        match serde_json::to_string(&LayerMessage { layer, feature_popups }) {
            Ok(message) => self.host.add_layer(&layer.id.to_string(), &message),
            Err(e) => error!(id = %layer.id, error = %e, "layer serialization failed"),
        }
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.host.remove_layer(&id.to_string());
    }

    fn tagged_layers(&self, tag: LayerTag) -> Vec<LayerId> {
        self.host
            .tagged_layers(tag_name(tag))
            .iter()
            .filter_map(|v| v.as_string())
            .filter_map(|s| match s.parse::<LayerId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(id = %s, error = %e, "host reported a non-uuid layer id");
                    None
                }
            })
            .collect()
    }

    fn attach_click(&mut self, handler: ClickHandler) {
        self.host.set_click_handler(handler_name(handler));
    }

    fn detach_click(&mut self) {
        self.host.clear_click_handler();
    }

    fn set_feature_popups(&mut self, id: LayerId, enabled: bool) {
        self.host.set_feature_popups(&id.to_string(), enabled);
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.host.set_view(center.lat, center.lng, zoom);
    }

    fn fit_bounds(&mut self, id: LayerId) {
        self.host.fit_bounds(&id.to_string());
    }
}

/// [`ResultSurface`] backed by the page's Leaflet host.
pub struct JsResultSurface {
    host: MapHost,
}

impl ResultSurface for JsResultSurface {
    fn write(&mut self, region: OutputRegion, html: &str) {
        self.host.set_html(region.dom_id(), html);
    }

    fn set_panel_visible(&mut self, panel: ControlPanel, visible: bool) {
        self.host.set_panel_visible(panel.dom_id(), visible);
    }
}

// =============================================================
// Turf.js geometry engine
// =============================================================

fn to_js(value: &impl Serialize) -> Result<JsValue, AnalysisError> {
    let json = serde_json::to_string(value).map_err(|e| AnalysisError::Geometry(e.to_string()))?;
    js_sys::JSON::parse(&json).map_err(|e| AnalysisError::Geometry(format!("{e:?}")))
}

fn from_js<T: serde::de::DeserializeOwned>(value: &JsValue) -> Result<T, AnalysisError> {
    let json: String = js_sys::JSON::stringify(value)
        .map_err(|e| AnalysisError::Geometry(format!("{e:?}")))?
        .into();
    serde_json::from_str(&json).map_err(|e| AnalysisError::Geometry(e.to_string()))
}

/// Turf options selecting kilometers, the unit of the engine seam.
fn km_options() -> Result<JsValue, AnalysisError> {
    to_js(&serde_json::json!({ "units": "kilometers" }))
}

/// A zero-area polygon at `center`, used when a zero radius yields no buffer.
fn degenerate_polygon(center: LatLng) -> Geometry {
    let p = center.position();
    Geometry::new(GeometryValue::Polygon(vec![vec![p.clone(), p.clone(), p.clone(), p]]))
}

/// [`GeometryEngine`] calling into the global `turf` namespace.
pub struct TurfEngine;

impl GeometryEngine for TurfEngine {
    fn available(&self) -> bool {
        js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("turf")).unwrap_or(false)
    }

    fn buffer(&self, center: LatLng, radius_km: f64) -> Result<Geometry, AnalysisError> {
        let point = to_js(&geo::feature(center.to_geometry(), None))?;
        let buffered = turf_buffer(&point, radius_km, &km_options()?)
            .map_err(|e| AnalysisError::Geometry(format!("{e:?}")))?;
        if buffered.is_undefined() || buffered.is_null() {
            return Ok(degenerate_polygon(center));
        }
        let feature: Feature = from_js(&buffered)?;
        feature
            .geometry
            .ok_or_else(|| AnalysisError::Geometry("buffer returned no geometry".into()))
    }

    fn intersects(&self, a: &Geometry, b: &Geometry) -> Result<bool, AnalysisError> {
        turf_boolean_intersects(&to_js(a)?, &to_js(b)?).map_err(|e| AnalysisError::Geometry(format!("{e:?}")))
    }

    fn distance_km(&self, a: LatLng, b: LatLng) -> Result<f64, AnalysisError> {
        turf_distance(&to_js(&a.position())?, &to_js(&b.position())?, &km_options()?)
            .map_err(|e| AnalysisError::Geometry(format!("{e:?}")))
    }
}

// =============================================================
// Exported handle
// =============================================================

/// Console verbosity for the map lab.
const CONSOLE_LOG_LEVEL: log::Level = log::Level::Info;

/// Module entry point: install the panic hook and the console logger.
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(CONSOLE_LOG_LEVEL) {
        warn!(error = %e, "console logger already installed");
    }
}

/// The map lab as seen from JavaScript.
#[wasm_bindgen]
pub struct MapLab {
    controller: MapToolController<JsMapRenderer, JsResultSurface>,
}

#[wasm_bindgen]
impl MapLab {
    /// Bind to a host object and initialize the map.
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(host: MapHost) -> MapLab {
        let renderer = JsMapRenderer { host: host.clone() };
        let surface = JsResultSurface { host };
        let mut controller = MapToolController::new(renderer, surface);
        controller.set_geometry_engine(Box::new(TurfEngine));
        controller.init_map();
        MapLab { controller }
    }

    /// Tool button pressed.
    ///
    /// # Errors
    ///
    /// Rejects unknown button ids.
    #[wasm_bindgen(js_name = selectTool)]
    pub fn select_tool(&mut self, button_id: &str) -> Result<(), JsValue> {
        let mode = ToolMode::from_button_id(button_id)
            .ok_or_else(|| JsValue::from_str(&format!("unknown tool: {button_id}")))?;
        self.controller.select_tool(mode);
        Ok(())
    }

    /// Map surface clicked.
    #[wasm_bindgen(js_name = mapClick)]
    pub fn map_click(&mut self, lat: f64, lng: f64) {
        self.controller.on_map_click(LatLng::new(lat, lng));
    }

    #[wasm_bindgen(js_name = setBufferRadius)]
    pub fn set_buffer_radius(&mut self, meters: u32) {
        self.controller.set_buffer_radius(meters);
    }

    /// "Run overlay analysis" pressed. Errors are already shown in the result
    /// panel; returns whether the analysis succeeded.
    #[wasm_bindgen(js_name = runOverlay)]
    pub fn run_overlay(&mut self) -> bool {
        self.controller.run_overlay_analysis().is_ok()
    }

    /// Feed a fetched GeoJSON file for the collection with the given panel key.
    ///
    /// # Errors
    ///
    /// Rejects unknown keys and malformed GeoJSON.
    #[wasm_bindgen(js_name = loadCollection)]
    pub fn load_collection(&mut self, key: &str, geojson: &str) -> Result<(), JsValue> {
        let kind =
            CollectionKind::from_key(key).ok_or_else(|| JsValue::from_str(&format!("unknown collection: {key}")))?;
        let collection = geo::parse_collection(geojson).map_err(|e| {
            error!(collection = kind.name(), error = %e, "GeoJSON parse failed");
            JsValue::from_str(&e.to_string())
        })?;
        self.controller.load_collection(kind, collection);
        Ok(())
    }

    /// GeoJSON path for a collection key.
    #[wasm_bindgen(js_name = dataPath)]
    #[must_use]
    pub fn data_path(key: &str) -> Option<String> {
        CollectionKind::from_key(key).map(|k| k.data_path().to_owned())
    }

    /// Layer panel option pressed: a basemap key switches the basemap, a
    /// collection key toggles that overlay. Returns the new visibility.
    #[wasm_bindgen(js_name = toggleLayer)]
    pub fn toggle_layer(&mut self, key: &str) -> Option<bool> {
        if let Some(base) = BaseLayer::from_key(key) {
            self.controller.set_base_layer(base);
            return Some(true);
        }
        CollectionKind::from_key(key).and_then(|kind| self.controller.toggle_overlay(kind))
    }

    #[wasm_bindgen(js_name = clearPath)]
    pub fn clear_path(&mut self) {
        self.controller.clear_path();
    }

    /// Current route as a GeoJSON feature string.
    #[wasm_bindgen(js_name = exportPath)]
    pub fn export_path(&mut self) -> Option<String> {
        match self.controller.export_path() {
            Ok(json) => Some(json),
            Err(_) => None,
        }
    }

    #[wasm_bindgen(js_name = resetMarker)]
    pub fn reset_marker(&mut self) {
        self.controller.reset_marker_tool();
    }
}
