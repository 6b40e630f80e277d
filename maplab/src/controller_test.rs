#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::analysis::CollectionOutcome;
use crate::consts::DISTANCE_PLACEHOLDER;
use crate::fakes::{BrokenEngine, Command, RecordingRenderer, RecordingSurface, SquareEngine};

// =============================================================
// Helpers
// =============================================================

type Controller = MapToolController<RecordingRenderer, RecordingSurface>;

fn controller() -> Controller {
    let mut c = MapToolController::new(RecordingRenderer::default(), RecordingSurface::default());
    c.set_geometry_engine(Box::new(SquareEngine::default()));
    c.init_map();
    c
}

fn controller_without_engine() -> Controller {
    let mut c = MapToolController::new(RecordingRenderer::default(), RecordingSurface::default());
    c.init_map();
    c
}

fn named_point(lat: f64, lng: f64, name: &str) -> geo::Feature {
    let props = json!({ "name": name }).as_object().cloned().unwrap();
    geo::feature(LatLng::new(lat, lng).to_geometry(), Some(props))
}

fn load_settlements(c: &mut Controller) {
    c.load_collection(
        CollectionKind::Settlements,
        geo::collection(vec![named_point(28.7001, 80.6001, "Campus Chowk"), named_point(29.5, 81.5, "Far")]),
    );
}

fn analysis_layer_count(c: &Controller) -> usize {
    c.renderer.tagged(LayerTag::Analysis).len()
}

fn result_text(c: &Controller) -> &str {
    c.surface.text(OutputRegion::Result)
}

const ALL_MODES: [ToolMode; 4] = [ToolMode::None, ToolMode::OverlayAnalysis, ToolMode::Marker, ToolMode::ShortestPath];

// =============================================================
// Bootstrap
// =============================================================

#[test]
fn init_map_installs_basemap_and_home_marker() {
    let c = controller();
    assert_eq!(c.base_layer(), Some(BaseLayer::OpenStreetMap));
    assert_eq!(c.renderer.tagged(LayerTag::Base).len(), 1);
    let home = c.renderer.tagged(LayerTag::Background);
    assert_eq!(home.len(), 1);
    assert_eq!(home[0].popup, Popup::Open(HOME_LABEL.to_owned()));
    assert_eq!(c.mode(), ToolMode::None);
    assert!(c.renderer.handlers.is_empty());
}

#[test]
fn set_base_layer_keeps_exactly_one_basemap() {
    let mut c = controller();
    c.set_base_layer(BaseLayer::EsriImagery);
    c.set_base_layer(BaseLayer::CartoLight);
    let bases = c.renderer.tagged(LayerTag::Base);
    assert_eq!(bases.len(), 1);
    assert_eq!(bases[0].data, BaseLayer::CartoLight.layer_data());
    assert_eq!(c.base_layer(), Some(BaseLayer::CartoLight));
}

#[test]
fn load_collection_adds_background_layer_with_popups() {
    let mut c = controller();
    load_settlements(&mut c);
    let loaded = c.collections().get(CollectionKind::Settlements).unwrap();
    assert!(c.renderer.has_layer(loaded.layer_id));
    assert_eq!(c.renderer.popups.get(&loaded.layer_id), Some(&true));
    assert_eq!(c.renderer.layer(loaded.layer_id).unwrap().popup, Popup::FeatureProperties);
}

#[test]
fn reloading_a_collection_replaces_its_layer() {
    let mut c = controller();
    load_settlements(&mut c);
    let first = c.collections().get(CollectionKind::Settlements).unwrap().layer_id;
    load_settlements(&mut c);
    let second = c.collections().get(CollectionKind::Settlements).unwrap().layer_id;
    assert_ne!(first, second);
    assert!(!c.renderer.has_layer(first));
    assert!(c.renderer.has_layer(second));
}

#[test]
fn boundary_load_fits_view() {
    let mut c = controller();
    c.load_collection(CollectionKind::Boundary, geo::collection(Vec::new()));
    let id = c.collections().get(CollectionKind::Boundary).unwrap().layer_id;
    assert!(c.renderer.position_of(&Command::Fit(id)).is_some());
}

#[test]
fn toggle_overlay_hides_and_restores() {
    let mut c = controller();
    assert_eq!(c.toggle_overlay(CollectionKind::Roads), None);
    load_settlements(&mut c);
    let id = c.collections().get(CollectionKind::Settlements).unwrap().layer_id;

    assert_eq!(c.toggle_overlay(CollectionKind::Settlements), Some(false));
    assert!(!c.renderer.has_layer(id));
    assert_eq!(c.toggle_overlay(CollectionKind::Settlements), Some(true));
    assert!(c.renderer.has_layer(id));
}

// =============================================================
// Mode transitions
// =============================================================

#[test]
fn button_ids_map_to_modes() {
    assert_eq!(ToolMode::from_button_id("overlay-analysis"), Some(ToolMode::OverlayAnalysis));
    assert_eq!(ToolMode::from_button_id("marker-tool"), Some(ToolMode::Marker));
    assert_eq!(ToolMode::from_button_id("shortest-path"), Some(ToolMode::ShortestPath));
    assert_eq!(ToolMode::from_button_id("none"), Some(ToolMode::None));
    assert_eq!(ToolMode::from_button_id("run-road-density"), None);
}

#[test]
fn every_switch_leaves_no_artifacts_and_at_most_one_handler() {
    let mut c = controller();
    load_settlements(&mut c);
    let sequence = [
        ToolMode::OverlayAnalysis,
        ToolMode::Marker,
        ToolMode::ShortestPath,
        ToolMode::ShortestPath,
        ToolMode::None,
        ToolMode::Marker,
        ToolMode::OverlayAnalysis,
        ToolMode::None,
    ];
    for (i, mode) in sequence.into_iter().enumerate() {
        // Leave something behind in whatever mode is active.
        c.on_map_click(LatLng::new(28.7, 80.6));
        c.on_map_click(LatLng::new(28.71, 80.62));
        if c.mode() == ToolMode::OverlayAnalysis {
            c.run_overlay_analysis().unwrap();
        }

        c.select_tool(mode);

        assert!(c.layers().is_empty(), "step {i}: store not empty after switching to {mode:?}");
        assert_eq!(analysis_layer_count(&c), 0, "step {i}: analysis layers left on the map");
        let expected = mode.click_handler().into_iter().collect::<Vec<_>>();
        assert_eq!(c.renderer.handlers, expected, "step {i}");
        assert_eq!(c.surface.visible_panels(), mode.panel().into_iter().collect::<Vec<_>>(), "step {i}");
        assert!(c.route().start.is_none() && c.route().end.is_none());
    }
}

#[test]
fn switch_runs_steps_in_order() {
    let mut c = controller();
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.7, 80.6));
    let marker = c.layers().get(ArtifactSlot::ClickMarker).unwrap();
    c.renderer.log.clear();

    c.select_tool(ToolMode::Marker);

    let detach = c.renderer.position_of(&Command::Detach).unwrap();
    let remove = c.renderer.position_of(&Command::Remove(marker)).unwrap();
    let attach = c.renderer.position_of(&Command::Attach(ClickHandler::Marker)).unwrap();
    assert!(detach < remove && remove < attach);
}

#[test]
fn analysis_modes_disable_background_popups() {
    let mut c = controller();
    load_settlements(&mut c);
    let id = c.collections().get(CollectionKind::Settlements).unwrap().layer_id;

    for mode in ALL_MODES {
        c.select_tool(mode);
        assert_eq!(c.renderer.popups.get(&id), Some(&!mode.is_analysis()), "{mode:?}");
    }
}

#[test]
fn collection_loaded_during_analysis_starts_without_popups() {
    let mut c = controller();
    c.select_tool(ToolMode::ShortestPath);
    load_settlements(&mut c);
    let id = c.collections().get(CollectionKind::Settlements).unwrap().layer_id;
    assert_eq!(c.renderer.popups.get(&id), Some(&false));
}

#[test]
fn clicks_with_no_tool_do_nothing() {
    let mut c = controller();
    let before = c.renderer.layers.len();
    c.on_map_click(LatLng::new(28.7, 80.6));
    assert_eq!(c.renderer.layers.len(), before);
    assert!(c.layers().is_empty());
}

// =============================================================
// Overlay analysis
// =============================================================

#[test]
fn overlay_click_replaces_analysis_point() {
    let mut c = controller();
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.7, 80.6));
    c.on_map_click(LatLng::new(28.8, 80.7));

    assert_eq!(analysis_layer_count(&c), 1);
    assert_eq!(c.overlay_point().map(|p| p.position), Some(LatLng::new(28.8, 80.7)));
    let marker = c.renderer.layer(c.layers().get(ArtifactSlot::ClickMarker).unwrap()).unwrap();
    assert_eq!(marker.popup, Popup::Open("Analysis Point".into()));
}

#[test]
fn overlay_analysis_renders_buffer_and_highlights() {
    let mut c = controller();
    load_settlements(&mut c);
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.70, 80.60));

    let report = c.run_overlay_analysis().unwrap();

    assert_eq!(report.total_found(), 1);
    assert!(c.layers().get(ArtifactSlot::Buffer).is_some());
    assert_eq!(c.layers().highlights().len(), 1);
    let highlight = c.renderer.layer(c.layers().highlights()[0]).unwrap();
    assert_eq!(highlight.style.as_ref().map(|s| s.color), Some(HIGHLIGHT_COLOR));
    let buffer = c.renderer.layer(c.layers().get(ArtifactSlot::Buffer).unwrap()).unwrap();
    assert_eq!(buffer.style.as_ref().map(|s| s.color), Some(BUFFER_COLOR));

    let html = result_text(&c);
    assert!(html.contains("Buffer: 500m"));
    assert!(html.contains("Settlements Found: 1"));
    assert!(html.contains("<li>Campus Chowk</li>"));
    assert!(html.contains("No Roads data available."));
}

#[test]
fn overlay_analysis_twice_keeps_one_buffer() {
    let mut c = controller();
    load_settlements(&mut c);
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.70, 80.60));

    c.run_overlay_analysis().unwrap();
    c.set_buffer_radius(1000);
    c.run_overlay_analysis().unwrap();

    let buffers = c
        .renderer
        .tagged(LayerTag::Analysis)
        .into_iter()
        .filter(|l| l.style.as_ref().map(|s| s.color) == Some(BUFFER_COLOR))
        .count();
    assert_eq!(buffers, 1);
    assert_eq!(c.layers().highlights().len(), 1);
    assert_eq!(analysis_layer_count(&c), 3);
    assert!(result_text(&c).contains("Buffer: 1000m"));
}

#[test]
fn zero_radius_overlay_succeeds() {
    let mut c = controller();
    load_settlements(&mut c);
    c.set_buffer_radius(0);
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.70, 80.60));

    let report = c.run_overlay_analysis().unwrap();
    assert_eq!(report.radius_m, 0);
    assert!(result_text(&c).contains("Buffer: 0m"));
    assert!(c.layers().get(ArtifactSlot::Buffer).is_some());
}

#[test]
fn new_overlay_click_clears_previous_result() {
    let mut c = controller();
    load_settlements(&mut c);
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.70, 80.60));
    c.run_overlay_analysis().unwrap();

    c.on_map_click(LatLng::new(28.9, 80.9));

    assert!(c.layers().get(ArtifactSlot::Buffer).is_none());
    assert!(c.layers().highlights().is_empty());
    assert_eq!(analysis_layer_count(&c), 1);
    assert_eq!(result_text(&c), RESULT_PLACEHOLDER);
}

#[test]
fn overlay_without_point_reports_missing_input() {
    let mut c = controller();
    load_settlements(&mut c);
    c.select_tool(ToolMode::OverlayAnalysis);

    let err = c.run_overlay_analysis().unwrap_err();

    assert!(matches!(err, AnalysisError::MissingInput(_)));
    assert!(result_text(&c).contains("Please click on the map to set an analysis point first."));
    assert!(result_text(&c).contains("error-message"));
    assert_eq!(analysis_layer_count(&c), 0);
    assert_eq!(c.mode(), ToolMode::OverlayAnalysis);
}

#[test]
fn overlay_without_engine_reports_missing_capability() {
    let mut c = controller_without_engine();
    load_settlements(&mut c);
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.70, 80.60));

    let err = c.run_overlay_analysis().unwrap_err();

    assert!(matches!(err, AnalysisError::MissingCapability { .. }));
    assert!(result_text(&c).contains("geometry engine not loaded"));
    assert!(c.layers().get(ArtifactSlot::Buffer).is_none());
    assert_eq!(analysis_layer_count(&c), 1, "only the analysis point remains");

    // Still usable: install the engine and retry.
    c.set_geometry_engine(Box::new(SquareEngine::default()));
    assert!(c.run_overlay_analysis().is_ok());
}

#[test]
fn unavailable_engine_is_treated_as_missing() {
    let mut c = controller();
    c.set_geometry_engine(Box::new(SquareEngine::unavailable()));
    load_settlements(&mut c);
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.70, 80.60));
    assert!(matches!(c.run_overlay_analysis(), Err(AnalysisError::MissingCapability { .. })));
}

#[test]
fn failed_rerun_keeps_previous_result_intact() {
    let mut c = controller();
    load_settlements(&mut c);
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.70, 80.60));
    c.run_overlay_analysis().unwrap();
    let buffer = c.layers().get(ArtifactSlot::Buffer).unwrap();

    c.set_geometry_engine(Box::new(BrokenEngine));
    let err = c.run_overlay_analysis().unwrap_err();

    assert!(matches!(err, AnalysisError::Geometry(_)));
    assert_eq!(c.layers().get(ArtifactSlot::Buffer), Some(buffer));
    assert!(c.renderer.has_layer(buffer));
}

#[test]
fn overlay_with_no_data_anywhere_reports_empty_dataset() {
    let mut c = controller();
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.70, 80.60));

    let err = c.run_overlay_analysis().unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyDataset { .. }));
    assert!(result_text(&c).contains("No data available for analysis"));
    assert!(c.layers().get(ArtifactSlot::Buffer).is_none());
}

#[test]
fn overlay_report_outcomes_per_collection() {
    let mut c = controller();
    load_settlements(&mut c);
    c.load_collection(CollectionKind::Roads, geo::collection(vec![named_point(29.9, 81.9, "Far road")]));
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.70, 80.60));

    let report = c.run_overlay_analysis().unwrap();
    let outcome = |kind| report.collections.iter().find(|r| r.kind == kind).map(|r| r.outcome.clone());
    assert_eq!(outcome(CollectionKind::Roads), Some(CollectionOutcome::NoneFound));
    assert_eq!(outcome(CollectionKind::Rivers), Some(CollectionOutcome::NoData));
    assert!(result_text(&c).contains("No Roads found within the buffer."));
    assert!(result_text(&c).contains("No Rivers data available."));
}

#[test]
fn switching_to_marker_clears_buffer_before_marker_click() {
    let mut c = controller();
    load_settlements(&mut c);
    c.select_tool(ToolMode::OverlayAnalysis);
    c.on_map_click(LatLng::new(28.70, 80.60));
    c.run_overlay_analysis().unwrap();
    let buffer = c.layers().get(ArtifactSlot::Buffer).unwrap();

    c.select_tool(ToolMode::Marker);
    c.on_map_click(LatLng::new(28.123_456, 80.654_321));

    let removed = c.renderer.position_of(&Command::Remove(buffer)).unwrap();
    let attached = c.renderer.position_of(&Command::Attach(ClickHandler::Marker)).unwrap();
    assert!(removed < attached);
    assert!(!c.renderer.has_layer(buffer));
    assert_eq!(analysis_layer_count(&c), 1);
}

// =============================================================
// Marker tool
// =============================================================

#[test]
fn marker_click_shows_six_decimal_coordinates() {
    let mut c = controller();
    c.select_tool(ToolMode::Marker);
    c.on_map_click(LatLng::new(28.123_456, 80.654_321));

    let text = c.surface.text(OutputRegion::Marker);
    assert!(text.contains("Lat: 28.123456"));
    assert!(text.contains("Lng: 80.654321"));
    let pin = c.renderer.layer(c.layers().get(ArtifactSlot::ClickMarker).unwrap()).unwrap();
    assert!(matches!(&pin.popup, Popup::Open(html) if html.contains("Lat: 28.123456<br>Lng: 80.654321")));
}

#[test]
fn marker_click_pads_to_six_decimals() {
    let mut c = controller();
    c.select_tool(ToolMode::Marker);
    c.on_map_click(LatLng::new(28.5, -80.25));
    let text = c.surface.text(OutputRegion::Marker);
    assert!(text.contains("Lat: 28.500000"));
    assert!(text.contains("Lng: -80.250000"));
}

#[test]
fn marker_click_replaces_previous_marker() {
    let mut c = controller();
    c.select_tool(ToolMode::Marker);
    c.on_map_click(LatLng::new(28.1, 80.1));
    c.on_map_click(LatLng::new(28.2, 80.2));

    assert_eq!(analysis_layer_count(&c), 1);
    assert_eq!(c.marker_point().map(|p| p.position), Some(LatLng::new(28.2, 80.2)));
    let text = c.surface.text(OutputRegion::Marker);
    assert!(text.contains("Lat: 28.200000"));
    assert!(!text.contains("28.100000"));
}

#[test]
fn reset_marker_tool_removes_pin() {
    let mut c = controller();
    c.select_tool(ToolMode::Marker);
    c.on_map_click(LatLng::new(28.1, 80.1));

    c.reset_marker_tool();

    assert!(c.marker_point().is_none());
    assert_eq!(analysis_layer_count(&c), 0);
    assert_eq!(c.surface.text(OutputRegion::Marker), MARKER_PLACEHOLDER);
}

// =============================================================
// Shortest path
// =============================================================

#[test]
fn two_clicks_compute_route() {
    let mut c = controller();
    c.select_tool(ToolMode::ShortestPath);

    c.on_map_click(LatLng::new(28.70, 80.60));
    assert!(result_text(&c).contains("Start point set"));
    assert!(c.layers().get(ArtifactSlot::StartWaypoint).is_some());

    c.on_map_click(LatLng::new(28.71, 80.62));

    assert_eq!(c.surface.text(OutputRegion::Distance), "2.85 km");
    assert!(result_text(&c).contains("Shortest path calculated: 2.85 km."));
    assert!(c.layers().get(ArtifactSlot::EndWaypoint).is_some());
    let line = c.renderer.layer(c.layers().get(ArtifactSlot::RouteLine).unwrap()).unwrap();
    assert_eq!(line.style.as_ref().map(|s| s.color), Some(ROUTE_COLOR));
    assert_eq!(c.last_route().map(|r| r.distance_km), Some(2.85));
    assert_eq!(analysis_layer_count(&c), 3);
}

#[test]
fn recompute_replaces_route_line() {
    let mut c = controller();
    c.select_tool(ToolMode::ShortestPath);
    c.on_map_click(LatLng::new(28.70, 80.60));
    c.on_map_click(LatLng::new(28.71, 80.62));
    let first = c.layers().get(ArtifactSlot::RouteLine).unwrap();

    c.compute_route().unwrap();

    let second = c.layers().get(ArtifactSlot::RouteLine).unwrap();
    assert_ne!(first, second);
    assert!(!c.renderer.has_layer(first));
    assert_eq!(analysis_layer_count(&c), 3);
}

#[test]
fn third_click_restarts_route() {
    let mut c = controller();
    c.select_tool(ToolMode::ShortestPath);
    c.on_map_click(LatLng::new(28.70, 80.60));
    c.on_map_click(LatLng::new(28.71, 80.62));

    c.on_map_click(LatLng::new(28.80, 80.80));

    assert_eq!(c.route().start.as_ref().map(|p| p.position), Some(LatLng::new(28.80, 80.80)));
    assert!(c.route().end.is_none());
    assert!(c.layers().get(ArtifactSlot::RouteLine).is_none());
    assert!(c.layers().get(ArtifactSlot::EndWaypoint).is_none());
    assert_eq!(analysis_layer_count(&c), 1);
    assert_eq!(c.surface.text(OutputRegion::Distance), DISTANCE_PLACEHOLDER);
    assert!(c.last_route().is_none());
}

#[test]
fn route_without_engine_reports_error_and_leaves_no_end_artifacts() {
    let mut c = controller_without_engine();
    c.select_tool(ToolMode::ShortestPath);
    c.on_map_click(LatLng::new(28.70, 80.60));
    c.on_map_click(LatLng::new(28.71, 80.62));

    assert_eq!(c.surface.text(OutputRegion::Distance), "Error");
    assert!(result_text(&c).contains("Cannot calculate shortest path"));
    assert!(c.layers().get(ArtifactSlot::EndWaypoint).is_none());
    assert!(c.layers().get(ArtifactSlot::RouteLine).is_none());
    assert!(c.route().end.is_none());
    assert_eq!(c.mode(), ToolMode::ShortestPath);

    // The next click retries the end point.
    c.set_geometry_engine(Box::new(SquareEngine::default()));
    c.on_map_click(LatLng::new(28.71, 80.62));
    assert_eq!(c.surface.text(OutputRegion::Distance), "2.85 km");
}

#[test]
fn compute_route_without_points_is_missing_input() {
    let mut c = controller();
    c.select_tool(ToolMode::ShortestPath);
    assert!(matches!(c.compute_route(), Err(AnalysisError::MissingInput(_))));
    assert_eq!(analysis_layer_count(&c), 0);
}

#[test]
fn clear_path_resets_everything() {
    let mut c = controller();
    c.select_tool(ToolMode::ShortestPath);
    c.on_map_click(LatLng::new(28.70, 80.60));
    c.on_map_click(LatLng::new(28.71, 80.62));

    c.clear_path();

    assert!(c.layers().is_empty());
    assert_eq!(analysis_layer_count(&c), 0);
    assert_eq!(c.surface.text(OutputRegion::Distance), DISTANCE_PLACEHOLDER);
    assert_eq!(result_text(&c), RESULT_PLACEHOLDER);
    assert_eq!(c.mode(), ToolMode::ShortestPath);
    assert_eq!(c.renderer.handlers, vec![ClickHandler::ShortestPath]);
}

#[test]
fn export_path_returns_geojson_feature() {
    let mut c = controller();
    c.select_tool(ToolMode::ShortestPath);
    c.on_map_click(LatLng::new(28.70, 80.60));
    c.on_map_click(LatLng::new(28.71, 80.62));

    let exported = c.export_path().unwrap();
    let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
    assert_eq!(value["type"], "Feature");
    assert_eq!(value["properties"]["distance_km"], json!(2.85));
    assert_eq!(value["geometry"]["coordinates"].as_array().map(Vec::len), Some(3));
}

#[test]
fn export_path_without_route_is_missing_input() {
    let mut c = controller();
    c.select_tool(ToolMode::ShortestPath);
    assert!(matches!(c.export_path(), Err(AnalysisError::MissingInput(_))));
    assert!(result_text(&c).contains("No path to export"));
}
