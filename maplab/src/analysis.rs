//! Overlay analysis and the simulated shortest path.
//!
//! Both algorithms only orchestrate calls into the [`GeometryEngine`]; they
//! produce plain values and never touch the renderer, so a failure part-way
//! through leaves nothing to clean up.

#[cfg(test)]
#[path = "analysis_test.rs"]
mod analysis_test;

use serde_json::{Map, Value, json};

use crate::consts::ROUTE_DETOUR_FACTOR;
use crate::data::{CollectionKind, Collections};
use crate::error::AnalysisError;
use crate::geo::{self, AnalysisPoint, Feature, FeatureCollection, Geometry, LatLng, escape_html};
use crate::geometry::GeometryEngine;

// =============================================================
// Overlay analysis
// =============================================================

/// Per-collection overlay outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionOutcome {
    /// The collection has no features loaded.
    NoData,
    /// Features are loaded but none intersect the buffer.
    NoneFound,
    /// Labels of the intersecting features, in collection order.
    Found(Vec<String>),
}

/// Outcome for one analyzed collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResult {
    pub kind: CollectionKind,
    pub outcome: CollectionOutcome,
}

impl CollectionResult {
    /// Number of intersecting features.
    #[must_use]
    pub fn count(&self) -> usize {
        match &self.outcome {
            CollectionOutcome::Found(labels) => labels.len(),
            CollectionOutcome::NoData | CollectionOutcome::NoneFound => 0,
        }
    }
}

/// Structured overlay result, one entry per analyzed collection.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayReport {
    pub radius_m: u32,
    pub collections: Vec<CollectionResult>,
}

impl OverlayReport {
    /// Total intersecting features across all collections.
    #[must_use]
    pub fn total_found(&self) -> usize {
        self.collections.iter().map(CollectionResult::count).sum()
    }

    /// Result-panel HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let r = self.radius_m;
        let mut html = format!(
            "<div class=\"analysis-result\"><h5>Overlay Analysis Results (Buffer: {r}m)</h5>\
             <div class=\"result-metrics\"><div class=\"metric\"><span class=\"value\">{r}m</span>\
             <span class=\"label\">Buffer Radius</span></div></div><div class=\"result-details\">"
        );
        for result in &self.collections {
            let name = result.kind.name();
            match &result.outcome {
                CollectionOutcome::NoData => {
                    html.push_str(&format!("<p>No {name} data available.</p>"));
                }
                CollectionOutcome::NoneFound => {
                    html.push_str(&format!("<p>No {name} found within the buffer.</p>"));
                }
                CollectionOutcome::Found(labels) => {
                    html.push_str(&format!("<h6>{name} Found: {}</h6><ul>", labels.len()));
                    for label in labels {
                        html.push_str(&format!("<li>{}</li>", escape_html(label)));
                    }
                    html.push_str("</ul>");
                }
            }
        }
        if self.total_found() == 0 {
            html.push_str("<p>No features found within the buffer for any selected data type.</p>");
        }
        html.push_str("</div></div>");
        html
    }
}

/// Everything an overlay run produces, ready to render.
#[derive(Debug, Clone)]
pub struct OverlayOutcome {
    pub buffer: Geometry,
    pub report: OverlayReport,
    /// Intersecting features per collection; only non-empty sets.
    pub highlights: Vec<(CollectionKind, FeatureCollection)>,
}

/// Buffer `center` by `radius_m` meters and test every analyzed collection
/// against the buffer.
///
/// # Errors
///
/// - [`AnalysisError::EmptyDataset`] when no analyzed collection has features.
/// - [`AnalysisError::Geometry`] when the engine rejects an input.
pub fn run_overlay(
    engine: &dyn GeometryEngine,
    center: &AnalysisPoint,
    radius_m: u32,
    collections: &Collections,
) -> Result<OverlayOutcome, AnalysisError> {
    if CollectionKind::ANALYZED.iter().all(|k| collections.features(*k).is_empty()) {
        return Err(AnalysisError::EmptyDataset {
            collections: CollectionKind::ANALYZED.iter().map(|k| k.name().to_owned()).collect(),
        });
    }

    let buffer = engine.buffer(center.position, f64::from(radius_m) / 1000.0)?;

    let mut results = Vec::with_capacity(CollectionKind::ANALYZED.len());
    let mut highlights = Vec::new();
    for kind in CollectionKind::ANALYZED {
        let features = collections.features(kind);
        if features.is_empty() {
            tracing::warn!(collection = kind.name(), "collection has no features loaded");
            results.push(CollectionResult { kind, outcome: CollectionOutcome::NoData });
            continue;
        }

        let hits = intersecting(engine, features, &buffer)?;
        if hits.is_empty() {
            results.push(CollectionResult { kind, outcome: CollectionOutcome::NoneFound });
            continue;
        }
        let labels = hits.iter().map(geo::feature_label).collect();
        results.push(CollectionResult { kind, outcome: CollectionOutcome::Found(labels) });
        highlights.push((kind, geo::collection(hits)));
    }

    Ok(OverlayOutcome { buffer, report: OverlayReport { radius_m, collections: results }, highlights })
}

fn intersecting(
    engine: &dyn GeometryEngine,
    features: &[Feature],
    buffer: &Geometry,
) -> Result<Vec<Feature>, AnalysisError> {
    let mut hits = Vec::new();
    for feature in features {
        let Some(geometry) = &feature.geometry else { continue };
        if engine.intersects(geometry, buffer)? {
            hits.push(feature.clone());
        }
    }
    Ok(hits)
}

// =============================================================
// Shortest path (simulated)
// =============================================================

/// What a shortest-path click did to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteProgress {
    StartSet,
    EndSet,
}

/// Start/end points collected from shortest-path clicks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteRequest {
    pub start: Option<AnalysisPoint>,
    pub end: Option<AnalysisPoint>,
}

impl RouteRequest {
    /// Both points are set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// Fill the next empty point. A complete request restarts from `point`.
    pub fn push(&mut self, point: AnalysisPoint) -> RouteProgress {
        if self.start.is_none() || self.end.is_some() {
            self.start = Some(point);
            self.end = None;
            RouteProgress::StartSet
        } else {
            self.end = Some(point);
            RouteProgress::EndSet
        }
    }

    /// Drop both points.
    pub fn reset(&mut self) {
        self.start = None;
        self.end = None;
    }
}

/// A computed route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    /// Simulated road distance, rounded to 2 decimals.
    pub distance_km: f64,
    /// Three-point path: start, bend, end.
    pub path: Geometry,
}

impl RouteResult {
    /// Distance as displayed (`"2.85 km"`).
    #[must_use]
    pub fn distance_text(&self) -> String {
        format!("{:.2} km", self.distance_km)
    }

    /// The route as a GeoJSON feature.
    #[must_use]
    pub fn to_feature(&self) -> Feature {
        let mut properties = Map::new();
        properties.insert("distance_km".into(), json!(self.distance_km));
        properties.insert("simulated".into(), Value::Bool(true));
        geo::feature(self.path.clone(), Some(properties))
    }
}

/// Cosmetic bend: a third of the longitude delta and two thirds of the
/// latitude delta from `start`.
#[must_use]
pub fn bend_point(start: LatLng, end: LatLng) -> LatLng {
    LatLng::new(start.lat + (end.lat - start.lat) * 2.0 / 3.0, start.lng + (end.lng - start.lng) / 3.0)
}

/// Round to 2 decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Great-circle distance times the detour factor, drawn with a cosmetic bend.
///
/// # Errors
///
/// - [`AnalysisError::MissingInput`] when either point is unset.
/// - [`AnalysisError::Geometry`] when the engine rejects the points.
pub fn simulate_route(engine: &dyn GeometryEngine, request: &RouteRequest) -> Result<RouteResult, AnalysisError> {
    let (Some(start), Some(end)) = (&request.start, &request.end) else {
        return Err(AnalysisError::MissingInput("Please click on the map to set both a start and an end point."));
    };
    let (start, end) = (start.position, end.position);
    let great_circle = engine.distance_km(start, end)?;
    let distance_km = round2(great_circle * ROUTE_DETOUR_FACTOR);
    let path = geo::line(&[start, bend_point(start, end), end]);
    Ok(RouteResult { distance_km, path })
}
