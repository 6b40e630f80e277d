//! Interactive map lab for the portfolio site.
//!
//! This crate is compiled to WebAssembly and runs in the browser next to a
//! Leaflet map. It owns the map's tool mode (overlay analysis, marker,
//! shortest path), every analysis artifact drawn on the map, and the text
//! written into the result panels. The host JavaScript layer only forwards
//! clicks and button presses to the [`bridge::MapLab`] handle and performs the
//! layer commands it receives.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`controller`] | [`controller::MapToolController`]: tool state machine and analysis orchestration |
//! | [`layers`] | [`layers::AnalysisLayerStore`]: owned references to every rendered analysis artifact |
//! | [`analysis`] | Overlay report and simulated route computation |
//! | [`geo`] | Coordinates and the GeoJSON data model |
//! | [`data`] | Named feature collections and their base styles |
//! | [`render`] | Renderer / result-surface seams, layer and style types |
//! | [`geometry`] | The external geometry engine seam |
//! | [`bridge`] | `wasm-bindgen` bindings to the Leaflet host and Turf.js |
//! | [`error`] | Recoverable analysis errors |
//! | [`consts`] | Shared constants (styles, placeholders, detour factor) |

pub mod analysis;
pub mod bridge;
pub mod consts;
pub mod controller;
pub mod data;
pub mod error;
pub mod geo;
pub mod geometry;
pub mod layers;
pub mod render;

#[cfg(test)]
#[path = "fakes_test.rs"]
mod fakes;
