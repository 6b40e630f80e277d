//! Named feature collections: the static GeoJSON overlays shown under the
//! analysis tools and consumed read-only by overlay analysis.

#[cfg(test)]
#[path = "data_test.rs"]
mod data_test;

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::geo::{Feature, FeatureCollection, display_value, escape_html};
use crate::render::{LayerId, LayerStyle};

/// The data collections shipped with the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Boundary,
    Rivers,
    Roads,
    Settlements,
    Facilities,
    Tourism,
}

impl CollectionKind {
    pub const ALL: [Self; 6] =
        [Self::Boundary, Self::Rivers, Self::Roads, Self::Settlements, Self::Facilities, Self::Tourism];

    /// Collections tested against the buffer, in report order.
    pub const ANALYZED: [Self; 5] = [Self::Settlements, Self::Roads, Self::Rivers, Self::Tourism, Self::Facilities];

    /// Display name used in results and the layer control.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Boundary => "Dhangadhi Boundary",
            Self::Rivers => "Rivers",
            Self::Roads => "Roads",
            Self::Settlements => "Settlements",
            Self::Facilities => "Facilities",
            Self::Tourism => "Tourism",
        }
    }

    /// Parse the `data-layer` key used by the layer panel.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "dhangadhi" => Some(Self::Boundary),
            "rivers" => Some(Self::Rivers),
            "roads" => Some(Self::Roads),
            "settlements" => Some(Self::Settlements),
            "facilities" => Some(Self::Facilities),
            "tourism" => Some(Self::Tourism),
            _ => None,
        }
    }

    /// Path of the GeoJSON file, relative to the site root.
    #[must_use]
    pub fn data_path(self) -> &'static str {
        match self {
            Self::Boundary => "Data/Dhangadhi.geojson",
            Self::Rivers => "Data/Rivers.geojson",
            Self::Roads => "Data/Roads.geojson",
            Self::Settlements => "Data/Settlements.geojson",
            Self::Facilities => "Data/Facilities.geojson",
            Self::Tourism => "Data/Tourism.geojson",
        }
    }

    /// Background style. Point collections render as circle markers.
    #[must_use]
    pub fn style(self) -> LayerStyle {
        match self {
            Self::Boundary => LayerStyle { color: "#ff7800", fill_opacity: Some(0.2), ..LayerStyle::default() },
            Self::Rivers => LayerStyle { color: "#0077be", weight: Some(3.0), ..LayerStyle::default() },
            Self::Roads => LayerStyle { color: "#555", weight: Some(2.0), ..LayerStyle::default() },
            Self::Settlements => point_style("#d03", 4.0),
            Self::Facilities => point_style("#16a085", 5.0),
            Self::Tourism => point_style("#f39c12", 6.0),
        }
    }
}

fn point_style(color: &'static str, radius: f64) -> LayerStyle {
    LayerStyle { color, fill_opacity: Some(0.8), point_radius: Some(radius), ..LayerStyle::default() }
}

/// A collection that has been loaded and added to the map.
#[derive(Debug, Clone)]
pub struct LoadedCollection {
    pub collection: FeatureCollection,
    pub layer_id: LayerId,
    pub visible: bool,
}

/// All loaded collections, keyed by kind.
#[derive(Debug, Default)]
pub struct Collections {
    loaded: HashMap<CollectionKind, LoadedCollection>,
}

impl Collections {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a collection, returning the entry it replaced.
    pub fn insert(&mut self, kind: CollectionKind, loaded: LoadedCollection) -> Option<LoadedCollection> {
        self.loaded.insert(kind, loaded)
    }

    #[must_use]
    pub fn get(&self, kind: CollectionKind) -> Option<&LoadedCollection> {
        self.loaded.get(&kind)
    }

    pub fn get_mut(&mut self, kind: CollectionKind) -> Option<&mut LoadedCollection> {
        self.loaded.get_mut(&kind)
    }

    /// Features of a collection; empty when it never loaded.
    #[must_use]
    pub fn features(&self, kind: CollectionKind) -> &[Feature] {
        match self.loaded.get(&kind) {
            Some(loaded) => &loaded.collection.features,
            None => &[],
        }
    }

    /// Layer ids of every loaded collection currently on the map.
    #[must_use]
    pub fn visible_layers(&self) -> Vec<LayerId> {
        CollectionKind::ALL
            .iter()
            .filter_map(|kind| self.loaded.get(kind))
            .filter(|l| l.visible)
            .map(|l| l.layer_id)
            .collect()
    }
}

/// Popup HTML for a feature: one table row per property.
#[must_use]
pub fn popup_content(properties: Option<&Map<String, Value>>) -> String {
    let Some(properties) = properties.filter(|p| !p.is_empty()) else {
        return "No information available.".to_owned();
    };
    let mut html = String::from("<table>");
    for (key, value) in properties {
        let text = display_value(value).unwrap_or_else(|| value.to_string());
        html.push_str(&format!("<tr><th>{}:</th><td>{}</td></tr>", escape_html(key), escape_html(&text)));
    }
    html.push_str("</table>");
    html
}
