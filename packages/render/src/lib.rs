#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Builds the interactive map for a set of places.
//!
//! [`render`] turns places into a [`ClusterMap`]: a serializable
//! description of the base map, the marker-cluster or heat layer, and the
//! optional search-area overlay. The browser side ([`leaflet`]) draws it
//! with Leaflet; nothing here depends on how tiles are fetched or drawn.

pub mod format;
pub mod leaflet;
pub mod palette;
pub mod popup;

use cluster_map_place_models::{ClusterLevel, Place, VisualizationMode};
use cluster_map_spatial::GeoFilter;
use serde::Serialize;

/// Most markers drawn in [`VisualizationMode::Markers`]; extra places are
/// dropped from the end of the input.
pub const MAX_MARKERS: usize = 5000;

/// Map center used when there are no places to average (downtown San
/// Salvador).
pub const DEFAULT_CENTER: [f64; 2] = [13.6929, -89.2182];

/// Initial zoom level of the base map.
pub const DEFAULT_ZOOM: u8 = 12;

/// Base tile layer.
pub const TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Attribution for [`TILE_URL`].
pub const TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// How a map is requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub level: ClusterLevel,
    pub mode: VisualizationMode,
    /// Active geographic filter, drawn as an overlay.
    pub geo_filter: Option<GeoFilter>,
}

/// A renderable map description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMap {
    /// `[lat, lon]` the map opens on.
    pub center: [f64; 2],
    pub zoom: u8,
    pub tile_url: &'static str,
    pub tile_attribution: &'static str,
    pub search_area: Option<SearchArea>,
    pub layer: MapLayer,
}

/// The data layer of a [`ClusterMap`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MapLayer {
    /// Colored circles, grouped by `leaflet.markercluster`.
    #[serde(rename_all = "camelCase")]
    MarkerCluster { markers: Vec<CircleMarker> },
    /// A density heat layer over raw `[lat, lon]` coordinates.
    #[serde(rename_all = "camelCase")]
    Heatmap {
        points: Vec<[f64; 2]>,
        radius: u32,
        blur: u32,
        max_zoom: u8,
    },
}

impl MapLayer {
    /// Number of markers or heat points in the layer.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::MarkerCluster { markers } => markers.len(),
            Self::Heatmap { points, .. } => points.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One place drawn as a filled circle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleMarker {
    pub position: [f64; 2],
    /// Radius in pixels.
    pub radius: u32,
    pub color: &'static str,
    pub fill_opacity: f64,
    pub weight: u32,
    pub popup_html: String,
    pub popup_max_width: u32,
}

/// The geographic filter overlay: a radius circle plus a center marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchArea {
    pub center: [f64; 2],
    pub radius_m: f64,
    pub color: &'static str,
    pub fill_opacity: f64,
    pub weight: u32,
    pub popup: String,
    pub center_popup: String,
}

impl SearchArea {
    #[must_use]
    pub fn from_filter(filter: &GeoFilter) -> Self {
        Self {
            center: [filter.center_lat, filter.center_lon],
            radius_m: filter.radius_m(),
            color: palette::SEARCH_AREA_COLOR,
            fill_opacity: 0.1,
            weight: 2,
            popup: format!("Radio de búsqueda: {} km", format::format_km(filter.radius_km)),
            center_popup: format!(
                "Centro de búsqueda<br>{:.4}, {:.4}",
                filter.center_lat, filter.center_lon
            ),
        }
    }
}

/// Reported when the marker cap dropped places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Truncation {
    /// Places that were asked for.
    pub total: usize,
    /// Places actually drawn.
    pub rendered: usize,
}

/// Output of [`render`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMap {
    pub map: ClusterMap,
    pub truncation: Option<Truncation>,
}

/// Builds the map for `places`.
///
/// In markers mode at most [`MAX_MARKERS`] places are drawn, in input
/// order, and the cut is reported through [`RenderedMap::truncation`].
/// Heat maps always use every place. The map is centered on the mean
/// coordinate of the drawn places, or [`DEFAULT_CENTER`] when there are
/// none.
#[must_use]
pub fn render(places: &[Place], options: &RenderOptions) -> RenderedMap {
    let (drawn, truncation) = match options.mode {
        VisualizationMode::Markers if places.len() > MAX_MARKERS => {
            log::info!(
                "Drawing the first {MAX_MARKERS} of {} places as markers",
                places.len()
            );
            (
                &places[..MAX_MARKERS],
                Some(Truncation {
                    total: places.len(),
                    rendered: MAX_MARKERS,
                }),
            )
        }
        _ => (places, None),
    };

    let layer = match options.mode {
        VisualizationMode::Markers => MapLayer::MarkerCluster {
            markers: drawn
                .iter()
                .map(|place| circle_marker(place, options.level))
                .collect(),
        },
        VisualizationMode::Heatmap => MapLayer::Heatmap {
            points: drawn.iter().map(|p| [p.latitude, p.longitude]).collect(),
            radius: 15,
            blur: 25,
            max_zoom: 13,
        },
    };

    RenderedMap {
        map: ClusterMap {
            center: mean_center(drawn),
            zoom: DEFAULT_ZOOM,
            tile_url: TILE_URL,
            tile_attribution: TILE_ATTRIBUTION,
            search_area: options.geo_filter.as_ref().map(SearchArea::from_filter),
            layer,
        },
        truncation,
    }
}

fn circle_marker(place: &Place, level: ClusterLevel) -> CircleMarker {
    CircleMarker {
        position: [place.latitude, place.longitude],
        radius: 8,
        color: palette::cluster_color(level, place.cluster_id(level)),
        fill_opacity: 0.7,
        weight: 2,
        popup_html: popup::place_popup_html(place, level),
        popup_max_width: popup::POPUP_MAX_WIDTH,
    }
}

/// Arithmetic mean `[lat, lon]` of the places.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_center(places: &[Place]) -> [f64; 2] {
    if places.is_empty() {
        return DEFAULT_CENTER;
    }

    let n = places.len() as f64;
    let (lat, lon) = places
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.latitude, lon + p.longitude));
    [lat / n, lon / n]
}
