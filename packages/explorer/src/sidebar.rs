//! Configuration surface: what the user asked for and what it resolves to.
//!
//! [`SidebarParams`] is the raw request, parsed leniently from URL query
//! pairs. [`SidebarState`] is that request resolved against a loaded
//! [`Dataset`]: the geographic filter applied, the cluster and type
//! options derived from what survives it, and the selections narrowed to
//! those options.

use std::collections::BTreeSet;
use std::str::FromStr;

use cluster_map_data::Dataset;
use cluster_map_place_models::{ClusterLevel, Place, VisualizationMode};
use cluster_map_render::format::{format_km, format_len};
use cluster_map_spatial::GeoFilter;
use serde::Serialize;

use crate::hierarchy::HierarchyTree;
use crate::presets::{CUSTOM_DEFAULT_CENTER, LocationPreset};

pub const RADIUS_MIN_KM: f64 = 0.5;
pub const RADIUS_MAX_KM: f64 = 20.0;
pub const RADIUS_STEP_KM: f64 = 0.5;
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Brings a requested radius onto the slider: clamped to
/// [`RADIUS_MIN_KM`]..=[`RADIUS_MAX_KM`] and snapped to
/// [`RADIUS_STEP_KM`]. Missing or non-finite input yields
/// [`DEFAULT_RADIUS_KM`].
#[must_use]
pub fn snap_radius(radius_km: Option<f64>) -> f64 {
    let Some(radius) = radius_km.filter(|r| r.is_finite()) else {
        return DEFAULT_RADIUS_KM;
    };
    let steps = (radius.clamp(RADIUS_MIN_KM, RADIUS_MAX_KM) / RADIUS_STEP_KM).round();
    (steps * RADIUS_STEP_KM).clamp(RADIUS_MIN_KM, RADIUS_MAX_KM)
}

/// The sidebar controls as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarParams {
    pub level: ClusterLevel,
    pub mode: VisualizationMode,
    /// Whether the geographic filter is switched on.
    pub geo_enabled: bool,
    pub preset: LocationPreset,
    /// Custom center, used only with [`LocationPreset::Custom`].
    pub custom_lat: Option<f64>,
    pub custom_lon: Option<f64>,
    /// Requested radius before snapping.
    pub radius_km: Option<f64>,
    /// Explicit cluster selection; `None` selects every available cluster.
    pub clusters: Option<Vec<u32>>,
    /// Explicit type selection; `None` selects every available type.
    pub types: Option<Vec<String>>,
    /// Cluster options the selection was made from.
    pub cluster_options: Option<BTreeSet<u32>>,
    /// Type options the selection was made from.
    pub type_options: Option<BTreeSet<String>>,
}

impl SidebarParams {
    /// Parses URL query pairs.
    ///
    /// Recognized keys are `level`, `mode`, `geo`, `preset`, `lat`, `lon`,
    /// `radius`, repeated `cluster` and `type`, `filtered`,
    /// `cluster_level`, `options`, and repeated `cluster_option` and
    /// `type_option`. Unparsable values fall back to their defaults.
    ///
    /// `filtered=1` marks the cluster and type lists as explicit, so that
    /// an empty selection stays empty. A cluster selection made for a
    /// different level (`cluster_level`) than the one requested is
    /// discarded, since the ids would refer to other clusters.
    ///
    /// `options=1` marks the option lists as submitted (possibly empty).
    /// [`SidebarState::resolve`] drops a selection whose options differ
    /// from the ones available now.
    pub fn from_query_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        let mut explicit = false;
        let mut clusters: Option<Vec<u32>> = None;
        let mut types: Option<Vec<String>> = None;
        let mut clusters_level: Option<ClusterLevel> = None;
        let mut options_shown = false;

        for (key, value) in pairs {
            let value = value.as_ref().trim();
            match key.as_ref() {
                "level" => params.level = parse_or_default("level", value),
                "mode" => params.mode = parse_or_default("mode", value),
                "geo" => params.geo_enabled = matches!(value, "1" | "true" | "on"),
                "preset" => params.preset = parse_or_default("preset", value),
                "lat" => params.custom_lat = parse_finite(value),
                "lon" => params.custom_lon = parse_finite(value),
                "radius" => params.radius_km = parse_finite(value),
                "cluster" => {
                    let selected = clusters.get_or_insert_with(Vec::new);
                    match value.parse() {
                        Ok(id) => selected.push(id),
                        Err(_) => log::debug!("Ignoring cluster id '{value}'"),
                    }
                }
                "type" => {
                    let selected = types.get_or_insert_with(Vec::new);
                    if !value.is_empty() {
                        selected.push(value.to_string());
                    }
                }
                "cluster_option" => {
                    let shown = params.cluster_options.get_or_insert_with(BTreeSet::new);
                    match value.parse() {
                        Ok(id) => {
                            shown.insert(id);
                        }
                        Err(_) => log::debug!("Ignoring cluster option '{value}'"),
                    }
                }
                "type_option" => {
                    let shown = params.type_options.get_or_insert_with(BTreeSet::new);
                    if !value.is_empty() {
                        shown.insert(value.to_string());
                    }
                }
                "filtered" => explicit = value == "1",
                "options" => options_shown = value == "1",
                "cluster_level" => clusters_level = value.parse().ok(),
                other => log::debug!("Ignoring query parameter '{other}'"),
            }
        }

        if explicit {
            clusters.get_or_insert_with(Vec::new);
            types.get_or_insert_with(Vec::new);
        }
        if options_shown {
            params.cluster_options.get_or_insert_with(BTreeSet::new);
            params.type_options.get_or_insert_with(BTreeSet::new);
        }
        if clusters_level.is_none_or(|level| level == params.level) {
            params.clusters = clusters;
        }
        params.types = types;

        params
    }

    /// The search center: the preset's coordinates, or the custom entry
    /// (each coordinate defaulting independently).
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        self.preset.coordinates().unwrap_or((
            self.custom_lat.unwrap_or(CUSTOM_DEFAULT_CENTER.0),
            self.custom_lon.unwrap_or(CUSTOM_DEFAULT_CENTER.1),
        ))
    }

    /// Effective radius after snapping.
    #[must_use]
    pub fn radius(&self) -> f64 {
        snap_radius(self.radius_km)
    }

    /// The geographic filter, when switched on.
    #[must_use]
    pub fn geo_filter(&self) -> Option<GeoFilter> {
        self.geo_enabled.then(|| {
            let (lat, lon) = self.center();
            GeoFilter::new(lat, lon, self.radius())
        })
    }
}

fn parse_or_default<T: FromStr + Default>(key: &str, value: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        log::debug!("Invalid value '{value}' for '{key}', using default");
        T::default()
    })
}

fn parse_finite(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whether a selection made from `shown` still applies to `available`
/// (sorted, unique). A selection submitted without its options applies.
fn same_options<T: Ord>(shown: Option<&BTreeSet<T>>, available: &[T]) -> bool {
    shown.is_none_or(|shown| shown.iter().eq(available.iter()))
}

/// Sidebar controls resolved against the loaded data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarState {
    pub level: ClusterLevel,
    pub mode: VisualizationMode,
    pub geo_enabled: bool,
    pub preset: LocationPreset,
    /// `[lat, lon]` of the search center.
    pub center: [f64; 2],
    pub radius_km: f64,
    /// Places in the dataset.
    pub total_places: usize,
    /// Places left after the geographic filter (all of them when it is off).
    pub geo_count: usize,
    pub available_clusters: Vec<u32>,
    pub selected_clusters: Vec<u32>,
    pub available_types: Vec<String>,
    pub selected_types: Vec<String>,
    pub hierarchy: HierarchyTree,
}

impl SidebarState {
    /// Resolves `params` against `dataset`.
    ///
    /// Returns the state together with the geographically filtered places,
    /// each annotated with its distance when the filter is on.
    #[must_use]
    pub fn resolve(dataset: &Dataset, params: &SidebarParams) -> (Self, Vec<Place>) {
        let geo_filter = params.geo_filter();
        let places = match &geo_filter {
            Some(filter) => filter.apply(dataset.places.clone()),
            None => dataset.places.clone(),
        };

        let available_clusters: Vec<u32> = places
            .iter()
            .map(|p| p.cluster_id(params.level))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let available_types: Vec<String> = places
            .iter()
            .map(|p| p.place_type.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(ToString::to_string)
            .collect();

        let selected_clusters = match &params.clusters {
            Some(wanted) if same_options(params.cluster_options.as_ref(), &available_clusters) => {
                available_clusters
                    .iter()
                    .copied()
                    .filter(|id| wanted.contains(id))
                    .collect()
            }
            _ => available_clusters.clone(),
        };
        let selected_types = match &params.types {
            Some(wanted) if same_options(params.type_options.as_ref(), &available_types) => {
                available_types
                    .iter()
                    .filter(|t| wanted.contains(t))
                    .cloned()
                    .collect()
            }
            _ => available_types.clone(),
        };

        let (lat, lon) = params.center();
        let state = Self {
            level: params.level,
            mode: params.mode,
            geo_enabled: geo_filter.is_some(),
            preset: params.preset,
            center: [lat, lon],
            radius_km: params.radius(),
            total_places: dataset.places.len(),
            geo_count: places.len(),
            available_clusters,
            selected_clusters,
            available_types,
            selected_types,
            hierarchy: HierarchyTree::from_document(&dataset.characteristics),
        };

        (state, places)
    }

    /// The active geographic filter.
    #[must_use]
    pub const fn geo_filter(&self) -> Option<GeoFilter> {
        if self.geo_enabled {
            Some(GeoFilter::new(self.center[0], self.center[1], self.radius_km))
        } else {
            None
        }
    }

    /// Count line under the geographic filter controls.
    #[must_use]
    pub fn status_text(&self) -> String {
        if self.geo_enabled {
            format!(
                "✓ {} lugares encontrados en {} km",
                format_len(self.geo_count),
                format_km(self.radius_km)
            )
        } else {
            format!("Total: {} lugares", format_len(self.total_places))
        }
    }

    /// Coordinates of a named preset, for display.
    #[must_use]
    pub fn location_text(&self) -> Option<String> {
        self.preset.coordinates().map(|(lat, lon)| {
            format!("{}: {lat:.4}, {lon:.4}", self.preset.label())
        })
    }

    #[must_use]
    pub fn is_cluster_selected(&self, id: u32) -> bool {
        self.selected_clusters.contains(&id)
    }

    #[must_use]
    pub fn is_type_selected(&self, place_type: &str) -> bool {
        self.selected_types.iter().any(|t| t == place_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_map_data::RawTable;
    use cluster_map_place_models::PlaceMetrics;
    use std::path::PathBuf;

    fn place(id: &str, place_type: &str, k6: u32, lat: f64, lon: f64) -> Place {
        Place {
            osm_id: id.to_string(),
            name: None,
            place_type: place_type.to_string(),
            latitude: lat,
            longitude: lon,
            cluster_k6: k6,
            cluster_k3: k6 / 2,
            metrics: PlaceMetrics::default(),
            distance_km: None,
        }
    }

    /// A cafe at the centro preset and a bank 3 km north of it.
    fn cafe_and_bank() -> Dataset {
        Dataset {
            source_dir: PathBuf::from("."),
            places: vec![
                place("1", "cafe", 0, 13.6929, -89.2182),
                place("2", "bank", 2, 13.7199, -89.2182),
            ],
            hierarchy: RawTable::default(),
            characteristics: cluster_map_place_models::CharacteristicsDocument::default(),
            statistics: RawTable::default(),
        }
    }

    fn resubmit(radius: &str, shown_types: &[&str], shown_clusters: &[&str]) -> SidebarParams {
        let mut pairs = vec![
            ("geo", "1"),
            ("radius", radius),
            ("filtered", "1"),
            ("options", "1"),
            ("cluster_level", "k6"),
            ("cluster", "0"),
            ("type", "cafe"),
        ];
        pairs.extend(shown_types.iter().map(|t| ("type_option", *t)));
        pairs.extend(shown_clusters.iter().map(|c| ("cluster_option", *c)));
        SidebarParams::from_query_pairs(pairs)
    }

    #[test]
    fn snaps_radius_onto_slider() {
        assert!((snap_radius(None) - 5.0).abs() < f64::EPSILON);
        assert!((snap_radius(Some(f64::NAN)) - 5.0).abs() < f64::EPSILON);
        assert!((snap_radius(Some(0.0)) - 0.5).abs() < f64::EPSILON);
        assert!((snap_radius(Some(-3.0)) - 0.5).abs() < f64::EPSILON);
        assert!((snap_radius(Some(50.0)) - 20.0).abs() < f64::EPSILON);
        assert!((snap_radius(Some(2.7)) - 2.5).abs() < f64::EPSILON);
        assert!((snap_radius(Some(2.8)) - 3.0).abs() < f64::EPSILON);
        assert!((snap_radius(Some(7.5)) - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn defaults_without_parameters() {
        let params = SidebarParams::from_query_pairs(Vec::<(String, String)>::new());
        assert_eq!(params, SidebarParams::default());
        assert_eq!(params.level, ClusterLevel::K6);
        assert_eq!(params.mode, VisualizationMode::Markers);
        assert!(params.geo_filter().is_none());
        assert!(params.clusters.is_none());
        assert!(params.types.is_none());
    }

    #[test]
    fn parses_full_query() {
        let params = SidebarParams::from_query_pairs([
            ("level", "k3"),
            ("mode", "heatmap"),
            ("geo", "1"),
            ("preset", "santa-tecla"),
            ("radius", "2.7"),
            ("cluster", "0"),
            ("cluster", "2"),
            ("cluster", "x"),
            ("type", "cafe"),
            ("unknown", "value"),
        ]);
        assert_eq!(params.level, ClusterLevel::K3);
        assert_eq!(params.mode, VisualizationMode::Heatmap);
        assert_eq!(params.clusters, Some(vec![0, 2]));
        assert_eq!(params.types, Some(vec!["cafe".to_string()]));

        let filter = params.geo_filter().unwrap();
        assert!((filter.center_lat - 13.6769).abs() < 1e-9);
        assert!((filter.center_lon - -89.2797).abs() < 1e-9);
        assert!((filter.radius_km - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_values_fall_back() {
        let params = SidebarParams::from_query_pairs([
            ("level", "k9"),
            ("mode", "3d"),
            ("preset", "nowhere"),
            ("lat", "inf"),
            ("radius", "NaN"),
        ]);
        assert_eq!(params.level, ClusterLevel::K6);
        assert_eq!(params.mode, VisualizationMode::Markers);
        assert_eq!(params.preset, LocationPreset::CentroSanSalvador);
        assert!(params.custom_lat.is_none());
        assert!((params.radius() - DEFAULT_RADIUS_KM).abs() < f64::EPSILON);
    }

    #[test]
    fn custom_center_defaults_per_coordinate() {
        let params = SidebarParams::from_query_pairs([
            ("geo", "on"),
            ("preset", "custom"),
            ("lat", "13.7"),
        ]);
        assert_eq!(params.center(), (13.7, CUSTOM_DEFAULT_CENTER.1));
    }

    #[test]
    fn filtered_flag_makes_empty_selection_explicit() {
        let params = SidebarParams::from_query_pairs([("filtered", "1")]);
        assert_eq!(params.clusters, Some(vec![]));
        assert_eq!(params.types, Some(vec![]));
    }

    #[test]
    fn widening_radius_selects_new_options() {
        let data = cafe_and_bank();

        let (narrow, places) = SidebarState::resolve(&data, &resubmit("1", &["cafe"], &["0"]));
        assert_eq!(places.len(), 1);
        assert_eq!(narrow.selected_types, vec!["cafe"]);

        let (wide, places) = SidebarState::resolve(&data, &resubmit("5", &["cafe"], &["0"]));
        assert_eq!(wide.geo_count, 2);
        assert_eq!(places.len(), 2);
        assert_eq!(wide.available_types, vec!["bank", "cafe"]);
        assert_eq!(wide.selected_types, vec!["bank", "cafe"]);
        assert_eq!(wide.selected_clusters, vec![0, 2]);

        let view = crate::ExplorerView::build(&data, &resubmit("5", &["cafe"], &["0"]));
        assert_eq!(view.metrics.total_places, 2);
    }

    #[test]
    fn deselection_holds_while_options_are_unchanged() {
        let data = cafe_and_bank();
        let params = resubmit("5", &["bank", "cafe"], &["0", "2"]);
        let (state, _) = SidebarState::resolve(&data, &params);

        assert_eq!(state.selected_types, vec!["cafe"]);
        assert_eq!(state.selected_clusters, vec![0]);
    }

    #[test]
    fn parses_submitted_options() {
        let params = SidebarParams::from_query_pairs([
            ("options", "1"),
            ("cluster_option", "3"),
            ("cluster_option", "1"),
            ("cluster_option", "x"),
        ]);
        assert_eq!(params.cluster_options, Some(BTreeSet::from([1, 3])));
        assert_eq!(params.type_options, Some(BTreeSet::new()));
        assert!(SidebarParams::default().type_options.is_none());
    }

    #[test]
    fn cluster_selection_for_other_level_is_dropped() {
        let params = SidebarParams::from_query_pairs([
            ("filtered", "1"),
            ("cluster_level", "k6"),
            ("cluster", "5"),
            ("level", "k3"),
            ("type", "cafe"),
        ]);
        assert!(params.clusters.is_none());
        assert_eq!(params.types, Some(vec!["cafe".to_string()]));
    }
}
