//! Main-panel view model: summary metrics, the map, and per-cluster
//! breakdowns for the current selection.

use std::collections::BTreeSet;

use cluster_map_data::Dataset;
use cluster_map_place_models::{ClusterCharacteristics, ClusterLevel, Place, VisualizationMode};
use cluster_map_render::format::format_len;
use cluster_map_render::palette::cluster_color;
use cluster_map_render::{MAX_MARKERS, RenderOptions, RenderedMap, render};
use serde::Serialize;

use crate::hierarchy::ClusterSummary;
use crate::sidebar::{SidebarParams, SidebarState};

/// Number of place types listed per cluster.
pub const TOP_TYPES: usize = 5;

/// Headline numbers above the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetrics {
    pub total_places: usize,
    /// Number of selected clusters, whether or not they have places.
    pub visible_clusters: usize,
    pub mean_unique_devices: Option<f64>,
    pub mean_dwell_time: Option<f64>,
}

/// How often a place type occurs within one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeShare {
    pub place_type: String,
    pub count: usize,
    /// Share of the cluster's places, in percent.
    pub pct: f64,
}

/// Aggregates over a cluster's places in the displayed subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStats {
    pub places: usize,
    pub mean_unique_devices: Option<f64>,
    pub mean_footfall: Option<f64>,
    pub mean_recurrence: Option<f64>,
    pub mean_dwell_time: Option<f64>,
    pub top_types: Vec<TypeShare>,
}

impl ClusterStats {
    /// Aggregates `places`; `None` when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(places: &[&Place]) -> Option<Self> {
        if places.is_empty() {
            return None;
        }

        let total = places.len() as f64;
        let top_types = top_types(places, TOP_TYPES)
            .into_iter()
            .map(|(place_type, count)| TypeShare {
                place_type: place_type.to_string(),
                count,
                pct: 100.0 * count as f64 / total,
            })
            .collect();

        Some(Self {
            places: places.len(),
            mean_unique_devices: mean(places.iter().map(|p| p.metrics.unique_devices_count)),
            mean_footfall: mean(places.iter().map(|p| p.metrics.footfall_avg_per_day)),
            mean_recurrence: mean(places.iter().map(|p| p.metrics.recurrence_rate)),
            mean_dwell_time: mean(places.iter().map(|p| p.metrics.dwell_time_mean)),
            top_types,
        })
    }
}

/// One selected cluster in the info panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCard {
    pub id: u32,
    pub level: ClusterLevel,
    pub color: &'static str,
    /// Descriptive metadata, when the document has an entry.
    pub characteristics: Option<ClusterCharacteristics>,
    /// The K=3 cluster a K=6 cluster belongs to.
    pub parent: Option<ClusterSummary>,
    /// Present only when the cluster has places in the displayed subset.
    pub stats: Option<ClusterStats>,
}

impl ClusterCard {
    /// Heading such as `K6 Cluster 3`.
    #[must_use]
    pub fn title(&self) -> String {
        format!("{} Cluster {}", self.level.tag(), self.id)
    }
}

/// Everything the main panel shows for one interaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerView {
    pub sidebar: SidebarState,
    pub metrics: SummaryMetrics,
    pub map: RenderedMap,
    /// Shown above the map when markers were capped.
    pub warning: Option<String>,
    /// Shown below the map in markers mode.
    pub hint: Option<String>,
    pub clusters: Vec<ClusterCard>,
}

impl ExplorerView {
    /// Runs one interaction: resolves the sidebar, filters by cluster and
    /// type, renders the map, and aggregates per cluster.
    #[must_use]
    pub fn build(dataset: &Dataset, params: &SidebarParams) -> Self {
        let (sidebar, places) = SidebarState::resolve(dataset, params);
        let level = sidebar.level;

        let clusters: BTreeSet<u32> = sidebar.selected_clusters.iter().copied().collect();
        let types: BTreeSet<&str> = sidebar.selected_types.iter().map(String::as_str).collect();
        let displayed: Vec<Place> = places
            .into_iter()
            .filter(|p| {
                clusters.contains(&p.cluster_id(level)) && types.contains(p.place_type.as_str())
            })
            .collect();

        log::debug!(
            "{} of {} places displayed ({} after geographic filter)",
            displayed.len(),
            sidebar.total_places,
            sidebar.geo_count
        );

        let metrics = SummaryMetrics {
            total_places: displayed.len(),
            visible_clusters: sidebar.selected_clusters.len(),
            mean_unique_devices: mean(displayed.iter().map(|p| p.metrics.unique_devices_count)),
            mean_dwell_time: mean(displayed.iter().map(|p| p.metrics.dwell_time_mean)),
        };

        let map = render(
            &displayed,
            &RenderOptions {
                level,
                mode: sidebar.mode,
                geo_filter: sidebar.geo_filter(),
            },
        );

        let warning = map.truncation.map(|t| {
            format!(
                "Hay {} lugares a renderizar. Considera usar el filtro geográfico o el mapa \
                 de calor para mejor rendimiento. Mostrando los primeros {} lugares.",
                format_len(t.total),
                format_len(MAX_MARKERS)
            )
        });
        let hint = match (sidebar.mode, map.truncation) {
            (VisualizationMode::Heatmap, _) => None,
            (VisualizationMode::Markers, None) => Some(
                "Haz click en los marcadores para ver información detallada de cada lugar"
                    .to_string(),
            ),
            (VisualizationMode::Markers, Some(t)) => Some(format!(
                "Mostrando {} de {} lugares. Usa el filtro geográfico para explorar áreas \
                 específicas.",
                format_len(t.rendered),
                format_len(t.total)
            )),
        };

        let cards = sidebar
            .selected_clusters
            .iter()
            .map(|&id| {
                let members: Vec<&Place> = displayed
                    .iter()
                    .filter(|p| p.cluster_id(level) == id)
                    .collect();
                ClusterCard {
                    id,
                    level,
                    color: cluster_color(level, id),
                    characteristics: dataset.characteristics.cluster(level, id).cloned(),
                    parent: match level {
                        ClusterLevel::K3 => None,
                        ClusterLevel::K6 => sidebar.hierarchy.parent_of(id).cloned(),
                    },
                    stats: ClusterStats::compute(&members),
                }
            })
            .collect();

        Self {
            sidebar,
            metrics,
            map,
            warning,
            hint,
            clusters: cards,
        }
    }
}

/// Mean of the present values; `None` when there are none.
#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0_usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// The `limit` most frequent place types, most frequent first. Ties keep
/// the order in which the types first appear.
fn top_types<'a>(places: &[&'a Place], limit: usize) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for place in places {
        match counts.iter_mut().find(|(t, _)| *t == place.place_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((place.place_type.as_str(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}
