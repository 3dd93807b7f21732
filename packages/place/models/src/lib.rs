#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Place and cluster types shared across the cluster map.
//!
//! A [`Place`] is one row of the clustered-places table: a point of
//! interest with its K=3 and K=6 cluster assignments and a fixed set of
//! behavioral metrics. The [`CharacteristicsDocument`] carries the
//! descriptive metadata of every cluster and the K=3 to K=6 hierarchy.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use cluster_map_spatial::Located;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Label used wherever a descriptive value is missing.
pub const NOT_AVAILABLE: &str = "N/A";

/// Capitalizes the first letter of every word and lowercases the rest.
///
/// Any character that is not a letter starts a new word, so
/// `place_of_worship` becomes `Place_Of_Worship`.
#[must_use]
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;

    for ch in value.chars() {
        if in_word {
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_uppercase());
        }
        in_word = ch.is_alphabetic();
    }

    out
}

/// Granularity of the hierarchical clustering.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ClusterLevel {
    /// Three macro-segments.
    K3,
    /// Six micro-segments, each nested under one K=3 parent.
    #[default]
    K6,
}

impl ClusterLevel {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::K3, Self::K6]
    }

    /// Number of clusters at this level.
    #[must_use]
    pub const fn cluster_count(self) -> u32 {
        match self {
            Self::K3 => 3,
            Self::K6 => 6,
        }
    }

    /// Short uppercase tag (`K3`, `K6`) used in cluster labels.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::K3 => "K3",
            Self::K6 => "K6",
        }
    }

    /// Human-readable option label for the level selector.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::K3 => "K=3 (Macro-segmentos)",
            Self::K6 => "K=6 (Micro-segmentos)",
        }
    }

    /// Key of this level's section in the characteristics document.
    #[must_use]
    pub const fn characteristics_key(self) -> &'static str {
        match self {
            Self::K3 => "k3_clusters",
            Self::K6 => "k6_clusters",
        }
    }
}

/// How places are drawn on the map.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum VisualizationMode {
    /// One colored circle per place, grouped into marker clusters.
    #[default]
    #[strum(to_string = "markers", serialize = "clusters")]
    Markers,
    /// A density heat layer built from raw coordinates.
    #[strum(to_string = "heatmap")]
    Heatmap,
}

impl VisualizationMode {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Markers, Self::Heatmap]
    }

    /// Human-readable option label for the mode selector.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Markers => "Clusters (marcadores)",
            Self::Heatmap => "Mapa de calor",
        }
    }
}

/// Behavioral metrics attached to a place. Any of them may be missing
/// from the source table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceMetrics {
    /// Distinct devices observed at the place.
    pub unique_devices_count: Option<f64>,
    /// Average daily footfall.
    pub footfall_avg_per_day: Option<f64>,
    /// Share of returning visitors, as a fraction.
    pub recurrence_rate: Option<f64>,
    /// Mean dwell time in minutes.
    pub dwell_time_mean: Option<f64>,
    /// Busiest hour on weekdays.
    pub peak_hour_weekday: Option<f64>,
    /// Busiest hour on weekends.
    pub peak_hour_weekend: Option<f64>,
    /// Morning activity divided by evening activity.
    pub morning_to_evening_ratio: Option<f64>,
}

/// One clustered place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// `OpenStreetMap` identifier.
    pub osm_id: String,
    /// Display name, when the source has one.
    pub name: Option<String>,
    /// Place type (e.g. `restaurant`, `school`).
    pub place_type: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// K=6 cluster id (0-5).
    pub cluster_k6: u32,
    /// K=3 cluster id (0-2).
    pub cluster_k3: u32,
    /// Behavioral metrics.
    pub metrics: PlaceMetrics,
    /// Distance from the active geographic filter's center, in km.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl Place {
    /// The place's cluster id at the given level.
    #[must_use]
    pub const fn cluster_id(&self, level: ClusterLevel) -> u32 {
        match level {
            ClusterLevel::K3 => self.cluster_k3,
            ClusterLevel::K6 => self.cluster_k6,
        }
    }

    /// The name to show for this place.
    ///
    /// Falls back to the title-cased place type when the name is absent or
    /// blank, and to `Place` when the type is blank too.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim)
            && !name.is_empty()
        {
            return name.to_string();
        }

        let place_type = self.place_type.trim();
        if place_type.is_empty() {
            "Place".to_string()
        } else {
            title_case(place_type)
        }
    }
}

impl Located for Place {
    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn longitude(&self) -> f64 {
        self.longitude
    }

    fn set_distance_km(&mut self, distance_km: f64) {
        self.distance_km = Some(distance_km);
    }
}

/// Descriptive metadata for one cluster. Every field is optional in the
/// source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterCharacteristics {
    #[serde(default)]
    pub descriptive_name: Option<String>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub pct_of_total: Option<f64>,
    #[serde(default)]
    pub dominant_type: Option<String>,
    #[serde(default)]
    pub activity_level: Option<String>,
    #[serde(default)]
    pub visit_pattern: Option<String>,
    #[serde(default)]
    pub dwell_category: Option<String>,
    #[serde(default)]
    pub avg_visitors: Option<f64>,
    #[serde(default)]
    pub avg_dwell_time: Option<f64>,
}

impl ClusterCharacteristics {
    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptive_name.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    /// Number of places in the cluster (0 when unknown).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn size(&self) -> u64 {
        self.size.map_or(0, |s| s.max(0.0).round() as u64)
    }

    #[must_use]
    pub fn pct_of_total(&self) -> f64 {
        self.pct_of_total.unwrap_or(0.0)
    }

    /// Dominant place type, title-cased.
    #[must_use]
    pub fn dominant_type_title(&self) -> String {
        self.dominant_type
            .as_deref()
            .map_or_else(|| NOT_AVAILABLE.to_string(), title_case)
    }

    #[must_use]
    pub fn activity_level(&self) -> &str {
        self.activity_level.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    #[must_use]
    pub fn visit_pattern(&self) -> &str {
        self.visit_pattern.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    #[must_use]
    pub fn dwell_category(&self) -> &str {
        self.dwell_category.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    #[must_use]
    pub fn avg_visitors(&self) -> f64 {
        self.avg_visitors.unwrap_or(0.0)
    }

    #[must_use]
    pub fn avg_dwell_time(&self) -> f64 {
        self.avg_dwell_time.unwrap_or(0.0)
    }
}

/// Children of one K=3 cluster in the hierarchy map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    #[serde(default)]
    pub k6_children: Vec<u32>,
}

/// The cluster characteristics document.
///
/// Cluster ids are stringified in the source JSON (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicsDocument {
    #[serde(default)]
    pub k3_clusters: BTreeMap<String, ClusterCharacteristics>,
    #[serde(default)]
    pub k6_clusters: BTreeMap<String, ClusterCharacteristics>,
    #[serde(default)]
    pub hierarchy_map: BTreeMap<String, HierarchyEntry>,
}

impl CharacteristicsDocument {
    /// All characteristics at a level, keyed by stringified cluster id.
    #[must_use]
    pub const fn clusters(&self, level: ClusterLevel) -> &BTreeMap<String, ClusterCharacteristics> {
        match level {
            ClusterLevel::K3 => &self.k3_clusters,
            ClusterLevel::K6 => &self.k6_clusters,
        }
    }

    /// Characteristics for one cluster, if the document describes it.
    #[must_use]
    pub fn cluster(&self, level: ClusterLevel, id: u32) -> Option<&ClusterCharacteristics> {
        self.clusters(level).get(&id.to_string())
    }

    /// The K=6 children of a K=3 cluster, in document order.
    #[must_use]
    pub fn k6_children(&self, k3_id: u32) -> &[u32] {
        self.hierarchy_map
            .get(&k3_id.to_string())
            .map_or(&[], |entry| entry.k6_children.as_slice())
    }

    /// Every K=6 id the document describes.
    #[must_use]
    pub fn k6_ids(&self) -> BTreeSet<u32> {
        self.k6_clusters
            .keys()
            .filter_map(|k| k.trim().parse().ok())
            .collect()
    }

    /// Fills an empty hierarchy map from `(k3, k6)` parent/child edges.
    ///
    /// Does nothing when the document already carries a hierarchy. Child
    /// order follows first appearance; duplicate edges are ignored.
    pub fn fill_hierarchy_from_edges(&mut self, edges: impl IntoIterator<Item = (u32, u32)>) {
        if !self.hierarchy_map.is_empty() {
            return;
        }

        for (k3, k6) in edges {
            let entry = self.hierarchy_map.entry(k3.to_string()).or_default();
            if !entry.k6_children.contains(&k6) {
                entry.k6_children.push(k6);
            }
        }
    }
}

/// A way the hierarchy map fails to partition the K=6 clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyIssue {
    /// A K=6 cluster is listed under more than one K=3 parent.
    MultipleParents { k6: u32, first: u32, second: u32 },
    /// A described K=6 cluster has no parent.
    Orphan { k6: u32 },
    /// A child id that the document does not describe.
    Undescribed { k6: u32, k3: u32 },
}

impl fmt::Display for HierarchyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleParents { k6, first, second } => {
                write!(f, "K6 cluster {k6} is listed under K3 clusters {first} and {second}")
            }
            Self::Orphan { k6 } => write!(f, "K6 cluster {k6} has no K3 parent"),
            Self::Undescribed { k6, k3 } => {
                write!(f, "K3 cluster {k3} lists undescribed K6 cluster {k6}")
            }
        }
    }
}

impl CharacteristicsDocument {
    /// Checks that the hierarchy map assigns every described K=6 cluster
    /// to exactly one K=3 parent and lists nothing else.
    ///
    /// An empty result means the map is a partition of [`Self::k6_ids`].
    #[must_use]
    pub fn hierarchy_issues(&self) -> Vec<HierarchyIssue> {
        let described = self.k6_ids();
        let mut parents: BTreeMap<u32, u32> = BTreeMap::new();
        let mut issues = Vec::new();

        let mut entries: Vec<(u32, &HierarchyEntry)> = self
            .hierarchy_map
            .iter()
            .filter_map(|(k, entry)| Some((k.trim().parse().ok()?, entry)))
            .collect();
        entries.sort_by_key(|(k3, _)| *k3);

        for (k3, entry) in entries {
            for &k6 in &entry.k6_children {
                if let Some(&first) = parents.get(&k6) {
                    if first != k3 {
                        issues.push(HierarchyIssue::MultipleParents {
                            k6,
                            first,
                            second: k3,
                        });
                    }
                    continue;
                }
                parents.insert(k6, k3);
                if !described.contains(&k6) {
                    issues.push(HierarchyIssue::Undescribed { k6, k3 });
                }
            }
        }

        issues.extend(
            described
                .into_iter()
                .filter(|k6| !parents.contains_key(k6))
                .map(|k6| HierarchyIssue::Orphan { k6 }),
        );

        issues
    }
}
