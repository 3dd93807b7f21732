//! Parsing of the four clustering artifacts into a [`Dataset`].

use std::path::{Path, PathBuf};

use cluster_map_place_models::{CharacteristicsDocument, ClusterLevel, Place, PlaceMetrics};
use serde::Deserialize;

use crate::{Artifact, DataError, paths};

/// Everything the explorer needs, loaded from one artifact directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// Directory the artifacts were read from.
    pub source_dir: PathBuf,
    /// Clustered places, in file order.
    pub places: Vec<Place>,
    /// The raw hierarchy table.
    pub hierarchy: RawTable,
    /// Cluster characteristics and the hierarchy map.
    pub characteristics: CharacteristicsDocument,
    /// The raw per-cluster statistics table.
    pub statistics: RawTable,
}

impl Dataset {
    /// Loads all four artifacts from `dir`.
    ///
    /// Presence of every file is verified before anything is parsed, so a
    /// partially generated directory reports the first missing file. When
    /// the characteristics document has no `hierarchy_map`, the hierarchy
    /// is derived from the hierarchy table.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Missing`] if any file is absent, or the
    /// matching read/parse error if a file is malformed.
    pub fn load(dir: &Path) -> Result<Self, DataError> {
        for artifact in Artifact::all() {
            let path = paths::artifact_path(dir, *artifact);
            if !path.is_file() {
                return Err(DataError::Missing { path });
            }
        }

        let places = load_places(&paths::artifact_path(dir, Artifact::ClusteredPlaces))?;
        log::info!("Loaded {} clustered places", places.len());

        let hierarchy = RawTable::load(&paths::artifact_path(dir, Artifact::HierarchyStructure))?;
        log::info!("Loaded hierarchy table with {} rows", hierarchy.rows.len());

        let mut characteristics =
            load_characteristics(&paths::artifact_path(dir, Artifact::Characteristics))?;
        log::info!(
            "Loaded characteristics for {} K3 and {} K6 clusters",
            characteristics.k3_clusters.len(),
            characteristics.k6_clusters.len()
        );

        if characteristics.hierarchy_map.is_empty() {
            let edges = hierarchy.hierarchy_edges();
            log::info!(
                "Characteristics document has no hierarchy_map, deriving it from {} table rows",
                edges.len()
            );
            characteristics.fill_hierarchy_from_edges(edges);
        }

        let statistics = RawTable::load(&paths::artifact_path(dir, Artifact::ClusterStatistics))?;
        log::info!("Loaded statistics table with {} rows", statistics.rows.len());

        warn_on_out_of_range_clusters(&places);
        for issue in characteristics.hierarchy_issues() {
            log::warn!("Inconsistent cluster hierarchy: {issue}");
        }

        Ok(Self {
            source_dir: dir.to_path_buf(),
            places,
            hierarchy,
            characteristics,
            statistics,
        })
    }
}

fn warn_on_out_of_range_clusters(places: &[Place]) {
    for level in ClusterLevel::all() {
        let out_of_range = places
            .iter()
            .filter(|p| p.cluster_id(*level) >= level.cluster_count())
            .count();
        if out_of_range > 0 {
            log::warn!(
                "{out_of_range} places have a {} cluster id outside 0..{}",
                level.tag(),
                level.cluster_count()
            );
        }
    }
}

/// One row of the clustered places table as it appears on disk.
///
/// Metric cells that are empty or not numeric become `None`.
#[derive(Debug, Deserialize)]
struct PlaceRow {
    osm_id: String,
    #[serde(default)]
    nombre: Option<String>,
    clase: String,
    latitude: f64,
    longitude: f64,
    cluster: u32,
    cluster_k3: u32,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    unique_devices_count: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    footfall_avg_per_day: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    recurrence_rate: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    dwell_time_mean: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    peak_hour_weekday: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    peak_hour_weekend: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    morning_to_evening_ratio: Option<f64>,
}

impl From<PlaceRow> for Place {
    fn from(row: PlaceRow) -> Self {
        Self {
            osm_id: row.osm_id,
            name: row.nombre.filter(|n| !n.trim().is_empty()),
            place_type: row.clase,
            latitude: row.latitude,
            longitude: row.longitude,
            cluster_k6: row.cluster,
            cluster_k3: row.cluster_k3,
            metrics: PlaceMetrics {
                unique_devices_count: row.unique_devices_count.filter(|v| v.is_finite()),
                footfall_avg_per_day: row.footfall_avg_per_day.filter(|v| v.is_finite()),
                recurrence_rate: row.recurrence_rate.filter(|v| v.is_finite()),
                dwell_time_mean: row.dwell_time_mean.filter(|v| v.is_finite()),
                peak_hour_weekday: row.peak_hour_weekday.filter(|v| v.is_finite()),
                peak_hour_weekend: row.peak_hour_weekend.filter(|v| v.is_finite()),
                morning_to_evening_ratio: row.morning_to_evening_ratio.filter(|v| v.is_finite()),
            },
            distance_km: None,
        }
    }
}

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>, DataError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|source| csv_error(path, source))
}

fn csv_error(path: &Path, source: csv::Error) -> DataError {
    DataError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Reads the clustered places table.
///
/// # Errors
///
/// Returns [`DataError`] if the file cannot be read or a row is missing a
/// required column (coordinates, cluster ids, type, id).
pub fn load_places(path: &Path) -> Result<Vec<Place>, DataError> {
    let mut reader = open_csv(path)?;
    reader
        .deserialize::<PlaceRow>()
        .map(|row| row.map(Place::from).map_err(|e| csv_error(path, e)))
        .collect()
}

/// Reads the cluster characteristics document.
///
/// # Errors
///
/// Returns [`DataError`] if the file cannot be read or is not a valid
/// characteristics document.
pub fn load_characteristics(path: &Path) -> Result<CharacteristicsDocument, DataError> {
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DataError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// A delimited table kept as text, keyed by its header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Reads a delimited table from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DataError`] if the file cannot be read or has ragged rows.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let mut reader = open_csv(path)?;
        let headers = reader
            .headers()
            .map_err(|e| csv_error(path, e))?
            .iter()
            .map(ToString::to_string)
            .collect();

        let rows = reader
            .records()
            .map(|record| {
                record
                    .map(|r| r.iter().map(ToString::to_string).collect())
                    .map_err(|e| csv_error(path, e))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { headers, rows })
    }

    /// Index of the first header matching any of `needles`
    /// (case-insensitive substring), skipping `exclude`.
    fn find_column(&self, needles: &[&str], exclude: Option<usize>) -> Option<usize> {
        self.headers.iter().enumerate().find_map(|(idx, header)| {
            let header = header.to_ascii_lowercase();
            (Some(idx) != exclude && needles.iter().any(|n| header.contains(n))).then_some(idx)
        })
    }

    /// Parent/child `(k3, k6)` pairs found in the table.
    ///
    /// The parent column is the first header mentioning `k3` or `parent`,
    /// the child column the first other header mentioning `k6` or `child`.
    /// Rows whose ids do not parse are skipped.
    #[must_use]
    pub fn hierarchy_edges(&self) -> Vec<(u32, u32)> {
        let Some(parent) = self.find_column(&["k3", "parent"], None) else {
            return Vec::new();
        };
        let Some(child) = self.find_column(&["k6", "child"], Some(parent)) else {
            return Vec::new();
        };

        self.rows
            .iter()
            .filter_map(|row| {
                let k3 = parse_cluster_id(row.get(parent)?)?;
                let k6 = parse_cluster_id(row.get(child)?)?;
                Some((k3, k6))
            })
            .collect()
    }

    /// Rows as header-keyed JSON objects. Numeric cells become numbers,
    /// empty cells `null`, everything else strings.
    #[must_use]
    pub fn to_json_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .map(|(header, cell)| (header.clone(), cell_to_json(cell)))
                    .collect()
            })
            .collect()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_cluster_id(cell: &str) -> Option<u32> {
    let value: f64 = cell.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0 && value.fract().abs() < f64::EPSILON).then_some(value as u32)
}

fn cell_to_json(cell: &str) -> serde_json::Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return serde_json::Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return int.into();
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| serde_json::Value::String(cell.to_string()), Into::into)
}
