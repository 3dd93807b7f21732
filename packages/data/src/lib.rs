#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading of the precomputed clustering artifacts.
//!
//! Four files produced by the offline clustering notebook make up a
//! [`Dataset`]: the clustered places table, the K=3/K=6 hierarchy table,
//! the cluster characteristics document, and the per-cluster statistics
//! table. They are read-only inputs; nothing here ever writes them.
//! [`DatasetCache`] memoizes a successful load for the lifetime of the
//! process, and [`check`] reports which files are present without
//! parsing them.

pub mod cache;
pub mod check;
pub mod loader;
pub mod paths;

use std::path::PathBuf;

pub use cache::DatasetCache;
pub use loader::{Dataset, RawTable};

/// Instruction shown to users when the artifacts cannot be loaded.
pub const GENERATION_HINT: &str = "Asegúrate de ejecutar el notebook \
    07_hierarchical_6clusters.ipynb primero para generar los datos.";

/// The four artifacts the explorer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Artifact {
    /// One row per place with its cluster assignments and metrics.
    ClusteredPlaces,
    /// K=3 parent / K=6 child pairs.
    HierarchyStructure,
    /// Descriptive metadata per cluster plus the hierarchy map.
    Characteristics,
    /// Aggregate metrics per cluster.
    ClusterStatistics,
}

impl Artifact {
    /// Returns all variants in load order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ClusteredPlaces,
            Self::HierarchyStructure,
            Self::Characteristics,
            Self::ClusterStatistics,
        ]
    }

    /// File name inside the artifact directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::ClusteredPlaces => "hierarchical_k6_clustered_places.csv",
            Self::HierarchyStructure => "hierarchical_structure_k3_k6.csv",
            Self::Characteristics => "cluster_characteristics.json",
            Self::ClusterStatistics => "hierarchical_k6_cluster_statistics.csv",
        }
    }
}

/// Errors raised while loading the artifacts. Any of them means the data
/// is unavailable for this interaction.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// A required file does not exist.
    #[error("Required data file not found: {}", path.display())]
    Missing {
        /// Path that was expected to exist.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A delimited table could not be parsed.
    #[error("Malformed CSV in {}: {source}", path.display())]
    Csv {
        /// File being parsed.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The characteristics document could not be parsed.
    #[error("Malformed JSON in {}: {source}", path.display())]
    Json {
        /// File being parsed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

impl DataError {
    /// Whether the failure is an absent file rather than a malformed one.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    /// The file the error is about.
    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        match self {
            Self::Missing { path }
            | Self::Io { path, .. }
            | Self::Csv { path, .. }
            | Self::Json { path, .. } => path,
        }
    }
}
