#![allow(clippy::module_name_repetitions)]
//! Canonical locations of the clustering artifacts.
//!
//! The artifacts live in `data/results_hierarchical_k6/` under the project
//! root unless `CLUSTER_MAP_DATA_DIR` points elsewhere.

use std::path::{Path, PathBuf};

use crate::Artifact;

/// Environment variable overriding the artifact directory.
pub const DATA_DIR_ENV: &str = "CLUSTER_MAP_DATA_DIR";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// current directory when the manifest sits less than two levels deep.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default artifact directory, ignoring the environment.
#[must_use]
pub fn default_results_dir() -> PathBuf {
    data_dir().join("results_hierarchical_k6")
}

/// Returns the artifact directory, honoring [`DATA_DIR_ENV`].
#[must_use]
pub fn results_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map_or_else(default_results_dir, PathBuf::from)
}

/// Returns the path of one artifact inside `dir`.
#[must_use]
pub fn artifact_path(dir: &Path, artifact: Artifact) -> PathBuf {
    dir.join(artifact.file_name())
}
