#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API response types for the cluster map server.
//!
//! These types are serialized to JSON for the REST API. View models that
//! the page also renders (the explorer view, the hierarchy tree) are
//! serialized directly; the types here only exist for the API.

use cluster_map_data::check::{AvailabilityReport, FileStatus};
use cluster_map_data::{DataError, GENERATION_HINT};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Body of a `503` answer when the clustering artifacts cannot be loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// What went wrong, naming the offending file.
    pub error: String,
    /// How to produce the missing data.
    pub hint: String,
}

impl From<&DataError> for ApiError {
    fn from(e: &DataError) -> Self {
        Self {
            error: e.to_string(),
            hint: GENERATION_HINT.to_string(),
        }
    }
}

/// Presence of one artifact file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFileStatus {
    pub name: String,
    pub found: bool,
    pub size_bytes: Option<u64>,
}

impl From<&FileStatus> for ApiFileStatus {
    fn from(status: &FileStatus) -> Self {
        Self {
            name: status.artifact.file_name().to_string(),
            found: status.exists(),
            size_bytes: status.size_bytes,
        }
    }
}

/// Response of `GET /api/data-status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDataStatus {
    /// Directory the artifacts are read from.
    pub data_dir: String,
    pub all_present: bool,
    pub files: Vec<ApiFileStatus>,
}

impl From<&AvailabilityReport> for ApiDataStatus {
    fn from(report: &AvailabilityReport) -> Self {
        Self {
            data_dir: report.base_dir.display().to_string(),
            all_present: report.all_present(),
            files: report.files.iter().map(ApiFileStatus::from).collect(),
        }
    }
}
