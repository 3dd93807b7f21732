#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pre-flight check for the clustering artifacts.
//!
//! A single pass over the four required files: each is reported as found
//! (with its size) or missing, followed by a summary.

use std::io::Write;
use std::path::Path;

use cluster_map_data::check::AvailabilityReport;

/// Checks `dir`, writes the report to `out`, and returns the process exit
/// code (0 when every file exists, 1 otherwise).
///
/// # Errors
///
/// Returns any error from writing to `out`.
pub fn run_check(dir: &Path, out: &mut impl Write) -> std::io::Result<i32> {
    log::debug!("Checking artifacts in {}", dir.display());

    let report = AvailabilityReport::check(dir);
    report.write_report(out)?;

    for artifact in report.missing() {
        log::debug!("Missing artifact: {}", artifact.file_name());
    }

    Ok(report.exit_code())
}
