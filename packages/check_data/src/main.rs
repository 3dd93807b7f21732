#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Verifies that the clustering artifacts exist before the explorer runs.

use std::path::PathBuf;

use clap::Parser;
use cluster_map_check_data::run_check;
use cluster_map_data::paths;

#[derive(Parser)]
#[command(name = "cluster_map_check_data")]
#[command(about = "Check that the clustering artifacts required by the explorer exist")]
struct Cli {
    /// Artifact directory (defaults to `CLUSTER_MAP_DATA_DIR` or
    /// `data/results_hierarchical_k6`).
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cli = Cli::parse();
    let dir = cli.data_dir.unwrap_or_else(paths::results_dir);

    let code = run_check(&dir, &mut std::io::stdout().lock())?;
    std::process::exit(code);
}
