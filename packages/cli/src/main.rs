#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interactive entry point for the cluster map tools.
//!
//! Lets the user pick between checking the clustering artifacts and
//! starting the explorer server, then guides them through it.

use cluster_map_data::paths;
use dialoguer::Select;

/// Top-level tool selection.
enum Tool {
    CheckData,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::CheckData, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::CheckData => "Check data files",
            Self::Server => "Start server",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    println!("Cluster Map Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::CheckData => {
            let dir = paths::results_dir();
            log::debug!("Checking {}", dir.display());
            let code = cluster_map_check_data::run_check(&dir, &mut std::io::stdout().lock())?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Tool::Server => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(cluster_map_server::interactive::run())
            })
            .await??;
        }
    }

    Ok(())
}
