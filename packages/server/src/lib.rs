#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the cluster map explorer.
//!
//! Serves the single-page explorer at `/` (sidebar form, map panel, and
//! cluster panel, re-rendered on every submission) and a small JSON API
//! under `/api`. The clustering artifacts are loaded lazily on the first
//! request and memoized in [`AppState::cache`]; while they are missing
//! the page explains how to generate them instead of failing.

mod handlers;
pub mod interactive;
pub mod page;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use cluster_map_data::{DataError, Dataset, DatasetCache, paths};

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Memoized artifact loads.
    pub cache: DatasetCache,
    /// Directory the artifacts are read from.
    pub data_dir: PathBuf,
}

impl AppState {
    #[must_use]
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            cache: DatasetCache::new(),
            data_dir,
        }
    }

    /// The loaded artifacts, loading them on first use.
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] if the artifacts are missing or malformed.
    pub fn dataset(&self) -> Result<Arc<Dataset>, DataError> {
        self.cache.get_or_load(&self.data_dir)
    }
}

/// Where the server listens and what it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub data_dir: PathBuf,
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, and the artifact directory override from
    /// the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        Self {
            bind_addr,
            port,
            data_dir: paths::results_dir(),
        }
    }
}

/// Registers every route. Shared by the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index)).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/view", web::get().to(handlers::view))
            .route("/hierarchy", web::get().to(handlers::hierarchy))
            .route("/statistics", web::get().to(handlers::statistics))
            .route("/data-status", web::get().to(handlers::data_status)),
    );
}

/// Starts the cluster map server.
///
/// The caller is responsible for initialising logging and for providing
/// the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    log::info!("Reading clustering artifacts from {}", config.data_dir.display());

    let report = cluster_map_data::check::AvailabilityReport::check(&config.data_dir);
    for artifact in report.missing() {
        log::warn!(
            "Missing {}; the explorer will show no data until it exists",
            artifact.file_name()
        );
    }

    let state = web::Data::new(AppState::new(config.data_dir));

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
