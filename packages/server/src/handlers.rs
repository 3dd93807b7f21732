//! HTTP handler functions for the cluster map server.

use std::sync::Arc;

use actix_web::error::BlockingError;
use actix_web::{HttpResponse, web};
use cluster_map_data::check::AvailabilityReport;
use cluster_map_data::{DataError, Dataset};
use cluster_map_explorer::{ExplorerView, HierarchyTree, SidebarParams};
use cluster_map_server_models::{ApiDataStatus, ApiError, ApiHealth};

use crate::{AppState, page};

type QueryPairs = web::Query<Vec<(String, String)>>;

/// `GET /`
///
/// The explorer page for the submitted sidebar controls. When the data
/// cannot be loaded the page explains how to generate it.
pub async fn index(state: web::Data<AppState>, query: QueryPairs) -> HttpResponse {
    let body = match load_dataset(&state).await {
        Ok(Ok(dataset)) => {
            let params = SidebarParams::from_query_pairs(query.into_inner());
            page::explorer_page(&ExplorerView::build(&dataset, &params))
        }
        Ok(Err(e)) => page::unavailable_page(&e),
        Err(e) => return load_failed(&e),
    };

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/view`
///
/// The view model behind the page, for the same query parameters.
pub async fn view(state: web::Data<AppState>, query: QueryPairs) -> HttpResponse {
    with_dataset(&state, |dataset| {
        let params = SidebarParams::from_query_pairs(query.into_inner());
        HttpResponse::Ok().json(ExplorerView::build(dataset, &params))
    })
    .await
}

/// `GET /api/hierarchy`
pub async fn hierarchy(state: web::Data<AppState>) -> HttpResponse {
    with_dataset(&state, |dataset| {
        HttpResponse::Ok().json(HierarchyTree::from_document(&dataset.characteristics))
    })
    .await
}

/// `GET /api/statistics`
///
/// The per-cluster statistics table, one object per row.
pub async fn statistics(state: web::Data<AppState>) -> HttpResponse {
    with_dataset(&state, |dataset| {
        HttpResponse::Ok().json(dataset.statistics.to_json_records())
    })
    .await
}

/// `GET /api/data-status`
///
/// Which artifacts exist, without loading them.
pub async fn data_status(state: web::Data<AppState>) -> HttpResponse {
    let report = AvailabilityReport::check(&state.data_dir);
    HttpResponse::Ok().json(ApiDataStatus::from(&report))
}

/// Fetches the dataset on the blocking thread pool. A cold load parses
/// every artifact while holding the cache lock.
async fn load_dataset(
    state: &web::Data<AppState>,
) -> Result<Result<Arc<Dataset>, DataError>, BlockingError> {
    let state = state.clone();
    web::block(move || state.dataset()).await
}

/// Runs `f` on the loaded dataset, or answers `503` when it is unavailable.
async fn with_dataset(
    state: &web::Data<AppState>,
    f: impl FnOnce(&Dataset) -> HttpResponse + Send,
) -> HttpResponse {
    match load_dataset(state).await {
        Ok(Ok(dataset)) => f(&dataset),
        Ok(Err(e)) => unavailable(&e),
        Err(e) => load_failed(&e),
    }
}

fn load_failed(e: &BlockingError) -> HttpResponse {
    log::error!("Dataset load did not complete: {e}");
    HttpResponse::InternalServerError().body(e.to_string())
}

fn unavailable(e: &DataError) -> HttpResponse {
    log::warn!("Data unavailable: {e}");
    HttpResponse::ServiceUnavailable().json(ApiError::from(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use cluster_map_data::Artifact;
    use std::path::{Path, PathBuf};

    const PLACES_CSV: &str = "\
osm_id,nombre,clase,latitude,longitude,cluster,cluster_k3,unique_devices_count,footfall_avg_per_day,recurrence_rate,dwell_time_mean,peak_hour_weekday,peak_hour_weekend,morning_to_evening_ratio
1,Pupuseria Olga,restaurant,13.6929,-89.2182,0,0,1500,42.5,0.25,35.0,12,18,1.2
2,,school,13.6950,-89.2150,2,1,800,20,0.5,90,8,,0.8
3,Super Selectos,supermarket,13.9000,-89.5000,5,2,300,10,0.1,15,17,11,0.5
";

    const CHARACTERISTICS_JSON: &str = r#"{
  "k3_clusters": {"0": {"descriptive_name": "Comercio", "size": 1, "pct_of_total": 33.3}},
  "k6_clusters": {"0": {"descriptive_name": "Restaurantes"}, "2": {}, "5": {}},
  "hierarchy_map": {"0": {"k6_children": [0]}, "1": {"k6_children": [2]}, "2": {"k6_children": [5]}}
}"#;

    fn write_fixture(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(Artifact::ClusteredPlaces.file_name()), PLACES_CSV).unwrap();
        std::fs::write(
            dir.join(Artifact::HierarchyStructure.file_name()),
            "cluster_k3,cluster_k6\n0,0\n1,2\n2,5\n",
        )
        .unwrap();
        std::fs::write(
            dir.join(Artifact::Characteristics.file_name()),
            CHARACTERISTICS_JSON,
        )
        .unwrap();
        std::fs::write(
            dir.join(Artifact::ClusterStatistics.file_name()),
            "cluster,n_places,label\n0,1,Restaurantes\n2,1,\n",
        )
        .unwrap();
        dir
    }

    fn state(dir: &Path) -> web::Data<AppState> {
        web::Data::new(AppState::new(dir.to_path_buf()))
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(App::new().configure(crate::configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: ApiHealth = test::call_and_read_body_json(&app, req).await;

        assert!(body.healthy);
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn index_renders_explorer_page() {
        let dir = write_fixture("cluster_map_server_index");
        let app = test::init_service(
            App::new()
                .app_data(state(&dir))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/?level=k3").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains(r#"value="k3" checked"#));
        assert!(html.contains("Total: 3 lugares"));
        assert!(html.contains("K3 Cluster 0</h3>"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[actix_web::test]
    async fn view_applies_query_filters() {
        let dir = write_fixture("cluster_map_server_view");
        let app = test::init_service(
            App::new()
                .app_data(state(&dir))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/view?geo=1&preset=centro-san-salvador&radius=2&mode=heatmap")
            .to_request();
        let view: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(view["sidebar"]["geoCount"], 2);
        assert_eq!(view["sidebar"]["totalPlaces"], 3);
        assert_eq!(view["metrics"]["totalPlaces"], 2);
        assert_eq!(view["map"]["map"]["layer"]["kind"], "heatmap");
        assert!((view["sidebar"]["radiusKm"].as_f64().unwrap() - 2.0).abs() < f64::EPSILON);

        let req = test::TestRequest::get()
            .uri("/api/view?filtered=1&cluster=0&cluster=5&type=restaurant")
            .to_request();
        let view: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["metrics"]["totalPlaces"], 1);
        assert_eq!(view["metrics"]["visibleClusters"], 2);
        assert_eq!(view["clusters"][0]["characteristics"]["descriptive_name"], "Restaurantes");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[actix_web::test]
    async fn hierarchy_and_statistics_endpoints() {
        let dir = write_fixture("cluster_map_server_tables");
        let app = test::init_service(
            App::new()
                .app_data(state(&dir))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/hierarchy").to_request();
        let tree: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(tree["branches"].as_array().unwrap().len(), 3);
        assert_eq!(tree["branches"][0]["cluster"]["name"], "Comercio");
        assert_eq!(tree["branches"][2]["children"][0]["id"], 5);

        let req = test::TestRequest::get().uri("/api/statistics").to_request();
        let rows: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rows[0]["n_places"], 1);
        assert_eq!(rows[0]["label"], "Restaurantes");
        assert!(rows[1]["label"].is_null());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[actix_web::test]
    async fn missing_data_degrades_gracefully() {
        let dir = std::env::temp_dir().join("cluster_map_server_missing");
        let _ = std::fs::remove_dir_all(&dir);
        let app = test::init_service(
            App::new()
                .app_data(state(&dir))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert!(
            std::str::from_utf8(&body)
                .unwrap()
                .contains("07_hierarchical_6clusters.ipynb")
        );

        let req = test::TestRequest::get().uri("/api/view").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ApiError = test::read_body_json(resp).await;
        assert!(body.error.contains("hierarchical_k6_clustered_places.csv"));

        let req = test::TestRequest::get().uri("/api/data-status").to_request();
        let status: ApiDataStatus = test::call_and_read_body_json(&app, req).await;
        assert!(!status.all_present);
        assert!(status.files.iter().all(|f| !f.found));
    }

    #[actix_web::test]
    async fn dataset_loads_on_blocking_pool() {
        let dir = write_fixture("cluster_map_server_blocking_load");
        let app_state = state(&dir);
        assert!(!app_state.cache.is_cached(&dir));

        let dataset = load_dataset(&app_state).await.unwrap().unwrap();
        assert_eq!(dataset.places.len(), 3);
        assert!(app_state.cache.is_cached(&dir));

        let again = load_dataset(&app_state).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&dataset, &again));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[actix_web::test]
    async fn data_appearing_later_is_picked_up() {
        let dir = std::env::temp_dir().join("cluster_map_server_late_data");
        let _ = std::fs::remove_dir_all(&dir);
        let app_state = state(&dir);
        let app = test::init_service(
            App::new()
                .app_data(app_state.clone())
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/hierarchy").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        write_fixture("cluster_map_server_late_data");
        let req = test::TestRequest::get().uri("/api/hierarchy").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(app_state.cache.is_cached(&dir));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
