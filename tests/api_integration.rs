#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::util::ServiceExt;

use windfarm_aep::api::{AppState, router};
use windfarm_aep::cache::ResultCache;
use windfarm_aep::config::ServiceConfig;
use windfarm_aep::pipeline::PlantSimulator;

use common::{SCADA_ROWS, plant_fixture};

const AEP_KEYS: &[&str] = &[
    "distribution",
    "mean_aep_GWh",
    "p50_GWh",
    "p90_GWh",
    "std_dev",
    "num_simulations",
    "risk",
];

fn app_state(cfg: &ServiceConfig) -> Arc<AppState> {
    let simulator = PlantSimulator::from_config(cfg);
    let loader = simulator.loader().clone();
    Arc::new(AppState {
        cache: ResultCache::from_config(&cfg.cache, Arc::new(simulator)).unwrap(),
        loader,
        cors_origins: cfg.server.cors_origins.clone(),
    })
}

async fn get(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router(Arc::clone(state)).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn on_demand_aep_has_schema_and_is_cached() {
    let fixture = plant_fixture();
    let state = app_state(&fixture.config);

    let (status, first) = get(&state, "/analysis/aep?num_sim=60").await;
    assert_eq!(status, StatusCode::OK);
    for key in AEP_KEYS {
        assert!(first.get(*key).is_some(), "missing key {key}");
    }
    assert_eq!(first["distribution"].as_array().map(Vec::len), Some(60));
    let level = first["risk"]["level"].as_str().unwrap();
    assert!(["Low Risk", "Moderate Risk", "High Risk"].contains(&level));

    let (_, second) = get(&state, "/analysis/aep?num_sim=60").await;
    assert_eq!(first, second);

    let (_, status_body) = get(&state, "/analysis/aep/cache").await;
    assert_eq!(status_body["entries"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn concurrent_requests_share_one_result() {
    let fixture = plant_fixture();
    let mut cfg = fixture.config.clone();
    // unseeded, so two computations would almost surely differ
    cfg.estimator.seed = None;
    let state = app_state(&cfg);

    let (a, b, c) = tokio::join!(
        get(&state, "/analysis/aep?num_sim=80"),
        get(&state, "/analysis/aep?num_sim=80"),
        get(&state, "/analysis/aep?num_sim=80"),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(a.1["distribution"], b.1["distribution"]);
    assert_eq!(b.1["distribution"], c.1["distribution"]);
}

#[tokio::test]
async fn out_of_range_count_is_400() {
    let fixture = plant_fixture();
    let state = app_state(&fixture.config);
    let (status, body) = get(&state, "/analysis/aep?num_sim=9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("between 10 and 5000"));
}

#[tokio::test]
async fn analysis_reflects_scada_file() {
    let fixture = plant_fixture();
    let state = app_state(&fixture.config);
    let (status, body) = get(&state, "/analysis").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_records"], SCADA_ROWS);
    assert_eq!(body["time_range"]["end"], "2014-01-01T00:20:00");
}

#[tokio::test]
async fn broken_plant_data_is_500_and_not_cached() {
    let fixture = plant_fixture();
    let plant_csv = fixture.config.data.data_dir.join("plant.csv");
    let saved = std::fs::read(&plant_csv).unwrap();
    std::fs::remove_file(&plant_csv).unwrap();
    let state = app_state(&fixture.config);

    let (status, body) = get(&state, "/analysis/aep?num_sim=20").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("plant.csv"));

    std::fs::write(&plant_csv, saved).unwrap();
    let (status, _) = get(&state, "/analysis/aep?num_sim=20").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn single_slot_serves_its_slot_for_any_count() {
    let fixture = plant_fixture();
    let mut cfg = fixture.config.clone();
    cfg.cache.policy = "single_slot".into();
    let state = app_state(&cfg);
    state.cache.warm().await.unwrap();

    let (status, body) = get(&state, "/analysis/aep?num_sim=1000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["num_simulations"], 10);
}
