use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use tower::ServiceExt;

use rootweave::api::{create_router, ApiState, MAX_STEPS_PER_REQUEST};
use rootweave::config::GrowthConfig;
use rootweave::simulation::Simulation;

fn app() -> Router {
    let mut rng = StdRng::seed_from_u64(1);
    let config = GrowthConfig {
        edge_seed_chances: Vec::new(),
        ..Default::default()
    };
    let sim = Simulation::with_surface(&mut rng, config, 640.0, 480.0);
    create_router(ApiState::with_rng(sim, rng))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn stats_report_initial_roots() {
    let app = app();
    let (status, stats) = send(&app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["root_count"], 6);
    assert_eq!(stats["branch_count"], 6);
    assert_eq!(stats["frame_index"], 0);
}

#[tokio::test]
async fn stepping_grows_roots_to_full_length() {
    let app = app();
    let (status, state) = send(&app, post("/step?steps=90&dt=16")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["stats"]["frame_index"], 90);
    for root in state["forest"].as_array().unwrap().iter().take(6) {
        assert_eq!(root["growth_progress"].as_f64(), Some(1.0));
    }
}

#[tokio::test]
async fn negative_step_duration_is_rejected() {
    let app = app();
    let (status, _) = send(&app, post("/step?dt=-5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_step_request_is_rejected() {
    let app = app();
    let uri = format!("/step?steps={}", MAX_STEPS_PER_REQUEST + 1);
    let (status, _) = send(&app, post(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing ran and the lock is still usable
    let (status, stats) = send(&app, get("/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["frame_index"], 0);
}

#[tokio::test]
async fn frame_lists_draw_commands() {
    let app = app();
    let (_, frame) = send(&app, get("/frame")).await;
    assert_eq!(frame["commands"].as_array().unwrap().len(), 0);

    send(&app, post("/step")).await;
    let (status, frame) = send(&app, get("/frame")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(frame["width"].as_f64(), Some(640.0));
    assert!(frame["commands"].as_array().unwrap().len() >= 6);
}

#[tokio::test]
async fn pause_toggles() {
    let app = app();
    let (_, body) = send(&app, post("/pause")).await;
    assert_eq!(body["paused"], true);
    let (_, body) = send(&app, post("/pause")).await;
    assert_eq!(body["paused"], false);
}

#[tokio::test]
async fn resize_updates_surface_only() {
    let app = app();
    let (_, before) = send(&app, get("/state")).await;

    let (status, _) = send(&app, post_json("/resize", serde_json::json!({ "width": 0, "height": 10 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json("/resize", serde_json::json!({ "width": 1024, "height": 768 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, after) = send(&app, get("/state")).await;
    assert_eq!(after["surface_width"].as_f64(), Some(1024.0));
    assert_eq!(after["surface_height"].as_f64(), Some(768.0));
    assert_eq!(before["forest"], after["forest"]);
}

#[tokio::test]
async fn reset_reseeds() {
    let app = app();
    send(&app, post("/step?steps=200")).await;
    let (status, state) = send(&app, post("/reset")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state["stats"]["frame_index"], 0);
    assert_eq!(state["forest"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn config_is_exposed() {
    let app = app();
    let (status, config) = send(&app, get("/config")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(config["max_roots"], 50);
    let speed = config["growth_speed"].as_f64().unwrap();
    assert!((speed - 0.0007).abs() < 1e-9);
}
