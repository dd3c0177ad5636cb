// API module for headless mode - HTTP endpoints to interact with the simulation

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::branch::Branch;
use crate::config::GrowthConfig;
use crate::frame::MonotonicClock;
use crate::render::CommandBuffer;
use crate::simulation::Simulation;
use crate::types::{DrawCommand, Rgba, Stats};
use ::rand::rngs::StdRng;
use ::rand::SeedableRng;

/// Synthetic frame length used by `/step` when `dt` is not given.
pub const DEFAULT_STEP_MS: f32 = 16.0;

#[derive(Serialize, Clone)]
pub struct SimulationStateResponse {
    pub surface_width: f32,
    pub surface_height: f32,
    pub paused: bool,
    pub forest: Vec<Branch>,
    pub stats: Stats,
}

#[derive(Serialize, Clone)]
pub struct FrameResponse {
    pub width: f32,
    pub height: f32,
    pub background: Option<Rgba>,
    pub commands: Vec<DrawCommand>,
}

#[derive(Deserialize)]
pub struct StepQuery {
    pub steps: Option<usize>,
    pub dt: Option<f32>,
}

#[derive(Deserialize)]
pub struct ResizeRequest {
    pub width: f32,
    pub height: f32,
}

// Shared state for the API server
#[derive(Clone)]
pub struct ApiState {
    pub simulation: Arc<Mutex<Simulation>>,
    pub rng: Arc<Mutex<StdRng>>,
}

impl ApiState {
    pub fn new(sim: Simulation) -> Self {
        Self::with_rng(sim, StdRng::from_entropy())
    }

    pub fn with_rng(sim: Simulation, rng: StdRng) -> Self {
        Self {
            simulation: Arc::new(Mutex::new(sim)),
            rng: Arc::new(Mutex::new(rng)),
        }
    }
}

/// Most ticks a single `/step` request may run while holding the simulation lock.
pub const MAX_STEPS_PER_REQUEST: usize = 10_000;

type ApiResult<T> = Result<Json<T>, StatusCode>;

// A poisoned lock means a stepping thread panicked; surface it as a 500
fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StatusCode> {
    mutex.lock().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

fn snapshot_state(sim: &Simulation) -> SimulationStateResponse {
    SimulationStateResponse {
        surface_width: sim.surface_width,
        surface_height: sim.surface_height,
        paused: sim.paused,
        forest: sim.forest.clone(),
        stats: sim.stats(),
    }
}

async fn get_state(State(api): State<ApiState>) -> ApiResult<SimulationStateResponse> {
    Ok(Json(snapshot_state(&*lock(&api.simulation)?)))
}

async fn get_stats(State(api): State<ApiState>) -> ApiResult<Stats> {
    Ok(Json(lock(&api.simulation)?.stats()))
}

async fn get_frame(State(api): State<ApiState>) -> ApiResult<FrameResponse> {
    let sim = lock(&api.simulation)?;
    let mut surface = CommandBuffer::new(sim.surface_width, sim.surface_height);
    sim.render(&mut surface);
    Ok(Json(FrameResponse {
        width: surface.width,
        height: surface.height,
        background: surface.background,
        commands: surface.commands,
    }))
}

/// Advance `steps` synthetic ticks of `dt` milliseconds, independent of the pause flag.
async fn step_simulation(
    Query(params): Query<StepQuery>,
    State(api): State<ApiState>,
) -> ApiResult<SimulationStateResponse> {
    let dt = params.dt.unwrap_or(DEFAULT_STEP_MS);
    let steps = params.steps.unwrap_or(1);
    if !(dt.is_finite() && dt >= 0.0) || steps > MAX_STEPS_PER_REQUEST {
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut sim = lock(&api.simulation)?;
    let mut rng = lock(&api.rng)?;
    for _ in 0..steps {
        sim.step(&mut *rng, dt);
    }
    Ok(Json(snapshot_state(&sim)))
}

async fn reset_simulation(State(api): State<ApiState>) -> ApiResult<SimulationStateResponse> {
    let mut sim = lock(&api.simulation)?;
    sim.reset(&mut *lock(&api.rng)?);
    Ok(Json(snapshot_state(&sim)))
}

async fn pause_simulation(State(api): State<ApiState>) -> ApiResult<serde_json::Value> {
    let mut sim = lock(&api.simulation)?;
    sim.toggle_pause();
    Ok(Json(serde_json::json!({ "paused": sim.paused })))
}

async fn resize_surface(
    State(api): State<ApiState>,
    Json(body): Json<ResizeRequest>,
) -> ApiResult<Stats> {
    if !(body.width > 0.0 && body.height > 0.0) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut sim = lock(&api.simulation)?;
    sim.resize(body.width, body.height);
    Ok(Json(sim.stats()))
}

async fn get_config(State(api): State<ApiState>) -> ApiResult<GrowthConfig> {
    Ok(Json(lock(&api.simulation)?.config.clone()))
}

pub fn create_router(api_state: ApiState) -> Router {
    Router::new()
        .route("/state", get(get_state))
        .route("/stats", get(get_stats))
        .route("/frame", get(get_frame))
        .route("/step", post(step_simulation))
        .route("/reset", post(reset_simulation))
        .route("/pause", post(pause_simulation))
        .route("/resize", post(resize_surface))
        .route("/config", get(get_config))
        .layer(CorsLayer::permissive())
        .with_state(api_state)
}

/// Serve the API and drive the simulation from wall-clock time until either task stops.
pub async fn run_server(api_state: ApiState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "rootweave headless API server listening");
    info!("endpoints: GET /state /stats /frame /config, POST /step?steps=N&dt=MS /reset /pause /resize");

    let ticker = tokio::spawn(frame_loop(api_state.clone()));
    let server = tokio::spawn(async move { axum::serve(listener, create_router(api_state)).await });

    tokio::select! {
        served = server => served??,
        _ = ticker => error!("frame loop stopped; shutting down"),
    }
    Ok(())
}

// Feeds real elapsed time to `Simulation::frame` at 60 Hz; pausing is handled there
async fn frame_loop(api_state: ApiState) {
    let period = Duration::from_secs_f32(1.0 / 60.0);
    let clock = MonotonicClock::start();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let (Ok(mut sim), Ok(mut rng)) = (api_state.simulation.lock(), api_state.rng.lock()) else {
            break;
        };
        sim.frame(&mut *rng, clock.now_ms());
    }
}
