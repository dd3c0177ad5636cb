use ::rand as external_rand;
use external_rand::Rng;
use tracing::info;

use crate::branch::{forest_count, Branch, Forest};
use crate::config::GrowthConfig;
use crate::frame::FrameClock;
use crate::growth::{advance_growth, spawn_branches};
use crate::render::{render, DrawSurface, RenderStyle};
use crate::seeding::{add_root, maybe_seed_edge_root, seed_initial_roots};
use crate::types::{Stats, Vec2};

// Simulation state - contains all mutable state data
#[derive(Clone, Debug, Default)]
pub struct SimulationState {
    pub forest: Forest,
    pub surface_width: f32,
    pub surface_height: f32,
    pub branch_count: usize, // running total, kept in step with `forest`
    pub frame_index: u64,
    pub elapsed_ms: f64,
}

impl SimulationState {
    pub fn new(surface_width: f32, surface_height: f32) -> Self {
        Self {
            surface_width,
            surface_height,
            ..Default::default()
        }
    }

    pub fn surface(&self) -> (f32, f32) {
        (self.surface_width, self.surface_height)
    }
}

// Simulation - contains state, config, and control flags
pub struct Simulation {
    pub state: SimulationState,
    pub config: GrowthConfig,
    pub style: RenderStyle,
    pub paused: bool,
    pub speed_multiplier: f32,
    clock: FrameClock,
}

// Implement Deref for convenience - allows sim.forest instead of sim.state.forest
impl std::ops::Deref for Simulation {
    type Target = SimulationState;
    fn deref(&self) -> &Self::Target {
        &self.state
    }
}

impl std::ops::DerefMut for Simulation {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.state
    }
}

impl Simulation {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_config(rng, GrowthConfig::default())
    }

    /// Seed the initial roots on a surface sized from `config`.
    pub fn with_config<R: Rng + ?Sized>(rng: &mut R, config: GrowthConfig) -> Self {
        let (width, height) = (config.surface_width, config.surface_height);
        Self::with_surface(rng, config, width, height)
    }

    pub fn with_surface<R: Rng + ?Sized>(
        rng: &mut R,
        config: GrowthConfig,
        width: f32,
        height: f32,
    ) -> Self {
        let mut state = SimulationState::new(width, height);
        let surface = state.surface();
        seed_initial_roots(&mut state.forest, surface, &config, rng);
        state.branch_count = forest_count(&state.forest);

        Self {
            state,
            style: RenderStyle::from_config(&config),
            config,
            paused: false,
            speed_multiplier: 1.0,
            clock: FrameClock::new(),
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
    pub fn increase_speed(&mut self) {
        self.speed_multiplier = (self.speed_multiplier * 1.5).min(10.0);
    }
    pub fn decrease_speed(&mut self) {
        self.speed_multiplier = (self.speed_multiplier / 1.5).max(0.1);
    }
    pub fn reset_speed(&mut self) {
        self.speed_multiplier = 1.0;
    }

    /// Drop every branch and seed a fresh opening layout on the current surface.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let (width, height) = self.state.surface();
        self.state = SimulationState::new(width, height);
        seed_initial_roots(&mut self.state.forest, (width, height), &self.config, rng);
        self.state.branch_count = forest_count(&self.state.forest);
        self.clock.reset();
        info!(roots = self.state.forest.len(), "simulation reset");
    }

    /// Resize the drawing surface. Existing branches keep their absolute coordinates.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.state.surface_width = width;
        self.state.surface_height = height;
        info!(width, height, "surface resized");
    }

    /// Explicitly add a root. Not subject to the edge-seeding root cap.
    pub fn spawn_root_at<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        origin: Vec2,
        angle: f32,
        base_width: f32,
    ) {
        let surface = self.state.surface();
        add_root(&mut self.state.forest, surface, origin, angle, base_width, &self.config, rng);
        self.state.branch_count += 1;
    }

    fn remaining_capacity(&self) -> Option<usize> {
        self.config
            .max_branches
            .map(|cap| cap.saturating_sub(self.state.branch_count))
    }

    /// One engine tick: grow, branch, then run the edge-seeding checks.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R, delta_ms: f32) {
        self.state.frame_index = self.state.frame_index.wrapping_add(1);
        self.state.elapsed_ms += delta_ms.max(0.0) as f64;

        advance_growth(&mut self.state.forest, delta_ms, &self.config);

        let capacity = self.remaining_capacity();
        let spawned = spawn_branches(&mut self.state.forest, &self.config, rng, capacity);
        self.state.branch_count += spawned;

        let surface = self.state.surface();
        for &chance in &self.config.edge_seed_chances {
            if self.remaining_capacity() == Some(0) {
                break;
            }
            if maybe_seed_edge_root(&mut self.state.forest, surface, chance, &self.config, rng) {
                self.state.branch_count += 1;
            }
        }
    }

    /// Frame-driver entry point: derive the delta from a clock reading and step
    /// unless paused. Returns whether the simulation advanced.
    pub fn frame<R: Rng + ?Sized>(&mut self, rng: &mut R, now_ms: f64) -> bool {
        let delta_ms = self.clock.tick(now_ms);
        if self.paused {
            return false;
        }
        self.step(rng, (delta_ms * self.speed_multiplier as f64) as f32);
        true
    }

    pub fn render<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        render(&self.state.forest, surface, &self.style);
    }

    pub fn stats(&self) -> Stats {
        let mut growing_count = 0;
        let mut max_generation = 0;
        let mut visit = |b: &Branch| {
            if b.growth_progress < 1.0 {
                growing_count += 1;
            }
            max_generation = max_generation.max(b.generation);
        };
        for root in &self.state.forest {
            root.visit(&mut visit);
        }

        Stats {
            root_count: self.state.forest.len(),
            branch_count: self.state.branch_count,
            growing_count,
            max_generation,
            frame_index: self.state.frame_index,
            elapsed_ms: self.state.elapsed_ms,
        }
    }
}
