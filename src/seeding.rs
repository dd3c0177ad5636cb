// Edge seeding: the initial roots and the roots that keep appearing from the surface edges

use ::rand as external_rand;
use external_rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use tracing::debug;

use crate::branch::Branch;
use crate::config::GrowthConfig;
use crate::geometry::{perturb_angle, random_in, random_int};
use crate::types::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Bottom,
    Top,
    Left,
    Right,
}

impl Edge {
    /// Direction pointing into the surface from this edge.
    pub fn inward_angle(self) -> f32 {
        match self {
            Edge::Bottom => -FRAC_PI_2,
            Edge::Top => FRAC_PI_2,
            Edge::Left => 0.0,
            Edge::Right => PI,
        }
    }

    /// Point on this edge, `t` in [0, 1] measured along it.
    pub fn point(self, t: f32, width: f32, height: f32) -> Vec2 {
        match self {
            Edge::Bottom => Vec2::new(t * width, height),
            Edge::Top => Vec2::new(t * width, 0.0),
            Edge::Left => Vec2::new(0.0, t * height),
            Edge::Right => Vec2::new(width, t * height),
        }
    }

    pub fn pick<R: Rng + ?Sized>(rng: &mut R, config: &GrowthConfig) -> Self {
        let w = &config.edge_weights;
        let roll = rng.gen_range(0.0..w.total());
        if roll < w.bottom {
            Edge::Bottom
        } else if roll < w.bottom + w.top {
            Edge::Top
        } else if roll < w.bottom + w.top + w.left {
            Edge::Left
        } else {
            Edge::Right
        }
    }
}

/// Append a root with randomized length, width jitter and child capacity.
///
/// Not bounded by `max_roots`; only the periodic policy checks the cap.
pub fn add_root<R: Rng + ?Sized>(
    forest: &mut Vec<Branch>,
    surface: (f32, f32),
    origin: Vec2,
    angle: f32,
    base_width: f32,
    config: &GrowthConfig,
    rng: &mut R,
) {
    let (width, height) = surface;
    let length = width.max(height) * random_in(rng, config.root_length_fraction);
    let stroke = base_width + random_in(rng, (0.0, config.root_width_jitter));
    let max_children = random_int(rng, config.root_max_children);
    forest.push(Branch::new_root(origin, angle, length, stroke, max_children));
}

/// Seed the opening layout: roots along the bottom plus one each from left, right and top.
pub fn seed_initial_roots<R: Rng + ?Sized>(
    forest: &mut Vec<Branch>,
    surface: (f32, f32),
    config: &GrowthConfig,
    rng: &mut R,
) {
    let (width, height) = surface;
    let bottom_band = config.initial_bottom_angle_jitter * 2.0;
    let side_band = config.initial_side_angle_jitter * 2.0;

    for _ in 0..config.initial_bottom_roots {
        let origin = Edge::Bottom.point(rng.gen::<f32>(), width, height);
        let angle = perturb_angle(rng, Edge::Bottom.inward_angle(), bottom_band);
        add_root(forest, surface, origin, angle, config.initial_bottom_width, config, rng);
    }

    let fixed = [
        (Edge::Left, 0.7),
        (Edge::Right, 0.6),
        (Edge::Top, 0.4),
    ];
    for (edge, t) in fixed {
        let origin = edge.point(t, width, height);
        let angle = perturb_angle(rng, edge.inward_angle(), side_band);
        add_root(forest, surface, origin, angle, config.initial_side_width, config, rng);
    }
    debug!(roots = forest.len(), "seeded initial roots");
}

/// Add a root at a random edge position.
pub fn add_edge_root<R: Rng + ?Sized>(
    forest: &mut Vec<Branch>,
    surface: (f32, f32),
    config: &GrowthConfig,
    rng: &mut R,
) -> Edge {
    let (width, height) = surface;
    let edge = Edge::pick(rng, config);
    let origin = edge.point(rng.gen::<f32>(), width, height);
    let angle = perturb_angle(rng, edge.inward_angle(), config.edge_angle_jitter * 2.0);
    let base_width = random_in(rng, config.edge_root_width);
    add_root(forest, surface, origin, angle, base_width, config, rng);
    edge
}

/// One seeding check: with probability `chance`, and only below `max_roots`, add an edge root.
/// Returns whether a root was added.
pub fn maybe_seed_edge_root<R: Rng + ?Sized>(
    forest: &mut Vec<Branch>,
    surface: (f32, f32),
    chance: f64,
    config: &GrowthConfig,
    rng: &mut R,
) -> bool {
    if !rng.gen_bool(chance) || forest.len() >= config.max_roots {
        return false;
    }
    let edge = add_edge_root(forest, surface, config, rng);
    debug!(?edge, roots = forest.len(), "seeded edge root");
    true
}
