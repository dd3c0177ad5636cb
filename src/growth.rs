// Growth engine: advances growth progress and spawns child branches once per tick

use ::rand as external_rand;
use external_rand::Rng;

use crate::branch::Branch;
use crate::config::GrowthConfig;
use crate::geometry::{perturb_angle, random_in, random_int};

/// Branching parameters for a parent of a given generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BranchRule {
    pub threshold: f32,
    pub chance: f64,
    pub angle_range: f32,
    pub width_factor: f32,
    pub max_children: (u32, u32),
}

impl BranchRule {
    pub fn for_generation(config: &GrowthConfig, generation: u32) -> Self {
        if generation == 0 {
            Self {
                threshold: config.root_spawn_threshold,
                chance: config.root_spawn_chance,
                angle_range: config.root_child_angle_range,
                width_factor: config.root_child_width_factor,
                max_children: config.root_child_max_children,
            }
        } else {
            Self {
                threshold: config.branch_spawn_threshold,
                chance: config.branch_spawn_chance,
                angle_range: config.branch_child_angle_range,
                width_factor: config.branch_child_width_factor,
                max_children: config.branch_child_max_children,
            }
        }
    }
}

/// Grow every unfinished branch by `growth_speed * delta_ms * depth_factor`, clamped at 1.
pub fn advance_growth(forest: &mut [Branch], delta_ms: f32, config: &GrowthConfig) {
    // A clock running backwards must not shrink anything
    let delta_ms = delta_ms.max(0.0);
    for root in forest.iter_mut() {
        grow(root, delta_ms, config);
    }
}

fn grow(branch: &mut Branch, delta_ms: f32, config: &GrowthConfig) {
    if branch.growth_progress < 1.0 {
        let depth_factor = if branch.is_root() {
            config.root_depth_factor
        } else {
            config.child_depth_factor
        };
        branch.growth_progress =
            (branch.growth_progress + config.growth_speed * delta_ms * depth_factor).min(1.0);
    }
    for child in branch.children.iter_mut() {
        grow(child, delta_ms, config);
    }
}

/// Whether `parent` may take another child this tick, before the random draw.
pub fn is_eligible(parent: &Branch, config: &GrowthConfig) -> bool {
    let rule = BranchRule::for_generation(config, parent.generation);
    parent.growth_progress >= rule.threshold && parent.has_room()
}

/// Build a child starting at the parent's current tip.
pub fn make_child<R: Rng + ?Sized>(parent: &Branch, config: &GrowthConfig, rng: &mut R) -> Branch {
    let rule = BranchRule::for_generation(config, parent.generation);
    let angle = perturb_angle(rng, parent.angle, rule.angle_range);
    let length = parent.length * random_in(rng, config.child_length_factor);
    let max_children = if parent.generation < config.generation_ceiling {
        random_int(rng, rule.max_children)
    } else {
        0
    };

    Branch {
        origin: parent.tip(),
        angle,
        length,
        width: parent.width * rule.width_factor,
        generation: parent.generation + 1,
        growth_progress: 0.0,
        max_children,
        children: Vec::new(),
    }
}

/// Give every eligible branch one chance to sprout a child.
///
/// A parent decides before its existing children are visited; a child created
/// this tick is appended after that visit, so it is not processed until the
/// next tick. `capacity` limits how many children may be created in this call.
/// Returns the number of children created.
pub fn spawn_branches<R: Rng + ?Sized>(
    forest: &mut [Branch],
    config: &GrowthConfig,
    rng: &mut R,
    capacity: Option<usize>,
) -> usize {
    let mut spawned = 0;
    for root in forest.iter_mut() {
        spawn_in(root, config, rng, capacity, &mut spawned);
    }
    spawned
}

fn spawn_in<R: Rng + ?Sized>(
    branch: &mut Branch,
    config: &GrowthConfig,
    rng: &mut R,
    capacity: Option<usize>,
    spawned: &mut usize,
) {
    let has_capacity = capacity.map_or(true, |cap| *spawned < cap);
    let chance = BranchRule::for_generation(config, branch.generation).chance;
    let new_child = if has_capacity && is_eligible(branch, config) && rng.gen_bool(chance) {
        Some(make_child(branch, config, rng))
    } else {
        None
    };
    if new_child.is_some() {
        *spawned += 1;
    }

    for child in branch.children.iter_mut() {
        spawn_in(child, config, rng, capacity, spawned);
    }

    if let Some(child) = new_child {
        branch.children.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::visit_forest;
    use crate::types::Vec2;
    use external_rand::rngs::StdRng;
    use external_rand::SeedableRng;

    fn always_spawn() -> GrowthConfig {
        GrowthConfig {
            root_spawn_chance: 1.0,
            branch_spawn_chance: 1.0,
            ..Default::default()
        }
    }

    fn root() -> Branch {
        Branch::new_root(Vec2::ZERO, 0.0, 100.0, 12.0, 3)
    }

    #[test]
    fn root_grows_at_full_speed_and_clamps() {
        let config = GrowthConfig::default();
        let mut forest = vec![root()];

        advance_growth(&mut forest, 16.0, &config);
        assert!((forest[0].growth_progress - 0.0112).abs() < 1e-6);

        advance_growth(&mut forest, 1_000_000.0, &config);
        assert_eq!(forest[0].growth_progress, 1.0);
    }

    #[test]
    fn children_grow_with_flat_discount() {
        let config = GrowthConfig::default();
        let mut parent = root();
        parent.growth_progress = 1.0;
        let mut child = make_child(&parent, &config, &mut StdRng::seed_from_u64(3));
        let grandchild = make_child(&child, &config, &mut StdRng::seed_from_u64(4));
        child.children.push(grandchild);
        parent.children.push(child);
        let mut forest = vec![parent];

        advance_growth(&mut forest, 100.0, &config);
        let child = &forest[0].children[0];
        assert!((child.growth_progress - 0.056).abs() < 1e-6);
        // Not further scaled by depth
        assert!((child.children[0].growth_progress - 0.056).abs() < 1e-6);
    }

    #[test]
    fn negative_delta_never_shrinks() {
        let config = GrowthConfig::default();
        let mut forest = vec![root()];
        forest[0].growth_progress = 0.4;
        advance_growth(&mut forest, -50.0, &config);
        assert_eq!(forest[0].growth_progress, 0.4);
    }

    #[test]
    fn no_spawn_below_threshold() {
        let config = always_spawn();
        let mut rng = StdRng::seed_from_u64(11);
        let mut forest = vec![root()];
        forest[0].growth_progress = 0.69;

        assert_eq!(spawn_branches(&mut forest, &config, &mut rng, None), 0);
        assert!(forest[0].children.is_empty());

        forest[0].growth_progress = 0.7;
        assert_eq!(spawn_branches(&mut forest, &config, &mut rng, None), 1);
        assert_eq!(forest[0].children.len(), 1);
    }

    #[test]
    fn deeper_parents_need_higher_threshold() {
        let config = always_spawn();
        let mut rng = StdRng::seed_from_u64(5);
        let mut parent = root();
        parent.growth_progress = 1.0;
        parent.max_children = 1;
        let mut child = make_child(&parent, &config, &mut rng);
        child.max_children = 2;
        child.growth_progress = 0.72;
        parent.children.push(child);

        let mut forest = vec![parent];
        assert_eq!(spawn_branches(&mut forest, &config, &mut rng, None), 0);

        forest[0].children[0].growth_progress = 0.75;
        assert_eq!(spawn_branches(&mut forest, &config, &mut rng, None), 1);
        assert_eq!(forest[0].children[0].children.len(), 1);
    }

    #[test]
    fn child_starts_at_parent_tip_and_stays_there() {
        let config = always_spawn();
        let mut rng = StdRng::seed_from_u64(8);
        let mut forest = vec![root()];
        forest[0].growth_progress = 0.8;

        spawn_branches(&mut forest, &config, &mut rng, None);
        let origin = forest[0].children[0].origin;
        assert!((origin.x - 80.0).abs() < 1e-4);
        assert!(origin.y.abs() < 1e-4);

        advance_growth(&mut forest, 1000.0, &config);
        assert_eq!(forest[0].children[0].origin, origin);
    }

    #[test]
    fn child_attributes_follow_parent() {
        let config = GrowthConfig::default();
        let mut rng = StdRng::seed_from_u64(21);
        let mut parent = root();
        parent.growth_progress = 1.0;

        for _ in 0..200 {
            let child = make_child(&parent, &config, &mut rng);
            assert!(child.angle > -0.4 && child.angle < 0.4);
            assert!(child.length >= 60.0 && child.length < 80.0);
            assert!((child.width - 12.0 * 0.7).abs() < 1e-5);
            assert!((1..=3).contains(&child.max_children));
            assert_eq!(child.generation, 1);
            assert_eq!(child.growth_progress, 0.0);
        }

        let child = make_child(&parent, &config, &mut rng);
        for _ in 0..200 {
            let grandchild = make_child(&child, &config, &mut rng);
            assert!((grandchild.angle - child.angle).abs() < 0.45);
            assert!((grandchild.width - child.width * 0.8).abs() < 1e-5);
            assert!((1..=2).contains(&grandchild.max_children));
        }
    }

    #[test]
    fn branching_stops_past_generation_ceiling() {
        let config = GrowthConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut parent = root();
        parent.generation = 10;
        parent.growth_progress = 1.0;
        assert_eq!(make_child(&parent, &config, &mut rng).max_children, 0);

        parent.generation = 9;
        assert!(make_child(&parent, &config, &mut rng).max_children > 0);
    }

    #[test]
    fn new_child_is_not_visited_in_the_same_tick() {
        let config = GrowthConfig {
            root_spawn_threshold: 0.0,
            branch_spawn_threshold: 0.0,
            ..always_spawn()
        };
        let mut rng = StdRng::seed_from_u64(13);
        let mut forest = vec![root()];

        // With zero thresholds a visited fresh child would itself spawn
        assert_eq!(spawn_branches(&mut forest, &config, &mut rng, None), 1);
        assert!(forest[0].children[0].children.is_empty());

        assert_eq!(spawn_branches(&mut forest, &config, &mut rng, None), 2);
    }

    #[test]
    fn capacity_limits_spawning() {
        let config = always_spawn();
        let mut rng = StdRng::seed_from_u64(17);
        let mut forest: Vec<Branch> = (0..5)
            .map(|_| {
                let mut r = root();
                r.growth_progress = 1.0;
                r
            })
            .collect();

        assert_eq!(spawn_branches(&mut forest, &config, &mut rng, Some(2)), 2);
        let mut total = 0;
        visit_forest(&forest, &mut |_| total += 1);
        assert_eq!(total, 7);
    }

    #[test]
    fn max_children_is_respected() {
        let config = always_spawn();
        let mut rng = StdRng::seed_from_u64(23);
        let mut forest = vec![root()];
        forest[0].growth_progress = 1.0;
        forest[0].max_children = 2;

        for _ in 0..10 {
            spawn_branches(&mut forest, &config, &mut rng, None);
        }
        assert_eq!(forest[0].children.len(), 2);
    }
}
