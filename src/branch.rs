use serde::{Deserialize, Serialize};

use crate::geometry::tip_point;
use crate::types::Vec2;

/// A single growing segment. Roots are generation 0.
///
/// Everything except `growth_progress` and `children` is fixed at creation.
/// Children are owned exclusively by their parent and only ever appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub origin: Vec2,
    pub angle: f32,
    pub length: f32,
    pub width: f32,
    pub generation: u32,
    pub growth_progress: f32, // fraction of `length` currently drawn, in [0, 1]
    pub max_children: u32,
    pub children: Vec<Branch>,
}

/// Ordered list of roots.
pub type Forest = Vec<Branch>;

impl Branch {
    pub fn new_root(origin: Vec2, angle: f32, length: f32, width: f32, max_children: u32) -> Self {
        Self {
            origin,
            angle,
            length,
            width,
            generation: 0,
            growth_progress: 0.0,
            max_children,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.generation == 0
    }

    pub fn is_fully_grown(&self) -> bool {
        self.growth_progress >= 1.0
    }

    /// Current tip, where a child spawned right now would start.
    pub fn tip(&self) -> Vec2 {
        tip_point(self.origin, self.angle, self.length, self.growth_progress)
    }

    pub fn full_tip(&self) -> Vec2 {
        tip_point(self.origin, self.angle, self.length, 1.0)
    }

    pub fn has_room(&self) -> bool {
        (self.children.len() as u32) < self.max_children
    }

    /// Number of branches in this subtree, self included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Branch::count).sum::<usize>()
    }

    pub fn max_generation(&self) -> u32 {
        self.children
            .iter()
            .map(Branch::max_generation)
            .max()
            .unwrap_or(self.generation)
    }

    /// Pre-order walk over this subtree.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Branch)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

pub fn forest_count(forest: &[Branch]) -> usize {
    forest.iter().map(Branch::count).sum()
}

pub fn visit_forest<'a>(forest: &'a [Branch], f: &mut impl FnMut(&'a Branch)) {
    for root in forest {
        root.visit(f);
    }
}
