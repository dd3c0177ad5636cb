use macroquad::prelude as mq;

use crate::render::DrawSurface;
use crate::types::{Rgba, Stats, Vec2};

pub fn to_color(c: Rgba) -> mq::Color {
    mq::Color::new(c.r, c.g, c.b, c.a)
}

/// The macroquad window as a draw target.
pub struct ScreenSurface {
    width: f32,
    height: f32,
}

impl ScreenSurface {
    pub fn new() -> Self {
        Self {
            width: mq::screen_width(),
            height: mq::screen_height(),
        }
    }
}

impl Default for ScreenSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawSurface for ScreenSurface {
    fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    // The window owns its real size; this only tracks it
    fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    fn clear(&mut self, background: Rgba) {
        mq::clear_background(to_color(background));
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        let color = to_color(color);
        mq::draw_line(from.x, from.y, to.x, to.y, width, color);
        // Round caps
        let r = width * 0.5;
        mq::draw_circle(from.x, from.y, r, color);
        mq::draw_circle(to.x, to.y, r, color);
    }
}

pub fn draw_stats_and_help(stats: &Stats, paused: bool, speed_multiplier: f32) {
    let status = if paused { "PAUSED" } else { "growing" };
    let lines = [
        format!(
            "roots: {}  branches: {}  growing: {}  depth: {}",
            stats.root_count, stats.branch_count, stats.growing_count, stats.max_generation
        ),
        format!(
            "{}  speed x{:.2}  t = {:.1}s",
            status,
            speed_multiplier,
            stats.elapsed_ms / 1000.0
        ),
    ];

    let mut y = 20.0;
    for line in &lines {
        mq::draw_text(line, 10.0, y, 18.0, mq::Color::new(0.8, 0.8, 0.8, 0.8));
        y += 20.0;
    }
}

pub fn draw_help_popup() {
    let entries = [
        "Space  pause / resume",
        "R      reset forest",
        "Left   slower",
        "Right  faster",
        "0      normal speed",
        "Click  plant a root",
        "P      save PNG snapshot",
        "F1     toggle this help",
    ];
    let x = 20.0;
    let mut y = 70.0;
    let height = entries.len() as f32 * 20.0 + 20.0;
    mq::draw_rectangle(x - 10.0, y - 20.0, 260.0, height, mq::Color::new(0.0, 0.0, 0.0, 0.7));
    for entry in entries {
        mq::draw_text(entry, x, y, 18.0, mq::WHITE);
        y += 20.0;
    }
}
