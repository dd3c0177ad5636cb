use ::rand as external_rand;
use external_rand::Rng;
use macroquad::prelude::*;

use crate::simulation::Simulation;
use crate::types::Vec2 as Point;

/// Requests the window loop has to act on itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlRequests {
    pub toggle_help: bool,
    pub screenshot: bool,
}

pub fn handle_controls<R: Rng + ?Sized>(sim: &mut Simulation, rng: &mut R) -> ControlRequests {
    let mut requests = ControlRequests::default();

    if is_key_pressed(KeyCode::Space) {
        sim.toggle_pause();
    }

    if is_key_pressed(KeyCode::R) {
        sim.reset(rng);
    }

    if is_key_pressed(KeyCode::Right) {
        sim.increase_speed();
    }
    if is_key_pressed(KeyCode::Left) {
        sim.decrease_speed();
    }
    if is_key_pressed(KeyCode::Key0) {
        sim.reset_speed();
    }

    // Plant a root under the cursor, pointing away from the nearest horizontal edge
    if is_mouse_button_pressed(MouseButton::Left) {
        let (mx, my) = mouse_position();
        let angle = if my > sim.surface_height * 0.5 {
            -std::f32::consts::FRAC_PI_2
        } else {
            std::f32::consts::FRAC_PI_2
        };
        let width = sim.config.initial_side_width;
        sim.spawn_root_at(rng, Point::new(mx, my), angle, width);
    }

    requests.toggle_help = is_key_pressed(KeyCode::F1);
    requests.screenshot = is_key_pressed(KeyCode::P);
    requests
}
