//! Procedural root/branch growth simulation.
//!
//! - [`branch`] — the owned recursive branch tree.
//! - [`growth`] — per-tick growth and child spawning.
//! - [`seeding`] — initial and periodic edge roots.
//! - [`render`] — drawing the forest onto a [`render::DrawSurface`].
//! - [`simulation`] — state plus the frame driver.
//! - [`api`] — headless HTTP host.

pub mod api;
pub mod branch;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod growth;
pub mod render;
pub mod seeding;
pub mod simulation;
pub mod snapshot;
pub mod types;

#[cfg(feature = "ui")]
pub mod controls;
#[cfg(feature = "ui")]
pub mod visualization;

pub use config::GrowthConfig;
pub use simulation::Simulation;
