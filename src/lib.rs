//! Particle Systems - a system of particle systems
//!
//! Core modules:
//! - `sim`: Deterministic simulation (state store, forces, constraints, integrators)
//! - `color`: HSI color model helpers for renderers reading the state store
//! - `presets`: Ready-made scenes (vortex, flocking, flame, springs)
//! - `config`: JSON run configuration for the headless runner
//! - `error`: Configuration error taxonomy

pub mod color;
pub mod config;
pub mod error;
pub mod presets;
pub mod sim;

pub use config::{RunConfig, SceneSource};
pub use error::ConfigError;
pub use presets::ScenePreset;

use glam::Vec3;

/// Simulation configuration constants
pub mod consts {
    /// Default fixed timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Magnitude of the random velocity kick applied by a nudge
    pub const NUDGE_MAGNITUDE: f32 = 4.0;
    /// Lengths below this are treated as zero before normalizing or dividing
    pub const EPSILON: f32 = 1.0e-6;
    /// Default seed when a scene does not provide one
    pub const DEFAULT_SEED: u64 = 0x5EED_0F_9A57;
    /// Default number of ticks run by the headless runner
    pub const DEFAULT_TICKS: u64 = 600;
}

/// Uniformly random unit vector scaled by `scale`
///
/// Samples z uniformly in [-1, 1] and the azimuth uniformly in [0, 2π), which
/// yields a uniform distribution over the sphere surface.
#[inline]
pub fn random_direction<R: rand::Rng + ?Sized>(rng: &mut R, scale: f32) -> Vec3 {
    let theta = rng.random::<f32>() * std::f32::consts::TAU;
    let z = rng.random::<f32>() * 2.0 - 1.0;
    let planar = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(planar * theta.cos(), planar * theta.sin(), z) * scale
}

/// Linear sample inside [min, max]; returns `min` when the range is empty
#[inline]
pub fn random_in<R: rand::Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

/// Angle between two vectors in radians, 0 when either is degenerate
#[inline]
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let denom = a.length() * b.length();
    if denom < consts::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}
