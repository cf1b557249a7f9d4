//! Force generators
//!
//! Each variant carries only its own parameters. A generator adds its
//! contribution for one particle into that particle's force accumulator, which
//! the tick pipeline clears before every evaluation.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::StateBuffer;
use crate::angle_between;
use crate::consts::EPSILON;
use crate::error::ConfigError;

/// Standard gravity used when a scene does not set one
pub const EARTH_GRAVITY: f32 = 9.832;

/// Constant acceleration in one direction, scaled by each particle's mass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformGravity {
    pub strength: f32,
    /// Normalized when the system is configured
    pub down: Vec3,
}

impl Default for UniformGravity {
    fn default() -> Self {
        Self {
            strength: EARTH_GRAVITY,
            down: Vec3::NEG_Z,
        }
    }
}

/// Newtonian attraction toward one particle of the same system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointGravity {
    pub constant: f32,
    pub attractor: usize,
    /// Added to the squared distance to soften close encounters
    pub softening: f32,
}

impl Default for PointGravity {
    fn default() -> Self {
        Self {
            constant: 1.0,
            attractor: 0,
            softening: 2.0,
        }
    }
}

/// Linear velocity drag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drag {
    pub coefficient: f32,
}

/// Damped Hookean spring between two particles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub a: usize,
    pub b: usize,
    pub stiffness: f32,
    pub damping: f32,
    pub rest_length: f32,
}

/// Boids-style flocking (separation, alignment, cohesion)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flocking {
    /// Separation gain
    pub avoidance: f32,
    /// Alignment gain
    pub velocity_matching: f32,
    /// Cohesion gain
    pub centering: f32,
    /// Full weight inside this distance
    pub inner_radius: f32,
    /// Zero weight beyond this distance
    pub outer_radius: f32,
    /// Full-weight view cone, degrees
    pub frontal_deg: f32,
    /// Zero-weight view cone, degrees
    pub peripheral_deg: f32,
    /// Acceleration budget shared by the three behaviors
    pub residual: f32,
}

impl Default for Flocking {
    fn default() -> Self {
        Self {
            avoidance: 2.0,
            velocity_matching: 10.0,
            centering: 10.0,
            inner_radius: 15.0,
            outer_radius: 20.0,
            frontal_deg: 90.0,
            peripheral_deg: 150.0,
            residual: 1.0,
        }
    }
}

/// Constant force applied regardless of mass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticForce {
    /// Normalized when the system is configured
    pub direction: Vec3,
    pub magnitude: f32,
}

/// Inverse-power field around a fixed point, limited to a radius
///
/// Positive strength attracts toward the center, negative repels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadialField {
    pub center: Vec3,
    pub radius: f32,
    pub strength: f32,
    pub exponent: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Force {
    #[default]
    None,
    UniformGravity(UniformGravity),
    PointGravity(PointGravity),
    Drag(Drag),
    Spring(Spring),
    /// Reserved for mesh-connected springs; contributes nothing
    SpringMesh,
    Flocking(Flocking),
    Static(StaticForce),
    RadialField(RadialField),
}

impl Force {
    pub fn gravity(strength: f32, down: Vec3) -> Self {
        Force::UniformGravity(UniformGravity { strength, down })
    }

    pub fn drag(coefficient: f32) -> Self {
        Force::Drag(Drag { coefficient })
    }

    pub fn spring(a: usize, b: usize, stiffness: f32, damping: f32, rest_length: f32) -> Self {
        Force::Spring(Spring {
            a,
            b,
            stiffness,
            damping,
            rest_length,
        })
    }

    pub fn constant(direction: Vec3, magnitude: f32) -> Self {
        Force::Static(StaticForce {
            direction,
            magnitude,
        })
    }

    pub fn radial(center: Vec3, radius: f32, strength: f32, exponent: f32) -> Self {
        Force::RadialField(RadialField {
            center,
            radius,
            strength,
            exponent,
        })
    }

    /// Short name used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Force::None => "none",
            Force::UniformGravity(_) => "uniform gravity",
            Force::PointGravity(_) => "point gravity",
            Force::Drag(_) => "drag",
            Force::Spring(_) => "spring",
            Force::SpringMesh => "spring mesh",
            Force::Flocking(_) => "flocking",
            Force::Static(_) => "static force",
            Force::RadialField(_) => "radial field",
        }
    }

    /// Shift anything anchored in space by `delta`
    pub fn translate(&mut self, delta: Vec3) {
        if let Force::RadialField(r) = self {
            r.center += delta;
        }
    }

    /// Validate against the system capacity and normalize directions
    pub fn prepare(&mut self, capacity: usize) -> Result<(), ConfigError> {
        let generator = self.name();
        let check_index = |index: usize| {
            if index >= capacity {
                Err(ConfigError::ParticleIndexOutOfRange {
                    generator,
                    index,
                    capacity,
                })
            } else {
                Ok(())
            }
        };

        match self {
            Force::UniformGravity(g) => {
                g.down = g
                    .down
                    .try_normalize()
                    .ok_or(ConfigError::DegenerateAxes("uniform gravity direction"))?;
            }
            Force::PointGravity(p) => check_index(p.attractor)?,
            Force::Spring(s) => {
                check_index(s.a)?;
                check_index(s.b)?;
                if s.a == s.b {
                    return Err(ConfigError::SelfSpring(s.a));
                }
            }
            Force::Flocking(f) => {
                if f.inner_radius > f.outer_radius {
                    return Err(ConfigError::InvertedRange {
                        attribute: "flocking radius",
                        min: f.inner_radius,
                        max: f.outer_radius,
                    });
                }
                if f.frontal_deg > f.peripheral_deg {
                    return Err(ConfigError::InvertedRange {
                        attribute: "flocking view cone",
                        min: f.frontal_deg,
                        max: f.peripheral_deg,
                    });
                }
            }
            Force::Static(s) => {
                s.direction = s
                    .direction
                    .try_normalize()
                    .ok_or(ConfigError::DegenerateAxes("static force direction"))?;
            }
            Force::None | Force::Drag(_) | Force::SpringMesh | Force::RadialField(_) => {}
        }
        Ok(())
    }

    /// Accumulate this generator's contribution for particle `index`
    pub fn apply(&self, state: &mut StateBuffer, index: usize) {
        match self {
            Force::None | Force::SpringMesh => {}
            Force::UniformGravity(g) => {
                let f = g.down * (g.strength * state.mass(index));
                state.add_force(index, f);
            }
            Force::PointGravity(p) => apply_point_gravity(p, state, index),
            Force::Drag(d) => {
                let f = state.velocity(index) * (state.mass(index) * d.coefficient);
                state.add_force(index, -f);
            }
            Force::Spring(s) => apply_spring(s, state, index),
            Force::Flocking(f) => {
                let accel = flocking_acceleration(f, state, index);
                state.add_force(index, accel * state.mass(index));
            }
            Force::Static(s) => state.add_force(index, s.direction * s.magnitude),
            Force::RadialField(r) => apply_radial_field(r, state, index),
        }
    }
}

fn apply_point_gravity(p: &PointGravity, state: &mut StateBuffer, index: usize) {
    if index == p.attractor {
        return;
    }
    let dir = state.position(p.attractor) - state.position(index);
    let dist = dir.length();
    if dist < EPSILON {
        return;
    }
    // No far-field cutoff: distant particles keep a non-vanishing pull
    let magnitude = p.constant * state.mass(p.attractor) * state.mass(index)
        / (dist * dist + p.softening);
    state.add_force(index, dir / dist * magnitude);
}

/// Only the first endpoint computes, so each spring is counted once per pass
fn apply_spring(s: &Spring, state: &mut StateBuffer, index: usize) {
    if index != s.a {
        return;
    }
    let dir = state.position(s.b) - state.position(s.a);
    let dist = dir.length();
    if dist < EPSILON {
        return;
    }
    let unit = dir / dist;
    let stretch = s.stiffness * (dist - s.rest_length);
    let closing = (state.velocity(s.b) - state.velocity(s.a)).dot(unit);
    let f = unit * (stretch + s.damping * closing);
    state.add_force(s.a, f);
    state.add_force(s.b, -f);
}

fn apply_radial_field(r: &RadialField, state: &mut StateBuffer, index: usize) {
    let to_center = r.center - state.position(index);
    let dist = to_center.length();
    if dist < EPSILON || dist > r.radius {
        return;
    }
    // Inverse powers blow up below unit distance; only an attracting field
    // pulls particles into that range
    if r.strength > 0.0 && dist < 1.0 {
        return;
    }
    let falloff = (1.0 / dist).powf(r.exponent);
    let f = to_center / dist * (r.strength * falloff * state.mass(index));
    state.add_force(index, f);
}

fn distance_weight(f: &Flocking, dist: f32) -> f32 {
    if dist < f.inner_radius {
        1.0
    } else if dist < f.outer_radius {
        (f.outer_radius - dist) / (f.outer_radius - f.inner_radius)
    } else {
        0.0
    }
}

fn view_weight(f: &Flocking, angle: f32) -> f32 {
    let front = f.frontal_deg.to_radians() * 0.5;
    let side = f.peripheral_deg.to_radians() * 0.5;
    if angle <= front {
        1.0
    } else if angle <= side {
        (side - angle) / (side - front)
    } else {
        0.0
    }
}

/// Flocking acceleration of particle `index` against every other particle
fn flocking_acceleration(f: &Flocking, state: &StateBuffer, index: usize) -> Vec3 {
    let pos = state.position(index);
    let vel = state.velocity(index);

    let mut separation = Vec3::ZERO;
    let mut alignment = Vec3::ZERO;
    let mut cohesion = Vec3::ZERO;

    for other in 0..state.capacity() {
        if other == index {
            continue;
        }
        let offset = state.position(other) - pos;
        let dist = offset.length();
        if dist < EPSILON {
            continue;
        }
        let weight = distance_weight(f, dist) * view_weight(f, angle_between(vel, offset));
        if weight <= 0.0 {
            continue;
        }
        separation -= offset / dist * (weight * f.avoidance / dist);
        alignment += (state.velocity(other) - vel) * (weight * f.velocity_matching);
        cohesion += offset * (weight * f.centering);
    }

    // Higher-priority behaviors consume the budget first
    let mut budget = f.residual;
    let mut total = Vec3::ZERO;
    for part in [separation, alignment, cohesion] {
        let take = part.length().min(budget.max(0.0));
        total += part.normalize_or_zero() * take;
        budget -= take;
    }
    total
}
