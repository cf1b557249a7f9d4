//! Constraint generators
//!
//! A constraint inspects one particle's transition from the previous state to
//! the freshly integrated next state and may rewrite the next position,
//! velocity or color. Collision shapes bounce particles with a restitution
//! coefficient; the color and compander variants are pure post-processing.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::{Frame, crossed, ray_sphere_entry, reflect, signed_distance, split_normal};
use super::state::{ColorChannel, StateBuffer};
use crate::consts::EPSILON;
use crate::error::ConfigError;

/// Box that keeps particles inside, oriented by two in-plane directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientedBox {
    pub center: Vec3,
    /// Full extents along the length, width and normal axes
    pub size: Vec3,
    pub length_dir: Vec3,
    pub width_dir: Vec3,
    pub restitution: f32,
}

impl OrientedBox {
    pub fn new(
        center: Vec3,
        size: Vec3,
        length_dir: Vec3,
        width_dir: Vec3,
        restitution: f32,
    ) -> Self {
        Self {
            center,
            size,
            length_dir,
            width_dir,
            restitution,
        }
    }

    /// Rebuilt from the current axes so in-place edits take effect
    fn frame(&self) -> Option<Frame> {
        Frame::from_axes(self.length_dir, self.width_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
    pub restitution: f32,
}

/// Finite rectangular plate; its normal is `length_dir × width_dir`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plate {
    pub center: Vec3,
    pub length_dir: Vec3,
    pub width_dir: Vec3,
    pub half_length: f32,
    pub half_width: f32,
    pub restitution: f32,
}

impl Plate {
    pub fn new(
        center: Vec3,
        length_dir: Vec3,
        width_dir: Vec3,
        half_length: f32,
        half_width: f32,
        restitution: f32,
    ) -> Self {
        Self {
            center,
            length_dir,
            width_dir,
            half_length,
            half_width,
            restitution,
        }
    }

    /// Rebuilt from the current axes so in-place edits take effect
    fn frame(&self) -> Option<Frame> {
        Frame::from_axes(self.length_dir, self.width_dir)
    }
}

/// Plate with a circular opening around its center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoledPlate {
    #[serde(flatten)]
    pub plate: Plate,
    /// Clamped to the smaller half extent when the system is configured
    pub hole_radius: f32,
}

/// Unbounded plane through `point`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InfinitePlane {
    pub point: Vec3,
    pub normal: Vec3,
    pub restitution: f32,
}

/// Tornado-like swirl around an axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vortex {
    pub base: Vec3,
    pub axis: Vec3,
    pub radius: f32,
    pub height: f32,
    /// Rotation frequency at the rim, Hz
    pub frequency: f32,
    /// Falloff exponent toward the axis
    pub tightness: f32,
    pub max_frequency: f32,
}

impl Default for Vortex {
    fn default() -> Self {
        Self {
            base: Vec3::ZERO,
            axis: Vec3::Z,
            radius: 1.0,
            height: 1.0,
            frequency: 1.0,
            tightness: 1.0,
            max_frequency: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorByAge {
    pub channel: ColorChannel,
    pub start: f32,
    pub end: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorByVelocity {
    /// Added to the heading, degrees
    pub hue_offset: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityCompander {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Constraint {
    #[default]
    None,
    OrientedBox(OrientedBox),
    SphereInterior(Sphere),
    SphereExterior(Sphere),
    Plate(Plate),
    PlateWithHole(HoledPlate),
    InfinitePlane(InfinitePlane),
    Vortex(Vortex),
    ColorByAge(ColorByAge),
    ColorByVelocity(ColorByVelocity),
    VelocityCompander(VelocityCompander),
}

impl Constraint {
    pub fn sphere_interior(center: Vec3, radius: f32, restitution: f32) -> Self {
        Constraint::SphereInterior(Sphere {
            center,
            radius,
            restitution,
        })
    }

    pub fn sphere_exterior(center: Vec3, radius: f32, restitution: f32) -> Self {
        Constraint::SphereExterior(Sphere {
            center,
            radius,
            restitution,
        })
    }

    pub fn plane(point: Vec3, normal: Vec3, restitution: f32) -> Self {
        Constraint::InfinitePlane(InfinitePlane {
            point,
            normal,
            restitution,
        })
    }

    pub fn color_by_age(channel: ColorChannel, start: f32, end: f32) -> Self {
        Constraint::ColorByAge(ColorByAge {
            channel,
            start,
            end,
        })
    }

    pub fn compander(min: f32, max: f32) -> Self {
        Constraint::VelocityCompander(VelocityCompander { min, max })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Constraint::None => "none",
            Constraint::OrientedBox(_) => "oriented box",
            Constraint::SphereInterior(_) => "sphere interior",
            Constraint::SphereExterior(_) => "sphere exterior",
            Constraint::Plate(_) => "plate",
            Constraint::PlateWithHole(_) => "plate with hole",
            Constraint::InfinitePlane(_) => "infinite plane",
            Constraint::Vortex(_) => "vortex",
            Constraint::ColorByAge(_) => "color by age",
            Constraint::ColorByVelocity(_) => "color by velocity",
            Constraint::VelocityCompander(_) => "velocity compander",
        }
    }

    /// True for constraints that react to motion and therefore need a
    /// non-empty timestep
    pub fn is_motion(&self) -> bool {
        !matches!(
            self,
            Constraint::None | Constraint::ColorByAge(_) | Constraint::ColorByVelocity(_)
        )
    }

    /// Validate parameters and normalize axes
    pub fn prepare(&mut self) -> Result<(), ConfigError> {
        match self {
            Constraint::OrientedBox(b) => {
                b.frame().ok_or(ConfigError::DegenerateAxes("oriented box"))?;
            }
            Constraint::SphereInterior(s) | Constraint::SphereExterior(s) => {
                if s.radius <= 0.0 {
                    return Err(ConfigError::NonPositive {
                        attribute: "sphere radius",
                        min: s.radius,
                    });
                }
            }
            Constraint::Plate(p) => prepare_plate(p)?,
            Constraint::PlateWithHole(h) => {
                prepare_plate(&h.plate)?;
                h.hole_radius = h
                    .hole_radius
                    .clamp(0.0, h.plate.half_length.min(h.plate.half_width));
            }
            Constraint::InfinitePlane(p) => {
                p.normal = p
                    .normal
                    .try_normalize()
                    .ok_or(ConfigError::DegenerateAxes("infinite plane normal"))?;
            }
            Constraint::Vortex(v) => {
                v.axis = v
                    .axis
                    .try_normalize()
                    .ok_or(ConfigError::DegenerateAxes("vortex axis"))?;
            }
            Constraint::VelocityCompander(c) => {
                if c.min > c.max {
                    return Err(ConfigError::InvertedRange {
                        attribute: "velocity compander",
                        min: c.min,
                        max: c.max,
                    });
                }
            }
            Constraint::None | Constraint::ColorByAge(_) | Constraint::ColorByVelocity(_) => {}
        }
        Ok(())
    }

    /// Shift the constraint's geometry by `delta`
    pub fn translate(&mut self, delta: Vec3) {
        match self {
            Constraint::OrientedBox(b) => b.center += delta,
            Constraint::SphereInterior(s) | Constraint::SphereExterior(s) => s.center += delta,
            Constraint::Plate(p) => p.center += delta,
            Constraint::PlateWithHole(h) => h.plate.center += delta,
            Constraint::InfinitePlane(p) => p.point += delta,
            Constraint::Vortex(v) => v.base += delta,
            Constraint::None
            | Constraint::ColorByAge(_)
            | Constraint::ColorByVelocity(_)
            | Constraint::VelocityCompander(_) => {}
        }
    }

    /// Adjust particle `index` of `next` given where it was in `prev`
    pub fn apply(&self, prev: &StateBuffer, next: &mut StateBuffer, index: usize, dt: f32) {
        if dt <= 0.0 && self.is_motion() {
            return;
        }
        match self {
            Constraint::None => {}
            Constraint::OrientedBox(b) => apply_box(b, next, index),
            Constraint::SphereInterior(s) => apply_sphere_interior(s, next, index),
            Constraint::SphereExterior(s) => apply_sphere_exterior(s, prev, next, index),
            Constraint::Plate(p) => apply_plate(p, 0.0, prev, next, index),
            Constraint::PlateWithHole(h) => apply_plate(&h.plate, h.hole_radius, prev, next, index),
            Constraint::InfinitePlane(p) => apply_plane(p, prev, next, index),
            Constraint::Vortex(v) => apply_vortex(v, next, index, dt),
            Constraint::ColorByAge(c) => apply_color_by_age(c, next, index),
            Constraint::ColorByVelocity(c) => {
                let v = next.velocity(index);
                if v.x.abs() < EPSILON && v.y.abs() < EPSILON {
                    return;
                }
                let hue = (v.y.atan2(v.x).to_degrees() + c.hue_offset).rem_euclid(360.0);
                next.set(index, ColorChannel::Hue.field(), hue);
            }
            Constraint::VelocityCompander(c) => {
                let v = next.velocity(index);
                let speed = v.length();
                if speed < EPSILON {
                    return;
                }
                if speed < c.min {
                    next.set_velocity(index, v / speed * c.min);
                } else if speed > c.max {
                    next.set_velocity(index, v / speed * c.max);
                }
            }
        }
    }
}

fn prepare_plate(p: &Plate) -> Result<(), ConfigError> {
    p.frame().ok_or(ConfigError::DegenerateAxes("plate"))?;
    Ok(())
}

/// Per-axis nearest-face correction
fn apply_box(b: &OrientedBox, next: &mut StateBuffer, index: usize) {
    let Some(frame) = b.frame() else {
        return;
    };
    let half = b.size * 0.5;
    let local = frame.local(b.center, next.position(index));
    let mut pos = next.position(index);
    let mut vel = next.velocity(index);
    let mut touched = false;

    for (axis, (coord, limit)) in frame
        .axes()
        .into_iter()
        .zip(local.to_array().into_iter().zip(half.to_array()))
    {
        let excess = coord.abs() - limit;
        if excess <= 0.0 {
            continue;
        }
        touched = true;
        let outward = axis * coord.signum();
        pos -= outward * ((1.0 + b.restitution) * excess);
        let vn = vel.dot(outward);
        if vn > 0.0 {
            vel -= outward * ((1.0 + b.restitution) * vn);
        }
    }

    if touched {
        next.set_position(index, pos);
        next.set_velocity(index, vel);
    }
}

fn apply_sphere_interior(s: &Sphere, next: &mut StateBuffer, index: usize) {
    let offset = next.position(index) - s.center;
    let dist = offset.length();
    if dist <= s.radius || dist < EPSILON {
        return;
    }
    let outward = offset / dist;
    let kplus = 1.0 + s.restitution;
    next.set_position(index, next.position(index) - outward * (kplus * (dist - s.radius)));

    let v = next.velocity(index);
    let vn = v.dot(outward);
    if vn > 0.0 {
        next.set_velocity(index, v - outward * (kplus * vn));
    }
}

fn apply_sphere_exterior(s: &Sphere, prev: &StateBuffer, next: &mut StateBuffer, index: usize) {
    let from = prev.position(index);
    let to = next.position(index);
    if (to - s.center).length() >= s.radius {
        return;
    }
    // Exact entry point, or straight out along the radius when the segment
    // started inside
    let contact = ray_sphere_entry(from, to, s.center, s.radius)
        .map(|t| from.lerp(to, t))
        .unwrap_or(to);
    let normal = (contact - s.center)
        .try_normalize()
        .or_else(|| (from - s.center).try_normalize())
        .unwrap_or(Vec3::Z);

    next.set_position(index, s.center + normal * s.radius);
    let v = next.velocity(index);
    if v.dot(normal) < 0.0 {
        next.set_velocity(index, reflect(v, normal) * s.restitution);
    }
}

fn apply_plate(
    p: &Plate,
    hole_radius: f32,
    prev: &StateBuffer,
    next: &mut StateBuffer,
    index: usize,
) {
    let Some(frame) = p.frame() else {
        return;
    };
    let before = frame.local(p.center, prev.position(index));
    let after = frame.local(p.center, next.position(index));

    if after.x.abs() > p.half_length || after.y.abs() > p.half_width {
        return;
    }
    if hole_radius > 0.0 && after.truncate().length() <= hole_radius {
        return;
    }
    if !crossed(before.z, after.z) {
        return;
    }

    let kplus = 1.0 + p.restitution;
    next.set_position(index, next.position(index) - frame.n * (kplus * after.z));
    let (vn, vt) = split_normal(next.velocity(index), frame.n);
    next.set_velocity(index, vt - vn * p.restitution);
}

fn apply_plane(p: &InfinitePlane, prev: &StateBuffer, next: &mut StateBuffer, index: usize) {
    let d1 = signed_distance(prev.position(index), p.point, p.normal);
    let d2 = signed_distance(next.position(index), p.point, p.normal);
    if !crossed(d1, d2) {
        return;
    }
    let t = if (d1 - d2).abs() < EPSILON {
        1.0
    } else {
        d1 / (d1 - d2)
    };
    let impact = prev.velocity(index).lerp(next.velocity(index), t);

    next.set_velocity(index, reflect(impact, p.normal) * p.restitution);
    next.set_position(
        index,
        next.position(index) - p.normal * ((1.0 + p.restitution) * d2),
    );
}

/// Advect particles around the axis; rotation speeds up toward the core
fn apply_vortex(v: &Vortex, next: &mut StateBuffer, index: usize, dt: f32) {
    let pos = next.position(index);
    let from_base = pos - v.base;
    let along = from_base.dot(v.axis);
    if !(0.0..=v.height).contains(&along) {
        return;
    }
    let radial = from_base - v.axis * along;
    let r = radial.length();
    if r > v.radius || r < EPSILON {
        return;
    }
    let frequency = (v.frequency * (v.radius / r).powf(v.tightness)).min(v.max_frequency);
    let tangent = radial.cross(v.axis).normalize_or_zero();
    next.set_position(index, pos + tangent * (std::f32::consts::TAU * frequency * dt));
}

fn apply_color_by_age(c: &ColorByAge, next: &mut StateBuffer, index: usize) {
    let lifetime = next.lifetime(index);
    if lifetime <= 0.0 {
        return;
    }
    let ratio = next.age(index) / lifetime;
    next.set(index, c.channel.field(), c.start + ratio * (c.end - c.start));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Field;

    const DT: f32 = 1.0 / 60.0;

    /// One particle moving from `from` to `to` with velocity `vel`
    fn transition(from: Vec3, to: Vec3, vel: Vec3) -> (StateBuffer, StateBuffer) {
        let mut prev = StateBuffer::new(1);
        prev.set_position(0, from);
        prev.set_velocity(0, vel);
        let mut next = prev.clone();
        next.set_position(0, to);
        (prev, next)
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_sphere_exterior_bounce() {
        let mut c = Constraint::sphere_exterior(Vec3::ZERO, 1.0, 0.85);
        c.prepare().unwrap();
        let (prev, mut next) = transition(
            Vec3::new(1.02, 0.0, 0.0),
            Vec3::new(0.99, 0.0, 0.0),
            Vec3::new(-2.0, 0.0, 0.0),
        );
        c.apply(&prev, &mut next, 0, DT);
        assert!(next.position(0).length() >= 1.0 - 1e-5);
        assert!((next.velocity(0).x - 1.7).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_exterior_ignores_outside() {
        let c = Constraint::sphere_exterior(Vec3::ZERO, 1.0, 0.85);
        let (prev, mut next) = transition(
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::NEG_X,
        );
        let before = next.clone();
        c.apply(&prev, &mut next, 0, DT);
        assert_eq!(next, before);
    }

    #[test]
    fn test_sphere_interior_keeps_inside() {
        let c = Constraint::sphere_interior(Vec3::ZERO, 10.0, 0.5);
        let (prev, mut next) = transition(
            Vec3::new(9.9, 0.0, 0.0),
            Vec3::new(10.2, 0.0, 0.0),
            Vec3::new(6.0, 1.0, 0.0),
        );
        c.apply(&prev, &mut next, 0, DT);
        // Penetration 0.2 mirrored by 1.5
        assert!(approx(next.position(0), Vec3::new(9.9, 0.0, 0.0)));
        assert!(approx(next.velocity(0), Vec3::new(-3.0, 1.0, 0.0)));
    }

    #[test]
    fn test_box_bounces_off_face() {
        let mut c = Constraint::OrientedBox(OrientedBox::new(
            Vec3::ZERO,
            Vec3::splat(10.0),
            Vec3::X,
            Vec3::Y,
            0.5,
        ));
        c.prepare().unwrap();
        let (prev, mut next) = transition(
            Vec3::new(4.9, 0.0, 0.0),
            Vec3::new(5.4, 1.0, 0.0),
            Vec3::new(4.0, 2.0, 0.0),
        );
        c.apply(&prev, &mut next, 0, DT);
        // Penetration 0.4 mirrored by 1.5
        assert!(approx(next.position(0), Vec3::new(4.8, 1.0, 0.0)));
        assert!(approx(next.velocity(0), Vec3::new(-2.0, 2.0, 0.0)));
    }

    #[test]
    fn test_box_rejects_parallel_axes() {
        let flat = OrientedBox::new(Vec3::ZERO, Vec3::ONE, Vec3::X, Vec3::X, 0.5);
        let mut c = Constraint::OrientedBox(flat);
        assert!(matches!(c.prepare(), Err(ConfigError::DegenerateAxes(_))));
    }

    #[test]
    fn test_plate_crossing_inside_extents() {
        let mut c = Constraint::Plate(Plate::new(Vec3::ZERO, Vec3::X, Vec3::Y, 5.0, 5.0, 0.5));
        c.prepare().unwrap();
        let (prev, mut next) = transition(
            Vec3::new(1.0, 1.0, 0.1),
            Vec3::new(1.0, 1.0, -0.2),
            Vec3::new(1.0, 0.0, -6.0),
        );
        c.apply(&prev, &mut next, 0, DT);
        assert!(approx(next.position(0), Vec3::new(1.0, 1.0, 0.1)));
        assert!(approx(next.velocity(0), Vec3::new(1.0, 0.0, 3.0)));
    }

    #[test]
    fn test_plate_misses_outside_extents_and_hole() {
        let mut plate = Constraint::Plate(Plate::new(Vec3::ZERO, Vec3::X, Vec3::Y, 5.0, 5.0, 0.5));
        plate.prepare().unwrap();
        let (prev, mut next) = transition(
            Vec3::new(6.0, 0.0, 0.1),
            Vec3::new(6.0, 0.0, -0.1),
            Vec3::NEG_Z,
        );
        plate.apply(&prev, &mut next, 0, DT);
        assert_eq!(next.position(0), Vec3::new(6.0, 0.0, -0.1));

        let mut holed = Constraint::PlateWithHole(HoledPlate {
            plate: Plate::new(Vec3::ZERO, Vec3::X, Vec3::Y, 5.0, 5.0, 0.5),
            hole_radius: 2.0,
        });
        holed.prepare().unwrap();
        let (prev, mut next) = transition(
            Vec3::new(1.0, 0.0, 0.1),
            Vec3::new(1.0, 0.0, -0.1),
            Vec3::NEG_Z,
        );
        holed.apply(&prev, &mut next, 0, DT);
        assert_eq!(next.position(0), Vec3::new(1.0, 0.0, -0.1));
    }

    #[test]
    fn test_hole_radius_clamped() {
        let mut holed = Constraint::PlateWithHole(HoledPlate {
            plate: Plate::new(Vec3::ZERO, Vec3::X, Vec3::Y, 5.0, 3.0, 0.5),
            hole_radius: 20.0,
        });
        holed.prepare().unwrap();
        let Constraint::PlateWithHole(h) = holed else {
            panic!("variant changed");
        };
        assert_eq!(h.hole_radius, 3.0);
    }

    #[test]
    fn test_infinite_plane_bounce() {
        let mut c = Constraint::plane(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), 0.5);
        c.prepare().unwrap();
        let (prev, mut next) = transition(
            Vec3::new(0.0, 0.0, 0.1),
            Vec3::new(0.0, 0.0, -0.1),
            Vec3::new(0.0, 0.0, -4.0),
        );
        c.apply(&prev, &mut next, 0, DT);
        assert!(approx(next.position(0), Vec3::new(0.0, 0.0, 0.05)));
        assert!(approx(next.velocity(0), Vec3::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn test_vortex_advects_tangentially() {
        let mut c = Constraint::Vortex(Vortex {
            radius: 10.0,
            height: 10.0,
            frequency: 0.5,
            tightness: 1.0,
            ..Default::default()
        });
        c.prepare().unwrap();
        let (prev, mut next) = transition(
            Vec3::new(5.0, 0.0, 1.0),
            Vec3::new(5.0, 0.0, 1.0),
            Vec3::ZERO,
        );
        c.apply(&prev, &mut next, 0, 1.0);
        // f = 0.5 * (10/5) = 1 Hz; x × z = -y
        assert!(approx(next.position(0), Vec3::new(5.0, -std::f32::consts::TAU, 1.0)));

        // Above the band: untouched
        let (prev, mut next) = transition(
            Vec3::new(5.0, 0.0, 11.0),
            Vec3::new(5.0, 0.0, 11.0),
            Vec3::ZERO,
        );
        c.apply(&prev, &mut next, 0, 1.0);
        assert_eq!(next.position(0), Vec3::new(5.0, 0.0, 11.0));
    }

    #[test]
    fn test_vortex_caps_frequency() {
        let c = Constraint::Vortex(Vortex {
            radius: 10.0,
            height: 10.0,
            frequency: 2.0,
            tightness: 10.0,
            ..Default::default()
        });
        let (prev, mut next) = transition(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::ZERO,
        );
        c.apply(&prev, &mut next, 0, 1.0);
        let moved = (next.position(0) - Vec3::X).length();
        assert!((moved - std::f32::consts::TAU * 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_color_by_age() {
        let c = Constraint::color_by_age(ColorChannel::Hue, 30.0, 4.0);
        let (prev, mut next) = transition(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);
        next.set(0, Field::Age, 1.0);
        next.set(0, Field::Lifetime, 2.0);
        c.apply(&prev, &mut next, 0, DT);
        assert!((next.get(0, Field::Hue) - 17.0).abs() < 1e-5);
    }

    #[test]
    fn test_color_by_velocity() {
        let c = Constraint::ColorByVelocity(ColorByVelocity { hue_offset: 90.0 });
        let (prev, mut next) = transition(Vec3::ZERO, Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0));
        c.apply(&prev, &mut next, 0, DT);
        assert!((next.get(0, Field::Hue) - 180.0).abs() < 1e-4);

        // Vertical motion keeps the old hue
        next.set(0, Field::Hue, 42.0);
        next.set_velocity(0, Vec3::Z);
        c.apply(&prev, &mut next, 0, DT);
        assert_eq!(next.get(0, Field::Hue), 42.0);
    }

    #[test]
    fn test_compander_band() {
        let c = Constraint::compander(3.0, 9.0);
        for (speed, expected) in [(1.0, 3.0), (20.0, 9.0), (5.0, 5.0)] {
            let (prev, mut next) = transition(Vec3::ZERO, Vec3::ZERO, Vec3::new(speed, 0.0, 0.0));
            c.apply(&prev, &mut next, 0, DT);
            assert!((next.velocity(0).length() - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_motion_constraints_skip_zero_dt() {
        let c = Constraint::compander(3.0, 9.0);
        let (prev, mut next) = transition(Vec3::ZERO, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        c.apply(&prev, &mut next, 0, 0.0);
        assert_eq!(next.velocity(0), Vec3::X);
    }

    #[test]
    fn test_translate_moves_geometry() {
        let mut vortex = Constraint::Vortex(Vortex::default());
        vortex.translate(Vec3::new(1.0, 2.0, 0.0));
        let Constraint::Vortex(v) = vortex else {
            panic!("variant changed");
        };
        assert_eq!(v.base, Vec3::new(1.0, 2.0, 0.0));

        let mut sphere = Constraint::sphere_exterior(Vec3::ZERO, 1.0, 0.5);
        sphere.translate(Vec3::Z);
        assert_eq!(sphere, Constraint::sphere_exterior(Vec3::Z, 1.0, 0.5));

        let mut compander = Constraint::compander(1.0, 2.0);
        compander.translate(Vec3::Z);
        assert_eq!(compander, Constraint::compander(1.0, 2.0));
    }
}
