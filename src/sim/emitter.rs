//! Particle emitter
//!
//! Decides where new particles appear and draws their initial attributes.
//! All randomness comes from the caller's seeded generator, so a fixed seed
//! reproduces the same particles.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Field, StateBuffer};
use crate::error::ConfigError;
use crate::{random_direction, random_in};

/// Region new particles are placed in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpawnRegion {
    Point {
        position: Vec3,
    },
    /// Axis-aligned box; `size` holds full extents
    Volume {
        center: Vec3,
        size: Vec3,
    },
    Sphere {
        center: Vec3,
        radius: f32,
    },
    Disc {
        center: Vec3,
        normal: Vec3,
        radius: f32,
    },
    /// `width` runs along the local x axis and `length` along local y before
    /// the rectangle is rotated onto `normal`
    Rect {
        center: Vec3,
        normal: Vec3,
        width: f32,
        length: f32,
    },
}

impl Default for SpawnRegion {
    fn default() -> Self {
        SpawnRegion::Point {
            position: Vec3::ZERO,
        }
    }
}

impl SpawnRegion {
    pub fn center(&self) -> Vec3 {
        match *self {
            SpawnRegion::Point { position } => position,
            SpawnRegion::Volume { center, .. }
            | SpawnRegion::Sphere { center, .. }
            | SpawnRegion::Disc { center, .. }
            | SpawnRegion::Rect { center, .. } => center,
        }
    }

    fn center_mut(&mut self) -> &mut Vec3 {
        match self {
            SpawnRegion::Point { position } => position,
            SpawnRegion::Volume { center, .. }
            | SpawnRegion::Sphere { center, .. }
            | SpawnRegion::Disc { center, .. }
            | SpawnRegion::Rect { center, .. } => center,
        }
    }

    /// Draw a position inside the region
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        match *self {
            SpawnRegion::Point { position } => position,
            SpawnRegion::Volume { center, size } => {
                let half = size * 0.5;
                center
                    + Vec3::new(
                        random_in(rng, -half.x, half.x),
                        random_in(rng, -half.y, half.y),
                        random_in(rng, -half.z, half.z),
                    )
            }
            SpawnRegion::Sphere { center, radius } => {
                let r = random_in(rng, 0.0, radius);
                center + random_direction(rng, r)
            }
            SpawnRegion::Disc {
                center,
                normal,
                radius,
            } => {
                let theta = rng.random::<f32>() * std::f32::consts::TAU;
                let r = random_in(rng, 0.0, radius);
                let planar = Vec3::new(r * theta.cos(), r * theta.sin(), 0.0);
                center + orientation(normal) * planar
            }
            SpawnRegion::Rect {
                center,
                normal,
                width,
                length,
            } => {
                let planar = Vec3::new(
                    random_in(rng, -width * 0.5, width * 0.5),
                    random_in(rng, -length * 0.5, length * 0.5),
                    0.0,
                );
                center + orientation(normal) * planar
            }
        }
    }
}

/// Rotation taking the local +Z axis onto `normal`
fn orientation(normal: Vec3) -> Quat {
    Quat::from_rotation_arc(Vec3::Z, normal.try_normalize().unwrap_or(Vec3::Z))
}

/// Bounds of one emitted attribute
///
/// When `randomized` is false every particle gets `min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeRange {
    pub min: f32,
    pub max: f32,
    pub randomized: bool,
}

impl AttributeRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            randomized: min != max,
        }
    }

    pub fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.randomized {
            random_in(rng, self.min, self.max)
        } else {
            self.min
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Emitted attributes addressable by [`Emitter::set_range`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    Lifetime,
    Speed,
    Mass,
    Hue,
    Saturation,
    Intensity,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Lifetime,
        Attribute::Speed,
        Attribute::Mass,
        Attribute::Hue,
        Attribute::Saturation,
        Attribute::Intensity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Lifetime => "lifetime",
            Attribute::Speed => "speed",
            Attribute::Mass => "mass",
            Attribute::Hue => "hue",
            Attribute::Saturation => "saturation",
            Attribute::Intensity => "intensity",
        }
    }
}

/// Per-axis bounds on the initial velocity direction, normalized after sampling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionBounds {
    pub min: Vec3,
    pub max: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emitter {
    pub region: SpawnRegion,
    pub lifetime: AttributeRange,
    pub speed: AttributeRange,
    pub mass: AttributeRange,
    /// Degrees
    pub hue: AttributeRange,
    pub saturation: AttributeRange,
    pub intensity: AttributeRange,
    /// Uniform over the sphere when unset
    #[serde(default)]
    pub direction: Option<DirectionBounds>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            region: SpawnRegion::default(),
            lifetime: AttributeRange::new(2.0, 5.0),
            speed: AttributeRange::new(0.5, 2.0),
            mass: AttributeRange::new(2.0, 5.0),
            hue: AttributeRange::new(0.0, 360.0),
            saturation: AttributeRange::new(0.5, 1.0),
            intensity: AttributeRange::fixed(1.0),
            direction: None,
        }
    }
}

impl Emitter {
    pub fn new(region: SpawnRegion) -> Self {
        Self {
            region,
            ..Default::default()
        }
    }

    pub fn with_range(mut self, attribute: Attribute, min: f32, max: f32) -> Self {
        self.set_range(attribute, min, max);
        self
    }

    pub fn with_direction(mut self, min: Vec3, max: Vec3) -> Self {
        self.direction = Some(DirectionBounds { min, max });
        self
    }

    pub fn range(&self, attribute: Attribute) -> &AttributeRange {
        match attribute {
            Attribute::Lifetime => &self.lifetime,
            Attribute::Speed => &self.speed,
            Attribute::Mass => &self.mass,
            Attribute::Hue => &self.hue,
            Attribute::Saturation => &self.saturation,
            Attribute::Intensity => &self.intensity,
        }
    }

    fn range_mut(&mut self, attribute: Attribute) -> &mut AttributeRange {
        match attribute {
            Attribute::Lifetime => &mut self.lifetime,
            Attribute::Speed => &mut self.speed,
            Attribute::Mass => &mut self.mass,
            Attribute::Hue => &mut self.hue,
            Attribute::Saturation => &mut self.saturation,
            Attribute::Intensity => &mut self.intensity,
        }
    }

    /// Replace an attribute range; equal bounds make the attribute fixed
    pub fn set_range(&mut self, attribute: Attribute, min: f32, max: f32) {
        *self.range_mut(attribute) = AttributeRange::new(min, max);
    }

    pub fn position(&self) -> Vec3 {
        self.region.center()
    }

    pub fn set_position(&mut self, position: Vec3) {
        *self.region.center_mut() = position;
    }

    pub fn translate(&mut self, delta: Vec3) {
        *self.region.center_mut() += delta;
    }

    /// Reject ranges that would produce invalid particles
    pub fn validate(&self) -> Result<(), ConfigError> {
        for attribute in Attribute::ALL {
            let range = self.range(attribute);
            if range.min > range.max {
                return Err(ConfigError::InvertedRange {
                    attribute: attribute.as_str(),
                    min: range.min,
                    max: range.max,
                });
            }
        }
        for attribute in [Attribute::Mass, Attribute::Lifetime] {
            let min = self.range(attribute).min;
            if min <= 0.0 {
                return Err(ConfigError::NonPositive {
                    attribute: attribute.as_str(),
                    min,
                });
            }
        }
        match self.region {
            SpawnRegion::Disc { normal, .. } | SpawnRegion::Rect { normal, .. }
                if normal.try_normalize().is_none() =>
            {
                return Err(ConfigError::DegenerateAxes("emitter normal"));
            }
            _ => {}
        }
        if let Some(bounds) = self.direction {
            for (min, max) in bounds.min.to_array().into_iter().zip(bounds.max.to_array()) {
                if min > max {
                    return Err(ConfigError::InvertedRange {
                        attribute: "direction",
                        min,
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    fn sample_direction<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let Some(bounds) = self.direction else {
            return random_direction(rng, 1.0);
        };
        let dir = Vec3::new(
            random_in(rng, bounds.min.x, bounds.max.x),
            random_in(rng, bounds.min.y, bounds.max.y),
            random_in(rng, bounds.min.z, bounds.max.z),
        );
        // A box straddling the origin can produce a zero vector
        dir.try_normalize()
            .unwrap_or_else(|| random_direction(rng, 1.0))
    }

    /// Overwrite particle `index` with a freshly emitted particle
    ///
    /// Age restarts at zero and the cached acceleration and force accumulator
    /// are cleared so nothing from the previous occupant carries over.
    pub fn spawn<R: Rng + ?Sized>(&self, rng: &mut R, state: &mut StateBuffer, index: usize) {
        state.set(index, Field::Age, 0.0);
        state.set(index, Field::Lifetime, self.lifetime.sample(rng));

        let position = self.region.sample(rng);
        state.set_position(index, position);

        let speed = self.speed.sample(rng);
        let velocity = self.sample_direction(rng) * speed;
        state.set_velocity(index, velocity);

        state.set_acceleration(index, Vec3::ZERO);
        state.set_force(index, Vec3::ZERO);

        state.set(index, Field::Mass, self.mass.sample(rng));
        state.set(index, Field::Hue, self.hue.sample(rng));
        state.set(index, Field::Saturation, self.saturation.sample(rng));
        state.set(index, Field::Intensity, self.intensity.sample(rng));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_set_range_toggles_randomization() {
        let mut emitter = Emitter::default();
        emitter.set_range(Attribute::Mass, 2.4, 2.4);
        assert!(!emitter.mass.randomized);
        emitter.set_range(Attribute::Mass, 1.0, 5.0);
        assert!(emitter.mass.randomized);
    }

    #[test]
    fn test_spawn_within_ranges() {
        let emitter = Emitter::new(SpawnRegion::Volume {
            center: Vec3::new(0.0, 0.0, 3.0),
            size: Vec3::splat(5.0),
        })
        .with_range(Attribute::Speed, 2.0, 5.0);
        let mut rng = Pcg32::seed_from_u64(11);
        let mut state = StateBuffer::new(64);

        for i in 0..state.capacity() {
            state.add_force(i, Vec3::ONE);
            emitter.spawn(&mut rng, &mut state, i);

            assert_eq!(state.age(i), 0.0);
            assert!(emitter.lifetime.contains(state.lifetime(i)));
            assert!(emitter.mass.contains(state.mass(i)));
            let speed = state.velocity(i).length();
            assert!(speed >= 2.0 - 1e-4 && speed <= 5.0 + 1e-4);
            let local = state.position(i) - Vec3::new(0.0, 0.0, 3.0);
            assert!(local.abs().max_element() <= 2.5 + 1e-4);
            assert_eq!(state.force(i), Vec3::ZERO);
            assert_eq!(state.get(i, Field::Intensity), 1.0);
        }
    }

    #[test]
    fn test_spawn_is_deterministic() {
        let emitter = Emitter::new(SpawnRegion::Sphere {
            center: Vec3::ZERO,
            radius: 4.0,
        });
        let mut a = StateBuffer::new(8);
        let mut b = StateBuffer::new(8);
        let mut rng_a = Pcg32::seed_from_u64(99);
        let mut rng_b = Pcg32::seed_from_u64(99);
        for i in 0..8 {
            emitter.spawn(&mut rng_a, &mut a, i);
            emitter.spawn(&mut rng_b, &mut b, i);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_disc_stays_in_plane() {
        let normal = Vec3::new(1.0, 1.0, 0.0).normalize();
        let region = SpawnRegion::Disc {
            center: Vec3::new(1.0, 2.0, 3.0),
            normal,
            radius: 3.0,
        };
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..50 {
            let p = region.sample(&mut rng) - Vec3::new(1.0, 2.0, 3.0);
            assert!(p.dot(normal).abs() < 1e-4);
            assert!(p.length() <= 3.0 + 1e-4);
        }
    }

    #[test]
    fn test_rect_extents() {
        let region = SpawnRegion::Rect {
            center: Vec3::ZERO,
            normal: Vec3::Z,
            width: 4.0,
            length: 2.0,
        };
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..50 {
            let p = region.sample(&mut rng);
            assert!(p.x.abs() <= 2.0 && p.y.abs() <= 1.0);
            assert!(p.z.abs() < 1e-5);
        }
    }

    #[test]
    fn test_direction_bounds() {
        let emitter =
            Emitter::default().with_direction(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.2, 0.2, 1.0));
        let mut rng = Pcg32::seed_from_u64(3);
        let mut state = StateBuffer::new(1);
        for _ in 0..20 {
            emitter.spawn(&mut rng, &mut state, 0);
            let v = state.velocity(0);
            assert!(v.x >= 0.0 && v.y >= 0.0 && v.z > 0.0);
        }
    }

    #[test]
    fn test_translate_and_set_position() {
        let mut emitter = Emitter::new(SpawnRegion::Sphere {
            center: Vec3::ONE,
            radius: 1.0,
        });
        emitter.translate(Vec3::X);
        assert_eq!(emitter.position(), Vec3::new(2.0, 1.0, 1.0));
        emitter.set_position(Vec3::ZERO);
        assert_eq!(emitter.position(), Vec3::ZERO);
    }

    #[test]
    fn test_validate() {
        assert!(Emitter::default().validate().is_ok());

        let mut emitter = Emitter::default();
        emitter.mass = AttributeRange {
            min: 5.0,
            max: 1.0,
            randomized: true,
        };
        assert!(matches!(
            emitter.validate(),
            Err(ConfigError::InvertedRange { attribute: "mass", .. })
        ));

        let emitter = Emitter::default().with_range(Attribute::Lifetime, 0.0, 2.0);
        assert!(matches!(emitter.validate(), Err(ConfigError::NonPositive { .. })));

        let emitter = Emitter::new(SpawnRegion::Disc {
            center: Vec3::ZERO,
            normal: Vec3::ZERO,
            radius: 1.0,
        });
        assert!(matches!(emitter.validate(), Err(ConfigError::DegenerateAxes(_))));
    }
}
