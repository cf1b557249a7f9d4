//! Ready-made scenes
//!
//! Four demonstration systems, each exercising a different slice of the
//! generator catalogue.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::constraint::{ColorByVelocity, OrientedBox, Vortex};
use crate::sim::emitter::{Attribute, Emitter, SpawnRegion};
use crate::sim::force::{Flocking, UniformGravity};
use crate::sim::{ColorChannel, Constraint, Force, IntegratorKind, SystemConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScenePreset {
    /// Tornado over a ground plane, fed from a point source
    #[default]
    Vortex,
    /// Boids inside an oriented box
    Flocking,
    /// Buoyant, aging embers colored by age
    Flame,
    /// Four particles fully connected by springs inside a sphere
    Springs,
}

impl ScenePreset {
    pub fn all() -> [ScenePreset; 4] {
        [
            ScenePreset::Vortex,
            ScenePreset::Flocking,
            ScenePreset::Flame,
            ScenePreset::Springs,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenePreset::Vortex => "Vortex",
            ScenePreset::Flocking => "Flocking",
            ScenePreset::Flame => "Flame",
            ScenePreset::Springs => "Springs",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vortex" | "tornado" => Some(ScenePreset::Vortex),
            "flocking" | "flock" | "boids" => Some(ScenePreset::Flocking),
            "flame" | "fire" => Some(ScenePreset::Flame),
            "springs" | "spring" => Some(ScenePreset::Springs),
            _ => None,
        }
    }

    /// Build the scene configuration
    pub fn config(&self) -> SystemConfig {
        match self {
            ScenePreset::Vortex => vortex(),
            ScenePreset::Flocking => flocking(),
            ScenePreset::Flame => flame(),
            ScenePreset::Springs => springs(),
        }
    }
}

fn vortex() -> SystemConfig {
    let emitter = Emitter::new(SpawnRegion::Point {
        position: Vec3::new(-70.0, 0.0, 1.5),
    })
    .with_range(Attribute::Speed, 5.0, 12.0)
    .with_range(Attribute::Hue, 200.0, 200.0)
    .with_range(Attribute::Saturation, 0.15, 0.55)
    .with_range(Attribute::Intensity, 0.0, 0.04)
    .with_range(Attribute::Lifetime, 1.0, 4.0);

    SystemConfig::new(35_000, emitter)
        .with_force(Force::UniformGravity(UniformGravity::default()))
        // Draws particles up toward the funnel top
        .with_force(Force::radial(Vec3::new(-70.0, 0.0, 50.0), 100.0, 20_000.0, 1.5))
        .with_constraint(Constraint::Vortex(Vortex {
            base: Vec3::new(-70.0, 0.0, 0.0),
            axis: Vec3::Z,
            radius: 100.0,
            height: 90.0,
            frequency: 2.0,
            tightness: 10.0,
            ..Default::default()
        }))
        .with_constraint(Constraint::plane(Vec3::ZERO, Vec3::Z, 0.85))
        .with_aging(true)
}

fn flocking() -> SystemConfig {
    let emitter = Emitter::new(SpawnRegion::Volume {
        center: Vec3::new(0.0, 0.0, 3.0),
        size: Vec3::splat(5.0),
    })
    .with_range(Attribute::Speed, 2.0, 5.0)
    .with_range(Attribute::Mass, 2.4, 2.4);

    SystemConfig::new(100, emitter)
        .with_force(Force::Flocking(Flocking {
            avoidance: 1.0,
            velocity_matching: 0.75,
            centering: 0.3,
            inner_radius: 15.0,
            outer_radius: 25.0,
            frontal_deg: 100.0,
            peripheral_deg: 240.0,
            residual: 3.0,
        }))
        .with_constraint(Constraint::OrientedBox(OrientedBox::new(
            Vec3::new(0.0, 0.0, 75.0),
            Vec3::new(200.0, 200.0, 150.0),
            Vec3::new(1.0, 0.5, 0.0),
            Vec3::new(-0.5, 1.0, 0.0),
            0.85,
        )))
        .with_constraint(Constraint::ColorByVelocity(ColorByVelocity { hue_offset: 90.0 }))
        .with_constraint(Constraint::compander(3.0, 9.0))
}

fn flame() -> SystemConfig {
    let emitter = Emitter::new(SpawnRegion::Sphere {
        center: Vec3::new(-50.0, -75.0, 8.0),
        radius: 4.0,
    })
    .with_range(Attribute::Speed, 0.0, 6.0)
    .with_range(Attribute::Mass, 1.0, 5.0);

    SystemConfig::new(50_000, emitter)
        .with_force(Force::gravity(2.2, Vec3::NEG_Z))
        .with_force(Force::constant(Vec3::Z, 7.0))
        .with_force(Force::drag(0.15))
        .with_constraint(Constraint::plane(Vec3::ZERO, Vec3::Z, 0.6))
        .with_constraint(Constraint::color_by_age(ColorChannel::Hue, 30.0, 4.0))
        .with_constraint(Constraint::color_by_age(ColorChannel::Saturation, 0.45, 0.9))
        .with_constraint(Constraint::color_by_age(ColorChannel::Intensity, 1.0, 0.4))
        .with_aging(true)
}

fn springs() -> SystemConfig {
    let emitter = Emitter::new(SpawnRegion::Point {
        position: Vec3::new(40.0, 40.0, 20.0),
    })
    .with_range(Attribute::Mass, 5.0, 5.0);

    let mut config = SystemConfig::new(4, emitter);
    for a in 0..4 {
        for b in a + 1..4 {
            config = config.with_force(Force::spring(a, b, 30.0, 0.4, 2.5));
        }
    }
    config
        .with_force(Force::gravity(2.4, Vec3::NEG_Z))
        .with_constraint(Constraint::sphere_interior(Vec3::new(40.0, 40.0, 20.0), 10.0, 0.7))
        .with_integrator(IntegratorKind::SymplecticEuler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::ParticleSystem;

    #[test]
    fn test_preset_names_round_trip() {
        for preset in ScenePreset::all() {
            assert_eq!(ScenePreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(ScenePreset::from_str("FIRE"), Some(ScenePreset::Flame));
        assert_eq!(ScenePreset::from_str("galaxy"), None);
    }

    #[test]
    fn test_every_preset_configures() {
        for preset in ScenePreset::all() {
            let config = preset.config();
            assert!(
                ParticleSystem::configure(config).is_ok(),
                "{} failed to configure",
                preset.as_str()
            );
        }
    }

    #[test]
    fn test_springs_connect_every_pair() {
        let config = ScenePreset::Springs.config();
        let springs = config
            .forces
            .iter()
            .filter(|f| matches!(f, Force::Spring(_)))
            .count();
        assert_eq!(springs, 6);
        assert_eq!(config.integrator, IntegratorKind::SymplecticEuler);
    }

    #[test]
    fn test_springs_scene_stays_in_sphere() {
        let mut system = ParticleSystem::configure(ScenePreset::Springs.config()).unwrap();
        system.initialize();
        for _ in 0..300 {
            system.step(crate::consts::SIM_DT);
        }
        let center = Vec3::new(40.0, 40.0, 20.0);
        for i in 0..system.capacity() {
            let p = system.read_state().position(i);
            assert!(p.is_finite());
            // Restitution mirror can leave a sliver of overshoot for one tick
            assert!((p - center).length() < 12.0);
        }
    }
}
