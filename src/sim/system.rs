//! Particle system orchestrator
//!
//! Owns the buffers, generators, emitter and random source of one particle
//! system and drives them through the tick pipeline.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::constraint::Constraint;
use super::emitter::Emitter;
use super::force::Force;
use super::integrator::{Integrator, IntegratorKind};
use super::state::StateBuffer;
use super::tick::{TickBuffers, TickContext, TickReport, tick};
use crate::consts::DEFAULT_SEED;
use crate::error::ConfigError;

/// Everything needed to build a [`ParticleSystem`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub capacity: usize,
    pub emitter: Emitter,
    pub forces: Vec<Force>,
    pub constraints: Vec<Constraint>,
    pub integrator: IntegratorKind,
    /// Particles age and respawn when enabled
    pub aging: bool,
    pub seed: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            emitter: Emitter::default(),
            forces: Vec::new(),
            constraints: Vec::new(),
            integrator: IntegratorKind::default(),
            aging: false,
            seed: DEFAULT_SEED,
        }
    }
}

impl SystemConfig {
    pub fn new(capacity: usize, emitter: Emitter) -> Self {
        Self {
            capacity,
            emitter,
            ..Default::default()
        }
    }

    pub fn with_force(mut self, force: Force) -> Self {
        self.forces.push(force);
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_integrator(mut self, integrator: IntegratorKind) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn with_aging(mut self, aging: bool) -> Self {
        self.aging = aging;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Aggregate numbers for logging and HUDs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemStats {
    /// Particles younger than their lifetime (all of them when aging is off)
    pub live: usize,
    pub mean_speed: f32,
    pub max_speed: f32,
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
}

pub struct ParticleSystem {
    buffers: TickBuffers,
    forces: Vec<Force>,
    constraints: Vec<Constraint>,
    emitter: Emitter,
    integrator: Integrator,
    aging: bool,
    rng: Pcg32,
    ticks: u64,
    pending_nudge: bool,
    last_report: TickReport,
}

impl ParticleSystem {
    /// Validate a configuration and allocate the buffers
    ///
    /// The state is zeroed until [`ParticleSystem::initialize`] runs.
    pub fn configure(config: SystemConfig) -> Result<Self, ConfigError> {
        let SystemConfig {
            capacity,
            emitter,
            mut forces,
            mut constraints,
            integrator,
            aging,
            seed,
        } = config;

        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        emitter.validate()?;
        for force in &mut forces {
            force.prepare(capacity)?;
        }
        for constraint in &mut constraints {
            constraint.prepare()?;
        }

        log::info!(
            "configured {} particles, {} forces, {} constraints, {} integrator, aging {}",
            capacity,
            forces.len(),
            constraints.len(),
            integrator.as_str(),
            if aging { "on" } else { "off" }
        );

        Ok(Self {
            buffers: TickBuffers::new(capacity),
            forces,
            constraints,
            emitter,
            integrator: Integrator::new(integrator),
            aging,
            rng: Pcg32::seed_from_u64(seed),
            ticks: 0,
            pending_nudge: false,
            last_report: TickReport::default(),
        })
    }

    /// Fill every slot with a freshly emitted particle
    pub fn initialize(&mut self) {
        let state = &mut self.buffers.current;
        for index in 0..state.capacity() {
            self.emitter.spawn(&mut self.rng, state, index);
        }
        self.buffers.next.copy_from(&self.buffers.current);
        log::info!("initialized {} particles", self.capacity());
    }

    /// Run one full tick of length `dt`
    pub fn step(&mut self, dt: f32) {
        let ctx = TickContext {
            forces: &self.forces,
            constraints: &self.constraints,
            emitter: &self.emitter,
            integrator: &mut self.integrator,
            aging: self.aging,
            rng: &mut self.rng,
            nudge: self.pending_nudge,
        };
        let (buffers, report) = tick(std::mem::take(&mut self.buffers), ctx, dt);
        self.buffers = buffers;
        self.last_report = report;
        self.pending_nudge = false;
        self.ticks += 1;
    }

    /// Immutable view of the current state, for renderers
    pub fn read_state(&self) -> &StateBuffer {
        &self.buffers.current
    }

    /// Kick every particle in a random direction on the next tick
    pub fn nudge(&mut self) {
        self.pending_nudge = true;
    }

    pub fn integrator(&self) -> IntegratorKind {
        self.integrator.kind()
    }

    pub fn set_integrator(&mut self, kind: IntegratorKind) {
        if kind != self.integrator.kind() {
            log::info!(
                "integrator: {} -> {}",
                self.integrator.kind().as_str(),
                kind.as_str()
            );
        }
        self.integrator.set_kind(kind);
    }

    pub fn aging(&self) -> bool {
        self.aging
    }

    pub fn set_aging(&mut self, aging: bool) {
        self.aging = aging;
    }

    /// Register another force generator; only allowed before the first tick
    pub fn add_force(&mut self, mut force: Force) -> Result<(), ConfigError> {
        if self.ticks > 0 {
            return Err(ConfigError::Frozen("force"));
        }
        force.prepare(self.capacity())?;
        self.forces.push(force);
        Ok(())
    }

    /// Register another constraint generator; only allowed before the first tick
    pub fn add_constraint(&mut self, mut constraint: Constraint) -> Result<(), ConfigError> {
        if self.ticks > 0 {
            return Err(ConfigError::Frozen("constraint"));
        }
        constraint.prepare()?;
        self.constraints.push(constraint);
        Ok(())
    }

    /// Edit a registered force in place
    ///
    /// The edited force is validated again; when that fails the previous
    /// parameters are restored and the error is returned.
    pub fn tune_force(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut Force),
    ) -> Result<(), ConfigError> {
        let capacity = self.capacity();
        let force = self
            .forces
            .get_mut(index)
            .ok_or(ConfigError::UnknownGenerator { kind: "force", index })?;
        let previous = force.clone();
        edit(force);
        if let Err(e) = force.prepare(capacity) {
            *force = previous;
            return Err(e);
        }
        log::debug!("tuned {} force at {index}", force.name());
        Ok(())
    }

    pub fn forces(&self) -> &[Force] {
        &self.forces
    }

    /// Edit a registered constraint in place, validated like [`Self::tune_force`]
    pub fn tune_constraint(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut Constraint),
    ) -> Result<(), ConfigError> {
        let constraint = self
            .constraints
            .get_mut(index)
            .ok_or(ConfigError::UnknownGenerator {
                kind: "constraint",
                index,
            })?;
        let previous = constraint.clone();
        edit(constraint);
        if let Err(e) = constraint.prepare() {
            *constraint = previous;
            return Err(e);
        }
        log::debug!("tuned {} constraint at {index}", constraint.name());
        Ok(())
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Edit the emitter in place; rejected edits leave it unchanged
    pub fn tune_emitter(&mut self, edit: impl FnOnce(&mut Emitter)) -> Result<(), ConfigError> {
        let previous = self.emitter.clone();
        edit(&mut self.emitter);
        if let Err(e) = self.emitter.validate() {
            self.emitter = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Move the whole scene: emitter, anchored forces and constraint geometry
    ///
    /// Particles already in flight stay where they are.
    pub fn translate(&mut self, delta: Vec3) {
        self.emitter.translate(delta);
        for force in &mut self.forces {
            force.translate(delta);
        }
        for constraint in &mut self.constraints {
            constraint.translate(delta);
        }
        log::debug!("scene moved by {delta}");
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn capacity(&self) -> usize {
        self.buffers.current.capacity()
    }

    /// What happened during the most recent tick
    pub fn last_report(&self) -> TickReport {
        self.last_report
    }

    pub fn stats(&self) -> SystemStats {
        let state = &self.buffers.current;
        let mut stats = SystemStats {
            bounds_min: Vec3::splat(f32::INFINITY),
            bounds_max: Vec3::splat(f32::NEG_INFINITY),
            ..Default::default()
        };
        let mut total_speed = 0.0;
        for index in 0..state.capacity() {
            if !self.aging || state.age(index) < state.lifetime(index) {
                stats.live += 1;
            }
            let speed = state.velocity(index).length();
            total_speed += speed;
            stats.max_speed = stats.max_speed.max(speed);
            let p = state.position(index);
            stats.bounds_min = stats.bounds_min.min(p);
            stats.bounds_max = stats.bounds_max.max(p);
        }
        stats.mean_speed = total_speed / state.capacity() as f32;
        stats
    }
}
