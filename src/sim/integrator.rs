//! Numerical integrators
//!
//! Every method reads the current state and its derivative and writes the next
//! state, which the caller has already seeded as a copy of the current one.
//! Particles that outlive their lifetime during a step are replaced by the
//! emitter and skipped for the rest of that step; the returned mask records
//! which slots were respawned.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::emitter::Emitter;
use super::force::Force;
use super::state::{Field, StateBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IntegratorKind {
    #[default]
    Euler,
    Midpoint,
    VelocityVerlet,
    BackwardEuler,
    BackwardMidpoint,
    SymplecticEuler,
}

impl IntegratorKind {
    pub const ALL: [IntegratorKind; 6] = [
        IntegratorKind::Euler,
        IntegratorKind::Midpoint,
        IntegratorKind::VelocityVerlet,
        IntegratorKind::BackwardEuler,
        IntegratorKind::BackwardMidpoint,
        IntegratorKind::SymplecticEuler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegratorKind::Euler => "Euler",
            IntegratorKind::Midpoint => "Midpoint",
            IntegratorKind::VelocityVerlet => "Velocity Verlet",
            IntegratorKind::BackwardEuler => "Backward Euler",
            IntegratorKind::BackwardMidpoint => "Backward Midpoint",
            IntegratorKind::SymplecticEuler => "Symplectic Euler",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "euler" => Some(IntegratorKind::Euler),
            "midpoint" => Some(IntegratorKind::Midpoint),
            "verlet" | "velocityverlet" => Some(IntegratorKind::VelocityVerlet),
            "backwardeuler" | "implicit" => Some(IntegratorKind::BackwardEuler),
            "backwardmidpoint" => Some(IntegratorKind::BackwardMidpoint),
            "symplectic" | "symplecticeuler" => Some(IntegratorKind::SymplecticEuler),
            _ => None,
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }

    /// Next method in cycling order, wrapping around
    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Whether this method needs the scratch buffers
    fn uses_scratch(self) -> bool {
        matches!(
            self,
            IntegratorKind::Midpoint
                | IntegratorKind::BackwardEuler
                | IntegratorKind::BackwardMidpoint
        )
    }
}

/// Everything a step needs besides the buffers
pub struct StepContext<'a, R: Rng + ?Sized> {
    pub forces: &'a [Force],
    pub emitter: &'a Emitter,
    pub aging: bool,
    pub rng: &'a mut R,
}

/// Accumulate every force generator, particle by particle
pub fn accumulate_forces(forces: &[Force], state: &mut StateBuffer) {
    for index in 0..state.capacity() {
        for force in forces {
            force.apply(state, index);
        }
    }
}

/// Time derivative of `state` written into `rate`
///
/// Age advances at 1 when aging, position at the velocity and velocity at
/// force over mass. Massless particles do not accelerate.
pub fn derivative(state: &StateBuffer, rate: &mut StateBuffer, aging: bool) {
    let age_rate = if aging { 1.0 } else { 0.0 };
    for index in 0..state.capacity() {
        let mass = state.mass(index);
        let accel = if mass > 0.0 {
            state.force(index) / mass
        } else {
            Vec3::ZERO
        };
        rate.set(index, Field::Age, age_rate);
        rate.set_position(index, state.velocity(index));
        rate.set_velocity(index, accel);
    }
}

/// Clear, accumulate and differentiate in one go
pub fn evaluate(forces: &[Force], state: &mut StateBuffer, rate: &mut StateBuffer, aging: bool) {
    state.clear_forces();
    accumulate_forces(forces, state);
    derivative(state, rate, aging);
}

/// Integrator with its lazily allocated scratch space
#[derive(Debug, Clone, Default)]
pub struct Integrator {
    kind: IntegratorKind,
    mid: Option<StateBuffer>,
    mid_rate: Option<StateBuffer>,
}

impl Integrator {
    pub fn new(kind: IntegratorKind) -> Self {
        Self {
            kind,
            mid: None,
            mid_rate: None,
        }
    }

    pub fn kind(&self) -> IntegratorKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: IntegratorKind) {
        self.kind = kind;
    }

    /// True once scratch space has been allocated
    pub fn has_scratch(&self) -> bool {
        self.mid.is_some()
    }

    fn scratch(&mut self, capacity: usize) -> (&mut StateBuffer, &mut StateBuffer) {
        let mid = self.mid.get_or_insert_with(|| StateBuffer::new(capacity));
        let mid_rate = self
            .mid_rate
            .get_or_insert_with(|| StateBuffer::new(capacity));
        (mid, mid_rate)
    }

    /// Advance `current` by `h` into `next`, returning the respawn mask
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        ctx: &mut StepContext<'_, R>,
        current: &StateBuffer,
        rate: &StateBuffer,
        next: &mut StateBuffer,
        h: f32,
    ) -> Vec<bool> {
        let kind = self.kind;
        if !kind.uses_scratch() {
            return match kind {
                IntegratorKind::VelocityVerlet => velocity_verlet(ctx, current, rate, next, h),
                IntegratorKind::SymplecticEuler => symplectic_euler(ctx, current, rate, next, h),
                _ => euler_pass(ctx, current, rate, next, h, true),
            };
        }

        let (mid, mid_rate) = self.scratch(current.capacity());
        match kind {
            IntegratorKind::Midpoint => midpoint(ctx, current, rate, next, mid, mid_rate, h),
            IntegratorKind::BackwardEuler => backward_euler(ctx, current, rate, next, mid_rate, h),
            _ => backward_midpoint(ctx, current, rate, next, mid, mid_rate, h),
        }
    }
}

/// Explicit Euler from `from` with derivative `rate` into `to`
///
/// Only scratch passes run with `respawn` off; their particles may overshoot
/// their lifetime without being replaced.
fn euler_pass<R: Rng + ?Sized>(
    ctx: &mut StepContext<'_, R>,
    from: &StateBuffer,
    rate: &StateBuffer,
    to: &mut StateBuffer,
    h: f32,
    respawn: bool,
) -> Vec<bool> {
    let mut respawned = vec![false; from.capacity()];
    for index in 0..from.capacity() {
        let age = from.age(index) + rate.age(index) * h;
        if respawn && ctx.aging && age > from.lifetime(index) {
            ctx.emitter.spawn(&mut *ctx.rng, to, index);
            respawned[index] = true;
            continue;
        }
        to.set(index, Field::Age, age);
        to.set_position(index, from.position(index) + rate.position(index) * h);
        to.set_velocity(index, from.velocity(index) + rate.velocity(index) * h);
        to.set_acceleration(index, rate.velocity(index));
    }
    respawned
}

fn midpoint<R: Rng + ?Sized>(
    ctx: &mut StepContext<'_, R>,
    current: &StateBuffer,
    rate: &StateBuffer,
    next: &mut StateBuffer,
    mid: &mut StateBuffer,
    mid_rate: &mut StateBuffer,
    h: f32,
) -> Vec<bool> {
    mid.copy_from(current);
    euler_pass(ctx, current, rate, mid, h * 0.5, false);
    evaluate(ctx.forces, mid, mid_rate, ctx.aging);
    euler_pass(ctx, current, mid_rate, next, h, true)
}

fn velocity_verlet<R: Rng + ?Sized>(
    ctx: &mut StepContext<'_, R>,
    current: &StateBuffer,
    rate: &StateBuffer,
    next: &mut StateBuffer,
    h: f32,
) -> Vec<bool> {
    let mut respawned = vec![false; current.capacity()];
    for index in 0..current.capacity() {
        let age = current.age(index) + rate.age(index) * h;
        if ctx.aging && age > current.lifetime(index) {
            ctx.emitter.spawn(&mut *ctx.rng, next, index);
            respawned[index] = true;
            continue;
        }
        let accel = current.acceleration(index);
        next.set(index, Field::Age, age);
        next.set_position(
            index,
            current.position(index) + current.velocity(index) * h + accel * (0.5 * h * h),
        );
    }

    next.clear_forces();
    accumulate_forces(ctx.forces, next);

    for index in 0..current.capacity() {
        if respawned[index] {
            continue;
        }
        let mass = next.mass(index);
        let new_accel = if mass > 0.0 {
            next.force(index) / mass
        } else {
            Vec3::ZERO
        };
        let accel = current.acceleration(index);
        next.set_velocity(
            index,
            current.velocity(index) + (accel + new_accel) * (0.5 * h),
        );
        next.set_acceleration(index, new_accel);
    }
    clear_respawned_forces(next, &respawned);
    respawned
}

/// Single fixed-point iteration: step, re-evaluate at the result, step again
fn backward_euler<R: Rng + ?Sized>(
    ctx: &mut StepContext<'_, R>,
    current: &StateBuffer,
    rate: &StateBuffer,
    next: &mut StateBuffer,
    next_rate: &mut StateBuffer,
    h: f32,
) -> Vec<bool> {
    let respawned = euler_pass(ctx, current, rate, next, h, true);
    evaluate(ctx.forces, next, next_rate, ctx.aging);

    for index in 0..current.capacity() {
        if respawned[index] {
            continue;
        }
        next.set(index, Field::Age, current.age(index) + next_rate.age(index) * h);
        next.set_position(index, current.position(index) + next_rate.position(index) * h);
        next.set_velocity(index, current.velocity(index) + next_rate.velocity(index) * h);
        next.set_acceleration(index, next_rate.velocity(index));
    }
    clear_respawned_forces(next, &respawned);
    respawned
}

/// Fresh particles start the next tick with an empty accumulator even when a
/// later pass re-evaluated forces over them
fn clear_respawned_forces(next: &mut StateBuffer, respawned: &[bool]) {
    for (index, _) in respawned.iter().enumerate().filter(|(_, r)| **r) {
        next.set_force(index, Vec3::ZERO);
    }
}

/// Position and velocity of `target` set to `origin - rate * h`
fn step_back(origin: &StateBuffer, rate: &StateBuffer, target: &mut StateBuffer, h: f32) {
    for index in 0..origin.capacity() {
        target.set_position(index, origin.position(index) - rate.position(index) * h);
        target.set_velocity(index, origin.velocity(index) - rate.velocity(index) * h);
    }
}

/// Midpoint forward, then walk back from the result and split the residual
///
/// One fixed-point iteration only; not a converged implicit solve.
fn backward_midpoint<R: Rng + ?Sized>(
    ctx: &mut StepContext<'_, R>,
    current: &StateBuffer,
    rate: &StateBuffer,
    next: &mut StateBuffer,
    mid: &mut StateBuffer,
    mid_rate: &mut StateBuffer,
    h: f32,
) -> Vec<bool> {
    let respawned = midpoint(ctx, current, rate, next, mid, mid_rate, h);

    evaluate(ctx.forces, next, mid_rate, ctx.aging);
    mid.copy_from(next);
    step_back(next, mid_rate, mid, h * 0.5);
    evaluate(ctx.forces, mid, mid_rate, ctx.aging);
    step_back(next, mid_rate, mid, h);

    for index in 0..current.capacity() {
        if respawned[index] {
            continue;
        }
        let pos_residual = mid.position(index) - current.position(index);
        let vel_residual = mid.velocity(index) - current.velocity(index);
        next.set_position(index, next.position(index) - pos_residual * 0.5);
        next.set_velocity(index, next.velocity(index) - vel_residual * 0.5);
    }
    clear_respawned_forces(next, &respawned);
    respawned
}

fn symplectic_euler<R: Rng + ?Sized>(
    ctx: &mut StepContext<'_, R>,
    current: &StateBuffer,
    rate: &StateBuffer,
    next: &mut StateBuffer,
    h: f32,
) -> Vec<bool> {
    let respawned = euler_pass(ctx, current, rate, next, h, true);
    for index in 0..current.capacity() {
        if !respawned[index] {
            next.set_position(index, current.position(index) + next.velocity(index) * h);
        }
    }
    respawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::emitter::{Attribute, SpawnRegion};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const H: f32 = 0.01;

    /// One unit-mass particle at rest at the origin
    fn single_particle(lifetime: f32) -> StateBuffer {
        let mut state = StateBuffer::new(1);
        state.set(0, Field::Mass, 1.0);
        state.set(0, Field::Lifetime, lifetime);
        state
    }

    fn run(
        kind: IntegratorKind,
        forces: &[Force],
        current: &StateBuffer,
        aging: bool,
    ) -> (StateBuffer, Vec<bool>) {
        let emitter = Emitter::new(SpawnRegion::Point {
            position: Vec3::new(9.0, 9.0, 9.0),
        });
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ctx = StepContext {
            forces,
            emitter: &emitter,
            aging,
            rng: &mut rng,
        };
        let mut current = current.clone();
        let mut rate = StateBuffer::new(current.capacity());
        evaluate(forces, &mut current, &mut rate, aging);
        let mut next = current.clone();
        let mut integrator = Integrator::new(kind);
        let mask = integrator.step(&mut ctx, &current, &rate, &mut next, H);
        (next, mask)
    }

    #[test]
    fn test_kind_cycles() {
        assert_eq!(IntegratorKind::Euler.next(), IntegratorKind::Midpoint);
        assert_eq!(IntegratorKind::SymplecticEuler.next(), IntegratorKind::Euler);
        assert_eq!(IntegratorKind::Euler.previous(), IntegratorKind::SymplecticEuler);
        for kind in IntegratorKind::ALL {
            assert_eq!(kind.next().previous(), kind);
            assert_eq!(IntegratorKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(IntegratorKind::from_str("rk4"), None);
    }

    #[test]
    fn test_derivative_guards_zero_mass() {
        let mut state = StateBuffer::new(1);
        state.set_velocity(0, Vec3::X);
        state.set_force(0, Vec3::Z);
        let mut rate = StateBuffer::new(1);
        derivative(&state, &mut rate, true);
        assert_eq!(rate.velocity(0), Vec3::ZERO);
        assert_eq!(rate.position(0), Vec3::X);
        assert_eq!(rate.age(0), 1.0);

        derivative(&state, &mut rate, false);
        assert_eq!(rate.age(0), 0.0);
    }

    #[test]
    fn test_every_method_follows_constant_force() {
        let gravity = [Force::gravity(10.0, Vec3::NEG_Z)];
        let mut state = single_particle(5.0);
        // Verlet reads the acceleration cached by the previous tick
        state.set_acceleration(0, Vec3::new(0.0, 0.0, -10.0));
        for kind in IntegratorKind::ALL {
            let (next, mask) = run(kind, &gravity, &state, true);
            assert_eq!(mask, vec![false], "{}", kind.as_str());
            assert!(
                (next.velocity(0).z + 10.0 * H).abs() < 1e-4,
                "{} vz = {}",
                kind.as_str(),
                next.velocity(0).z
            );
            assert!(next.position(0).z <= 0.0, "{}", kind.as_str());
            assert!((next.age(0) - H).abs() < 1e-6, "{}", kind.as_str());
        }
    }

    #[test]
    fn test_euler_caches_acceleration() {
        let (next, _) = run(
            IntegratorKind::Euler,
            &[Force::gravity(2.0, Vec3::NEG_Z)],
            &single_particle(5.0),
            false,
        );
        assert_eq!(next.acceleration(0), Vec3::new(0.0, 0.0, -2.0));
        // Aging off: age frozen
        assert_eq!(next.age(0), 0.0);
    }

    #[test]
    fn test_expired_particle_respawns_in_every_method() {
        let mut state = single_particle(1.0);
        state.set(0, Field::Age, 1.0);
        state.set_velocity(0, Vec3::new(3.0, 0.0, 0.0));
        for kind in IntegratorKind::ALL {
            let (next, mask) = run(kind, &[Force::drag(0.1)], &state, true);
            assert_eq!(mask, vec![true], "{}", kind.as_str());
            assert_eq!(next.age(0), 0.0);
            assert_eq!(next.position(0), Vec3::new(9.0, 9.0, 9.0), "{}", kind.as_str());
            assert_eq!(next.force(0), Vec3::ZERO, "{}", kind.as_str());
        }
    }

    #[test]
    fn test_scratch_allocated_lazily() {
        let emitter = Emitter::default().with_range(Attribute::Mass, 1.0, 1.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ctx = StepContext {
            forces: &[],
            emitter: &emitter,
            aging: false,
            rng: &mut rng,
        };
        let current = single_particle(1.0);
        let rate = StateBuffer::new(1);
        let mut next = current.clone();

        let mut integrator = Integrator::new(IntegratorKind::Euler);
        integrator.step(&mut ctx, &current, &rate, &mut next, H);
        assert!(!integrator.has_scratch());

        integrator.set_kind(IntegratorKind::Midpoint);
        integrator.step(&mut ctx, &current, &rate, &mut next, H);
        assert!(integrator.has_scratch());
    }

    #[test]
    fn test_symplectic_uses_updated_velocity() {
        let (next, _) = run(
            IntegratorKind::SymplecticEuler,
            &[Force::gravity(1.0, Vec3::NEG_Z)],
            &single_particle(5.0),
            false,
        );
        assert!((next.position(0).z + H * H).abs() < 1e-7);
    }

    #[test]
    fn test_verlet_uses_cached_acceleration() {
        let mut state = single_particle(5.0);
        state.set_acceleration(0, Vec3::new(0.0, 0.0, -4.0));
        let (next, _) = run(IntegratorKind::VelocityVerlet, &[], &state, false);
        assert!((next.position(0).z + 0.5 * 4.0 * H * H).abs() < 1e-7);
        // No force at the new position: a' = 0, v = -4 * h / 2
        assert!((next.velocity(0).z + 2.0 * H).abs() < 1e-6);
        assert_eq!(next.acceleration(0), Vec3::ZERO);
    }
}
