//! Fixed timestep simulation tick
//!
//! One tick runs strictly ordered phases over owned buffers:
//! clear → force → derivative → integrate → constrain → recycle → swap.

use rand_pcg::Pcg32;

use super::constraint::Constraint;
use super::emitter::Emitter;
use super::force::Force;
use super::integrator::{Integrator, StepContext, accumulate_forces, derivative};
use super::state::StateBuffer;
use crate::consts::NUDGE_MAGNITUDE;
use crate::random_direction;

/// The buffers a tick consumes and hands back
///
/// `current` is the state at the start of the tick; after the tick the old
/// `next` is returned as `current` and the old `current` becomes storage for
/// the following tick's `next`.
#[derive(Debug, Clone, Default)]
pub struct TickBuffers {
    pub current: StateBuffer,
    pub next: StateBuffer,
    /// Derivative of `current`
    pub rate: StateBuffer,
}

impl TickBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            current: StateBuffer::new(capacity),
            next: StateBuffer::new(capacity),
            rate: StateBuffer::new(capacity),
        }
    }
}

/// Inputs for a single tick (deterministic)
pub struct TickContext<'a> {
    pub forces: &'a [Force],
    pub constraints: &'a [Constraint],
    pub emitter: &'a Emitter,
    pub integrator: &'a mut Integrator,
    pub aging: bool,
    pub rng: &'a mut Pcg32,
    /// Kick every particle in a random direction before forces are evaluated
    pub nudge: bool,
}

/// Summary of what happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Particles replaced by the integrator
    pub respawned: usize,
    /// Expired particles caught after constraints ran
    pub recovered: usize,
}

/// Advance the particle state by one timestep
pub fn tick(buffers: TickBuffers, mut ctx: TickContext<'_>, dt: f32) -> (TickBuffers, TickReport) {
    let TickBuffers {
        mut current,
        mut next,
        mut rate,
    } = buffers;
    let capacity = current.capacity();

    if ctx.nudge {
        for index in 0..capacity {
            let kick = random_direction(&mut *ctx.rng, NUDGE_MAGNITUDE);
            current.set_velocity(index, current.velocity(index) + kick);
        }
    }

    // Forces and derivative at the start of the tick
    current.clear_forces();
    accumulate_forces(ctx.forces, &mut current);
    derivative(&current, &mut rate, ctx.aging);

    // Integrate
    next.copy_from(&current);
    let mut step_ctx = StepContext {
        forces: ctx.forces,
        emitter: ctx.emitter,
        aging: ctx.aging,
        rng: &mut *ctx.rng,
    };
    let respawned = ctx
        .integrator
        .step(&mut step_ctx, &current, &rate, &mut next, dt);

    // Constrain, particle-major
    for index in 0..capacity {
        for constraint in ctx.constraints {
            constraint.apply(&current, &mut next, index, dt);
        }
    }

    // Recycle anything that slipped past the integrator
    let mut report = TickReport {
        respawned: respawned.iter().filter(|r| **r).count(),
        recovered: 0,
    };
    if ctx.aging {
        for index in 0..capacity {
            let expired = next.is_expired(index);
            debug_assert!(
                !expired,
                "particle {index} outlived its lifetime ({} > {})",
                next.age(index),
                next.lifetime(index)
            );
            if expired {
                log::warn!(
                    "particle {index} outlived its lifetime ({} > {}), respawning",
                    next.age(index),
                    next.lifetime(index)
                );
                ctx.emitter.spawn(&mut *ctx.rng, &mut next, index);
                report.recovered += 1;
            }
        }
    }
    if report.respawned > 0 {
        log::debug!("respawned {} particles", report.respawned);
    }

    // Swap by move
    let buffers = TickBuffers {
        current: next,
        next: current,
        rate,
    };
    (buffers, report)
}
