//! Deterministic simulation module
//!
//! This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (by particle index, then by generator registration)
//! - No rendering or platform dependencies

pub mod collision;
pub mod constraint;
pub mod emitter;
pub mod force;
pub mod integrator;
pub mod state;
pub mod system;
pub mod tick;

pub use constraint::Constraint;
pub use emitter::{Attribute, AttributeRange, Emitter, SpawnRegion};
pub use force::Force;
pub use integrator::IntegratorKind;
pub use state::{ColorChannel, Field, STRIDE, StateBuffer};
pub use system::{ParticleSystem, SystemConfig, SystemStats};
pub use tick::{TickBuffers, TickContext, TickReport, tick};
