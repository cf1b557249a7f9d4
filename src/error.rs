//! Error types for scene configuration.
//!
//! Only configuration can fail. Numerical degeneracies during a tick are
//! guarded where they occur and never surface here.

use thiserror::Error;

/// Errors raised while building or loading a particle system.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A system needs at least one particle slot.
    #[error("particle capacity must be at least 1")]
    ZeroCapacity,

    /// A two-body force referenced a particle slot that does not exist.
    #[error("{generator} references particle {index}, but capacity is {capacity}")]
    ParticleIndexOutOfRange {
        generator: &'static str,
        index: usize,
        capacity: usize,
    },

    /// Both spring endpoints are the same particle.
    #[error("spring endpoints must differ (both are particle {0})")]
    SelfSpring(usize),

    /// An attribute range has its bounds swapped.
    #[error("{attribute} range is inverted: [{min}, {max}]")]
    InvertedRange {
        attribute: &'static str,
        min: f32,
        max: f32,
    },

    /// Mass and lifetime must stay positive so derivatives and age ratios are finite.
    #[error("{attribute} minimum must be positive, got {min}")]
    NonPositive { attribute: &'static str, min: f32 },

    /// A direction, normal or axis pair cannot span the required frame.
    #[error("{0} has degenerate axes")]
    DegenerateAxes(&'static str),

    /// Generator lists are frozen once the first tick has run.
    #[error("cannot add a {0} after the simulation has started")]
    Frozen(&'static str),

    /// No generator registered at that position.
    #[error("no {kind} at index {index}")]
    UnknownGenerator { kind: &'static str, index: usize },

    /// Scene name not found among the presets.
    #[error("unknown scene preset: {0}")]
    UnknownPreset(String),

    /// Failed to read a configuration file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration file.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
