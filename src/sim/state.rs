//! Packed particle state store
//!
//! Every particle is a fixed-width record of `f32` fields laid out back to back
//! in one contiguous buffer. The layout is shared by the current, next, rate and
//! scratch buffers, so a derivative is just another `StateBuffer`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of `f32` fields in one particle record
pub const STRIDE: usize = 18;

const POSITION: usize = Field::PosX as usize;
const VELOCITY: usize = Field::VelX as usize;
const ACCELERATION: usize = Field::AccX as usize;
const FORCE: usize = Field::ForceX as usize;

/// Field tags of a particle record, in storage order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Field {
    Age = 0,
    Lifetime,
    PosX,
    PosY,
    PosZ,
    VelX,
    VelY,
    VelZ,
    /// Cached acceleration (written by Euler-family steps, read by velocity Verlet)
    AccX,
    AccY,
    AccZ,
    Mass,
    Hue,
    Saturation,
    Intensity,
    /// Force accumulator, cleared at the start of every evaluation
    ForceX,
    ForceY,
    ForceZ,
}

impl Field {
    pub const ALL: [Field; STRIDE] = [
        Field::Age,
        Field::Lifetime,
        Field::PosX,
        Field::PosY,
        Field::PosZ,
        Field::VelX,
        Field::VelY,
        Field::VelZ,
        Field::AccX,
        Field::AccY,
        Field::AccZ,
        Field::Mass,
        Field::Hue,
        Field::Saturation,
        Field::Intensity,
        Field::ForceX,
        Field::ForceY,
        Field::ForceZ,
    ];

    /// Offset of this field inside a record
    #[inline]
    pub const fn offset(self) -> usize {
        self as usize
    }
}

/// One of the three channels of the hue/saturation/intensity color model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorChannel {
    /// Degrees, wraps at 360
    Hue,
    /// [0, 1]
    Saturation,
    /// [0, 1]
    Intensity,
}

impl ColorChannel {
    pub fn field(self) -> Field {
        match self {
            ColorChannel::Hue => Field::Hue,
            ColorChannel::Saturation => Field::Saturation,
            ColorChannel::Intensity => Field::Intensity,
        }
    }
}

/// Fixed-capacity buffer of particle records
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateBuffer {
    capacity: usize,
    data: Vec<f32>,
}

impl StateBuffer {
    /// Allocate a zero-initialized buffer for `capacity` particles
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: vec![0.0; capacity * STRIDE],
        }
    }

    /// Number of particle records (never changes after allocation)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn base(&self, index: usize) -> usize {
        assert!(
            index < self.capacity,
            "particle index {index} out of range for capacity {}",
            self.capacity
        );
        index * STRIDE
    }

    #[inline]
    pub fn get(&self, index: usize, field: Field) -> f32 {
        self.data[self.base(index) + field.offset()]
    }

    #[inline]
    pub fn set(&mut self, index: usize, field: Field, value: f32) {
        let at = self.base(index) + field.offset();
        self.data[at] = value;
    }

    #[inline]
    fn vec3(&self, index: usize, offset: usize) -> Vec3 {
        let at = self.base(index) + offset;
        Vec3::from_slice(&self.data[at..at + 3])
    }

    #[inline]
    fn set_vec3(&mut self, index: usize, offset: usize, value: Vec3) {
        let at = self.base(index) + offset;
        value.write_to_slice(&mut self.data[at..at + 3]);
    }

    #[inline]
    pub fn age(&self, index: usize) -> f32 {
        self.get(index, Field::Age)
    }

    #[inline]
    pub fn lifetime(&self, index: usize) -> f32 {
        self.get(index, Field::Lifetime)
    }

    #[inline]
    pub fn mass(&self, index: usize) -> f32 {
        self.get(index, Field::Mass)
    }

    #[inline]
    pub fn position(&self, index: usize) -> Vec3 {
        self.vec3(index, POSITION)
    }

    #[inline]
    pub fn set_position(&mut self, index: usize, value: Vec3) {
        self.set_vec3(index, POSITION, value);
    }

    #[inline]
    pub fn velocity(&self, index: usize) -> Vec3 {
        self.vec3(index, VELOCITY)
    }

    #[inline]
    pub fn set_velocity(&mut self, index: usize, value: Vec3) {
        self.set_vec3(index, VELOCITY, value);
    }

    #[inline]
    pub fn acceleration(&self, index: usize) -> Vec3 {
        self.vec3(index, ACCELERATION)
    }

    #[inline]
    pub fn set_acceleration(&mut self, index: usize, value: Vec3) {
        self.set_vec3(index, ACCELERATION, value);
    }

    #[inline]
    pub fn force(&self, index: usize) -> Vec3 {
        self.vec3(index, FORCE)
    }

    #[inline]
    pub fn set_force(&mut self, index: usize, value: Vec3) {
        self.set_vec3(index, FORCE, value);
    }

    /// Accumulate into the force field of one particle
    #[inline]
    pub fn add_force(&mut self, index: usize, value: Vec3) {
        let total = self.force(index) + value;
        self.set_force(index, total);
    }

    /// Hue, saturation and intensity packed as a vector
    #[inline]
    pub fn color(&self, index: usize) -> Vec3 {
        self.vec3(index, Field::Hue.offset())
    }

    /// True when the particle has outlived its lifetime
    #[inline]
    pub fn is_expired(&self, index: usize) -> bool {
        self.age(index) > self.lifetime(index)
    }

    /// Zero the force accumulator of every particle
    pub fn clear_forces(&mut self) {
        for record in self.data.chunks_exact_mut(STRIDE) {
            record[FORCE..FORCE + 3].fill(0.0);
        }
    }

    /// Bulk copy another buffer of the same capacity into this one
    pub fn copy_from(&mut self, other: &StateBuffer) {
        assert_eq!(
            self.capacity, other.capacity,
            "state buffers must share a capacity"
        );
        self.data.copy_from_slice(&other.data);
    }

    /// Raw fields of one particle
    pub fn record(&self, index: usize) -> &[f32] {
        let at = self.base(index);
        &self.data[at..at + STRIDE]
    }

    pub fn record_mut(&mut self, index: usize) -> &mut [f32] {
        let at = self.base(index);
        &mut self.data[at..at + STRIDE]
    }

    /// Every field of every particle, record-major
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Byte view for uploading into a vertex buffer
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
