//! Collision geometry shared by the constraint generators
//!
//! Reflection about a surface normal, normal/tangent splitting, orthonormal
//! frames for oriented boxes and plates, and ray entry into a sphere.

use glam::Vec3;

use crate::consts::EPSILON;

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n, `normal` must be unit length
#[inline]
pub fn reflect(velocity: Vec3, normal: Vec3) -> Vec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Split a vector into its component along `normal` and the tangential rest
///
/// Returns `(normal_part, tangent_part)`.
#[inline]
pub fn split_normal(v: Vec3, normal: Vec3) -> (Vec3, Vec3) {
    let vn = normal * v.dot(normal);
    (vn, v - vn)
}

/// Right-handed orthonormal frame built from two in-plane directions
///
/// `u` follows the first direction, `v` is the second direction made
/// perpendicular to it and `n = u × v` completes the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub u: Vec3,
    pub v: Vec3,
    pub n: Vec3,
}

impl Frame {
    /// Gram-Schmidt orthonormalization; `None` when the directions are
    /// zero-length or parallel
    pub fn from_axes(length_dir: Vec3, width_dir: Vec3) -> Option<Self> {
        if length_dir.length() < EPSILON {
            return None;
        }
        let u = length_dir.normalize();
        let w = width_dir - u * width_dir.dot(u);
        if w.length() < EPSILON {
            return None;
        }
        let v = w.normalize();
        Some(Self { u, v, n: u.cross(v) })
    }

    pub fn axes(&self) -> [Vec3; 3] {
        [self.u, self.v, self.n]
    }

    /// Coordinates of `p` relative to `origin` in this frame
    #[inline]
    pub fn local(&self, origin: Vec3, p: Vec3) -> Vec3 {
        let d = p - origin;
        Vec3::new(d.dot(self.u), d.dot(self.v), d.dot(self.n))
    }
}

/// Parameter `t` in [0, 1] where the segment `from → to` first enters the sphere
///
/// Returns `None` when the segment starts inside, misses the sphere or is
/// degenerate.
pub fn ray_sphere_entry(from: Vec3, to: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let dir = to - from;
    let a = dir.length_squared();
    if a < EPSILON * EPSILON {
        return None;
    }
    let oc = from - center;
    let c = oc.length_squared() - radius * radius;
    if c < 0.0 {
        return None;
    }
    let b = 2.0 * oc.dot(dir);
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Signed distance from `p` to the plane through `point` with unit `normal`
#[inline]
pub fn signed_distance(p: Vec3, point: Vec3, normal: Vec3) -> f32 {
    (p - point).dot(normal)
}

/// True when two signed distances lie on opposite sides of a surface
///
/// Zero counts as the positive side, so resting exactly on the surface and then
/// sinking below is a crossing.
#[inline]
pub fn crossed(before: f32, after: f32) -> bool {
    (before >= 0.0 && after < 0.0) || (before < 0.0 && after >= 0.0)
}
