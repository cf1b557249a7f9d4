//! Hue/saturation/intensity color helpers
//!
//! Particles carry color as HSI. Renderers reading the state store convert it
//! here and upload point vertices straight from the resulting slice.

use bytemuck::{Pod, Zeroable};

use crate::sim::StateBuffer;

/// Point vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl PointVertex {
    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Convert HSI to RGB
///
/// Hue is in degrees and wraps; saturation and intensity are in [0, 1].
/// Channels are clamped to 1.
pub fn hsi_to_rgb(hue: f32, saturation: f32, intensity: f32) -> [f32; 3] {
    let h = hue.rem_euclid(360.0) / 60.0;
    let z = 1.0 - ((h % 2.0) - 1.0).abs();
    let c = 3.0 * saturation * intensity / (1.0 + z);
    let x = c * z;
    let m = intensity * (1.0 - saturation);

    let (r, g, b) = match h {
        h if h < 1.0 => (c, x, 0.0),
        h if h < 2.0 => (x, c, 0.0),
        h if h < 3.0 => (0.0, c, x),
        h if h < 4.0 => (0.0, x, c),
        h if h < 5.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [(r + m).min(1.0), (g + m).min(1.0), (b + m).min(1.0)]
}

/// RGB color of one particle
pub fn particle_rgb(state: &StateBuffer, index: usize) -> [f32; 3] {
    let hsi = state.color(index);
    hsi_to_rgb(hsi.x, hsi.y, hsi.z)
}

/// Fill `out` with one opaque vertex per particle, reusing its allocation
pub fn write_vertices(state: &StateBuffer, out: &mut Vec<PointVertex>) {
    out.clear();
    out.extend((0..state.capacity()).map(|i| {
        let [r, g, b] = particle_rgb(state, i);
        PointVertex::new(state.position(i).to_array(), [r, g, b, 1.0])
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Field;
    use glam::Vec3;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_primaries() {
        let third = 1.0 / 3.0;
        assert!(close(hsi_to_rgb(0.0, 1.0, third), [1.0, 0.0, 0.0]));
        assert!(close(hsi_to_rgb(120.0, 1.0, third), [0.0, 1.0, 0.0]));
        assert!(close(hsi_to_rgb(240.0, 1.0, third), [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_zero_saturation_is_gray() {
        assert!(close(hsi_to_rgb(200.0, 0.0, 0.4), [0.4, 0.4, 0.4]));
    }

    #[test]
    fn test_hue_wraps() {
        assert!(close(hsi_to_rgb(-120.0, 0.5, 0.5), hsi_to_rgb(240.0, 0.5, 0.5)));
        assert!(close(hsi_to_rgb(400.0, 0.5, 0.5), hsi_to_rgb(40.0, 0.5, 0.5)));
    }

    #[test]
    fn test_channels_clamped() {
        let rgb = hsi_to_rgb(60.0, 1.0, 1.0);
        assert!(rgb.iter().all(|c| *c <= 1.0));
    }

    #[test]
    fn test_write_vertices() {
        let mut state = StateBuffer::new(2);
        state.set_position(1, Vec3::new(1.0, 2.0, 3.0));
        state.set(1, Field::Intensity, 0.5);
        let mut out = vec![PointVertex::zeroed(); 7];
        write_vertices(&state, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].position, [1.0, 2.0, 3.0]);
        assert!(close([out[1].color[0], out[1].color[1], out[1].color[2]], [0.5, 0.5, 0.5]));
        assert_eq!(bytemuck::cast_slice::<PointVertex, u8>(&out).len(), 2 * 28);
    }
}
