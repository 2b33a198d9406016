//! Sphere Halo - decorative spheres orbiting a tracked face
//!
//! Core modules:
//! - `sim`: Deterministic simulation (placement, motion, collisions, return easing)
//! - `renderer`: Per-frame output handed to the rendering backend
//! - `persistence`: Sphere descriptor lists (load, validate, capture)
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Data-driven tuning

pub mod error;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, ControlError};
pub use settings::{MotionPreset, Settings};

/// Engine constants that are not tuning knobs
pub mod consts {
    /// Upper bound on a frame's dt (seconds); larger spikes are clamped
    pub const MAX_FRAME_DT: f32 = 0.033;
    /// Frame rate the per-sphere follow lerp was authored against
    pub const REFERENCE_FPS: f32 = 60.0;
    /// Face colliders smaller than this are treated as missing
    pub const MIN_FACE_RADIUS: f32 = 1e-3;
    /// Extra distance added by exact clamps so float error stays on the safe side
    pub const CLAMP_SLOP: f32 = 1e-4;
    /// Distances below this count as coincident
    pub const DIST_EPSILON: f32 = 1e-6;

    /// Tracker defaults used before the first face arrives
    pub const DEFAULT_FACE_DEPTH: f32 = 3.0;
    pub const DEFAULT_FACE_RADIUS: f32 = 0.9;
    pub const DEFAULT_FACE_MARGIN: f32 = 0.1;
}

/// Frame-rate independent blend factor for an exponential filter
#[inline]
pub fn exp_blend(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate.max(0.0) * dt.max(0.0)).exp()
}

/// Hermite smoothstep between `edge0` and `edge1`
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Integer hash for per-entity pseudo-randomness (golden ratio multiply + xorshift)
#[inline]
pub fn hash_u32(mut x: u32) -> u32 {
    x = x.wrapping_mul(2654435761);
    x ^= x >> 16;
    x = x.wrapping_mul(0x45d9f3b);
    x ^= x >> 16;
    x
}

/// Map a hash to [0, 1)
#[inline]
pub fn hash_unit(x: u32) -> f32 {
    (hash_u32(x) >> 8) as f32 / (1u32 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
        // Degenerate range acts as a step
        assert_eq!(smoothstep(1.0, 1.0, 0.5), 0.0);
        assert_eq!(smoothstep(1.0, 1.0, 1.5), 1.0);
    }

    #[test]
    fn test_exp_blend_frame_rate_independent() {
        // Two half steps equal one full step
        let full = exp_blend(8.0, 1.0 / 30.0);
        let half = exp_blend(8.0, 1.0 / 60.0);
        let two_halves = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((full - two_halves).abs() < 1e-6);
        assert_eq!(exp_blend(8.0, 0.0), 0.0);
    }

    #[test]
    fn test_hash_unit_range() {
        for i in 0..1000 {
            let v = hash_unit(i);
            assert!((0.0..1.0).contains(&v));
        }
        assert_eq!(hash_u32(42), hash_u32(42));
    }
}
