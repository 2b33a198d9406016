//! Per-frame low-pass filter on resolved positions

use glam::Vec2;

use crate::consts::REFERENCE_FPS;
use crate::exp_blend;
use crate::settings::Settings;

/// Continuous rate equivalent to lerping by `follow_lerp` every 60 fps frame
#[inline]
pub fn follow_lerp_rate(follow_lerp: f32) -> f32 {
    -(1.0 - follow_lerp.clamp(1e-4, 0.999)).ln() * REFERENCE_FPS
}

/// Filter rate for a sphere: heavier smoothing when it was bumped
#[inline]
pub fn smoothing_rate(follow_lerp: f32, bumped: bool, settings: &Settings) -> f32 {
    if bumped {
        settings.bumped_smoothing_rate
    } else {
        follow_lerp_rate(follow_lerp)
    }
}

/// Move `prev` toward `target` by `k = 1 - e^(-rate * dt)`
#[inline]
pub fn smooth_toward(prev: Vec2, target: Vec2, rate: f32, dt: f32) -> Vec2 {
    prev + (target - prev) * exp_blend(rate, dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_lerp_rate_matches_60fps_lerp() {
        let rate = follow_lerp_rate(0.2);
        let k = exp_blend(rate, 1.0 / 60.0);
        assert!((k - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_bumped_spheres_smooth_harder() {
        let settings = Settings::default();
        for lerp in [settings.follow_lerp_min, settings.follow_lerp_max] {
            assert!(smoothing_rate(lerp, true, &settings) < smoothing_rate(lerp, false, &settings));
        }
    }

    #[test]
    fn test_smooth_toward_converges_without_overshoot() {
        let target = Vec2::new(1.0, -1.0);
        let mut p = Vec2::ZERO;
        for _ in 0..120 {
            let next = smooth_toward(p, target, 10.0, 1.0 / 60.0);
            assert!((target - next).length() <= (target - p).length());
            p = next;
        }
        assert!((p - target).length() < 1e-3);
    }
}
