//! Orbital motion model
//!
//! Each sphere wobbles a little around its anchor and partially follows the
//! head. The wobble is spherical in form but deliberately tiny: it is capped
//! far below the orbit radius so the layout reads as floating, not orbiting.

use glam::Vec2;

use super::sphere::{Orbit, OrbitPhase, Sphere};
use crate::settings::Settings;

/// Advance the wobble angles by `dt`
#[inline]
pub fn advance_orbit(sphere: &mut Sphere, dt: f32) {
    sphere.phase.theta += sphere.orbit.d_theta * dt;
    sphere.phase.phi += sphere.orbit.d_phi * dt;
}

/// Wobble radius for an orbit
#[inline]
pub fn wobble_radius(orbit: &Orbit, settings: &Settings) -> f32 {
    (orbit.base_radius * settings.wobble_fraction)
        .min(settings.wobble_cap)
        .max(0.0)
}

/// Small periodic offset on the face plane
pub fn wobble_offset(orbit: &Orbit, phase: &OrbitPhase, settings: &Settings) -> Vec2 {
    let r = wobble_radius(orbit, settings);
    Vec2::new(
        r * phase.phi.sin() * phase.theta.cos(),
        r * phase.phi.cos(),
    )
}

/// Where the sphere wants to be this frame, before any collision handling
///
/// `extra` carries the return wobble of spheres easing back home.
pub fn desired_position(
    sphere: &Sphere,
    head_offset: Vec2,
    extra: Vec2,
    settings: &Settings,
) -> Vec2 {
    sphere.anchor()
        + head_offset * settings.head_follow
        + wobble_offset(&sphere.orbit, &sphere.phase, settings)
        + extra
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sphere::{SphereColor, SphereState};
    use glam::Vec3;

    fn sphere(base_radius: f32) -> Sphere {
        let orbit = Orbit {
            base_radius,
            d_theta: 0.5,
            d_phi: -0.25,
            follow_lerp: 0.2,
        };
        Sphere::new(3, Vec3::new(2.0, 0.0, 3.08), 0.1, SphereColor([0, 255, 255]), orbit, 0.04)
    }

    #[test]
    fn test_wobble_is_capped() {
        let settings = Settings::default();
        let far = sphere(10.0);
        assert!((wobble_radius(&far.orbit, &settings) - settings.wobble_cap).abs() < 1e-6);
        let near = sphere(0.2);
        assert!((wobble_radius(&near.orbit, &settings) - 0.03).abs() < 1e-6);

        let mut s = far;
        for _ in 0..500 {
            advance_orbit(&mut s, 1.0 / 60.0);
            let offset = wobble_offset(&s.orbit, &s.phase, &settings);
            assert!(offset.length() <= settings.wobble_cap + 1e-6);
        }
    }

    #[test]
    fn test_advance_orbit_uses_velocities() {
        let mut s = sphere(2.0);
        advance_orbit(&mut s, 2.0);
        assert!((s.phase.theta - 1.0).abs() < 1e-6);
        assert!((s.phase.phi + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_desired_follows_fraction_of_head() {
        let settings = Settings::default();
        let s = sphere(0.0);
        let desired = desired_position(&s, Vec2::new(1.0, -2.0), Vec2::ZERO, &settings);
        let expected = Vec2::new(2.0, 0.0) + Vec2::new(1.0, -2.0) * settings.head_follow;
        assert!((desired - expected).length() < 1e-6);
    }

    #[test]
    fn test_desired_uses_displaced_anchor() {
        let settings = Settings::default();
        let mut s = sphere(0.0);
        s.state = SphereState::Displaced {
            anchor: Vec2::new(2.5, 0.5),
            since: 0.0,
            cooldown_until: 0.4,
            last_boundary: Vec2::new(2.5, 0.5),
        };
        let desired = desired_position(&s, Vec2::ZERO, Vec2::ZERO, &settings);
        assert!((desired - Vec2::new(2.5, 0.5)).length() < 1e-6);
    }
}
