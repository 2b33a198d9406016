//! Displacement and return easing
//!
//! `Free -> Displaced` when the face box pushes a sphere. The displaced
//! anchor holds while the repel cooldown runs, then eases back to base with
//! a distance-aware rate; `Displaced -> Free` once it is within the return
//! threshold.

use glam::Vec2;

use super::sphere::{Sphere, SphereState, return_wobble_params};
use crate::settings::Settings;
use crate::{exp_blend, smoothstep};

/// Record a face-box hit
///
/// `boundary` is the world-space target outside the box and `offset` is
/// what the motion model added on top of the anchor this frame, so the
/// anchor drifts toward the spot that puts the sphere at the boundary.
pub fn mark_displaced(
    sphere: &mut Sphere,
    boundary: Vec2,
    offset: Vec2,
    now: f64,
    settings: &Settings,
) {
    let anchor_target = boundary - offset;
    let factor = settings.face_resolve_factor;
    let cooldown = now + settings.repel_cooldown as f64;

    match &mut sphere.state {
        SphereState::Free => {
            let base = sphere.base.truncate();
            sphere.state = SphereState::Displaced {
                anchor: base + (anchor_target - base) * factor,
                since: now,
                cooldown_until: cooldown,
                last_boundary: boundary,
            };
            log::trace!("Sphere {} displaced", sphere.id);
        }
        SphereState::Displaced {
            anchor,
            cooldown_until,
            last_boundary,
            ..
        } => {
            *anchor += (anchor_target - *anchor) * factor;
            *cooldown_until = cooldown;
            *last_boundary = boundary;
        }
    }
}

/// Ease a displaced anchor back toward base; true when it becomes free
pub fn ease_return(sphere: &mut Sphere, now: f64, dt: f32, settings: &Settings) -> bool {
    let base = sphere.base.truncate();
    let SphereState::Displaced {
        anchor,
        cooldown_until,
        ..
    } = &mut sphere.state
    else {
        return false;
    };

    if now <= *cooldown_until {
        return false;
    }

    let dist = (base - *anchor).length();
    if dist >= settings.return_threshold {
        // Far displacements come back quickly, near ones settle gently
        let t = smoothstep(0.0, settings.return_far_distance, dist);
        let rate = settings.return_rate_near
            + (settings.return_rate_far - settings.return_rate_near) * t;
        *anchor += (base - *anchor) * exp_blend(rate, dt);
    }

    if (base - *anchor).length() < settings.return_threshold {
        sphere.state = SphereState::Free;
        log::trace!("Sphere {} back at base", sphere.id);
        return true;
    }
    false
}

/// Decaying per-sphere wobble added while easing back
///
/// Breaks up the straight, synchronized lines several spheres would
/// otherwise draw when returning together.
pub fn return_wobble(sphere: &Sphere, now: f64, settings: &Settings) -> Vec2 {
    let SphereState::Displaced {
        anchor,
        cooldown_until,
        ..
    } = sphere.state
    else {
        return Vec2::ZERO;
    };
    if now <= cooldown_until {
        return Vec2::ZERO;
    }

    let t = (now - cooldown_until) as f32;
    let dist = (sphere.base.truncate() - anchor).length();
    let reach = (dist / settings.return_far_distance.max(1e-3)).min(1.0);
    let amp = settings.return_wobble * reach * (-settings.return_wobble_decay * t).exp();
    let (phase, freq) = return_wobble_params(sphere.id);

    Vec2::new((freq * t + phase).sin(), (freq * 1.3 * t + phase * 0.7).cos()) * amp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sphere::{Orbit, SphereColor};
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    fn sphere() -> Sphere {
        let orbit = Orbit {
            base_radius: 0.0,
            d_theta: 0.0,
            d_phi: 0.0,
            follow_lerp: 0.2,
        };
        Sphere::new(5, Vec3::new(2.0, 0.0, 3.08), 0.1, SphereColor([0, 255, 255]), orbit, 0.04)
    }

    fn displaced_by(offset: Vec2, cooldown_until: f64) -> Sphere {
        let mut s = sphere();
        let anchor = s.base.truncate() + offset;
        s.state = SphereState::Displaced {
            anchor,
            since: 0.0,
            cooldown_until,
            last_boundary: anchor,
        };
        s
    }

    fn frames_to_return(mut s: Sphere, settings: &Settings) -> Option<usize> {
        let mut now = 0.0f64;
        for frame in 1..=600 {
            now += DT as f64;
            if ease_return(&mut s, now, DT, settings) {
                return Some(frame);
            }
        }
        None
    }

    #[test]
    fn test_first_hit_starts_near_base() {
        let settings = Settings::default();
        let mut s = sphere();
        mark_displaced(&mut s, Vec2::new(3.0, 0.0), Vec2::ZERO, 1.0, &settings);
        match s.state {
            SphereState::Displaced {
                anchor,
                since,
                cooldown_until,
                last_boundary,
            } => {
                assert!((anchor.x - 2.03).abs() < 1e-5);
                assert_eq!(since, 1.0);
                assert!((cooldown_until - 1.4).abs() < 1e-6);
                assert_eq!(last_boundary, Vec2::new(3.0, 0.0));
            }
            SphereState::Free => panic!("sphere should be displaced"),
        }
    }

    #[test]
    fn test_repeat_hits_extend_cooldown() {
        let settings = Settings::default();
        let mut s = sphere();
        mark_displaced(&mut s, Vec2::new(3.0, 0.0), Vec2::ZERO, 1.0, &settings);
        mark_displaced(&mut s, Vec2::new(3.0, 0.0), Vec2::ZERO, 1.2, &settings);
        let SphereState::Displaced { since, cooldown_until, .. } = s.state else {
            panic!("sphere should be displaced");
        };
        assert_eq!(since, 1.0);
        assert!((cooldown_until - 1.6).abs() < 1e-6);
    }

    #[test]
    fn test_no_easing_during_cooldown() {
        let settings = Settings::default();
        let mut s = displaced_by(Vec2::new(0.5, 0.0), 10.0);
        let before = s.anchor();
        assert!(!ease_return(&mut s, 5.0, DT, &settings));
        assert_eq!(s.anchor(), before);
        assert_eq!(return_wobble(&s, 5.0, &settings), Vec2::ZERO);
    }

    #[test]
    fn test_returns_within_bounded_frames() {
        let settings = Settings::default();
        // Cooldown counted from the hit, as in a real transient push
        let cooldown = settings.repel_cooldown as f64;
        for offset in [Vec2::new(0.3, 0.0), Vec2::new(-0.6, 0.4), Vec2::new(0.0, 1.5)] {
            let frames = frames_to_return(displaced_by(offset, cooldown), &settings)
                .expect("sphere never returned");
            assert!(frames < 180, "took {} frames for {:?}", frames, offset);
        }
    }

    #[test]
    fn test_far_returns_faster_than_near() {
        let settings = Settings::default();
        let mut near = displaced_by(Vec2::new(0.1, 0.0), 0.0);
        let mut far = displaced_by(Vec2::new(1.0, 0.0), 0.0);
        ease_return(&mut near, 0.1, DT, &settings);
        ease_return(&mut far, 0.1, DT, &settings);
        let near_step = 0.1 - (near.anchor().x - 2.0);
        let far_step = 1.0 - (far.anchor().x - 2.0);
        assert!(far_step / 1.0 > near_step / 0.1);
    }

    #[test]
    fn test_return_wobble_decays() {
        let settings = Settings::default();
        let s = displaced_by(Vec2::new(1.0, 0.0), 0.0);
        let early = return_wobble(&s, 0.05, &settings).length();
        let late = return_wobble(&s, 4.0, &settings).length();
        assert!(early <= settings.return_wobble * 1.5);
        assert!(late < 0.01 * settings.return_wobble);
        assert_eq!(return_wobble(&sphere(), 1.0, &settings), Vec2::ZERO);
    }

    #[test]
    fn test_small_displacement_frees_immediately() {
        let settings = Settings::default();
        let mut s = displaced_by(Vec2::new(0.01, 0.0), 0.0);
        assert!(ease_return(&mut s, 0.1, DT, &settings));
        assert_eq!(s.state, SphereState::Free);
    }
}
