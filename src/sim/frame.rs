//! One frame of sphere resolution
//!
//! Deterministic: the same spheres and the same input always give the same
//! result. Pass order: motion, face push, soft separation, pair clamp,
//! spread, face clamp, return easing, smoothing, then a projection loop
//! that restores both hard constraints after smoothing.

use glam::Vec2;

use super::collision::{self, Body};
use super::displacement::{ease_return, mark_displaced, return_wobble};
use super::face::{FaceBox, HeadTracker};
use super::motion::{advance_orbit, desired_position};
use super::smoothing::{smooth_toward, smoothing_rate};
use super::sphere::Sphere;
use crate::consts::*;
use crate::settings::Settings;

/// Everything a frame needs besides the spheres themselves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub face_box: FaceBox,
    /// Shared Z of all spheres
    pub plane_z: f32,
    /// Smoothed head translation from rest
    pub head_offset: Vec2,
    /// Engine clock (seconds)
    pub now: f64,
    pub dt: f32,
}

impl FrameInput {
    pub fn from_tracker(head: &HeadTracker, now: f64, dt: f32, settings: &Settings) -> Self {
        Self {
            face_box: head.face_box(settings),
            plane_z: head.plane_z(settings),
            head_offset: head.head_offset(),
            now,
            dt,
        }
    }
}

/// Counters from a resolved frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Spheres in the displaced state after the frame
    pub displaced: usize,
    /// Spheres whose desired position hit the face box
    pub face_pushed: usize,
    /// Spheres moved by any collision pass
    pub bumped: usize,
    /// Spheres hard-clamped against the face box
    pub face_clamped: usize,
    /// Spheres that finished returning home
    pub returned: usize,
    pub projection_sweeps: u32,
}

/// Pure form: resolve a copy of `spheres`
pub fn resolve_frame(
    spheres: &[Sphere],
    input: &FrameInput,
    settings: &Settings,
) -> (Vec<Sphere>, FrameReport) {
    let mut next = spheres.to_vec();
    let report = resolve_frame_in_place(&mut next, input, settings);
    (next, report)
}

/// Resolve one frame, mutating the spheres
pub fn resolve_frame_in_place(
    spheres: &mut [Sphere],
    input: &FrameInput,
    settings: &Settings,
) -> FrameReport {
    let mut report = FrameReport::default();
    if spheres.is_empty() {
        return report;
    }
    let face = &input.face_box;
    let dt = input.dt.max(0.0);

    // Motion model and soft face avoidance
    let mut bodies: Vec<Body> = Vec::with_capacity(spheres.len());
    for sphere in spheres.iter_mut() {
        advance_orbit(sphere, dt);
        let extra = return_wobble(sphere, input.now, settings);
        let mut desired = desired_position(sphere, input.head_offset, extra, settings);
        if !desired.is_finite() {
            desired = sphere.anchor();
        }

        let mut body = Body::new(sphere.id, desired, sphere.radius);
        let offset = desired - sphere.anchor();
        if let Some(boundary) = collision::avoid_face(&mut body, face, sphere.jitter, settings)
        {
            mark_displaced(sphere, boundary, offset, input.now, settings);
            report.face_pushed += 1;
        }
        bodies.push(body);
    }

    // Sphere-sphere passes
    collision::soft_separate(&mut bodies, settings);
    collision::hard_clamp_pairs(&mut bodies, settings.min_gap, settings.hard_clamp_sweeps);
    collision::spread(&mut bodies, settings, dt);
    report.face_clamped = collision::clamp_to_face(&mut bodies, face, settings.face_push_margin);

    for sphere in spheres.iter_mut() {
        if ease_return(sphere, input.now, dt, settings) {
            report.returned += 1;
        }
    }

    // Low-pass filter, skipped for spheres pinned to the face box
    for (sphere, body) in spheres.iter().zip(bodies.iter_mut()) {
        if body.pinned {
            continue;
        }
        let rate = smoothing_rate(sphere.orbit.follow_lerp, body.bumped, settings);
        let prev = sphere.pos.truncate();
        if prev.is_finite() {
            body.pos = smooth_toward(prev, body.pos, rate, dt);
        }
    }

    report.projection_sweeps = project(&mut bodies, face, settings);

    for (sphere, body) in spheres.iter_mut().zip(&bodies) {
        sphere.pos = body.pos.extend(input.plane_z);
        sphere.bumped = body.bumped;
    }

    report.bumped = bodies.iter().filter(|b| b.bumped).count();
    report.displaced = spheres.iter().filter(|s| s.is_displaced()).count();
    report
}

/// Alternate pair and face clamps until both constraints hold
///
/// Pinned bodies never get pushed back into the box by the pair clamp, so
/// rounds only stop early once the layout is clean. Hitting the cap is
/// reported, since the frame may then end with an overlap.
fn project(bodies: &mut [Body], face: &FaceBox, settings: &Settings) -> u32 {
    let cap = settings.projection_iterations.max(1);
    for round in 1..=cap {
        collision::hard_clamp_pairs(bodies, settings.min_gap, settings.hard_clamp_sweeps);
        let clamped = collision::clamp_to_face(bodies, face, settings.face_push_margin);
        if clamped == 0 && collision::worst_gap_violation(bodies, settings.min_gap) >= -CLAMP_SLOP
        {
            return round;
        }
    }
    log::warn!(
        "Projection hit its cap of {} rounds with {} spheres, worst gap error {:.5}",
        cap,
        bodies.len(),
        collision::worst_gap_violation(bodies, settings.min_gap)
    );
    cap
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sphere::{Orbit, SphereColor, SphereState};
    use glam::Vec3;

    const DT: f32 = 1.0 / 60.0;

    fn still_orbit() -> Orbit {
        Orbit {
            base_radius: 0.0,
            d_theta: 0.0,
            d_phi: 0.0,
            follow_lerp: 0.2,
        }
    }

    fn sphere_at(id: u32, x: f32, y: f32, radius: f32) -> Sphere {
        let pos = Vec3::new(x, y, 3.08);
        Sphere::new(id, pos, radius, SphereColor([0, 255, 255]), still_orbit(), 0.04)
    }

    fn input(now: f64) -> FrameInput {
        FrameInput {
            face_box: FaceBox::new(Vec2::ZERO, Vec2::new(1.05, 1.42), 0.0),
            plane_z: 3.08,
            head_offset: Vec2::ZERO,
            now,
            dt: DT,
        }
    }

    fn assert_invariants(spheres: &[Sphere], face: &FaceBox, min_gap: f32) {
        for (i, a) in spheres.iter().enumerate() {
            assert!(
                !face.inflated_contains(a.pos.truncate(), a.radius),
                "sphere {} in face box",
                a.id
            );
            for b in &spheres[i + 1..] {
                let dist = (a.pos.truncate() - b.pos.truncate()).length();
                assert!(
                    dist >= a.radius + b.radius + min_gap - 1e-4,
                    "spheres {} and {} too close: {}",
                    a.id,
                    b.id,
                    dist
                );
            }
        }
    }

    #[test]
    fn test_overlapping_pair_separates_in_one_frame() {
        let settings = Settings::default();
        let spheres = vec![sphere_at(0, 3.0, 0.0, 0.1), sphere_at(1, 3.01, 0.0, 0.1)];
        let (next, report) = resolve_frame(&spheres, &input(0.0), &settings);
        assert_invariants(&next, &input(0.0).face_box, settings.min_gap);
        assert_eq!(report.bumped, 2);
        // Pure form leaves the input alone
        assert_eq!(spheres[0].pos.x, 3.0);
    }

    #[test]
    fn test_sphere_inside_face_is_pushed_out() {
        let settings = Settings::default();
        let mut spheres = vec![sphere_at(0, 0.3, 0.2, 0.15), sphere_at(1, 3.0, 0.0, 0.1)];
        let frame = input(1.0);
        let report = resolve_frame_in_place(&mut spheres, &frame, &settings);
        assert_invariants(&spheres, &frame.face_box, settings.min_gap);
        assert_eq!(report.face_pushed, 1);
        assert_eq!(report.face_clamped, 1);
        assert!(matches!(spheres[0].state, SphereState::Displaced { .. }));
        assert_eq!(spheres[1].state, SphereState::Free);
    }

    #[test]
    fn test_all_spheres_share_the_plane() {
        let settings = Settings::default();
        let mut spheres = vec![sphere_at(0, 2.0, 2.0, 0.2), sphere_at(1, -2.5, 0.0, 0.1)];
        spheres[1].pos.z = 7.0;
        let mut frame = input(0.0);
        frame.plane_z = 2.5;
        resolve_frame_in_place(&mut spheres, &frame, &settings);
        assert!(spheres.iter().all(|s| s.pos.z == 2.5));
    }

    #[test]
    fn test_free_sphere_is_smoothed_toward_target() {
        let settings = Settings::default();
        let mut spheres = vec![sphere_at(0, 3.0, 0.0, 0.1)];
        let mut frame = input(0.0);
        frame.head_offset = Vec2::new(1.0, 0.0);
        resolve_frame_in_place(&mut spheres, &frame, &settings);
        let target = 3.0 + settings.head_follow;
        // Moved by roughly follow_lerp of the way, not snapped
        let moved = spheres[0].pos.x - 3.0;
        assert!(moved > 0.0 && moved < target - 3.0);
        assert!((moved / (target - 3.0) - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_displaced_sphere_returns_after_face_leaves() {
        let settings = Settings::default();
        let mut spheres = vec![sphere_at(0, 1.0, 0.0, 0.1)];
        let mut now = 0.0f64;
        for _ in 0..10 {
            now += DT as f64;
            resolve_frame_in_place(&mut spheres, &input(now), &settings);
        }
        assert!(spheres[0].is_displaced());

        let mut away = input(now);
        away.face_box = FaceBox::new(Vec2::new(-10.0, 0.0), Vec2::new(1.05, 1.42), 0.0);
        let mut frames = 0;
        while spheres[0].is_displaced() && frames < 180 {
            now += DT as f64;
            away.now = now;
            resolve_frame_in_place(&mut spheres, &away, &settings);
            frames += 1;
        }
        assert!(!spheres[0].is_displaced(), "still displaced after {} frames", frames);
    }

    #[test]
    fn test_empty_frame() {
        let settings = Settings::default();
        let mut spheres: Vec<Sphere> = Vec::new();
        let report = resolve_frame_in_place(&mut spheres, &input(0.0), &settings);
        assert_eq!(report, FrameReport::default());
    }

    #[test]
    fn test_crowded_frame_holds_invariants() {
        let settings = Settings::default();
        // A tight ring hugging the face box
        let mut spheres: Vec<Sphere> = (0..16)
            .map(|i| {
                let a = i as f32 / 16.0 * std::f32::consts::TAU;
                sphere_at(i, a.cos() * 1.3, a.sin() * 1.6, 0.15)
            })
            .collect();
        let mut now = 0.0;
        for _ in 0..30 {
            now += DT as f64;
            let report = resolve_frame_in_place(&mut spheres, &input(now), &settings);
            assert!(report.projection_sweeps >= 1);
            assert_invariants(&spheres, &input(now).face_box, settings.min_gap);
        }
    }

    #[test]
    fn test_face_growing_over_a_packed_ring_settles() {
        let settings = Settings::default();
        // Two rings packed tight around a small face
        let mut spheres: Vec<Sphere> = (0..36)
            .map(|i| {
                let ring = if i < 18 { 1.5 } else { 1.9 };
                let a = (i % 18) as f32 / 18.0 * std::f32::consts::TAU + ring;
                sphere_at(i, a.cos() * ring, a.sin() * ring * 1.2, 0.12 + (i % 3) as f32 * 0.04)
            })
            .collect();
        let mut now = 0.0;
        for step in 0..60 {
            now += DT as f64;
            let mut frame = input(now);
            // The face jumps to three times its size and rolls
            if step % 20 >= 10 {
                frame.face_box = FaceBox::new(Vec2::new(0.2, -0.1), Vec2::new(3.15, 4.1), 0.5);
            }
            resolve_frame_in_place(&mut spheres, &frame, &settings);
            assert_invariants(&spheres, &frame.face_box, settings.min_gap);
        }
    }
}
