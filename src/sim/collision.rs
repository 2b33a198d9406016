//! Collision resolution on the face plane
//!
//! All spheres share one Z, so every pass here is 2D. The passes run in a
//! fixed order each frame:
//! 1. face-box avoidance (soft, per sphere)
//! 2. soft pairwise separation (a few iterations, decreasing stiffness)
//! 3. exact pair clamp (guarantees the minimum gap)
//! 4. long-range spread (gentle, scaled by dt)
//! 5. exact face clamp (sphere pushes can re-enter the box)

use glam::Vec2;

use super::face::FaceBox;
use crate::consts::*;
use crate::hash_unit;
use crate::settings::Settings;

/// A sphere as the solver sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Moved by a collision pass this frame
    pub bumped: bool,
    /// Hard-clamped against the face box. Pair clamps never push it back in
    pub pinned: bool,
    /// World outward normal of the face edge the body was clamped across
    pub outward: Vec2,
}

impl Body {
    pub fn new(id: u32, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            radius,
            bumped: false,
            pinned: false,
            outward: Vec2::ZERO,
        }
    }
}

/// Soft face-box avoidance for one body
///
/// Returns the boundary target when the body was inside the box.
pub fn avoid_face(
    body: &mut Body,
    face: &FaceBox,
    jitter: Vec2,
    settings: &Settings,
) -> Option<Vec2> {
    if !face.inflated_contains(body.pos, body.radius) {
        return None;
    }
    let boundary =
        face.push_out_target(body.pos, body.radius, settings.face_push_margin, jitter);
    body.pos += (boundary - body.pos) * settings.face_resolve_factor;
    body.bumped = true;
    Some(boundary)
}

/// Exact face clamp for every body; returns how many were moved
pub fn clamp_to_face(bodies: &mut [Body], face: &FaceBox, margin: f32) -> usize {
    let mut clamped = 0;
    for body in bodies.iter_mut() {
        if let Some((p, outward)) = face.clamp_outside(body.pos, body.radius, margin) {
            body.pos = p;
            body.outward = outward;
            body.pinned = true;
            body.bumped = true;
            clamped += 1;
        }
    }
    clamped
}

/// Unit normal from `a` to `b` and their distance
///
/// Coincident bodies get a deterministic normal derived from their ids.
pub fn contact_normal(a: &Body, b: &Body) -> (Vec2, f32) {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    if dist > DIST_EPSILON && dist.is_finite() {
        (delta / dist, dist)
    } else {
        (fallback_normal(a.id, b.id), 0.0)
    }
}

fn fallback_normal(a: u32, b: u32) -> Vec2 {
    if a == b {
        return Vec2::X;
    }
    let (lo, hi) = (a.min(b), a.max(b));
    let angle = hash_unit(lo.wrapping_mul(31).wrapping_add(hi)) * std::f32::consts::TAU;
    let n = Vec2::new(angle.cos(), angle.sin());
    if a < b { n } else { -n }
}

/// Split a correction between two bodies; a pinned body yields to a free one
#[inline]
fn pair_weights(a: &Body, b: &Body) -> (f32, f32) {
    match (a.pinned, b.pinned) {
        (true, false) => (0.0, 1.0),
        (false, true) => (1.0, 0.0),
        _ => (0.5, 0.5),
    }
}

/// Drop the part of `step` that would carry a pinned body into the face box
#[inline]
fn clip_inward(body: &Body, step: Vec2) -> Vec2 {
    if !body.pinned {
        return step;
    }
    let into = step.dot(body.outward);
    if into < 0.0 { step - body.outward * into } else { step }
}

/// Move `a` and `b` apart by `amount` along `normal` (from `a` to `b`)
///
/// Pinned bodies only slide along their edge or move away from the box.
/// Whatever one body cannot take is handed to the other, so two pinned
/// bodies on the same edge separate along it.
fn separate(a: &mut Body, b: &mut Body, normal: Vec2, amount: f32) {
    let (wa, _) = pair_weights(a, b);
    let mut step_a = clip_inward(a, -normal * amount * wa);
    let mut left = amount + step_a.dot(normal);
    let step_b = clip_inward(b, normal * left.max(0.0));
    left -= step_b.dot(normal);
    if left > 0.0 && a.pinned && b.pinned {
        step_a += clip_inward(a, -normal * left);
    }
    a.pos += step_a;
    b.pos += step_b;
}

#[inline]
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert!(i < j);
    let (left, right) = bodies.split_at_mut(j);
    (&mut left[i], &mut right[0])
}

/// Stiffness of a soft iteration, softening as iterations proceed
#[inline]
pub fn soft_stiffness(iter: u32, settings: &Settings) -> f32 {
    (settings.soft_stiffness * (1.0 - iter as f32 * settings.stiffness_falloff)).max(0.05)
}

/// Iterative soft separation; returns how many pair pushes were applied
pub fn soft_separate(bodies: &mut [Body], settings: &Settings) -> usize {
    let n = bodies.len();
    let mut pushes = 0;

    for iter in 0..settings.soft_iterations {
        let stiffness = soft_stiffness(iter, settings);
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = pair_mut(bodies, i, j);
                let target = a.radius + b.radius + settings.sphere_padding;
                let (normal, dist) = contact_normal(a, b);
                if dist < target {
                    let push = (target - dist) * 0.5 * stiffness;
                    a.pos -= normal * push;
                    b.pos += normal * push;
                    a.bumped = true;
                    b.bumped = true;
                    pushes += 1;
                }
            }
        }
    }
    pushes
}

/// Exact minimum-gap clamp; returns the number of corrections
///
/// Sweeps repeat until a sweep finds nothing to fix or the budget runs out.
pub fn hard_clamp_pairs(bodies: &mut [Body], min_gap: f32, max_sweeps: u32) -> usize {
    let n = bodies.len();
    let mut total = 0;

    for _ in 0..max_sweeps.max(1) {
        let mut corrected = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = pair_mut(bodies, i, j);
                let required = a.radius + b.radius + min_gap;
                let (normal, dist) = contact_normal(a, b);
                if dist < required {
                    separate(a, b, normal, required - dist + CLAMP_SLOP);
                    a.bumped = true;
                    b.bumped = true;
                    corrected += 1;
                }
            }
        }
        total += corrected;
        if corrected == 0 {
            break;
        }
    }
    total
}

/// Nudge pairs that are merely close apart, to discourage clustering
pub fn spread(bodies: &mut [Body], settings: &Settings, dt: f32) {
    let n = bodies.len();
    let gain = settings.spread_strength * dt;
    if gain <= 0.0 {
        return;
    }

    for i in 0..n {
        for j in (i + 1)..n {
            let (a, b) = pair_mut(bodies, i, j);
            let comfort =
                a.radius + b.radius + settings.sphere_padding + settings.spread_margin;
            let (normal, dist) = contact_normal(a, b);
            if dist < comfort {
                separate(a, b, normal, (comfort - dist) * gain);
            }
        }
    }
}

/// Smallest surface gap minus `min_gap` over all pairs (negative = violation)
pub fn worst_gap_violation(bodies: &[Body], min_gap: f32) -> f32 {
    let mut worst = f32::INFINITY;
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let a = &bodies[i];
            let b = &bodies[j];
            let slack = (b.pos - a.pos).length() - (a.radius + b.radius + min_gap);
            worst = worst.min(slack);
        }
    }
    worst
}
