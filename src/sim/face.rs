//! Face collider and the oriented exclusion box derived from it
//!
//! The tracker reports a centre, an isotropic radius, a margin and an
//! optional head orientation. The engine turns that into a rectangle on the
//! face plane, rotated by the head roll, that spheres must stay outside of.

use std::cell::Cell;
use std::rc::Rc;

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::exp_blend;
use crate::settings::Settings;

/// Simplified head volume published by the face tracker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceCollider {
    pub center: Vec3,
    pub radius: f32,
    pub margin: f32,
    #[serde(default)]
    pub orientation: Option<Quat>,
}

impl Default for FaceCollider {
    fn default() -> Self {
        Self {
            center: Vec3::new(0.0, 0.0, DEFAULT_FACE_DEPTH),
            radius: DEFAULT_FACE_RADIUS,
            margin: DEFAULT_FACE_MARGIN,
            orientation: None,
        }
    }
}

impl FaceCollider {
    pub fn new(center: Vec3, radius: f32, margin: f32) -> Self {
        Self {
            center,
            radius,
            margin,
            orientation: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// True if the collider can't be trusted (NaNs, zero radius)
    pub fn is_degenerate(&self) -> bool {
        let finite = self.center.is_finite()
            && self.radius.is_finite()
            && self.margin.is_finite()
            && self.orientation.is_none_or(|q| q.is_finite());
        !finite || self.radius < MIN_FACE_RADIUS
    }

    /// Head roll on the face plane (radians), 0 when unknown
    pub fn roll(&self) -> f32 {
        let Some(q) = self.orientation else {
            return 0.0;
        };
        let axis = (q * Vec3::X).truncate();
        if axis.length_squared() < 1e-6 {
            // Head turned edge-on; roll is undefined
            return 0.0;
        }
        axis.y.atan2(axis.x)
    }
}

/// Anything that can report the current face collider
pub trait FaceSource {
    /// `None` when no face is currently tracked
    fn face_collider(&self) -> Option<FaceCollider>;
}

/// Face slot shared with the tracker, which writes it at its own cadence
#[derive(Debug, Clone, Default)]
pub struct SharedFace(Rc<Cell<Option<FaceCollider>>>);

impl SharedFace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, collider: FaceCollider) {
        self.0.set(Some(collider));
    }

    pub fn clear(&self) {
        self.0.set(None);
    }
}

impl FaceSource for SharedFace {
    fn face_collider(&self) -> Option<FaceCollider> {
        self.0.get()
    }
}

/// A face that never moves (tests, demos)
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedFace(pub Option<FaceCollider>);

impl FaceSource for FixedFace {
    fn face_collider(&self) -> Option<FaceCollider> {
        self.0
    }
}

/// Oriented exclusion rectangle on the face plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub center: Vec2,
    /// Half extents along the box's local axes
    pub half: Vec2,
    /// (cos, sin) of the roll angle
    rot: Vec2,
}

impl FaceBox {
    pub fn new(center: Vec2, half: Vec2, roll: f32) -> Self {
        Self {
            center,
            half: half.max(Vec2::ZERO),
            rot: Vec2::new(roll.cos(), roll.sin()),
        }
    }

    pub fn from_collider(collider: &FaceCollider, settings: &Settings) -> Self {
        let hx =
            collider.radius * settings.face_width_scale + collider.margin + settings.box_margin_x;
        let hy =
            collider.radius * settings.face_height_scale + collider.margin + settings.box_margin_y;
        Self::new(collider.center.truncate(), Vec2::new(hx, hy), collider.roll())
    }

    pub fn roll(&self) -> f32 {
        self.rot.y.atan2(self.rot.x)
    }

    /// World point to box-local coordinates
    #[inline]
    pub fn to_local(&self, p: Vec2) -> Vec2 {
        let d = p - self.center;
        Vec2::new(
            d.x * self.rot.x + d.y * self.rot.y,
            -d.x * self.rot.y + d.y * self.rot.x,
        )
    }

    /// Box-local coordinates to world point
    #[inline]
    pub fn to_world(&self, l: Vec2) -> Vec2 {
        self.center + self.rotate(l)
    }

    /// Box-local direction to world direction
    #[inline]
    pub fn rotate(&self, l: Vec2) -> Vec2 {
        Vec2::new(
            l.x * self.rot.x - l.y * self.rot.y,
            l.x * self.rot.y + l.y * self.rot.x,
        )
    }

    /// Whether a disc of `radius` centred at `p` reaches into the box
    ///
    /// Tested against the box grown by `radius` on every side, so corners
    /// are treated conservatively.
    pub fn inflated_contains(&self, p: Vec2, radius: f32) -> bool {
        let l = self.to_local(p);
        l.x.abs() < self.half.x + radius && l.y.abs() < self.half.y + radius
    }

    /// Whether a bare point lies in the face area
    pub fn contains_point(&self, p: Vec2) -> bool {
        self.inflated_contains(p, 0.0)
    }

    /// Target just outside the nearest edge for a disc at `p`
    ///
    /// The jitter pushes further out along the edge normal and slides along
    /// the edge, so spheres hitting the same edge don't line up.
    pub fn push_out_target(&self, p: Vec2, radius: f32, margin: f32, jitter: Vec2) -> Vec2 {
        let l = self.to_local(p);
        let ex = self.half.x + radius;
        let ey = self.half.y + radius;
        let pen_x = ex - l.x.abs();
        let pen_y = ey - l.y.abs();

        let target = if pen_x <= pen_y {
            let side = edge_side(l.x, jitter.x);
            Vec2::new(side * (ex + margin + jitter.x.abs()), l.y + jitter.y)
        } else {
            let side = edge_side(l.y, jitter.y);
            Vec2::new(l.x + jitter.x, side * (ey + margin + jitter.y.abs()))
        };
        self.to_world(target)
    }

    /// Exact push-out for a disc inside the inflated box, `None` if clear
    ///
    /// Returns the clamped point and the world-space outward normal of the
    /// edge it was pushed across.
    pub fn clamp_outside(&self, p: Vec2, radius: f32, margin: f32) -> Option<(Vec2, Vec2)> {
        if !self.inflated_contains(p, radius) {
            return None;
        }
        let l = self.to_local(p);
        let ex = self.half.x + radius;
        let ey = self.half.y + radius;
        let margin = margin.max(CLAMP_SLOP);

        let (clamped, outward) = if ex - l.x.abs() <= ey - l.y.abs() {
            let side = edge_side(l.x, 1.0);
            (Vec2::new(side * (ex + margin), l.y), Vec2::new(side, 0.0))
        } else {
            let side = edge_side(l.y, 1.0);
            (Vec2::new(l.x, side * (ey + margin)), Vec2::new(0.0, side))
        };
        Some((self.to_world(clamped), self.rotate(outward)))
    }
}

/// Which side of an axis a coordinate is on; `tie` breaks exact zeros
#[inline]
fn edge_side(v: f32, tie: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else if tie >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Smoothed head state derived from the tracker's reports
#[derive(Debug, Clone)]
pub struct HeadTracker {
    last_valid: FaceCollider,
    rest: Vec2,
    offset: Vec2,
    visible: bool,
}

impl HeadTracker {
    pub fn new(initial: FaceCollider) -> Self {
        Self {
            last_valid: initial,
            rest: initial.center.truncate(),
            offset: Vec2::ZERO,
            visible: false,
        }
    }

    /// Feed one frame of tracker output
    ///
    /// Degenerate colliders count as no face: the last good collider keeps
    /// defining the box, and the head offset decays toward zero.
    pub fn observe(&mut self, face: Option<FaceCollider>, dt: f32, settings: &Settings) {
        match face.filter(|f| !f.is_degenerate()) {
            Some(face) => {
                if !self.visible {
                    log::debug!("Face acquired at {:?}", face.center);
                }
                self.visible = true;
                self.last_valid = face;
                let target = face.center.truncate() - self.rest;
                self.offset += (target - self.offset) * exp_blend(settings.head_follow_rate, dt);
            }
            None => {
                if self.visible {
                    log::debug!("Face lost, easing head offset to rest");
                }
                self.visible = false;
                self.offset *= 1.0 - exp_blend(settings.head_decay_rate, dt);
            }
        }
    }

    /// Re-anchor the rest frame on the last known face
    pub fn reset_rest(&mut self) {
        self.rest = self.last_valid.center.truncate();
        self.offset = Vec2::ZERO;
    }

    pub fn collider(&self) -> &FaceCollider {
        &self.last_valid
    }

    pub fn rest(&self) -> Vec2 {
        self.rest
    }

    /// Face centre deviation from rest, smoothed
    pub fn head_offset(&self) -> Vec2 {
        self.offset
    }

    pub fn face_visible(&self) -> bool {
        self.visible
    }

    /// Shared Z of every sphere
    pub fn plane_z(&self, settings: &Settings) -> f32 {
        self.last_valid.center.z + settings.plane_bias
    }

    pub fn face_box(&self, settings: &Settings) -> FaceBox {
        FaceBox::from_collider(&self.last_valid, settings)
    }
}
