//! Sphere entities and their per-sphere state

use std::fmt;
use std::str::FromStr;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::{hash_u32, hash_unit};

/// Display colour (not used by physics)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SphereColor(pub [u8; 3]);

impl Default for SphereColor {
    fn default() -> Self {
        Self([0xFF, 0xFF, 0xFF])
    }
}

impl SphereColor {
    /// Normalized RGBA for GPU upload
    pub fn to_rgba(self) -> [f32; 4] {
        let [r, g, b] = self.0;
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
    }
}

impl FromStr for SphereColor {
    type Err = ();

    /// Parse `#RRGGBB` (leading `#` optional)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ());
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl TryFrom<String> for SphereColor {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse().map_err(|_| format!("invalid color {:?}", s))
    }
}

impl From<SphereColor> for String {
    fn from(c: SphereColor) -> Self {
        c.to_string()
    }
}

impl fmt::Display for SphereColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02X}{:02X}{:02X}", r, g, b)
    }
}

/// Constant per-sphere wobble parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    /// Distance from the face centre at creation; scales the wobble
    pub base_radius: f32,
    /// Angular velocities (rad/s)
    pub d_theta: f32,
    pub d_phi: f32,
    /// Per-frame follow fraction at 60 fps (drives the smoothing rate)
    pub follow_lerp: f32,
}

/// Wobble angles, advanced every frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrbitPhase {
    pub theta: f32,
    pub phi: f32,
}

impl OrbitPhase {
    /// Initial angles pointing along a face-relative offset
    pub fn from_offset(offset: Vec2) -> Self {
        let len = offset.length();
        if len < 1e-6 {
            return Self::default();
        }
        Self {
            theta: offset.y.atan2(offset.x),
            phi: (offset.y / len).clamp(-1.0, 1.0).acos(),
        }
    }
}

/// Whether a sphere is following its orbit or recovering from a push
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum SphereState {
    #[default]
    Free,
    /// Pushed off its base by the face box
    Displaced {
        /// Where the sphere currently rests instead of its base (xy)
        anchor: Vec2,
        /// Engine time of the first push
        since: f64,
        /// Return easing may start after this engine time
        cooldown_until: f64,
        /// Last resolved safe point outside the face box
        last_boundary: Vec2,
    },
}

impl SphereState {
    pub fn is_displaced(&self) -> bool {
        matches!(self, SphereState::Displaced { .. })
    }
}

/// A decorative sphere
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sphere {
    pub id: u32,
    pub radius: f32,
    pub color: SphereColor,
    /// Canonical rest point
    pub base: Vec3,
    /// Live resolved point
    pub pos: Vec3,
    pub orbit: Orbit,
    pub phase: OrbitPhase,
    pub state: SphereState,
    /// Fixed offset used when pushed onto a face-box edge
    pub jitter: Vec2,
    /// Moved by a collision pass last frame
    #[serde(default)]
    pub bumped: bool,
}

impl Sphere {
    pub fn new(
        id: u32,
        base: Vec3,
        radius: f32,
        color: SphereColor,
        orbit: Orbit,
        jitter_amplitude: f32,
    ) -> Self {
        Self {
            id,
            radius,
            color,
            base,
            pos: base,
            orbit,
            phase: OrbitPhase::default(),
            state: SphereState::Free,
            jitter: boundary_jitter(id, jitter_amplitude),
            bumped: false,
        }
    }

    /// Where the sphere is resting: base, or the displaced anchor
    pub fn anchor(&self) -> Vec2 {
        match self.state {
            SphereState::Free => self.base.truncate(),
            SphereState::Displaced { anchor, .. } => anchor,
        }
    }

    pub fn is_displaced(&self) -> bool {
        self.state.is_displaced()
    }
}

/// Deterministic per-sphere offset in [-amplitude, amplitude]²
pub fn boundary_jitter(id: u32, amplitude: f32) -> Vec2 {
    let jx = hash_unit(id.wrapping_mul(2).wrapping_add(1)) * 2.0 - 1.0;
    let jy = hash_unit(id.wrapping_mul(2).wrapping_add(2)) * 2.0 - 1.0;
    Vec2::new(jx, jy) * amplitude
}

/// Per-sphere phase and frequency of the return wobble
pub fn return_wobble_params(id: u32) -> (f32, f32) {
    let h = hash_u32(id ^ 0x9e37_79b9);
    let phase = (h % 10_000) as f32 / 10_000.0 * std::f32::consts::TAU;
    // 1.5 - 3.5 rad/s
    let freq = 1.5 + hash_unit(h) * 2.0;
    (phase, freq)
}
