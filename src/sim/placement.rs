//! Initial sphere layout
//!
//! Procedural placement draws a zone per sphere, then rejection-samples a
//! position inside that zone that clears the face box and every sphere
//! placed so far. Loaded layouts skip all of that and are trusted as-is.

use glam::{Vec2, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::face::{FaceBox, FaceCollider};
use super::sphere::{Orbit, OrbitPhase, Sphere, SphereColor};
use crate::persistence::SphereConfig;
use crate::settings::Settings;

/// Display palette for generated spheres
pub const PALETTE: [SphereColor; 9] = [
    SphereColor([0x00, 0xFF, 0xFF]),
    SphereColor([0xC7, 0x7D, 0xFF]),
    SphereColor([0x3D, 0x34, 0x8B]),
    SphereColor([0x72, 0x09, 0xB7]),
    SphereColor([0x5E, 0x2E, 0xA7]),
    SphereColor([0xA4, 0x5C, 0xFF]),
    SphereColor([0x36, 0xE5, 0xFF]),
    SphereColor([0x8A, 0x2B, 0xE2]),
    SphereColor([0xB7, 0x94, 0xF4]),
];

/// Named region around the face where a sphere may spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    /// Scattered around (and mostly rejected by) the face itself
    Behind,
    Sides,
    FrontCorners,
    Top,
}

impl Zone {
    pub const ALL: [Zone; 4] = [Zone::Behind, Zone::Sides, Zone::FrontCorners, Zone::Top];

    /// Selection weight (sums to 1)
    pub fn weight(&self) -> f32 {
        match self {
            Zone::Behind => 0.40,
            Zone::Sides => 0.25,
            Zone::FrontCorners => 0.20,
            Zone::Top => 0.15,
        }
    }

    /// Radius range for spheres spawned here
    pub fn radius_range(&self) -> (f32, f32) {
        match self {
            Zone::Behind => (0.06, 0.15),
            Zone::Sides => (0.12, 0.25),
            Zone::FrontCorners => (0.18, 0.32),
            Zone::Top => (0.15, 0.28),
        }
    }

    /// Weighted random zone
    pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> Zone {
        let mut roll: f32 = rng.random();
        for zone in Zone::ALL {
            if roll < zone.weight() {
                return zone;
            }
            roll -= zone.weight();
        }
        Zone::Top
    }

    /// Random face-relative offset inside the zone
    pub fn sample_offset<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        match self {
            Zone::Behind => Vec2::new(rng.random_range(-2.0..=2.0), rng.random_range(-2.0..=2.0)),
            Zone::Sides => {
                let side: f32 = if rng.random_bool(0.5) { -1.0 } else { 1.0 };
                Vec2::new(side * rng.random_range(2.0f32..=4.0), rng.random_range(-1.5..=1.5))
            }
            Zone::FrontCorners => {
                let side: f32 = if rng.random_bool(0.5) { -1.0 } else { 1.0 };
                Vec2::new(side * rng.random_range(2.0f32..=4.0), rng.random_range(-1.25..=1.25))
            }
            Zone::Top => Vec2::new(rng.random_range(-1.25..=1.25), rng.random_range(2.0..=4.0)),
        }
    }
}

/// Flat placement-time collider, independent of the live solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub radius: f32,
}

/// Outcome of a procedural placement run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementReport {
    pub requested: usize,
    pub placed: usize,
    /// Spheres that only fit after shrinking
    pub shrunk: usize,
    pub skipped: usize,
}

/// True if a disc at `p` clears the face box and every accepted collider
pub fn is_clear(
    p: Vec2,
    radius: f32,
    face: &FaceBox,
    colliders: &[Collider],
    min_gap: f32,
) -> bool {
    if face.inflated_contains(p, radius) {
        return false;
    }
    colliders.iter().all(|c| {
        let dist = (p - Vec2::new(c.x, c.y)).length();
        dist >= radius + c.radius + min_gap
    })
}

/// Rejection-sample a position in `zone` for a sphere of `radius`
pub fn find_position<R: Rng + ?Sized>(
    rng: &mut R,
    zone: Zone,
    radius: f32,
    face: &FaceBox,
    colliders: &[Collider],
    settings: &Settings,
) -> Option<Vec2> {
    (0..settings.placement_attempts).find_map(|_| {
        let p = face.center + zone.sample_offset(rng);
        is_clear(p, radius, face, colliders, settings.min_gap).then_some(p)
    })
}

/// Random orbit parameters for a new sphere
pub fn random_orbit<R: Rng + ?Sized>(rng: &mut R, base_radius: f32, settings: &Settings) -> Orbit {
    Orbit {
        base_radius,
        d_theta: rng.random_range(-0.15f32..=0.15) * 0.25,
        d_phi: rng.random_range(-0.15f32..=0.15) * 0.25,
        follow_lerp: rng.random_range(settings.follow_lerp_min..=settings.follow_lerp_max),
    }
}

#[allow(clippy::too_many_arguments)]
fn make_sphere<R: Rng + ?Sized>(
    rng: &mut R,
    id: u32,
    base: Vec3,
    radius: f32,
    color: SphereColor,
    base_radius: Option<f32>,
    face_center: Vec2,
    settings: &Settings,
) -> Sphere {
    let offset = base.truncate() - face_center;
    let orbit = random_orbit(rng, base_radius.unwrap_or(offset.length()), settings);
    let mut sphere = Sphere::new(id, base, radius, color, orbit, settings.jitter_amplitude);
    sphere.phase = OrbitPhase::from_offset(offset);
    sphere
}

/// Generate up to `count` collision-free spheres around `face`
///
/// Ids are assigned sequentially from `first_id`. A sphere that cannot be
/// placed even after shrinking is skipped, so the result may be short.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    face: &FaceCollider,
    first_id: u32,
    settings: &Settings,
) -> (Vec<Sphere>, PlacementReport) {
    let face_box = FaceBox::from_collider(face, settings);
    let plane_z = face.center.z + settings.plane_bias;
    let mut colliders: Vec<Collider> = Vec::with_capacity(count);
    let mut spheres = Vec::with_capacity(count);
    let mut report = PlacementReport {
        requested: count,
        ..Default::default()
    };

    for _ in 0..count {
        let zone = Zone::pick(rng);
        let (lo, hi) = zone.radius_range();
        let mut radius = rng.random_range(lo..=hi);

        let mut found = find_position(rng, zone, radius, &face_box, &colliders, settings);
        let mut shrinks = 0;
        while found.is_none() && shrinks < settings.placement_retries {
            radius *= settings.placement_shrink;
            shrinks += 1;
            found = find_position(rng, zone, radius, &face_box, &colliders, settings);
        }

        let Some(p) = found else {
            log::debug!("No room in {:?} for radius {:.3}, skipping", zone, radius);
            report.skipped += 1;
            continue;
        };
        if shrinks > 0 {
            report.shrunk += 1;
        }

        colliders.push(Collider {
            x: p.x,
            y: p.y,
            z: plane_z,
            radius,
        });

        let id = first_id + spheres.len() as u32;
        let color = PALETTE[rng.random_range(0..PALETTE.len())];
        let base = p.extend(plane_z);
        let sphere =
            make_sphere(rng, id, base, radius, color, None, face_box.center, settings);
        spheres.push(sphere);
    }

    report.placed = spheres.len();
    if report.skipped > 0 {
        log::warn!(
            "Placed {}/{} spheres ({} skipped after shrinking)",
            report.placed,
            report.requested,
            report.skipped
        );
    } else {
        log::info!("Successfully placed {} spheres", report.placed);
    }

    (spheres, report)
}

/// Build spheres from a persisted layout, verbatim
pub fn spheres_from_config<R: Rng + ?Sized>(
    rng: &mut R,
    config: &SphereConfig,
    face_center: Vec2,
    settings: &Settings,
) -> Vec<Sphere> {
    config
        .spheres
        .iter()
        .map(|d| {
            let base = Vec3::new(d.position.x, d.position.y, d.position.z);
            let color = d.parse_color().unwrap_or_default();
            make_sphere(rng, d.id, base, d.radius, color, d.base_radius, face_center, settings)
        })
        .collect()
}
