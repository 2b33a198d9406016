//! Deterministic sphere simulation
//!
//! All placement and collision logic lives here. This module must stay pure
//! and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (by slot, which follows creation order)
//! - No rendering or platform dependencies
//! - Every sphere on one Z plane, so collisions are 2D

pub mod collision;
pub mod displacement;
pub mod engine;
pub mod face;
pub mod frame;
pub mod motion;
pub mod placement;
pub mod smoothing;
pub mod sphere;
pub mod transition;

pub use collision::Body;
pub use engine::SphereEngine;
pub use face::{FaceBox, FaceCollider, FaceSource, FixedFace, HeadTracker, SharedFace};
pub use frame::{FrameInput, FrameReport, resolve_frame, resolve_frame_in_place};
pub use placement::{Collider, PALETTE, PlacementReport, Zone};
pub use sphere::{Orbit, OrbitPhase, Sphere, SphereColor, SphereState};
pub use transition::{GroupVisual, Transition, TransitionKind};
