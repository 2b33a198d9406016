//! Per-sphere data handed to whatever draws the spheres

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::Serialize;

use crate::sim::Sphere;

/// GPU instance record, one per sphere
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SphereInstance {
    pub position: [f32; 3],
    pub radius: f32,
    pub color: [f32; 4],
}

impl SphereInstance {
    /// Number of f32 values per instance in a flat buffer
    pub const FLOATS: usize = 8;

    pub fn from_transform(t: &SphereTransform, opacity: f32) -> Self {
        let mut color = t.color;
        color[3] *= opacity;
        Self {
            position: t.position.to_array(),
            radius: t.radius,
            color,
        }
    }
}

/// Resolved placement of one sphere in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SphereTransform {
    pub id: u32,
    /// Includes the group z offset of the running transition
    pub position: Vec3,
    pub radius: f32,
    pub color: [f32; 4],
}

impl SphereTransform {
    pub fn from_sphere(sphere: &Sphere, group_z: f32) -> Self {
        Self {
            id: sphere.id,
            position: sphere.pos + Vec3::Z * group_z,
            radius: sphere.radius,
            color: sphere.color.to_rgba(),
        }
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutput {
    pub opacity: f32,
    pub group_z: f32,
    pub visible: bool,
    pub spheres: Vec<SphereTransform>,
}

impl FrameOutput {
    pub fn hidden() -> Self {
        Self {
            opacity: 0.0,
            group_z: 0.0,
            visible: false,
            spheres: Vec::new(),
        }
    }

    /// Instance buffer with the group opacity folded into alpha
    pub fn instances(&self) -> Vec<SphereInstance> {
        self.spheres
            .iter()
            .map(|t| SphereInstance::from_transform(t, self.opacity))
            .collect()
    }
}
