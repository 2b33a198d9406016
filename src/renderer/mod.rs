//! Renderer-facing output
//!
//! The crate draws nothing itself. Each frame it produces world-space
//! transforms plus a `bytemuck` instance buffer a GPU backend can upload.

pub mod instance;

pub use instance::{FrameOutput, SphereInstance, SphereTransform};
