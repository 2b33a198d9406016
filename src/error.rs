//! Error types
//!
//! Nothing here escapes `update()`: configuration errors are caught and
//! logged by the engine, control errors go back to the tuning UI.

use thiserror::Error;

/// A persisted sphere descriptor list could not be used
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("sphere config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sphere config contains no spheres")]
    Empty,
    #[error("sphere {id} appears more than once")]
    DuplicateId { id: u32 },
    #[error("sphere {id} has a non-finite position")]
    NonFinitePosition { id: u32 },
    #[error("sphere {id} has invalid radius {radius}")]
    InvalidRadius { id: u32, radius: f32 },
    #[error("sphere {id} has invalid color {color:?}")]
    InvalidColor { id: u32, color: String },
    #[error("storage unavailable: {0}")]
    Storage(String),
}

/// A control-surface edit was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("no sphere with id {0}")]
    UnknownSphere(u32),
    #[error("radius {0} is not a positive finite number")]
    InvalidRadius(f32),
    #[error("scale factor {0} is not a positive finite number")]
    InvalidScale(f32),
    #[error("position ({x}, {y}, {z}) is not finite")]
    NonFinitePosition { x: f32, y: f32, z: f32 },
}
