//! Sphere layout persistence
//!
//! - Descriptor lists in the capture tool's JSON shape
//! - All-or-nothing validation
//! - Pluggable sources (inline JSON, bundled layout, LocalStorage on web)

pub mod descriptors;
pub mod sources;

pub use descriptors::{Position, SphereConfig, SphereDescriptor};
#[cfg(target_arch = "wasm32")]
pub use sources::LocalStorageDescriptors;
pub use sources::{
    BUILTIN_CONFIG, BuiltinDescriptors, ChainedDescriptors, DescriptorSource, JsonDescriptors,
};
