//! Where persisted layouts come from

use super::descriptors::SphereConfig;
use crate::error::ConfigError;

/// Bundled layout used when nothing else is configured
pub const BUILTIN_CONFIG: &str = include_str!("../../assets/sphere-config.json");

/// A provider of a persisted layout
///
/// `Ok(None)` means nothing is stored; the engine then places spheres
/// procedurally. Errors are logged by the engine and treated the same way.
pub trait DescriptorSource {
    fn load(&self) -> Result<Option<SphereConfig>, ConfigError>;
}

/// Layout held as JSON text (e.g. fetched by the host)
#[derive(Debug, Clone)]
pub struct JsonDescriptors(pub String);

impl DescriptorSource for JsonDescriptors {
    fn load(&self) -> Result<Option<SphereConfig>, ConfigError> {
        if self.0.trim().is_empty() {
            return Ok(None);
        }
        SphereConfig::from_json(&self.0).map(Some)
    }
}

/// The layout shipped with the crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinDescriptors;

impl DescriptorSource for BuiltinDescriptors {
    fn load(&self) -> Result<Option<SphereConfig>, ConfigError> {
        SphereConfig::from_json(BUILTIN_CONFIG).map(Some)
    }
}

/// Tries each source in order; the first stored layout wins
///
/// A failing source is logged and skipped rather than failing the chain.
#[derive(Default)]
pub struct ChainedDescriptors(pub Vec<Box<dyn DescriptorSource>>);

impl ChainedDescriptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, source: impl DescriptorSource + 'static) -> Self {
        self.0.push(Box::new(source));
        self
    }
}

impl DescriptorSource for ChainedDescriptors {
    fn load(&self) -> Result<Option<SphereConfig>, ConfigError> {
        for source in &self.0 {
            match source.load() {
                Ok(Some(config)) => return Ok(Some(config)),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping sphere layout source: {}", e),
            }
        }
        Ok(None)
    }
}

/// Layout kept in browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageDescriptors {
    pub key: String,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageDescriptors {
    pub const DEFAULT_KEY: &'static str = "sphere_halo_config";

    pub fn new() -> Self {
        Self {
            key: Self::DEFAULT_KEY.to_string(),
        }
    }

    fn storage() -> Result<web_sys::Storage, ConfigError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| ConfigError::Storage("LocalStorage unavailable".into()))
    }

    /// Store a layout for the next activation
    pub fn save(&self, config: &SphereConfig) -> Result<(), ConfigError> {
        let json = serde_json::to_string(config)?;
        Self::storage()?
            .set_item(&self.key, &json)
            .map_err(|e| ConfigError::Storage(format!("{:?}", e)))?;
        log::info!("Saved {} sphere descriptors", config.spheres.len());
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorageDescriptors {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "wasm32")]
impl DescriptorSource for LocalStorageDescriptors {
    fn load(&self) -> Result<Option<SphereConfig>, ConfigError> {
        let item = Self::storage()?
            .get_item(&self.key)
            .map_err(|e| ConfigError::Storage(format!("{:?}", e)))?;
        item.map(|json| SphereConfig::from_json(&json)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_layout_is_valid() {
        let config = BuiltinDescriptors.load().unwrap().unwrap();
        assert_eq!(config.spheres.len(), 22);
        assert_eq!(config.timestamp, Some(1759269817551));
        assert!(config.spheres.iter().all(|d| d.position.z == 3.07));
    }

    #[test]
    fn test_json_descriptors() {
        assert!(JsonDescriptors(String::new()).load().unwrap().is_none());
        assert!(JsonDescriptors("not json".into()).load().is_err());
        let json = concat!(
            r##"{"spheres":[{"id":0,"position":{"x":2,"y":0,"z":3},"##,
            r##""radius":0.1,"color":"#00FFFF"}]}"##
        );
        assert_eq!(JsonDescriptors(json.into()).load().unwrap().unwrap().spheres.len(), 1);
    }

    #[test]
    fn test_chain_skips_empty_and_broken_sources() {
        let chain = ChainedDescriptors::new()
            .then(JsonDescriptors(String::new()))
            .then(JsonDescriptors("{\"spheres\": []}".into()))
            .then(BuiltinDescriptors);
        assert_eq!(chain.load().unwrap().unwrap().spheres.len(), 22);
        assert!(ChainedDescriptors::new().load().unwrap().is_none());
    }
}
