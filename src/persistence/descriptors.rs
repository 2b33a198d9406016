//! Persisted sphere layouts
//!
//! The JSON shape is the one the capture tool has always written:
//! `{"spheres":[{"id","position":{"x","y","z"},"radius","baseRadius","color"}],"timestamp"}`.

use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::{Sphere, SphereColor};

/// Plain xyz triple (glam serializes vectors as arrays)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Vec3> for Position {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Position> for Vec3 {
    fn from(p: Position) -> Self {
        Vec3::new(p.x, p.y, p.z)
    }
}

/// One persisted sphere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SphereDescriptor {
    pub id: u32,
    pub position: Position,
    pub radius: f32,
    /// Distance from the origin when captured; scales the wobble
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_radius: Option<f32>,
    pub color: String,
}

impl SphereDescriptor {
    pub fn parse_color(&self) -> Option<SphereColor> {
        self.color.parse().ok()
    }

    /// Snapshot of a live sphere, rounded to centimetres
    pub fn capture(sphere: &Sphere) -> Self {
        let pos = sphere.pos;
        Self {
            id: sphere.id,
            position: Position {
                x: round2(pos.x),
                y: round2(pos.y),
                z: round2(pos.z),
            },
            radius: round2(sphere.radius),
            base_radius: Some(round2(pos.length())),
            color: sphere.color.to_string(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.position.is_finite() {
            return Err(ConfigError::NonFinitePosition { id: self.id });
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(ConfigError::InvalidRadius {
                id: self.id,
                radius: self.radius,
            });
        }
        if self.parse_color().is_none() {
            return Err(ConfigError::InvalidColor {
                id: self.id,
                color: self.color.clone(),
            });
        }
        Ok(())
    }
}

#[inline]
fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// A full persisted layout
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SphereConfig {
    pub spheres: Vec<SphereDescriptor>,
    /// Capture time (ms since the Unix epoch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl SphereConfig {
    /// Parse and validate; any bad entry rejects the whole list
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spheres.is_empty() {
            return Err(ConfigError::Empty);
        }
        let mut seen = HashSet::with_capacity(self.spheres.len());
        for descriptor in &self.spheres {
            if !seen.insert(descriptor.id) {
                return Err(ConfigError::DuplicateId { id: descriptor.id });
            }
            descriptor.validate()?;
        }
        Ok(())
    }

    /// Snapshot live spheres
    pub fn capture(spheres: &[Sphere], timestamp: Option<u64>) -> Self {
        Self {
            spheres: spheres.iter().map(SphereDescriptor::capture).collect(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: &str = concat!(
        r##"{"spheres":[{"id":0,"position":{"x":-0.88,"y":-0.62,"z":3.07},"##,
        r##""radius":0.14,"baseRadius":3.25,"color":"#5E2EA7"}],"##,
        r##""timestamp":1759269817551}"##
    );

    #[test]
    fn test_parse_tool_output() {
        let config = SphereConfig::from_json(ONE).unwrap();
        assert_eq!(config.spheres.len(), 1);
        assert_eq!(config.timestamp, Some(1759269817551));
        let d = &config.spheres[0];
        assert_eq!(d.base_radius, Some(3.25));
        assert_eq!(d.parse_color(), Some(SphereColor([0x5E, 0x2E, 0xA7])));
    }

    #[test]
    fn test_base_radius_and_timestamp_are_optional() {
        let json = concat!(
            r##"{"spheres":[{"id":3,"position":{"x":1,"y":2,"z":3},"##,
            r##""radius":0.2,"color":"#00FFFF"}]}"##
        );
        let config = SphereConfig::from_json(json).unwrap();
        assert_eq!(config.spheres[0].base_radius, None);
        assert_eq!(config.timestamp, None);
    }

    #[test]
    fn test_rejects_bad_lists_whole() {
        assert!(matches!(SphereConfig::from_json("{"), Err(ConfigError::Json(_))));
        assert!(matches!(
            SphereConfig::from_json(r#"{"spheres":[]}"#),
            Err(ConfigError::Empty)
        ));

        let dup = r##"{"spheres":[
            {"id":1,"position":{"x":0,"y":0,"z":0},"radius":0.1,"color":"#FFFFFF"},
            {"id":1,"position":{"x":1,"y":0,"z":0},"radius":0.1,"color":"#FFFFFF"}]}"##;
        assert!(matches!(
            SphereConfig::from_json(dup),
            Err(ConfigError::DuplicateId { id: 1 })
        ));

        let radius = concat!(
            r##"{"spheres":[{"id":2,"position":{"x":0,"y":0,"z":0},"##,
            r##""radius":-0.1,"color":"#FFFFFF"}]}"##
        );
        assert!(matches!(
            SphereConfig::from_json(radius),
            Err(ConfigError::InvalidRadius { id: 2, .. })
        ));

        let color = concat!(
            r##"{"spheres":[{"id":4,"position":{"x":0,"y":0,"z":0},"##,
            r##""radius":0.1,"color":"purple"}]}"##
        );
        assert!(matches!(
            SphereConfig::from_json(color),
            Err(ConfigError::InvalidColor { id: 4, .. })
        ));
    }

    #[test]
    fn test_non_finite_position_rejected() {
        let config = SphereConfig {
            spheres: vec![SphereDescriptor {
                id: 9,
                position: Position {
                    x: f32::NAN,
                    y: 0.0,
                    z: 0.0,
                },
                radius: 0.1,
                base_radius: None,
                color: "#FFFFFF".into(),
            }],
            timestamp: None,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinitePosition { id: 9 })
        ));
    }

    #[test]
    fn test_pretty_json_reparses() {
        let config = SphereConfig::from_json(ONE).unwrap();
        let text = config.to_json_pretty().unwrap();
        assert!(text.contains("\"baseRadius\""));
        assert_eq!(SphereConfig::from_json(&text).unwrap(), config);
    }
}
