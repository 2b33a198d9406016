//! Engine tuning and preferences
//!
//! Persisted separately from sphere layouts in LocalStorage.

use serde::{Deserialize, Serialize};

/// Motion presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MotionPreset {
    Calm,
    #[default]
    Default,
    Lively,
}

impl MotionPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionPreset::Calm => "Calm",
            MotionPreset::Default => "Default",
            MotionPreset::Lively => "Lively",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "calm" => Some(MotionPreset::Calm),
            "default" | "normal" => Some(MotionPreset::Default),
            "lively" => Some(MotionPreset::Lively),
            _ => None,
        }
    }

    /// Cap on the orbital wobble radius (world units)
    pub fn wobble_cap(&self) -> f32 {
        match self {
            MotionPreset::Calm => 0.04,
            MotionPreset::Default => 0.08,
            MotionPreset::Lively => 0.12,
        }
    }

    /// Fraction of head translation the spheres follow
    pub fn head_follow(&self) -> f32 {
        match self {
            MotionPreset::Calm => 0.2,
            MotionPreset::Default => 0.3,
            MotionPreset::Lively => 0.4,
        }
    }

    /// Smoothing rate for spheres bumped this frame (1/s)
    pub fn bumped_smoothing_rate(&self) -> f32 {
        match self {
            MotionPreset::Calm => 3.5,
            MotionPreset::Default => 5.0,
            MotionPreset::Lively => 7.0,
        }
    }
}

/// Engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub preset: MotionPreset,

    // === Placement ===
    /// Spheres requested by procedural generation
    pub sphere_count: usize,
    /// Candidate positions tried per radius
    pub placement_attempts: u32,
    /// Radius multiplier applied when a zone is exhausted
    pub placement_shrink: f32,
    /// How many times the radius may shrink before the sphere is skipped
    pub placement_retries: u32,

    // === Face box ===
    /// Box half-width = face radius * this + margins
    pub face_width_scale: f32,
    /// Box half-height = face radius * this + margins
    pub face_height_scale: f32,
    pub box_margin_x: f32,
    pub box_margin_y: f32,
    /// Clearance left between a pushed sphere and the box edge
    pub face_push_margin: f32,
    /// Fraction of the way toward the boundary target per frame
    pub face_resolve_factor: f32,
    /// Seconds after the last face hit before return easing starts
    pub repel_cooldown: f32,
    /// Magnitude of the per-sphere boundary jitter
    pub jitter_amplitude: f32,

    // === Motion ===
    pub head_follow: f32,
    /// Head offset tracking rate while a face is visible (1/s)
    pub head_follow_rate: f32,
    /// Head offset decay rate while no face is visible (1/s)
    pub head_decay_rate: f32,
    /// Face plane sits this far in front of the face centre
    pub plane_bias: f32,
    /// Wobble radius as a fraction of the orbit base radius
    pub wobble_fraction: f32,
    pub wobble_cap: f32,
    /// Range of the per-sphere 60 fps follow lerp
    pub follow_lerp_min: f32,
    pub follow_lerp_max: f32,

    // === Sphere-sphere ===
    /// Hard minimum gap between sphere surfaces
    pub min_gap: f32,
    /// Gap targeted by the soft separation (>= min_gap)
    pub sphere_padding: f32,
    pub soft_iterations: u32,
    pub soft_stiffness: f32,
    /// Stiffness lost per soft iteration
    pub stiffness_falloff: f32,
    /// Sweep budget for the exact pair clamp
    pub hard_clamp_sweeps: u32,
    /// Comfort band beyond the padding used by the spread pass
    pub spread_margin: f32,
    pub spread_strength: f32,
    /// Cap on rounds of pair clamp + face clamp after smoothing; rounds stop
    /// as soon as both constraints hold
    pub projection_iterations: u32,

    // === Return ===
    pub return_threshold: f32,
    pub return_rate_near: f32,
    pub return_rate_far: f32,
    /// Displacement at which the far rate fully applies
    pub return_far_distance: f32,
    pub return_wobble: f32,
    pub return_wobble_decay: f32,

    // === Smoothing ===
    pub bumped_smoothing_rate: f32,

    // === Editing ===
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for Settings {
    fn default() -> Self {
        let preset = MotionPreset::Default;
        Self {
            preset,

            sphere_count: 22,
            placement_attempts: 200,
            placement_shrink: 0.7,
            placement_retries: 2,

            face_width_scale: 1.0,
            face_height_scale: 1.3,
            box_margin_x: 0.05,
            box_margin_y: 0.08,
            face_push_margin: 0.02,
            face_resolve_factor: 0.03,
            repel_cooldown: 0.4,
            jitter_amplitude: 0.04,

            head_follow: preset.head_follow(),
            head_follow_rate: 12.0,
            head_decay_rate: 2.0,
            plane_bias: 0.08,
            wobble_fraction: 0.15,
            wobble_cap: preset.wobble_cap(),
            follow_lerp_min: 0.15,
            follow_lerp_max: 0.25,

            min_gap: 0.05,
            sphere_padding: 0.06,
            soft_iterations: 3,
            soft_stiffness: 0.5,
            stiffness_falloff: 0.3,
            hard_clamp_sweeps: 8,
            spread_margin: 0.08,
            spread_strength: 0.6,
            projection_iterations: 64,

            return_threshold: 0.02,
            return_rate_near: 2.5,
            return_rate_far: 8.0,
            return_far_distance: 1.0,
            return_wobble: 0.015,
            return_wobble_decay: 1.5,

            bumped_smoothing_rate: preset.bumped_smoothing_rate(),

            min_radius: 0.02,
            max_radius: 0.6,
        }
    }
}

impl Settings {
    /// Create settings from a motion preset (applies preset defaults)
    pub fn from_preset(preset: MotionPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a motion preset (updates preset-dependent settings)
    pub fn apply_preset(&mut self, preset: MotionPreset) {
        self.preset = preset;
        self.wobble_cap = preset.wobble_cap();
        self.head_follow = preset.head_follow();
        self.bumped_smoothing_rate = preset.bumped_smoothing_rate();
    }

    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Clamp values that would break the solver
    pub fn sanitized(mut self) -> Self {
        self.min_gap = self.min_gap.max(0.0);
        self.sphere_padding = self.sphere_padding.max(self.min_gap);
        self.face_resolve_factor = self.face_resolve_factor.clamp(0.0, 1.0);
        self.placement_shrink = self.placement_shrink.clamp(0.1, 1.0);
        self.follow_lerp_min = self.follow_lerp_min.clamp(0.001, 0.95);
        self.follow_lerp_max = self.follow_lerp_max.clamp(self.follow_lerp_min, 0.95);
        self.min_radius = self.min_radius.max(0.001);
        self.max_radius = self.max_radius.max(self.min_radius);
        self.hard_clamp_sweeps = self.hard_clamp_sweeps.max(1);
        self.projection_iterations = self.projection_iterations.max(1);
        self
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "sphere_halo_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_round_trip_names() {
        for preset in [MotionPreset::Calm, MotionPreset::Default, MotionPreset::Lively] {
            assert_eq!(MotionPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(MotionPreset::from_str("frantic"), None);
    }

    #[test]
    fn test_from_preset_applies_values() {
        let calm = Settings::from_preset(MotionPreset::Calm);
        assert_eq!(calm.preset, MotionPreset::Calm);
        assert!(calm.wobble_cap < Settings::default().wobble_cap);
        assert!(calm.bumped_smoothing_rate < Settings::default().bumped_smoothing_rate);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "sphere_count": 40, "min_gap": 0.1 }"#).unwrap();
        assert_eq!(settings.sphere_count, 40);
        assert!((settings.min_gap - 0.1).abs() < 1e-6);
        // Padding is raised to at least the hard gap
        assert!(settings.sphere_padding >= settings.min_gap);
        assert_eq!(settings.soft_iterations, 3);
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(Settings::from_json("{ nope").is_err());
    }
}
