//! JavaScript bindings
//!
//! The page owns the face tracker and the 3D scene. It writes the tracked
//! face into [`HaloEngine::set_face`] whenever the tracker reports, calls
//! `update` once per animation frame and uploads `instances()`.

use glam::{Quat, Vec3};
use wasm_bindgen::prelude::*;

use crate::persistence::{
    BuiltinDescriptors, ChainedDescriptors, LocalStorageDescriptors, SphereConfig,
};
use crate::renderer::SphereInstance;
use crate::settings::{MotionPreset, Settings};
use crate::sim::{FaceCollider, SharedFace, SphereEngine};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialised".into());
    }
    log::info!("Sphere Halo starting...");
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct HaloEngine {
    engine: SphereEngine<SharedFace>,
    face: SharedFace,
    store: LocalStorageDescriptors,
}

#[wasm_bindgen]
impl HaloEngine {
    /// Stored layout first, then the bundled one
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u32>) -> HaloEngine {
        let seed = seed
            .map(u64::from)
            .unwrap_or_else(|| (js_sys::Math::random() * u32::MAX as f64) as u64);
        let face = SharedFace::new();
        let store = LocalStorageDescriptors::new();
        let sources = ChainedDescriptors::new().then(store.clone()).then(BuiltinDescriptors);
        let engine = SphereEngine::new(face.clone(), Settings::load(), seed)
            .with_descriptors(Box::new(sources));
        HaloEngine { engine, face, store }
    }

    /// Start procedural placement next time instead of the stored layouts
    pub fn use_procedural(&mut self) {
        self.engine.set_descriptor_source(None);
    }

    pub fn set_face(&self, x: f32, y: f32, z: f32, radius: f32, margin: f32) {
        self.face.set(FaceCollider::new(Vec3::new(x, y, z), radius, margin));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_face_oriented(
        &self,
        x: f32,
        y: f32,
        z: f32,
        radius: f32,
        margin: f32,
        qx: f32,
        qy: f32,
        qz: f32,
        qw: f32,
    ) {
        let collider = FaceCollider::new(Vec3::new(x, y, z), radius, margin)
            .with_orientation(Quat::from_xyzw(qx, qy, qz, qw));
        self.face.set(collider);
    }

    pub fn clear_face(&self) {
        self.face.clear();
    }

    /// Advance by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.engine.update(dt);
    }

    pub fn activate(&mut self) {
        self.engine.activate();
    }

    pub fn deactivate(&mut self) {
        self.engine.deactivate();
    }

    pub fn finalize_deactivate(&mut self) {
        self.engine.finalize_deactivate();
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    pub fn resume(&mut self) {
        self.engine.resume();
    }

    pub fn clear_all(&mut self) {
        self.engine.clear_all();
    }

    pub fn regenerate(&mut self) {
        self.engine.regenerate();
    }

    pub fn set_sphere_radius(&mut self, id: u32, radius: f32) -> Result<(), JsValue> {
        self.engine.set_sphere_radius(id, radius).map_err(to_js)
    }

    pub fn scale_sphere_radius(&mut self, id: u32, factor: f32) -> Result<f32, JsValue> {
        self.engine.scale_sphere_radius(id, factor).map_err(to_js)
    }

    pub fn set_sphere_base_position(
        &mut self,
        id: u32,
        x: f32,
        y: f32,
        z: f32,
    ) -> Result<(), JsValue> {
        self.engine.set_sphere_base_position(id, x, y, z).map_err(to_js)
    }

    pub fn remove_sphere(&mut self, id: u32) -> Result<(), JsValue> {
        self.engine.remove_sphere(id).map(|_| ()).map_err(to_js)
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), JsValue> {
        let config = SphereConfig::from_json(json).map_err(to_js)?;
        self.engine.load_config(&config).map_err(to_js)
    }

    /// Live layout in the capture tool's JSON shape
    pub fn capture_json(&self) -> Result<String, JsValue> {
        self.engine
            .capture_config(Some(super::now_ms()))
            .to_json_pretty()
            .map_err(to_js)
    }

    /// Persist the live layout for the next session
    pub fn save_layout(&self) -> Result<(), JsValue> {
        let config = self.engine.capture_config(Some(super::now_ms()));
        self.store.save(&config).map_err(to_js)
    }

    /// Switch motion preset (`calm`, `default`, `lively`) and remember it
    pub fn set_preset(&mut self, name: &str) -> bool {
        let Some(preset) = MotionPreset::from_str(name) else {
            return false;
        };
        let mut settings = self.engine.settings().clone();
        settings.apply_preset(preset);
        settings.save();
        self.engine.set_settings(settings);
        true
    }

    /// Flat instance buffer, `SphereInstance::FLOATS` values per sphere
    pub fn instances(&self) -> Vec<f32> {
        let instances: Vec<SphereInstance> = self.engine.frame().instances();
        bytemuck::cast_slice(&instances).to_vec()
    }

    pub fn floats_per_instance(&self) -> usize {
        SphereInstance::FLOATS
    }

    pub fn opacity(&self) -> f32 {
        self.engine.visual().opacity
    }

    pub fn group_z(&self) -> f32 {
        self.engine.visual().z_offset
    }

    pub fn visible(&self) -> bool {
        self.engine.frame().visible
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    pub fn sphere_count(&self) -> usize {
        self.engine.spheres().len()
    }
}
