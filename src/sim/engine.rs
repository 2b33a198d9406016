//! The sphere engine: lifecycle, control surface and per-frame update
//!
//! Owned by the host application. The face tracker is read through a
//! [`FaceSource`] once per update; persisted layouts come from an optional
//! [`DescriptorSource`].

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::face::{FaceBox, FaceCollider, FaceSource, HeadTracker};
use super::frame::{FrameInput, FrameReport, resolve_frame_in_place};
use super::placement;
use super::sphere::{Sphere, SphereState};
use super::transition::{GroupVisual, Transition, TransitionKind};
use crate::consts::*;
use crate::error::{ConfigError, ControlError};
use crate::persistence::{DescriptorSource, SphereConfig};
use crate::renderer::{FrameOutput, SphereTransform};
use crate::settings::Settings;

pub struct SphereEngine<F: FaceSource> {
    settings: Settings,
    face_source: F,
    descriptors: Option<Box<dyn DescriptorSource>>,
    rng: Pcg32,
    seed: u64,
    /// Engine clock, advanced by clamped frame dt
    now: f64,
    head: HeadTracker,
    spheres: Vec<Sphere>,
    next_id: u32,
    active: bool,
    paused: bool,
    visual: GroupVisual,
    transition: Option<Transition>,
    last_report: FrameReport,
}

impl<F: FaceSource> SphereEngine<F> {
    pub fn new(face_source: F, settings: Settings, seed: u64) -> Self {
        Self {
            settings: settings.sanitized(),
            face_source,
            descriptors: None,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            now: 0.0,
            head: HeadTracker::new(FaceCollider::default()),
            spheres: Vec::new(),
            next_id: 0,
            active: false,
            paused: false,
            visual: GroupVisual::HIDDEN,
            transition: None,
            last_report: FrameReport::default(),
        }
    }

    /// Use a persisted layout on activation instead of procedural placement
    pub fn with_descriptors(mut self, source: Box<dyn DescriptorSource>) -> Self {
        self.descriptors = Some(source);
        self
    }

    pub fn set_descriptor_source(&mut self, source: Option<Box<dyn DescriptorSource>>) {
        self.descriptors = source;
    }

    // ---- Lifecycle ----

    /// Create the spheres and fade them in
    pub fn activate(&mut self) {
        if self.active {
            if self.is_exiting() {
                log::info!("Activation during exit, fading back in");
                self.transition = Some(Transition::enter_from(self.visual));
            }
            return;
        }

        self.anchor_on_current_face();
        self.populate();
        self.active = true;
        self.paused = false;
        self.visual = GroupVisual::HIDDEN;
        self.transition = Some(Transition::enter());
        log::info!("Sphere engine activated with {} spheres", self.spheres.len());
    }

    /// Fade out; spheres are removed once the fade completes
    pub fn deactivate(&mut self) {
        if !self.active || self.is_exiting() {
            return;
        }
        self.transition = Some(Transition::exit_from(self.visual));
        log::debug!("Sphere engine fading out");
    }

    /// Remove everything immediately
    pub fn finalize_deactivate(&mut self) {
        self.spheres.clear();
        self.active = false;
        self.paused = false;
        self.transition = None;
        self.visual = GroupVisual::HIDDEN;
        log::info!("Sphere engine deactivated");
    }

    /// Hide the spheres and stop updating them
    pub fn pause(&mut self) {
        if self.active && !self.paused {
            self.paused = true;
            self.transition = None;
            log::debug!("Sphere engine paused");
        }
    }

    /// Show again with a fresh enter fade; recreates the spheres if they were
    /// cleared meanwhile
    pub fn resume(&mut self) {
        if !self.active || !self.paused {
            return;
        }
        self.paused = false;
        self.visual = GroupVisual::HIDDEN;
        self.transition = Some(Transition::enter());
        if self.spheres.is_empty() {
            self.anchor_on_current_face();
            self.populate();
        }
        log::debug!("Sphere engine resumed with {} spheres", self.spheres.len());
    }

    // ---- Content ----

    pub fn clear_all(&mut self) {
        log::info!("Clearing {} spheres", self.spheres.len());
        self.spheres.clear();
    }

    /// Discard the current layout and place a fresh procedural one
    pub fn regenerate(&mut self) {
        self.spheres.clear();
        self.next_id = 0;
        self.anchor_on_current_face();
        self.generate();
    }

    /// Replace the current spheres with a persisted layout
    pub fn load_config(&mut self, config: &SphereConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let center = self.head.collider().center.truncate();
        self.spheres =
            placement::spheres_from_config(&mut self.rng, config, center, &self.settings);
        self.next_id = self.spheres.iter().map(|s| s.id + 1).max().unwrap_or(0);
        log::info!("Loaded {} spheres from config", self.spheres.len());
        Ok(())
    }

    /// Snapshot the live layout
    pub fn capture_config(&self, timestamp: Option<u64>) -> SphereConfig {
        SphereConfig::capture(&self.spheres, timestamp)
    }

    // ---- Edits (resolved on the next update) ----

    pub fn set_sphere_radius(&mut self, id: u32, radius: f32) -> Result<(), ControlError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(ControlError::InvalidRadius(radius));
        }
        self.sphere_mut(id)?.radius = radius;
        Ok(())
    }

    /// Multiply a radius, clamped to the settings range; returns the new radius
    pub fn scale_sphere_radius(&mut self, id: u32, factor: f32) -> Result<f32, ControlError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ControlError::InvalidScale(factor));
        }
        let (min, max) = (self.settings.min_radius, self.settings.max_radius);
        let sphere = self.sphere_mut(id)?;
        sphere.radius = (sphere.radius * factor).clamp(min, max);
        Ok(sphere.radius)
    }

    /// Move a sphere's rest point; any displacement is forgotten
    pub fn set_sphere_base_position(
        &mut self,
        id: u32,
        x: f32,
        y: f32,
        z: f32,
    ) -> Result<(), ControlError> {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(ControlError::NonFinitePosition { x, y, z });
        }
        let sphere = self.sphere_mut(id)?;
        sphere.base = Vec3::new(x, y, z);
        sphere.state = SphereState::Free;
        Ok(())
    }

    pub fn remove_sphere(&mut self, id: u32) -> Result<Sphere, ControlError> {
        let idx = self
            .spheres
            .iter()
            .position(|s| s.id == id)
            .ok_or(ControlError::UnknownSphere(id))?;
        Ok(self.spheres.remove(idx))
    }

    // ---- Per frame ----

    /// Advance by `dt` seconds (clamped); no-op while inactive or paused
    pub fn update(&mut self, dt: f32) {
        if !self.active || self.paused {
            return;
        }
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.now += dt as f64;

        if let Some(transition) = &mut self.transition {
            self.visual = transition.advance(dt);
            if transition.is_finished() {
                let kind = transition.kind;
                self.transition = None;
                if kind == TransitionKind::Exit {
                    self.finalize_deactivate();
                    return;
                }
            }
        }

        let face = self.face_source.face_collider();
        self.head.observe(face, dt, &self.settings);

        let input = FrameInput::from_tracker(&self.head, self.now, dt, &self.settings);
        self.last_report = resolve_frame_in_place(&mut self.spheres, &input, &self.settings);
    }

    /// Renderer-facing snapshot of the current state
    pub fn frame(&self) -> FrameOutput {
        if !self.active || self.paused {
            return FrameOutput::hidden();
        }
        FrameOutput {
            opacity: self.visual.opacity,
            group_z: self.visual.z_offset,
            visible: true,
            spheres: self
                .spheres
                .iter()
                .map(|s| SphereTransform::from_sphere(s, self.visual.z_offset))
                .collect(),
        }
    }

    // ---- Accessors ----

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn sphere(&self, id: u32) -> Option<&Sphere> {
        self.spheres.iter().find(|s| s.id == id)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
    }

    pub fn face_source(&self) -> &F {
        &self.face_source
    }

    pub fn head(&self) -> &HeadTracker {
        &self.head
    }

    pub fn face_box(&self) -> FaceBox {
        self.head.face_box(&self.settings)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_exiting(&self) -> bool {
        self.transition.is_some_and(|t| t.kind == TransitionKind::Exit)
    }

    pub fn visual(&self) -> GroupVisual {
        self.visual
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn last_report(&self) -> FrameReport {
        self.last_report
    }

    // ---- Internals ----

    fn sphere_mut(&mut self, id: u32) -> Result<&mut Sphere, ControlError> {
        self.spheres
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ControlError::UnknownSphere(id))
    }

    /// Take the tracker's current face as the rest frame for new spheres
    fn anchor_on_current_face(&mut self) {
        let face = self.face_source.face_collider();
        self.head.observe(face, 0.0, &self.settings);
        self.head.reset_rest();
    }

    /// Fill from the descriptor source, falling back to procedural placement
    fn populate(&mut self) {
        let loaded = match self.descriptors.as_ref().map(|source| source.load()) {
            Some(Ok(Some(config))) => Some(config),
            Some(Ok(None)) | None => None,
            Some(Err(e)) => {
                log::warn!("Ignoring sphere config: {}", e);
                None
            }
        };

        match loaded {
            Some(config) => {
                if let Err(e) = self.load_config(&config) {
                    log::warn!("Ignoring sphere config: {}", e);
                    self.generate();
                }
            }
            None => self.generate(),
        }
    }

    fn generate(&mut self) {
        let (spheres, _report) = placement::generate(
            &mut self.rng,
            self.settings.sphere_count,
            self.head.collider(),
            self.next_id,
            &self.settings,
        );
        self.next_id += spheres.len() as u32;
        self.spheres = spheres;
    }
}
