//! Sphere Halo entry point
//!
//! The web build is driven from JavaScript through `platform::web`. Natively
//! this runs a headless demo: a face drifts around, the engine resolves a few
//! seconds of frames, and the final layout is printed as JSON.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use glam::{Quat, Vec3};
    use sphere_halo::persistence::BuiltinDescriptors;
    use sphere_halo::platform;
    use sphere_halo::sim::{FaceCollider, SharedFace, SphereEngine};
    use sphere_halo::{MotionPreset, Settings};

    platform::init_logging();
    log::info!("Sphere Halo (native) starting...");

    let mut args = std::env::args().skip(1);
    let preset = args
        .next()
        .and_then(|name| MotionPreset::from_str(&name))
        .unwrap_or_default();
    let builtin = args.next().is_some_and(|a| a == "--builtin");

    let face = SharedFace::new();
    let rest = Vec3::new(0.0, 0.0, 3.0);
    face.set(FaceCollider::new(rest, 0.9, 0.1));

    let mut engine = SphereEngine::new(face.clone(), Settings::from_preset(preset), 7);
    if builtin {
        engine = engine.with_descriptors(Box::new(BuiltinDescriptors));
    }
    engine.activate();

    let dt = 1.0 / 60.0;
    for frame in 0..600u32 {
        let t = frame as f32 * dt;
        if (240..270).contains(&frame) {
            // Tracker dropout
            face.clear();
        } else {
            let center = rest + Vec3::new((t * 0.8).sin() * 0.6, (t * 1.1).cos() * 0.3, 0.0);
            let tilt = Quat::from_rotation_z((t * 0.5).sin() * 0.25);
            face.set(FaceCollider::new(center, 0.9, 0.1).with_orientation(tilt));
        }

        engine.update(dt);

        if frame % 120 == 0 {
            let report = engine.last_report();
            log::info!(
                "t={:.1}s spheres={} displaced={} bumped={} sweeps={}",
                t,
                engine.spheres().len(),
                report.displaced,
                report.bumped,
                report.projection_sweeps
            );
        }
    }

    match engine.capture_config(Some(platform::now_ms())).to_json_pretty() {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Could not serialize layout: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
