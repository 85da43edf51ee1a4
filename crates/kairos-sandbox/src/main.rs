use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use kairos_engine::logging::{init_logging, LoggingConfig};
use kairos_engine::physics::rapier3d::na::Vector3;
use kairos_engine::physics::rapier3d::prelude::RigidBody;
use kairos_engine::physics::{
    BodyDesc, Collidable, CollidableId, NoHooks, PhysicsConfig, PhysicsController, PhysicsListener,
    ShapeDef,
};
use kairos_engine::system::{FrameDelta, System, SystemConfig, SystemCtx, SystemListener, SystemMessage};
use kairos_engine::window::{Runtime, RuntimeConfig};

/// Run this many fixed 60 Hz ticks without a window, then exit.
const HEADLESS_ENV: &str = "KAIROS_HEADLESS_FRAMES";

/// Kinematic platform sliding back and forth along X.
struct Shuttle {
    phase: f32,
}

impl Collidable for Shuttle {
    fn pre_physics_step(&mut self, body: &mut RigidBody) {
        self.phase += 1.0 / 60.0;
        let x = 3.0 * self.phase.sin();
        body.set_next_kinematic_translation(Vector3::new(x, 0.0, 1.0));
    }
}

/// Logs simulation progress once per simulated second.
#[derive(Default)]
struct Heartbeat {
    next_report: f64,
    elapsed: f64,
    frames: u64,
}

impl SystemListener for Heartbeat {
    fn on_message(&mut self, msg: &SystemMessage, _ctx: &mut SystemCtx) {
        match msg {
            SystemMessage::PostFrame(FrameDelta { sim, .. }) => {
                self.elapsed += sim;
                self.frames += 1;
                if self.elapsed >= self.next_report {
                    log::info!("t={:.2}s after {} frames", self.elapsed, self.frames);
                    self.next_report += 1.0;
                }
            }
            SystemMessage::PauseStart => log::info!("paused"),
            SystemMessage::PauseEnd => log::info!("resumed"),
            SystemMessage::Exit => log::info!("exit after {} frames", self.frames),
            _ => {}
        }
    }
}

fn build_world() -> Result<PhysicsController> {
    let mut physics = PhysicsController::new(PhysicsConfig::default().with_step_size(1.0 / 120.0));
    let mut names: HashMap<CollidableId, String> = HashMap::new();

    let mut add = |physics: &mut PhysicsController,
                   name: &str,
                   desc: BodyDesc,
                   hooks: Box<dyn Collidable>|
     -> Result<()> {
        let id = physics
            .register_collidable(name, desc, hooks)
            .with_context(|| format!("failed to register '{name}'"))?;
        names.insert(id, name.to_string());
        Ok(())
    };

    add(&mut physics, "ground", BodyDesc::ground(0.0), Box::new(NoHooks))?;
    add(
        &mut physics,
        "shuttle",
        BodyDesc::kinematic(ShapeDef::Cuboid { half_extents: Vector3::new(1.5, 1.5, 0.1) })
            .at(Vector3::new(0.0, 0.0, 1.0)),
        Box::new(Shuttle { phase: 0.0 }),
    )?;

    for i in 0..5 {
        let x = i as f32 - 2.0;
        add(
            &mut physics,
            &format!("ball-{i}"),
            BodyDesc::dynamic(ShapeDef::Sphere { radius: 0.3 })
                .at(Vector3::new(x, 0.0, 4.0 + i as f32))
                .with_restitution(0.4),
            Box::new(NoHooks),
        )?;
    }

    add(
        &mut physics,
        "crate",
        BodyDesc::dynamic(ShapeDef::Cuboid { half_extents: Vector3::new(0.4, 0.4, 0.4) })
            .at(Vector3::new(0.5, 0.5, 8.0))
            .with_mass(20.0),
        Box::new(NoHooks),
    )?;

    let mut seen: HashSet<(CollidableId, CollidableId)> = HashSet::new();
    physics.set_collision_callback(move |contact| {
        let key = (contact.first.min(contact.second), contact.first.max(contact.second));
        if seen.insert(key) {
            let name = |id: CollidableId| names.get(&id).map(String::as_str).unwrap_or("?");
            log::info!(
                "first contact {} <-> {} at ({:.2}, {:.2}, {:.2}) depth {:.4}",
                name(contact.first),
                name(contact.second),
                contact.position.x,
                contact.position.y,
                contact.position.z,
                contact.depth
            );
        }
    });

    Ok(physics)
}

fn headless_frames() -> Result<Option<u64>> {
    match std::env::var(HEADLESS_ENV) {
        Ok(v) => {
            let frames = v
                .parse()
                .with_context(|| format!("{HEADLESS_ENV} must be a frame count, got '{v}'"))?;
            Ok(Some(frames))
        }
        Err(_) => Ok(None),
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut system = System::new(SystemConfig::default().with_frame_rate(60.0));
    system.add_listener(Box::new(PhysicsListener::new(build_world()?)));
    system.add_listener(Box::new(Heartbeat::default()));

    match headless_frames()? {
        Some(frames) => {
            log::info!("running {frames} headless frames");
            system.start();
            system.config_stage();
            let dt = 1.0 / system.frame_rate();
            for _ in 0..frames {
                system.step_with(dt);
            }
            system.stop();
            system.finish();
        }
        None => {
            let config = RuntimeConfig {
                title: "kairos sandbox (P: pause, Esc: quit)".to_string(),
                ..RuntimeConfig::default()
            };
            Runtime::run(config, system)?;
        }
    }

    Ok(())
}
