use std::collections::{BTreeMap, HashMap};

use rapier3d::na::Vector3;
use rapier3d::prelude::*;

use super::body::{BodyDesc, BodyKind};
use super::collidable::{Collidable, CollidableId};
use super::contact::{gather_contacts, ContactReport};
use super::error::PhysicsError;

/// Leftover time below this is dropped instead of taking a sliver substep.
const LEFTOVER_EPSILON: f64 = 1.0e-6;

/// Slack when counting full substeps, so `0.3 / 0.1` counts as three.
const SUBSTEP_SLACK: f64 = 1.0e-9;

/// Physics controller configuration.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    pub gravity: Vector3<f32>,
    /// Substep size in seconds. `None` takes one step of the whole frame delta.
    pub step_size: Option<f64>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, 0.0, -9.81),
            step_size: None,
        }
    }
}

impl PhysicsConfig {
    pub fn with_gravity(mut self, gravity: Vector3<f32>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_step_size(mut self, step: f64) -> Self {
        self.step_size = Some(step);
        self
    }
}

type CollisionCallback = Box<dyn FnMut(&ContactReport)>;

struct Registered {
    name: String,
    kind: BodyKind,
    body: RigidBodyHandle,
    collider: ColliderHandle,
    hooks: Box<dyn Collidable>,
}

/// Owns the collision space and dynamics world and advances them in
/// fixed-size substeps.
pub struct PhysicsController {
    config: PhysicsConfig,

    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    // Registration order is id order, so hooks run deterministically.
    registered: BTreeMap<CollidableId, Registered>,
    owners: HashMap<ColliderHandle, CollidableId>,
    next_id: u64,

    on_contact: Option<CollisionCallback>,
    contacts: Vec<ContactReport>,
    steps_taken: u64,
}

impl PhysicsController {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            registered: BTreeMap::new(),
            owners: HashMap::new(),
            next_id: 0,
            on_contact: None,
            contacts: Vec::new(),
            steps_taken: 0,
        }
    }

    // ── registration ──────────────────────────────────────────────────────

    /// Adds a body and its collider to the world.
    pub fn register_collidable(
        &mut self,
        name: impl Into<String>,
        desc: BodyDesc,
        hooks: Box<dyn Collidable>,
    ) -> Result<CollidableId, PhysicsError> {
        let name = name.into();

        if let Err(err) = desc.validate(&name) {
            log::warn!("rejecting collidable: {err}");
            return Err(err);
        }
        if self.find(&name).is_some() {
            log::warn!("rejecting collidable '{name}': name already registered");
            return Err(PhysicsError::DuplicateName(name));
        }

        let body = self.bodies.insert(desc.build_body());
        let collider = self
            .colliders
            .insert_with_parent(desc.build_collider(), body, &mut self.bodies);

        let id = CollidableId(self.next_id);
        self.next_id += 1;

        log::debug!("registered collidable '{name}' {id} ({:?})", desc.kind);

        self.owners.insert(collider, id);
        self.registered.insert(
            id,
            Registered {
                name,
                kind: desc.kind,
                body,
                collider,
                hooks,
            },
        );

        Ok(id)
    }

    /// Removes a body and its collider. Unknown ids are logged and ignored.
    pub fn unregister_collidable(&mut self, id: CollidableId) -> bool {
        let Some(entry) = self.registered.remove(&id) else {
            log::warn!("unregister of unknown collidable {id} ignored");
            return false;
        };

        self.owners.remove(&entry.collider);
        self.bodies.remove(
            entry.body,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );

        log::debug!("unregistered collidable '{}' {id}", entry.name);
        true
    }

    pub fn find(&self, name: &str) -> Option<CollidableId> {
        self.registered
            .iter()
            .find(|(_, r)| r.name == name)
            .map(|(id, _)| *id)
    }

    pub fn name(&self, id: CollidableId) -> Option<&str> {
        self.registered.get(&id).map(|r| r.name.as_str())
    }

    pub fn collidable_count(&self) -> usize {
        self.registered.len()
    }

    // ── body access ───────────────────────────────────────────────────────

    pub fn body(&self, id: CollidableId) -> Option<&RigidBody> {
        let entry = self.registered.get(&id)?;
        self.bodies.get(entry.body)
    }

    pub fn body_mut(&mut self, id: CollidableId) -> Option<&mut RigidBody> {
        let entry = self.registered.get(&id)?;
        self.bodies.get_mut(entry.body)
    }

    pub fn translation(&self, id: CollidableId) -> Option<Vector3<f32>> {
        self.body(id).map(|b| *b.translation())
    }

    pub fn set_translation(&mut self, id: CollidableId, translation: Vector3<f32>) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                body.set_translation(translation, true);
                true
            }
            None => {
                log::warn!("set_translation on unknown collidable {id} ignored");
                false
            }
        }
    }

    pub fn linear_velocity(&self, id: CollidableId) -> Option<Vector3<f32>> {
        self.body(id).map(|b| *b.linvel())
    }

    pub fn set_linear_velocity(&mut self, id: CollidableId, velocity: Vector3<f32>) -> bool {
        match self.body_mut(id) {
            Some(body) => {
                body.set_linvel(velocity, true);
                true
            }
            None => {
                log::warn!("set_linear_velocity on unknown collidable {id} ignored");
                false
            }
        }
    }

    /// Switches a dynamic body between solver-driven and owner-driven motion.
    /// Bodies registered as kinematic or static are left alone.
    pub fn set_dynamics_enabled(&mut self, id: CollidableId, enabled: bool) -> bool {
        let Some(entry) = self.registered.get(&id) else {
            log::warn!("set_dynamics_enabled on unknown collidable {id} ignored");
            return false;
        };
        if entry.kind != BodyKind::Dynamic {
            log::warn!("collidable '{}' is not dynamic; dynamics toggle ignored", entry.name);
            return false;
        }

        let Some(body) = self.bodies.get_mut(entry.body) else {
            return false;
        };
        let body_type = if enabled {
            RigidBodyType::Dynamic
        } else {
            RigidBodyType::KinematicPositionBased
        };
        body.set_body_type(body_type, true);
        true
    }

    pub fn dynamics_enabled(&self, id: CollidableId) -> bool {
        self.body(id).is_some_and(|b| b.is_dynamic())
    }

    // ── world settings ────────────────────────────────────────────────────

    pub fn gravity(&self) -> Vector3<f32> {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vector3<f32>) {
        self.config.gravity = gravity;
    }

    pub fn step_size(&self) -> Option<f64> {
        self.config.step_size
    }

    /// `None` (or a non-positive size) steps the whole frame delta at once.
    pub fn set_step_size(&mut self, step: Option<f64>) {
        self.config.step_size = step;
    }

    pub fn set_collision_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&ContactReport) + 'static,
    {
        self.on_contact = Some(Box::new(callback));
    }

    pub fn clear_collision_callback(&mut self) {
        self.on_contact = None;
    }

    /// Total substeps integrated since construction.
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    // ── stepping ──────────────────────────────────────────────────────────

    /// Advances the world by `dt` seconds.
    ///
    /// Runs every pre-step hook, then `floor(dt / step)` full substeps plus one
    /// partial substep for the remainder, then every post-step hook.
    pub fn iterate(&mut self, dt: f64) {
        self.run_pre_hooks();

        if dt.is_finite() && dt > 0.0 {
            let step = match self.config.step_size {
                Some(s) if s.is_finite() && s > 0.0 => s,
                _ => dt,
            };

            let full = (dt / step + SUBSTEP_SLACK).floor() as u64;
            let leftover = dt - full as f64 * step;

            for _ in 0..full {
                self.substep(step);
            }
            if leftover > LEFTOVER_EPSILON {
                self.substep(leftover);
            }

            log::trace!("iterate dt={dt:.5} step={step:.5} full={full} leftover={leftover:.6}");
        }

        self.run_post_hooks();
    }

    fn run_pre_hooks(&mut self) {
        for (id, entry) in self.registered.iter_mut() {
            match self.bodies.get_mut(entry.body) {
                Some(body) => entry.hooks.pre_physics_step(body),
                None => log::warn!("collidable '{}' {id} has no body; pre-step skipped", entry.name),
            }
        }
    }

    fn run_post_hooks(&mut self) {
        for (id, entry) in self.registered.iter_mut() {
            match self.bodies.get(entry.body) {
                Some(body) => entry.hooks.post_physics_step(body),
                None => log::warn!("collidable '{}' {id} has no body; post-step skipped", entry.name),
            }
        }
    }

    /// Collision detection and dynamics integration for one substep, then
    /// contact reporting and cleanup.
    fn substep(&mut self, dt: f64) {
        self.integration_parameters.dt = dt as Real;

        self.pipeline.step(
            &self.config.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
        self.steps_taken += 1;

        gather_contacts(&self.narrow_phase, &self.owners, &mut self.contacts);
        self.dispatch_contacts();
        self.contacts.clear();
    }

    fn dispatch_contacts(&mut self) {
        for contact in &self.contacts {
            let accepted_first = self
                .registered
                .get_mut(&contact.first)
                .is_some_and(|e| e.hooks.filter_contact(contact, contact.second));
            let accepted_second = self
                .registered
                .get_mut(&contact.second)
                .is_some_and(|e| e.hooks.filter_contact(contact, contact.first));

            if !(accepted_first && accepted_second) {
                continue;
            }

            if let Some(callback) = self.on_contact.as_mut() {
                callback(contact);
            }
        }
    }
}

impl Default for PhysicsController {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{NoHooks, ShapeDef};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ball() -> BodyDesc {
        BodyDesc::dynamic(ShapeDef::Sphere { radius: 0.5 })
    }

    struct CountingHooks {
        pre: Rc<RefCell<u32>>,
        post: Rc<RefCell<u32>>,
    }

    impl Collidable for CountingHooks {
        fn pre_physics_step(&mut self, _body: &mut RigidBody) {
            *self.pre.borrow_mut() += 1;
        }

        fn post_physics_step(&mut self, _body: &RigidBody) {
            *self.post.borrow_mut() += 1;
        }
    }

    struct RejectAll;

    impl Collidable for RejectAll {
        fn filter_contact(&mut self, _contact: &ContactReport, _other: CollidableId) -> bool {
            false
        }
    }

    // ── registration ──────────────────────────────────────────────────────

    #[test]
    fn register_and_unregister() {
        let mut physics = PhysicsController::default();
        let id = physics.register_collidable("ball", ball(), Box::new(NoHooks)).unwrap();

        assert_eq!(physics.collidable_count(), 1);
        assert_eq!(physics.find("ball"), Some(id));
        assert_eq!(physics.name(id), Some("ball"));

        assert!(physics.unregister_collidable(id));
        assert!(!physics.unregister_collidable(id));
        assert_eq!(physics.collidable_count(), 0);
        assert!(physics.body(id).is_none());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut physics = PhysicsController::default();
        physics.register_collidable("ball", ball(), Box::new(NoHooks)).unwrap();
        let err = physics.register_collidable("ball", ball(), Box::new(NoHooks)).unwrap_err();
        assert_eq!(err, PhysicsError::DuplicateName("ball".into()));
        assert_eq!(physics.collidable_count(), 1);
    }

    #[test]
    fn invalid_desc_is_rejected_without_insertion() {
        let mut physics = PhysicsController::default();
        let desc = BodyDesc::dynamic(ShapeDef::Sphere { radius: -1.0 });
        assert!(physics.register_collidable("bad", desc, Box::new(NoHooks)).is_err());
        assert_eq!(physics.collidable_count(), 0);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut physics = PhysicsController::default();
        let id = physics.register_collidable("ball", ball(), Box::new(NoHooks)).unwrap();
        physics.unregister_collidable(id);

        assert!(!physics.set_translation(id, Vector3::zeros()));
        assert!(!physics.set_linear_velocity(id, Vector3::zeros()));
        assert!(!physics.set_dynamics_enabled(id, false));
        assert!(physics.translation(id).is_none());
    }

    // ── substeps ──────────────────────────────────────────────────────────

    #[test]
    fn iterate_without_step_size_takes_one_step() {
        let mut physics = PhysicsController::default();
        physics.iterate(1.0 / 60.0);
        assert_eq!(physics.steps_taken(), 1);
    }

    #[test]
    fn iterate_splits_into_full_steps_plus_leftover() {
        let mut physics = PhysicsController::new(PhysicsConfig::default().with_step_size(0.01));
        physics.iterate(0.035);
        assert_eq!(physics.steps_taken(), 4);
    }

    #[test]
    fn iterate_exact_multiple_has_no_leftover_step() {
        let mut physics = PhysicsController::new(PhysicsConfig::default().with_step_size(0.1));
        physics.iterate(0.3);
        assert_eq!(physics.steps_taken(), 3);
    }

    #[test]
    fn iterate_zero_runs_hooks_only() {
        let mut physics = PhysicsController::default();
        let pre = Rc::new(RefCell::new(0));
        let post = Rc::new(RefCell::new(0));
        physics
            .register_collidable(
                "ball",
                ball(),
                Box::new(CountingHooks { pre: pre.clone(), post: post.clone() }),
            )
            .unwrap();

        physics.iterate(0.0);

        assert_eq!(physics.steps_taken(), 0);
        assert_eq!(*pre.borrow(), 1);
        assert_eq!(*post.borrow(), 1);
    }

    #[test]
    fn hooks_run_once_per_iterate_not_per_substep() {
        let mut physics = PhysicsController::new(PhysicsConfig::default().with_step_size(0.01));
        let pre = Rc::new(RefCell::new(0));
        let post = Rc::new(RefCell::new(0));
        physics
            .register_collidable(
                "ball",
                ball(),
                Box::new(CountingHooks { pre: pre.clone(), post: post.clone() }),
            )
            .unwrap();

        physics.iterate(0.05);
        physics.iterate(0.05);

        assert_eq!(physics.steps_taken(), 10);
        assert_eq!(*pre.borrow(), 2);
        assert_eq!(*post.borrow(), 2);
    }

    // ── dynamics ──────────────────────────────────────────────────────────

    #[test]
    fn dynamic_body_falls_under_gravity() {
        let mut physics = PhysicsController::new(PhysicsConfig::default().with_step_size(1.0 / 120.0));
        let id = physics
            .register_collidable("ball", ball().at(Vector3::new(0.0, 0.0, 10.0)), Box::new(NoHooks))
            .unwrap();

        physics.iterate(0.5);

        let z = physics.translation(id).unwrap().z;
        assert!(z < 10.0 - 0.5, "ball only reached z={z}");
        assert!(physics.linear_velocity(id).unwrap().z < 0.0);
    }

    #[test]
    fn disabled_dynamics_hold_position() {
        let mut physics = PhysicsController::default();
        let id = physics
            .register_collidable("ball", ball().at(Vector3::new(0.0, 0.0, 10.0)), Box::new(NoHooks))
            .unwrap();

        assert!(physics.dynamics_enabled(id));
        assert!(physics.set_dynamics_enabled(id, false));
        assert!(!physics.dynamics_enabled(id));

        physics.iterate(0.5);
        assert_eq!(physics.translation(id).unwrap().z, 10.0);
    }

    #[test]
    fn static_body_cannot_toggle_dynamics() {
        let mut physics = PhysicsController::default();
        let id = physics
            .register_collidable("ground", BodyDesc::ground(0.0), Box::new(NoHooks))
            .unwrap();
        assert!(!physics.set_dynamics_enabled(id, true));
    }

    #[test]
    fn gravity_is_configurable() {
        let mut physics = PhysicsController::default();
        physics.set_gravity(Vector3::zeros());
        let id = physics
            .register_collidable("ball", ball().at(Vector3::new(0.0, 0.0, 10.0)), Box::new(NoHooks))
            .unwrap();

        physics.iterate(0.5);
        assert!((physics.translation(id).unwrap().z - 10.0).abs() < 1e-5);
    }

    // ── contacts ──────────────────────────────────────────────────────────

    fn resting_ball(physics: &mut PhysicsController, hooks: Box<dyn Collidable>) -> (CollidableId, CollidableId) {
        let ground = physics
            .register_collidable("ground", BodyDesc::ground(0.0), Box::new(NoHooks))
            .unwrap();
        let ball = physics
            .register_collidable("ball", ball().at(Vector3::new(0.0, 0.0, 0.6)), hooks)
            .unwrap();
        (ground, ball)
    }

    #[test]
    fn landing_reports_contact_between_bodies() {
        let mut physics = PhysicsController::new(PhysicsConfig::default().with_step_size(1.0 / 120.0));
        let (ground, ball) = resting_ball(&mut physics, Box::new(NoHooks));

        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = reports.clone();
        physics.set_collision_callback(move |c| sink.borrow_mut().push(c.clone()));

        physics.iterate(1.0);

        let reports = reports.borrow();
        assert!(!reports.is_empty(), "no contact reported");
        let c = &reports[reports.len() - 1];
        let pair = [c.first, c.second];
        assert!(pair.contains(&ground) && pair.contains(&ball));
        assert!(c.depth >= 0.0);
        assert!(c.normal.z.abs() > 0.9);
        // Ball rests on the plane instead of falling through.
        assert!(physics.translation(ball).unwrap().z > 0.3);
    }

    #[test]
    fn filter_contact_suppresses_report() {
        let mut physics = PhysicsController::new(PhysicsConfig::default().with_step_size(1.0 / 120.0));
        resting_ball(&mut physics, Box::new(RejectAll));

        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        physics.set_collision_callback(move |_| *sink.borrow_mut() += 1);

        physics.iterate(1.0);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn disjoint_collision_bits_pass_through() {
        let mut physics = PhysicsController::new(PhysicsConfig::default().with_step_size(1.0 / 120.0));
        physics
            .register_collidable(
                "ground",
                BodyDesc::ground(0.0).with_collision_bits(0b01, 0b01),
                Box::new(NoHooks),
            )
            .unwrap();
        let ghost = physics
            .register_collidable(
                "ghost",
                ball().at(Vector3::new(0.0, 0.0, 0.6)).with_collision_bits(0b10, 0b10),
                Box::new(NoHooks),
            )
            .unwrap();

        let count = Rc::new(RefCell::new(0));
        let sink = count.clone();
        physics.set_collision_callback(move |_| *sink.borrow_mut() += 1);

        physics.iterate(1.0);

        assert_eq!(*count.borrow(), 0);
        assert!(physics.translation(ghost).unwrap().z < -1.0);
    }

    #[test]
    fn uncategorised_body_with_full_mask_rests_on_ground() {
        let mut physics = PhysicsController::new(PhysicsConfig::default().with_step_size(1.0 / 120.0));
        physics
            .register_collidable("ground", BodyDesc::ground(0.0), Box::new(NoHooks))
            .unwrap();
        let walker = physics
            .register_collidable(
                "walker",
                ball().at(Vector3::new(0.0, 0.0, 0.6)).with_collision_bits(0, u32::MAX),
                Box::new(NoHooks),
            )
            .unwrap();

        physics.iterate(1.0);

        assert!(physics.translation(walker).unwrap().z > 0.3);
    }
}
