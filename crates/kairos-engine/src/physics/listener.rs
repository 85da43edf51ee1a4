use crate::system::{SystemCtx, SystemListener, SystemMessage};

use super::controller::PhysicsController;

/// Steps a `PhysicsController` from the frame pump.
///
/// Physics runs on `preframe` with the simulation delta, so a paused pump
/// (which emits no `preframe`) freezes the world and a fixed-step pump feeds
/// the controller whole steps.
pub struct PhysicsListener {
    controller: PhysicsController,
}

impl PhysicsListener {
    pub fn new(controller: PhysicsController) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &PhysicsController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PhysicsController {
        &mut self.controller
    }

    pub fn into_inner(self) -> PhysicsController {
        self.controller
    }
}

impl SystemListener for PhysicsListener {
    fn on_message(&mut self, msg: &SystemMessage, _ctx: &mut SystemCtx) {
        if let SystemMessage::PreFrame(delta) = msg {
            self.controller.iterate(delta.sim);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{BodyDesc, NoHooks, PhysicsConfig, ShapeDef};
    use crate::system::{System, SystemConfig};
    use rapier3d::na::Vector3;

    fn system_with_ball(config: SystemConfig) -> (System, crate::system::ListenerId, crate::physics::CollidableId) {
        let mut physics = PhysicsController::new(PhysicsConfig::default().with_step_size(0.01));
        let ball = physics
            .register_collidable(
                "ball",
                BodyDesc::dynamic(ShapeDef::Sphere { radius: 0.5 }).at(Vector3::new(0.0, 0.0, 100.0)),
                Box::new(NoHooks),
            )
            .unwrap();

        let mut system = System::new(config.with_idle_sleep(None));
        let id = system.add_listener(Box::new(PhysicsListener::new(physics)));
        system.start();
        (system, id, ball)
    }

    #[test]
    fn preframe_drives_substeps() {
        let (mut system, id, _) = system_with_ball(SystemConfig::variable());
        system.step_with(0.05);

        let physics = system.listener_mut::<PhysicsListener>(id).unwrap().controller();
        assert_eq!(physics.steps_taken(), 5);
    }

    #[test]
    fn paused_pump_freezes_world() {
        let (mut system, id, ball) = system_with_ball(SystemConfig::variable());
        system.step_with(0.05);
        let z = system
            .listener_mut::<PhysicsListener>(id)
            .and_then(|l| l.controller().translation(ball))
            .unwrap()
            .z;

        system.set_pause(true);
        system.step_with(0.5);
        system.step_with(0.5);

        let physics = system.listener_mut::<PhysicsListener>(id).unwrap().controller();
        assert_eq!(physics.steps_taken(), 5);
        assert_eq!(physics.translation(ball).unwrap().z, z);
    }

    #[test]
    fn fixed_pump_feeds_whole_steps() {
        let (mut system, id, _) = system_with_ball(SystemConfig::default().with_frame_rate(50.0));
        // 0.02s per fixed step, 0.01s physics step: two substeps per pump step.
        for _ in 0..10 {
            system.step_with(0.02);
        }

        let physics = system.listener_mut::<PhysicsListener>(id).unwrap().controller();
        assert_eq!(physics.steps_taken(), 20);
    }
}
