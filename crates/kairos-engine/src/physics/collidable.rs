use std::fmt;

use rapier3d::prelude::RigidBody;

use super::contact::ContactReport;

/// Stable id of a registered collidable. Ids are never reused.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CollidableId(pub(crate) u64);

impl fmt::Display for CollidableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-body hooks run by `PhysicsController::iterate`.
///
/// `pre_physics_step` runs once per iterate before any substep; use it to push
/// game-side state (a kinematic target, accumulated forces) into the body.
/// `post_physics_step` runs once after the last substep; use it to pull the
/// integrated pose back out.
pub trait Collidable {
    fn pre_physics_step(&mut self, body: &mut RigidBody) {
        let _ = body;
    }

    fn post_physics_step(&mut self, body: &RigidBody) {
        let _ = body;
    }

    /// Return false to suppress reporting this contact. Both bodies of a pair
    /// must accept it.
    fn filter_contact(&mut self, contact: &ContactReport, other: CollidableId) -> bool {
        let _ = (contact, other);
        true
    }
}

/// Collidable without hooks.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoHooks;

impl Collidable for NoHooks {}
