//! Physics step controller.
//!
//! [`PhysicsController`] owns a Rapier collision space and dynamics world.
//! Each `iterate(dt)` runs the per-body pre-step hooks, integrates `dt` in
//! fixed substeps (plus one partial substep for the remainder), reports
//! contacts through the collision callback after every substep, and finally
//! runs the post-step hooks.
//!
//! Failures are log-and-continue: unknown ids and bodies that have gone
//! missing are reported at `warn` and skipped.

mod body;
mod collidable;
mod contact;
mod controller;
mod error;
mod listener;

pub use body::{BodyDesc, BodyKind, ShapeDef};
pub use collidable::{Collidable, CollidableId, NoHooks};
pub use contact::ContactReport;
pub use controller::{PhysicsConfig, PhysicsController};
pub use error::PhysicsError;
pub use listener::PhysicsListener;

// Hooks receive Rapier bodies directly.
pub use rapier3d;
