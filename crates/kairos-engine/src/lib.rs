//! Kairos engine crate.
//!
//! The simulation heartbeat: a frame pump that turns host ticks into ordered
//! stage notifications (fixed or variable timestep, with pause handling), and
//! a physics controller that substeps a rigid-body world from that pump.

pub mod logging;
pub mod physics;
pub mod system;
pub mod time;
pub mod window;
