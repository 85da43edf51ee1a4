//! Frame pump.
//!
//! `System` turns host ticks into ordered stage notifications:
//!
//! | Stage | Message | Paused | Variable | Fixed |
//! |-------|---------|--------|----------|-------|
//! | event traversal | `eventtraversal` | yes | yes | per step |
//! | post event traversal | `posteventtraversal` | yes | yes | per step |
//! | pre frame | `preframe` | no | yes | per step |
//! | camera synch | `camerasynch` | yes | yes | when drawn |
//! | frame synch | `framesynch` | yes | yes | when drawn |
//! | frame | `frame` | yes | yes | when drawn |
//! | post frame | `postframe` | no | yes | per step |
//!
//! Listeners implement [`SystemListener`]; side effects on the pump go through
//! the [`SystemCtx`] command buffer.

mod config;
mod listener;
mod message;
mod pump;
mod stage;
mod stats;

pub use config::SystemConfig;
pub use listener::{AsAny, ListenerId, SystemCtx, SystemListener};
pub use message::{FrameDelta, SystemMessage};
pub use pump::{StepOutcome, System};
pub use stage::{StageFlags, SystemStage};
pub use stats::StageTimes;
