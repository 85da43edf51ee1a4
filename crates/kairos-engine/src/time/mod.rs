//! Time subsystem.
//!
//! Real-time measurement for the frame pump, kept separate from the pump so it
//! can be tested on its own.
//! - `FrameClock` samples the real delta once per host tick
//! - `WallClock` seeds the real/simulation clock times in epoch microseconds

mod frame_clock;

pub use frame_clock::{secs_to_micros, FrameClock, FrameTime, WallClock};
