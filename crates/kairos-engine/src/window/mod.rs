//! Host runtime.
//!
//! Owns the `winit` event loop and window and pumps a `System` from it.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
