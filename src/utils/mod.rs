//! Utility Module
//!
//! - [`time`]: frame timing used by [`Engine::tick`](crate::Engine::tick)

pub mod time;

pub use time::FrameClock;
