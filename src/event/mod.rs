//! Producer Side
//!
//! The half of the engine the caller talks to. [`Object`] and
//! [`AnimationControl`] keep the caller's view of the world (hierarchy,
//! requested property values, animation settings) and turn every change into
//! a queued message for the update side.

mod animation;
mod object;

pub use animation::AnimationControl;
pub use object::Object;
