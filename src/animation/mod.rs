//! Animation System
//!
//! Time-based property animation, split across the two sides of the engine.
//!
//! # Overview
//!
//! - [`Animation`]: scene-side state machine (play, pause, stop, loops,
//!   play range, progress marker) that owns a list of [`Animator`]s
//! - [`Animator`]: drives one property with an [`AnimatorFunction`] shaped by
//!   an [`AlphaFunction`] over a [`TimePeriod`]
//! - [`AnimatorConnector`]: producer-side description of an animator, turned
//!   into a live [`Animator`] the first time its animation is played
//!
//! # Data Flow
//!
//! ```text
//! Engine::animate_to ──► AnimatorConnector ──(play)──► Animator
//!                                                       │
//!            Animation::update(dt) ─► elapsed ─► progress ─► alpha ─► write
//! ```
//!
//! Animators write with [`WriteMode::Set`](crate::scene::WriteMode::Set)
//! while playing and with `Bake` on the finishing tick, so a finished
//! animation leaves its end value behind unless its [`EndAction`] is
//! `Discard`.

mod alpha;
#[allow(clippy::module_inception)]
mod animation;
mod animator;
mod connector;
mod function;
mod keyframes;

use slotmap::new_key_type;

pub use alpha::AlphaFunction;
pub use animation::{Animation, UpdateOutcome};
pub use animator::{Animator, AnimatorId, TimePeriod};
pub use connector::AnimatorConnector;
pub use function::AnimatorFunction;
pub use keyframes::{Interpolation, KeyFrameCursor, KeyFrames};

new_key_type! {
    /// Handle shared by the producer-side animation and its scene-side state.
    pub struct AnimationId;
}

/// What happens to animated values when an animation stops, is destroyed,
/// or its target leaves the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndAction {
    /// Keep the animated value. Stopping bakes the value at the edge of the
    /// play range.
    #[default]
    Bake,
    /// Jump to and keep the final value.
    BakeFinal,
    /// Revert to the value before the animation.
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Destroyed,
}

/// How each loop after the first starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopingMode {
    #[default]
    Restart,
    /// Every loop plays forward then backward.
    AutoReverse,
}
