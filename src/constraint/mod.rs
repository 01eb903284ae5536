//! Constraint System
//!
//! Constraints recompute one target property every tick from a user
//! function and a list of source properties.
//!
//! # Overview
//!
//! - [`Constraint`]: producer-side record (sources, function, tag, remove
//!   action, apply rate). Connecting it queues a [`SceneConstraint`].
//! - [`SceneConstraint`]: evaluated on the update side, after animation,
//!   in scene traversal order. Pre constraints run before post constraints.
//! - [`ConstraintFunction`]: the user callback, receiving the current target
//!   value and a [`PropertyInputs`] view of the sources.
//!
//! # Tags
//!
//! Tags group constraints for bulk removal. `0` is the default tag, custom
//! tags live in [`CUSTOM_CONSTRAINT_TAG_MIN`]..=[`CUSTOM_CONSTRAINT_TAG_MAX`]
//! and internal ones in [`INTERNAL_CONSTRAINT_TAG_MIN`]..=
//! [`INTERNAL_CONSTRAINT_TAG_MAX`]. A tagged constraint cannot be moved into
//! the other range.

mod base;
mod function;
mod scene;

use slotmap::new_key_type;

pub use base::{Constraint, ConstraintSource, ConstraintState, SourceKind};
pub use function::{ConstraintFunction, PropertyInputs};
pub use scene::SceneConstraint;

new_key_type! {
    pub struct ConstraintId;
}

pub const DEFAULT_CONSTRAINT_TAG: u32 = 0;
pub const CUSTOM_CONSTRAINT_TAG_MIN: u32 = 1;
pub const CUSTOM_CONSTRAINT_TAG_MAX: u32 = 999_999;
pub const INTERNAL_CONSTRAINT_TAG_MIN: u32 = 1_000_000;
pub const INTERNAL_CONSTRAINT_TAG_MAX: u32 = 1_999_999;

#[inline]
#[must_use]
pub const fn is_custom_tag(tag: u32) -> bool {
    tag >= CUSTOM_CONSTRAINT_TAG_MIN && tag <= CUSTOM_CONSTRAINT_TAG_MAX
}

#[inline]
#[must_use]
pub const fn is_internal_tag(tag: u32) -> bool {
    tag >= INTERNAL_CONSTRAINT_TAG_MIN && tag <= INTERNAL_CONSTRAINT_TAG_MAX
}

/// What happens to the target when the constraint is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoveAction {
    /// Keep the last computed value.
    #[default]
    Bake,
    /// Revert to the base value.
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyRate {
    /// Evaluate every tick, writing transiently.
    #[default]
    Always,
    /// Evaluate once and bake the result.
    Once,
}

/// Pre constraints run before post constraints within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstraintPhase {
    #[default]
    Pre,
    Post,
}
