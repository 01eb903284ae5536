//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`KinemaError`] covers the requests a caller can get
//! wrong on the producer side:
//! - Unknown objects, animations and constraints
//! - Unknown, read-only or non-animatable properties
//! - Values whose type does not match the property they target
//!
//! Conditions that are part of normal operation (a target object destroyed
//! while an animation still references it, an object taken off the scene) are
//! modelled as states and never surface as errors.
//!
//! Broken internal invariants are reported through [`ensure_invariant!`]:
//! fatal in debug builds, logged and skipped in release builds.
//!
//! # Usage
//!
//! ```rust,ignore
//! use kinema::errors::{KinemaError, Result};
//!
//! fn configure(engine: &mut Engine, object: ObjectId) -> Result<()> {
//!     engine.set_property(object, PropertyIndex::COLOR_ALPHA, 0.5_f32.into())?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::animation::AnimationId;
use crate::constraint::ConstraintId;
use crate::property::{PropertyIndex, PropertyType};
use crate::scene::ObjectId;

/// The main error type for the Kinema engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinemaError {
    // ========================================================================
    // Handle Errors
    // ========================================================================
    /// The object handle is stale or was never issued.
    #[error("Object not found: {0:?}")]
    ObjectNotFound(ObjectId),

    /// The animation handle is stale or was never issued.
    #[error("Animation not found: {0:?}")]
    AnimationNotFound(AnimationId),

    /// The constraint handle is stale or was never issued.
    #[error("Constraint not found: {0:?}")]
    ConstraintNotFound(ConstraintId),

    /// Parenting would create a cycle.
    #[error("Cannot add {child:?} as a child of {parent:?}")]
    InvalidHierarchy { parent: ObjectId, child: ObjectId },

    /// The stage root cannot be destroyed or reparented.
    #[error("Operation not allowed on the root object")]
    RootObject,

    // ========================================================================
    // Property Errors
    // ========================================================================
    /// No default or custom property is registered under this index.
    #[error("Property {0} does not exist")]
    PropertyNotFound(PropertyIndex),

    /// The property exists but cannot be driven by an animator or constraint.
    #[error("Property {0} is not animatable")]
    PropertyNotAnimatable(PropertyIndex),

    /// The property is derived (e.g. a world transform) and cannot be written.
    #[error("Property {0} is read-only")]
    PropertyNotWritable(PropertyIndex),

    /// The property cannot be read as a constraint input.
    #[error("Property {0} cannot be used as a constraint input")]
    NotAConstraintInput(PropertyIndex),

    /// A custom property with the same name is already registered.
    #[error("Property name already registered: {0}")]
    DuplicatePropertyName(String),

    /// The supplied value does not match the type of the property.
    #[error("Type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        expected: PropertyType,
        found: PropertyType,
    },

    /// The operation is not defined for values of this type.
    #[error("Operation not supported for {0:?} values")]
    UnsupportedType(PropertyType),

    // ========================================================================
    // Animation Errors
    // ========================================================================
    /// A key-frame set must contain at least one entry.
    #[error("Key frame set is empty")]
    EmptyKeyFrames,
}

/// Alias for `Result<T, KinemaError>`.
pub type Result<T> = std::result::Result<T, KinemaError>;

/// Checks an internal invariant.
///
/// Panics with the given message in debug builds. In release builds the
/// message is logged at error level and the enclosing function returns early
/// (with the value after `@ret` when the function is not unit-returning).
macro_rules! ensure_invariant {
    (@ret $ret:expr; $cond:expr, $($arg:tt)+) => {
        if !$cond {
            if cfg!(debug_assertions) {
                panic!($($arg)+);
            }
            log::error!($($arg)+);
            return $ret;
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            if cfg!(debug_assertions) {
                panic!($($arg)+);
            }
            log::error!($($arg)+);
            return;
        }
    };
}

pub(crate) use ensure_invariant;
