#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod constraint;
pub mod engine;
pub mod errors;
pub mod event;
pub mod property;
pub mod resetter;
pub mod scene;
pub mod settings;
pub mod transform;
pub mod update;
pub mod utils;

pub use animation::{
    AlphaFunction, AnimationId, AnimationState, AnimatorFunction, EndAction, Interpolation, KeyFrames, LoopingMode,
    TimePeriod,
};
pub use constraint::{
    ApplyRate, ConstraintId, ConstraintPhase, ConstraintSource, ConstraintState, PropertyInputs, RemoveAction,
};
pub use engine::{Engine, RenderView};
pub use errors::{KinemaError, Result};
pub use event::{AnimationControl, Object};
pub use property::{Color, Component, PropertyIndex, PropertyType, PropertyValue};
pub use scene::{ColorMode, ObjectId};
pub use settings::EngineSettings;
pub use transform::InheritanceMode;
pub use update::FrameReport;
