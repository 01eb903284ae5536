//! Engine Settings
//!
//! Defaults applied to objects the engine creates, plus tick behaviour.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use kinema::{Engine, EngineSettings, EndAction};
//!
//! let settings = EngineSettings {
//!     default_end_action: EndAction::Discard,
//!     max_frame_delta: Some(0.1),
//!     ..Default::default()
//! };
//! let mut engine = Engine::new(settings);
//! ```

use crate::animation::{AlphaFunction, EndAction};

/// Configuration for an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// End action of newly created animations.
    pub default_end_action: EndAction,
    /// Disconnect action of newly created animations.
    pub default_disconnect_action: EndAction,
    /// Alpha function used when a convenience `animate_*` call names none.
    pub default_alpha_function: AlphaFunction,
    /// Initial capacity of the producer-to-update message queue.
    pub message_queue_capacity: usize,
    /// Upper bound on the delta passed to a single tick, in seconds.
    pub max_frame_delta: Option<f32>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_end_action: EndAction::Bake,
            default_disconnect_action: EndAction::BakeFinal,
            default_alpha_function: AlphaFunction::Default,
            message_queue_capacity: 64,
            max_frame_delta: None,
        }
    }
}
