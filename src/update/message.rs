use glam::Vec2;

use crate::animation::{Animation, AnimationId, Animator, EndAction, LoopingMode};
use crate::constraint::{ConstraintId, ConstraintPhase, SceneConstraint};
use crate::property::{PropertyTarget, PropertyValue};
use crate::resetter::PropertyResetter;
use crate::scene::{ColorMode, NodeInit, ObjectId, WriteMode};
use crate::transform::InheritanceMode;

/// A state change requested by the producer side, applied at the start of
/// the next tick.
#[derive(Debug)]
pub(crate) enum Message {
    // --- Nodes ---
    InstallNode {
        object: ObjectId,
        init: Box<NodeInit>,
    },
    AddRoot {
        object: ObjectId,
    },
    DestroyNode {
        object: ObjectId,
    },
    SetParent {
        object: ObjectId,
        parent: Option<ObjectId>,
    },
    SetConnected {
        object: ObjectId,
        connected: bool,
    },
    RegisterProperty {
        object: ObjectId,
        slot: usize,
        initial: PropertyValue,
    },
    WriteProperty {
        target: PropertyTarget,
        value: PropertyValue,
        mode: WriteMode,
    },
    SetColorMode {
        object: ObjectId,
        mode: ColorMode,
    },
    SetTransformFlags {
        object: ObjectId,
        inheritance: InheritanceMode,
        position_uses_anchor_point: bool,
    },

    // --- Animations ---
    AddAnimation {
        id: AnimationId,
        animation: Box<Animation>,
    },
    DestroyAnimation {
        id: AnimationId,
    },
    AnimationCommand {
        id: AnimationId,
        command: AnimationCommand,
    },
    AddAnimator {
        animation: AnimationId,
        animator: Box<Animator>,
    },

    // --- Constraints ---
    ApplyConstraint {
        object: ObjectId,
        phase: ConstraintPhase,
        constraint: Box<SceneConstraint>,
    },
    RemoveConstraint {
        object: ObjectId,
        id: ConstraintId,
    },

    AddResetter(PropertyResetter),
}

/// Playback and configuration changes for a scene-side animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum AnimationCommand {
    Play,
    PlayFrom(f32),
    PlayAfter(f32),
    Pause,
    Stop,
    SetDuration(f32),
    SetLoopCount(u32),
    SetEndAction(EndAction),
    SetDisconnectAction(EndAction),
    SetSpeedFactor(f32),
    SetPlayRange(Vec2),
    SetProgressNotification(f32),
    SetLoopingMode(LoopingMode),
    SetBlendPoint(f32),
    SetCurrentProgress(f32),
}

/// Producer-to-update message buffer. Drained once per tick.
#[derive(Debug, Default)]
pub(crate) struct MessageQueue {
    messages: Vec<Message>,
}

impl MessageQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Takes every queued message, leaving an empty queue of the same
    /// capacity behind.
    pub(crate) fn drain(&mut self) -> Vec<Message> {
        let capacity = self.messages.capacity();
        std::mem::replace(&mut self.messages, Vec::with_capacity(capacity))
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }
}
