use super::alpha::AlphaFunction;
use super::function::AnimatorFunction;
use super::keyframes::KeyFrameCursor;
use super::EndAction;
use crate::property::{BufferIndex, PropertyTarget};
use crate::scene::{SceneGraph, WriteMode};

/// Identifies an animator within its animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimatorId(pub(crate) u32);

/// Delay and duration of an animator, in seconds of animation time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimePeriod {
    pub delay: f32,
    pub duration: f32,
}

impl TimePeriod {
    #[must_use]
    pub const fn new(duration: f32) -> Self {
        Self { delay: 0.0, duration }
    }

    #[must_use]
    pub const fn with_delay(delay: f32, duration: f32) -> Self {
        Self { delay, duration }
    }

    #[inline]
    #[must_use]
    pub fn end(&self) -> f32 {
        self.delay + self.duration
    }
}

/// Drives one property from an animation's elapsed time.
///
/// Created on the producer side by an
/// [`AnimatorConnector`](super::AnimatorConnector) and owned by the
/// scene-side [`Animation`](super::Animation) afterwards.
#[derive(Debug, Clone)]
pub struct Animator {
    id: AnimatorId,
    target: PropertyTarget,
    function: AnimatorFunction,
    alpha_function: AlphaFunction,
    period: TimePeriod,

    disconnect_action: EndAction,
    speed_factor: f32,
    auto_reverse: bool,

    current_progress: f32,
    cursor: KeyFrameCursor,

    /// Set while the owning animation plays; cleared on finish.
    active: bool,
    /// Cleared while the target node is off the scene.
    enabled: bool,
    /// The target node no longer exists.
    orphan: bool,
    /// The elapsed time has not reached the interval delay yet.
    delayed: bool,
}

impl Animator {
    #[must_use]
    pub fn new(
        id: AnimatorId,
        target: PropertyTarget,
        function: AnimatorFunction,
        alpha_function: AlphaFunction,
        period: TimePeriod,
    ) -> Self {
        Self {
            id,
            target,
            function,
            alpha_function,
            period,
            disconnect_action: EndAction::BakeFinal,
            speed_factor: 1.0,
            auto_reverse: false,
            current_progress: 0.0,
            cursor: KeyFrameCursor::default(),
            active: false,
            enabled: true,
            orphan: false,
            delayed: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> AnimatorId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> &PropertyTarget {
        &self.target
    }

    #[inline]
    #[must_use]
    pub fn period(&self) -> TimePeriod {
        self.period
    }

    #[inline]
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.period.end()
    }

    #[inline]
    #[must_use]
    pub fn current_progress(&self) -> f32 {
        self.current_progress
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    #[must_use]
    pub fn is_orphan(&self) -> bool {
        self.orphan
    }

    #[inline]
    #[must_use]
    pub fn is_delayed(&self) -> bool {
        self.delayed
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_disconnect_action(&mut self, action: EndAction) {
        self.disconnect_action = action;
    }

    pub(crate) fn set_speed_factor(&mut self, factor: f32) {
        self.speed_factor = factor;
    }

    pub(crate) fn set_auto_reverse(&mut self, enabled: bool) {
        self.auto_reverse = enabled;
    }

    /// Marks the animator orphaned once its target node is gone.
    pub(crate) fn check_orphan(&mut self, graph: &SceneGraph) -> bool {
        if !self.orphan && !graph.contains(self.target.object) {
            log::debug!("Animator {:?} lost its target {:?}", self.id, self.target.object);
            self.orphan = true;
        }
        self.orphan
    }

    /// Advances to `elapsed` seconds of animation time and writes the
    /// result, transiently or as a bake.
    pub(crate) fn update(
        &mut self,
        graph: &mut SceneGraph,
        index: BufferIndex,
        elapsed: f32,
        blend_point: f32,
        bake: bool,
    ) {
        if self.check_orphan(graph) || !self.enabled {
            return;
        }

        if elapsed < self.period.delay {
            self.delayed = true;
            return;
        }
        self.delayed = false;

        let progress = if self.period.duration > 0.0 {
            ((elapsed - self.period.delay) / self.period.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.apply(graph, index, progress, blend_point, bake);
    }

    /// Writes the value for `progress` with the auto-reverse and blend-point
    /// shaping applied.
    pub(crate) fn apply(
        &mut self,
        graph: &mut SceneGraph,
        index: BufferIndex,
        progress: f32,
        blend_point: f32,
        bake: bool,
    ) {
        let progress = self.shape_progress(progress);
        self.write_progress(graph, index, progress, blend_point, bake);
    }

    fn write_progress(
        &mut self,
        graph: &mut SceneGraph,
        index: BufferIndex,
        progress: f32,
        blend_point: f32,
        bake: bool,
    ) {
        self.current_progress = progress;

        let Some(current) = graph.read(&self.target, index) else {
            return;
        };
        let alpha = self.alpha_function.apply(progress);
        let Some(mut result) = self.function.evaluate(alpha, &current, &mut self.cursor) else {
            log::warn!("Animator {:?} cannot drive a {} value", self.id, current.property_type());
            return;
        };

        if blend_point > 0.0 && progress < blend_point {
            let end_alpha = self.alpha_function.apply(1.0);
            if let Some(end) = self.function.evaluate(end_alpha, &current, &mut KeyFrameCursor::default())
                && let Some(blended) = end.interpolate(&result, progress / blend_point)
            {
                result = blended;
            }
        }

        let mode = if bake { WriteMode::Bake } else { WriteMode::Set };
        graph.write(&self.target, index, &result, mode);
    }

    fn shape_progress(&self, progress: f32) -> f32 {
        if !self.auto_reverse {
            return progress;
        }
        if self.speed_factor >= 0.0 {
            1.0 - 2.0 * (progress - 0.5).abs()
        } else {
            2.0 * (progress - 0.5).abs()
        }
    }

    /// The target left the scene. An active animator bakes according to its
    /// disconnect action and stops writing until reconnected.
    pub(crate) fn on_target_disconnected(&mut self, graph: &mut SceneGraph, index: BufferIndex) {
        if self.active && !self.orphan {
            match self.disconnect_action {
                EndAction::Bake => self.write_progress(graph, index, self.current_progress, 0.0, true),
                EndAction::BakeFinal => self.apply(graph, index, 1.0, 0.0, true),
                EndAction::Discard => {}
            }
        }
        self.enabled = false;
    }
}
