use glam::{Vec2, Vec3};

use crate::animation::{
    AlphaFunction, Animation, AnimationId, AnimationState, AnimatorConnector, AnimatorFunction, AnimatorId, EndAction,
    Interpolation, KeyFrames, LoopingMode, TimePeriod,
};
use crate::engine::Engine;
use crate::errors::{KinemaError, Result};
use crate::property::{PropertyIndex, PropertyValue};
use crate::resetter::PropertyResetter;
use crate::scene::ObjectId;
use crate::update::message::{AnimationCommand, Message};

/// Producer-side view of an animation: its settings, the state last
/// reported by the update side, and the animators it will create.
#[derive(Debug, Clone)]
pub struct AnimationControl {
    duration: f32,
    loop_count: u32,
    end_action: EndAction,
    disconnect_action: EndAction,
    speed_factor: f32,
    play_range: Vec2,
    progress_marker: f32,
    looping_mode: LoopingMode,
    blend_point: f32,
    pub(crate) state: AnimationState,
    pub(crate) connectors: Vec<AnimatorConnector>,
    finished_count: u32,
}

impl AnimationControl {
    fn new(duration: f32, end_action: EndAction, disconnect_action: EndAction) -> Self {
        Self {
            duration: duration.max(0.0),
            loop_count: 1,
            end_action,
            disconnect_action,
            speed_factor: 1.0,
            play_range: Vec2::new(0.0, 1.0),
            progress_marker: 0.0,
            looping_mode: LoopingMode::Restart,
            blend_point: 0.0,
            state: AnimationState::Stopped,
            connectors: Vec::new(),
            finished_count: 0,
        }
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    #[must_use]
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    #[inline]
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.loop_count != 1
    }

    #[inline]
    #[must_use]
    pub fn end_action(&self) -> EndAction {
        self.end_action
    }

    #[inline]
    #[must_use]
    pub fn disconnect_action(&self) -> EndAction {
        self.disconnect_action
    }

    #[inline]
    #[must_use]
    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    #[inline]
    #[must_use]
    pub fn play_range(&self) -> Vec2 {
        self.play_range
    }

    #[inline]
    #[must_use]
    pub fn progress_notification(&self) -> f32 {
        self.progress_marker
    }

    #[inline]
    #[must_use]
    pub fn looping_mode(&self) -> LoopingMode {
        self.looping_mode
    }

    #[inline]
    #[must_use]
    pub fn blend_point(&self) -> f32 {
        self.blend_point
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn connectors(&self) -> &[AnimatorConnector] {
        &self.connectors
    }

    /// How many times the finished notification has been delivered.
    #[inline]
    #[must_use]
    pub fn finished_count(&self) -> u32 {
        self.finished_count
    }
}

// ============================================================================
// Engine: Animations
// ============================================================================

impl Engine {
    pub fn create_animation(&mut self, duration: f32) -> AnimationId {
        let end_action = self.settings.default_end_action;
        let disconnect_action = self.settings.default_disconnect_action;
        let id = self
            .animations
            .insert(AnimationControl::new(duration, end_action, disconnect_action));
        self.queue.push(Message::AddAnimation {
            id,
            animation: Box::new(Animation::new(duration, end_action, disconnect_action)),
        });
        id
    }

    /// Destroys the animation; playing animators finish per the end action.
    pub fn destroy_animation(&mut self, id: AnimationId) -> Result<()> {
        self.animations
            .remove(id)
            .ok_or(KinemaError::AnimationNotFound(id))?;
        self.queue.push(Message::DestroyAnimation { id });
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn animation(&self, id: AnimationId) -> Option<&AnimationControl> {
        self.animations.get(id)
    }

    #[must_use]
    pub fn animation_state(&self, id: AnimationId) -> Option<AnimationState> {
        self.animations.get(id).map(AnimationControl::state)
    }

    /// Elapsed progress of the scene-side animation after the last tick.
    #[must_use]
    pub fn animation_progress(&self, id: AnimationId) -> Option<f32> {
        self.update_manager.animation(id).map(Animation::current_progress)
    }

    /// Current loop of the scene-side animation after the last tick.
    #[must_use]
    pub fn animation_current_loop(&self, id: AnimationId) -> Option<u32> {
        self.update_manager.animation(id).map(Animation::current_loop)
    }

    fn control_mut(&mut self, id: AnimationId) -> Result<&mut AnimationControl> {
        self.animations.get_mut(id).ok_or(KinemaError::AnimationNotFound(id))
    }

    // ========================================================================
    // Animators
    // ========================================================================

    /// Adds an animator driving `property` of `object`. A `period` reaching
    /// past the animation's duration extends it.
    pub fn animate(
        &mut self,
        id: AnimationId,
        object: ObjectId,
        property: PropertyIndex,
        function: AnimatorFunction,
        alpha_function: AlphaFunction,
        period: Option<TimePeriod>,
    ) -> Result<()> {
        let target = self.object_ref(object)?;
        let expected = target
            .property_type(property)
            .ok_or(KinemaError::PropertyNotFound(property))?;
        if !target.is_property_animatable(property) {
            return Err(KinemaError::PropertyNotAnimatable(property));
        }
        let found = function.value_type().ok_or(KinemaError::EmptyKeyFrames)?;
        if found != expected {
            return Err(KinemaError::TypeMismatch { expected, found });
        }

        let control = self.control_mut(id)?;
        let period = period.unwrap_or(TimePeriod::new(control.duration));
        if period.end() > control.duration {
            control.duration = period.end();
            self.queue.push(Message::AnimationCommand {
                id,
                command: AnimationCommand::SetDuration(period.end()),
            });
        }

        let control = self.control_mut(id)?;
        control
            .connectors
            .push(AnimatorConnector::new(object, property, function, alpha_function, period));
        if matches!(control.state, AnimationState::Playing | AnimationState::Paused) {
            self.connect_animators(id, false);
        }
        Ok(())
    }

    pub fn animate_to(
        &mut self,
        id: AnimationId,
        object: ObjectId,
        property: PropertyIndex,
        value: impl Into<PropertyValue>,
    ) -> Result<()> {
        let alpha = self.settings.default_alpha_function;
        self.animate(id, object, property, AnimatorFunction::To(value.into()), alpha, None)
    }

    pub fn animate_by(
        &mut self,
        id: AnimationId,
        object: ObjectId,
        property: PropertyIndex,
        delta: impl Into<PropertyValue>,
    ) -> Result<()> {
        let alpha = self.settings.default_alpha_function;
        self.animate(id, object, property, AnimatorFunction::By(delta.into()), alpha, None)
    }

    pub fn animate_between(
        &mut self,
        id: AnimationId,
        object: ObjectId,
        property: PropertyIndex,
        key_frames: KeyFrames,
        interpolation: Interpolation,
    ) -> Result<()> {
        if key_frames.is_empty() {
            return Err(KinemaError::EmptyKeyFrames);
        }
        let alpha = self.settings.default_alpha_function;
        let function = AnimatorFunction::Between {
            key_frames,
            interpolation,
        };
        self.animate(id, object, property, function, alpha, None)
    }

    /// Rotates the orientation by `angle` radians about `axis`.
    pub fn animate_rotation(&mut self, id: AnimationId, object: ObjectId, angle: f32, axis: Vec3) -> Result<()> {
        let alpha = self.settings.default_alpha_function;
        let function = AnimatorFunction::RotateBy { angle, axis };
        self.animate(id, object, PropertyIndex::ORIENTATION, function, alpha, None)
    }

    /// Creates the scene-side animators of connectors whose target is still
    /// alive. A restart also re-arms the resetters of existing animators,
    /// which retire once an animation stops.
    fn connect_animators(&mut self, id: AnimationId, restarting: bool) {
        let Some(control) = self.animations.get_mut(id) else {
            return;
        };
        for connector in &mut control.connectors {
            let (animator_id, target) = match connector.animator() {
                Some(existing) if restarting => match connector.resolve_target(&self.objects) {
                    Some(target) => (existing, target),
                    None => continue,
                },
                Some(_) => continue,
                None => {
                    let animator_id = AnimatorId(self.next_animator);
                    let Some(animator) = connector.connect(&self.objects, animator_id) else {
                        continue;
                    };
                    self.next_animator = self.next_animator.wrapping_add(1);
                    let target = *animator.target();
                    self.queue.push(Message::AddAnimator {
                        animation: id,
                        animator: Box::new(animator),
                    });
                    (animator_id, target)
                }
            };
            if !target.property.is_transform() {
                self.queue
                    .push(Message::AddResetter(PropertyResetter::animator(target, id, animator_id)));
            }
        }
    }

    /// Marks the animation playing and connects its animators.
    fn start_playback(&mut self, id: AnimationId, command: AnimationCommand) -> Result<()> {
        let control = self.control_mut(id)?;
        let restarting = !matches!(control.state, AnimationState::Playing | AnimationState::Paused);
        control.state = AnimationState::Playing;
        self.connect_animators(id, restarting);
        self.send_command(id, command);
        Ok(())
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub fn play(&mut self, id: AnimationId) -> Result<()> {
        self.start_playback(id, AnimationCommand::Play)
    }

    pub fn play_from(&mut self, id: AnimationId, progress: f32) -> Result<()> {
        self.start_playback(id, AnimationCommand::PlayFrom(progress))
    }

    pub fn play_after(&mut self, id: AnimationId, delay: f32) -> Result<()> {
        self.start_playback(id, AnimationCommand::PlayAfter(delay))
    }

    pub fn pause(&mut self, id: AnimationId) -> Result<()> {
        let control = self.control_mut(id)?;
        if control.state == AnimationState::Playing {
            control.state = AnimationState::Paused;
        }
        self.send_command(id, AnimationCommand::Pause);
        Ok(())
    }

    pub fn stop(&mut self, id: AnimationId) -> Result<()> {
        self.control_mut(id)?.state = AnimationState::Stopped;
        self.send_command(id, AnimationCommand::Stop);
        Ok(())
    }

    fn send_command(&mut self, id: AnimationId, command: AnimationCommand) {
        self.queue.push(Message::AnimationCommand { id, command });
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn set_duration(&mut self, id: AnimationId, duration: f32) -> Result<()> {
        let duration = duration.max(0.0);
        self.control_mut(id)?.duration = duration;
        self.send_command(id, AnimationCommand::SetDuration(duration));
        Ok(())
    }

    /// `0` loops forever.
    pub fn set_loop_count(&mut self, id: AnimationId, count: u32) -> Result<()> {
        self.control_mut(id)?.loop_count = count;
        self.send_command(id, AnimationCommand::SetLoopCount(count));
        Ok(())
    }

    /// Shorthand for a loop count of `0` (forever) or `1`.
    pub fn set_looping(&mut self, id: AnimationId, looping: bool) -> Result<()> {
        self.set_loop_count(id, u32::from(!looping))
    }

    pub fn set_end_action(&mut self, id: AnimationId, action: EndAction) -> Result<()> {
        self.control_mut(id)?.end_action = action;
        self.send_command(id, AnimationCommand::SetEndAction(action));
        Ok(())
    }

    pub fn set_disconnect_action(&mut self, id: AnimationId, action: EndAction) -> Result<()> {
        self.control_mut(id)?.disconnect_action = action;
        self.send_command(id, AnimationCommand::SetDisconnectAction(action));
        Ok(())
    }

    /// Negative factors play backwards.
    pub fn set_speed_factor(&mut self, id: AnimationId, factor: f32) -> Result<()> {
        self.control_mut(id)?.speed_factor = factor;
        self.send_command(id, AnimationCommand::SetSpeedFactor(factor));
        Ok(())
    }

    pub fn set_play_range(&mut self, id: AnimationId, range: Vec2) -> Result<()> {
        let (start, end) = (range.x.clamp(0.0, 1.0), range.y.clamp(0.0, 1.0));
        let range = Vec2::new(start.min(end), start.max(end));
        self.control_mut(id)?.play_range = range;
        self.send_command(id, AnimationCommand::SetPlayRange(range));
        Ok(())
    }

    pub fn set_progress_notification(&mut self, id: AnimationId, progress: f32) -> Result<()> {
        let progress = progress.clamp(0.0, 1.0);
        self.control_mut(id)?.progress_marker = progress;
        self.send_command(id, AnimationCommand::SetProgressNotification(progress));
        Ok(())
    }

    pub fn set_looping_mode(&mut self, id: AnimationId, mode: LoopingMode) -> Result<()> {
        self.control_mut(id)?.looping_mode = mode;
        self.send_command(id, AnimationCommand::SetLoopingMode(mode));
        Ok(())
    }

    pub fn set_blend_point(&mut self, id: AnimationId, point: f32) -> Result<()> {
        let point = point.clamp(0.0, 1.0);
        self.control_mut(id)?.blend_point = point;
        self.send_command(id, AnimationCommand::SetBlendPoint(point));
        Ok(())
    }

    /// Jumps to `progress`; ignored outside the play range.
    pub fn set_current_progress(&mut self, id: AnimationId, progress: f32) -> Result<()> {
        self.control_mut(id)?;
        self.send_command(id, AnimationCommand::SetCurrentProgress(progress));
        Ok(())
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Mirrors a finished animation into the object caches and its state.
    pub(crate) fn on_animation_finished(&mut self, id: AnimationId) {
        let Some(control) = self.animations.get_mut(id) else {
            return;
        };
        control.finished_count += 1;
        if control.end_action == EndAction::Discard {
            return;
        }

        // Playback rests on the range edge it was heading for.
        let edge_progress = if control.speed_factor < 0.0 {
            control.play_range.x
        } else {
            control.play_range.y
        };
        let edge = edge_progress * control.duration;
        for connector in &control.connectors {
            let Some(object) = self.objects.get_mut(connector.object()) else {
                continue;
            };
            let Some(base) = object.cached_value(connector.property()) else {
                continue;
            };
            if let Some(value) = connector.value_at(&base, edge) {
                object.cache_value(connector.property(), value);
            }
        }
    }

    /// Takes the playback state reported by the update side.
    pub(crate) fn sync_animation_states(&mut self) {
        for (id, control) in &mut self.animations {
            if let Some(animation) = self.update_manager.animation(id) {
                control.state = animation.state();
            }
        }
    }
}
