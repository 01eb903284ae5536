//! Scene-side animation state machine.

use glam::Vec2;

use super::animator::{Animator, AnimatorId};
use super::{AnimationState, EndAction, LoopingMode};
use crate::property::BufferIndex;
use crate::scene::{ObjectId, SceneGraph};

/// What happened during one [`Animation::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// Elapsed time wrapped around the play range.
    pub looped: bool,
    /// The last loop completed; the animation is now stopped.
    pub finished: bool,
    /// The progress marker was crossed.
    pub progress_reached: bool,
}

/// Owns a set of animators and advances them with its elapsed time.
#[derive(Debug, Clone)]
pub struct Animation {
    duration: f32,
    /// Remaining delay before elapsed time starts advancing.
    delay: f32,
    elapsed: f32,
    speed_factor: f32,
    play_range: Vec2,

    progress_marker: f32,
    progress_signal_required: bool,

    /// `0` loops forever.
    loop_count: u32,
    current_loop: u32,
    played_count: u32,

    end_action: EndAction,
    disconnect_action: EndAction,
    looping_mode: LoopingMode,
    blend_point: f32,

    state: AnimationState,
    animators: Vec<Animator>,
    animators_sorted: bool,
}

impl Animation {
    #[must_use]
    pub fn new(duration: f32, end_action: EndAction, disconnect_action: EndAction) -> Self {
        Self {
            duration: duration.max(0.0),
            delay: 0.0,
            elapsed: 0.0,
            speed_factor: 1.0,
            play_range: Vec2::new(0.0, 1.0),
            progress_marker: 0.0,
            progress_signal_required: false,
            loop_count: 1,
            current_loop: 0,
            played_count: 0,
            end_action,
            disconnect_action,
            looping_mode: LoopingMode::Restart,
            blend_point: 0.0,
            state: AnimationState::Stopped,
            animators: Vec::new(),
            animators_sorted: true,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn state(&self) -> AnimationState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        matches!(self.state, AnimationState::Playing)
    }

    /// Playing or paused: its animators still write every tick.
    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self.state, AnimationState::Playing | AnimationState::Paused)
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Elapsed time as a fraction of the duration.
    #[must_use]
    pub fn current_progress(&self) -> f32 {
        if self.duration > 0.0 {
            self.elapsed / self.duration
        } else {
            0.0
        }
    }

    #[inline]
    #[must_use]
    pub fn current_loop(&self) -> u32 {
        self.current_loop
    }

    #[inline]
    #[must_use]
    pub fn played_count(&self) -> u32 {
        self.played_count
    }

    #[inline]
    #[must_use]
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    #[inline]
    #[must_use]
    pub fn animators(&self) -> &[Animator] {
        &self.animators
    }

    #[must_use]
    pub fn has_animator(&self, id: AnimatorId) -> bool {
        self.animators.iter().any(|animator| animator.id() == id && !animator.is_orphan())
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration.max(0.0);
    }

    /// A marker of `0` disables the notification.
    pub fn set_progress_notification(&mut self, progress: f32) {
        self.progress_marker = progress.clamp(0.0, 1.0);
        self.progress_signal_required = self.progress_marker > 0.0;
    }

    pub fn set_loop_count(&mut self, count: u32) {
        self.loop_count = count;
        self.current_loop = 0;
    }

    pub fn set_end_action(&mut self, action: EndAction) {
        self.end_action = action;
    }

    pub fn set_disconnect_action(&mut self, action: EndAction) {
        self.disconnect_action = action;
        for animator in &mut self.animators {
            animator.set_disconnect_action(action);
        }
    }

    pub fn set_speed_factor(&mut self, factor: f32) {
        self.speed_factor = factor;
        for animator in &mut self.animators {
            animator.set_speed_factor(factor);
        }
    }

    pub fn set_looping_mode(&mut self, mode: LoopingMode) {
        self.looping_mode = mode;
        let auto_reverse = mode == LoopingMode::AutoReverse;
        for animator in &mut self.animators {
            animator.set_auto_reverse(auto_reverse);
        }
    }

    /// Only meaningful for looping animations.
    pub fn set_blend_point(&mut self, point: f32) {
        self.blend_point = point.clamp(0.0, 1.0);
    }

    /// Restricts playback to `[range.x, range.y]` of the duration. A stopped
    /// animation rewinds to the range start; otherwise the elapsed time is
    /// pulled inside the range.
    pub fn set_play_range(&mut self, range: Vec2) {
        let (start, end) = (range.x.clamp(0.0, 1.0), range.y.clamp(0.0, 1.0));
        self.play_range = Vec2::new(start.min(end), start.max(end));
        let (start, end) = self.play_range_seconds();
        self.elapsed = if matches!(self.state, AnimationState::Stopped) {
            start
        } else {
            self.elapsed.clamp(start, end)
        };
    }

    /// Ignored when `progress` lies outside the play range.
    pub fn set_current_progress(&mut self, progress: f32) {
        if progress >= self.play_range.x && progress <= self.play_range.y {
            self.elapsed = progress * self.duration;
        }
    }

    fn play_range_seconds(&self) -> (f32, f32) {
        (self.play_range.x * self.duration, self.play_range.y * self.duration)
    }

    // ========================================================================
    // Animators
    // ========================================================================

    /// Adopts `animator`, configured with this animation's settings.
    pub fn add_animator(&mut self, mut animator: Animator) {
        animator.set_disconnect_action(self.disconnect_action);
        animator.set_speed_factor(self.speed_factor);
        animator.set_auto_reverse(self.looping_mode == LoopingMode::AutoReverse);
        animator.set_active(self.is_live());

        if let Some(last) = self.animators.last()
            && animator.end_time() < last.end_time()
        {
            self.animators_sorted = false;
        }
        self.animators.push(animator);
    }

    /// Drops orphaned animators. Returns how many were removed.
    pub(crate) fn remove_orphans(&mut self, graph: &SceneGraph) -> usize {
        let before = self.animators.len();
        self.animators.retain_mut(|animator| !animator.check_orphan(graph));
        let removed = before - self.animators.len();
        if removed > 0 && self.animators.len() >= 2 {
            self.animators_sorted = self
                .animators
                .windows(2)
                .all(|pair| pair[0].end_time() <= pair[1].end_time());
        }
        removed
    }

    fn sort_animators(&mut self) {
        self.animators.sort_by(|a, b| a.end_time().total_cmp(&b.end_time()));
        self.animators_sorted = true;
    }

    fn set_animators_active(&mut self, active: bool) {
        for animator in &mut self.animators {
            animator.set_active(active);
        }
    }

    /// Enables or disables the animators targeting `object` after it joined
    /// or left the scene.
    pub(crate) fn on_target_connection_changed(
        &mut self,
        graph: &mut SceneGraph,
        index: BufferIndex,
        object: ObjectId,
        connected: bool,
    ) {
        for animator in &mut self.animators {
            if animator.target().object != object {
                continue;
            }
            if connected {
                animator.set_enabled(true);
            } else {
                animator.on_target_disconnected(graph, index);
            }
        }
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Starts playback. Resuming from pause keeps the loop counter.
    pub fn play(&mut self) {
        self.rewind_loops();
        self.sort_animators();
        let (start, end) = self.play_range_seconds();
        if self.speed_factor < 0.0 && self.elapsed <= start {
            self.elapsed = end;
        }
        self.delay = 0.0;
        self.set_animators_active(true);
        self.state = AnimationState::Playing;
    }

    /// Starts from `progress`, clamped to the play range; ignored while
    /// already playing.
    pub fn play_from(&mut self, progress: f32) {
        if self.is_playing() {
            return;
        }
        self.rewind_loops();
        self.sort_animators();
        self.elapsed = progress.clamp(self.play_range.x, self.play_range.y) * self.duration;
        self.delay = 0.0;
        self.set_animators_active(true);
        self.state = AnimationState::Playing;
    }

    /// Plays after `delay` seconds; ignored while already playing.
    pub fn play_after(&mut self, delay: f32) {
        if self.is_playing() {
            return;
        }
        self.play();
        self.delay = delay.max(0.0);
    }

    fn rewind_loops(&mut self) {
        if !matches!(self.state, AnimationState::Paused) {
            self.current_loop = 0;
        }
    }

    pub fn pause(&mut self) {
        if self.is_playing() {
            self.state = AnimationState::Paused;
        }
    }

    /// Stops playback, baking per the end action. Returns `true` when the
    /// animation was playing or paused.
    pub fn stop(&mut self, graph: &mut SceneGraph, index: BufferIndex) -> bool {
        let was_live = self.is_live();
        if was_live {
            self.finish_with_end_action(graph, index);
            self.played_count += 1;
            self.current_loop = 0;
        }
        self.elapsed = self.play_range_seconds().0;
        self.delay = 0.0;
        self.progress_signal_required = self.progress_marker > 0.0;
        self.state = AnimationState::Stopped;
        was_live
    }

    /// Called once before the animation is dropped.
    pub fn on_destroy(&mut self, graph: &mut SceneGraph, index: BufferIndex) {
        if self.is_live() {
            self.finish_with_end_action(graph, index);
        }
        self.state = AnimationState::Destroyed;
    }

    fn finish_with_end_action(&mut self, graph: &mut SceneGraph, index: BufferIndex) {
        if self.end_action == EndAction::Discard {
            self.set_animators_active(false);
            return;
        }
        let (start, end) = self.play_range_seconds();
        self.elapsed = if self.speed_factor < 0.0 { start } else { end };
        self.update_animators(graph, index, true, true);
    }

    /// Advances by `delta` seconds of wall time.
    pub fn update(&mut self, graph: &mut SceneGraph, index: BufferIndex, delta: f32) -> UpdateOutcome {
        let mut outcome = UpdateOutcome::default();
        if !self.is_live() {
            return outcome;
        }
        if !self.animators_sorted {
            self.sort_animators();
        }

        if self.is_playing() {
            let mut step = delta * self.speed_factor;
            if self.delay > 0.0 {
                let consumed = step.abs();
                if self.delay >= consumed {
                    self.delay -= consumed;
                    step = 0.0;
                } else {
                    step = (consumed - self.delay) * self.speed_factor.signum();
                    self.delay = 0.0;
                }
            }
            self.elapsed += step;

            if self.progress_signal_required {
                let marker = self.progress_marker * self.duration;
                if (self.elapsed - marker) * self.speed_factor.signum() >= 0.0 {
                    self.progress_signal_required = false;
                    outcome.progress_reached = true;
                }
            }
        }

        let (start, end) = self.play_range_seconds();
        let past_edge = if self.speed_factor < 0.0 {
            self.elapsed <= start
        } else {
            self.elapsed >= end
        };

        if self.loop_count == 0 || self.current_loop + 1 < self.loop_count {
            outcome.looped = self.is_playing() && past_edge;
            self.wrap_in_play_range(start, end);
            self.update_animators(graph, index, false, false);

            if outcome.looped {
                if self.loop_count != 0 {
                    self.current_loop += 1;
                }
                self.progress_signal_required = self.progress_marker > 0.0;
            }
        } else {
            let finished = self.is_playing() && past_edge;
            let bake = finished && self.end_action != EndAction::Discard;
            self.update_animators(graph, index, bake, finished);

            if finished {
                self.played_count += 1;
                if self.current_loop < self.loop_count {
                    self.current_loop += 1;
                }
                self.progress_signal_required = self.progress_marker > 0.0;
                self.elapsed = start;
                self.state = AnimationState::Stopped;
                outcome.finished = true;
            }
        }

        outcome
    }

    fn wrap_in_play_range(&mut self, start: f32, end: f32) {
        let range = end - start;
        let forward = self.speed_factor >= 0.0;
        let past_end = if forward { self.elapsed >= end } else { self.elapsed > end };
        let before_start = if forward { self.elapsed < start } else { self.elapsed <= start };
        if range <= 0.0 {
            self.elapsed = start;
        } else if past_end {
            self.elapsed = start + (self.elapsed - start) % range;
        } else if before_start {
            self.elapsed = end - (start - self.elapsed) % range;
        }
    }

    fn update_animators(&mut self, graph: &mut SceneGraph, index: BufferIndex, bake: bool, finished: bool) {
        let (start, end) = self.play_range_seconds();
        let elapsed = self.elapsed.clamp(start, end);
        let blend_point = if self.loop_count == 1 { 0.0 } else { self.blend_point };

        for animator in &mut self.animators {
            if animator.check_orphan(graph) {
                continue;
            }
            if animator.is_enabled() {
                animator.update(graph, index, elapsed, blend_point, bake);
            }
            if finished {
                animator.set_active(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::animation::{AlphaFunction, AnimatorFunction, TimePeriod};
    use crate::property::{PropertyRef, PropertyTarget, PropertyValue};
    use crate::scene::NodeInit;

    const EPSILON: f32 = 1e-5;
    const INDEX: BufferIndex = BufferIndex::ZERO;

    struct Fixture {
        graph: SceneGraph,
        target: PropertyTarget,
    }

    fn fixture() -> Fixture {
        let mut keys: SlotMap<ObjectId, ()> = SlotMap::with_key();
        let object = keys.insert(());
        let mut graph = SceneGraph::new();
        let init = NodeInit {
            custom: vec![PropertyValue::Float(0.0)],
            ..NodeInit::default()
        };
        graph.install_node(object, &init);
        graph.add_root(object);
        graph.set_connected(object, true);
        Fixture {
            graph,
            target: PropertyTarget::new(object, PropertyRef::Custom(0), None),
        }
    }

    fn animate_to(target: PropertyTarget, value: f32, duration: f32) -> Animator {
        Animator::new(
            AnimatorId(0),
            target,
            AnimatorFunction::To(PropertyValue::Float(value)),
            AlphaFunction::Linear,
            TimePeriod::new(duration),
        )
    }

    /// Resets the target the way its resetter would, then advances.
    fn tick(animation: &mut Animation, f: &mut Fixture, dt: f32) -> UpdateOutcome {
        f.graph.reset_property(&f.target, INDEX);
        animation.update(&mut f.graph, INDEX, dt)
    }

    fn value(f: &Fixture) -> f32 {
        match f.graph.read(&f.target, INDEX) {
            Some(PropertyValue::Float(v)) => v,
            other => panic!("Expected float, got {other:?}"),
        }
    }

    #[test]
    fn loop_count_three_finishes_on_third_wrap() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 10.0, 1.0));
        animation.set_loop_count(3);
        animation.play();

        let first = animation.update(&mut f.graph, INDEX, 1.5);
        assert!(first.looped && !first.finished);
        let second = animation.update(&mut f.graph, INDEX, 1.5);
        assert!(second.looped && !second.finished, "Second update: {second:?}");
        let third = animation.update(&mut f.graph, INDEX, 1.5);
        assert!(third.finished, "Third update: {third:?}");
        assert_eq!(animation.state(), AnimationState::Stopped);
        assert_eq!(animation.played_count(), 1);
    }

    #[test]
    fn replay_after_finish_counts_loops_again() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 10.0, 1.0));
        animation.set_loop_count(3);
        animation.play();
        for _ in 0..3 {
            animation.update(&mut f.graph, INDEX, 1.0);
        }
        assert_eq!(animation.state(), AnimationState::Stopped);

        animation.play();
        assert_eq!(animation.current_loop(), 0);
        let outcome = animation.update(&mut f.graph, INDEX, 1.0);
        assert!(outcome.looped && !outcome.finished, "Replay: {outcome:?}");
        assert_eq!(animation.state(), AnimationState::Playing);
    }

    #[test]
    fn resume_keeps_the_loop_counter() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 10.0, 1.0));
        animation.set_loop_count(3);
        animation.play();
        animation.update(&mut f.graph, INDEX, 1.0);
        animation.pause();
        animation.play();
        assert_eq!(animation.current_loop(), 1);
    }

    #[test]
    fn stop_bakes_the_end_value() {
        let mut f = fixture();
        let mut animation = Animation::new(2.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 8.0, 2.0));
        animation.play();
        animation.update(&mut f.graph, INDEX, 0.5);

        assert!(animation.stop(&mut f.graph, INDEX));
        assert!((value(&f) - 8.0).abs() < EPSILON, "Expected 8.0, got {}", value(&f));
        assert!((animation.elapsed()).abs() < EPSILON);
    }

    #[test]
    fn stop_with_discard_writes_nothing() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Discard, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 8.0, 1.0));
        animation.play();
        assert!(animation.stop(&mut f.graph, INDEX));
        assert!(value(&f).abs() < EPSILON);
        assert!(!animation.stop(&mut f.graph, INDEX), "Stopping twice reports no finish");
    }

    #[test]
    fn paused_animation_keeps_writing_without_advancing() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 10.0, 1.0));
        animation.play();
        tick(&mut animation, &mut f, 0.25);
        animation.pause();
        tick(&mut animation, &mut f, 0.5);

        assert!((animation.elapsed() - 0.25).abs() < EPSILON);
        assert!((value(&f) - 2.5).abs() < EPSILON, "Expected 2.5, got {}", value(&f));
    }

    #[test]
    fn negative_speed_plays_backwards_from_the_end() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 10.0, 1.0));
        animation.set_speed_factor(-1.0);
        animation.play();
        assert!((animation.elapsed() - 1.0).abs() < EPSILON);

        animation.update(&mut f.graph, INDEX, 0.25);
        assert!((animation.elapsed() - 0.75).abs() < EPSILON);
        let outcome = animation.update(&mut f.graph, INDEX, 1.0);
        assert!(outcome.finished);
    }

    #[test]
    fn progress_marker_fires_once() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 1.0, 1.0));
        animation.set_progress_notification(0.5);
        animation.play();

        assert!(!animation.update(&mut f.graph, INDEX, 0.25).progress_reached);
        assert!(animation.update(&mut f.graph, INDEX, 0.3).progress_reached);
        assert!(!animation.update(&mut f.graph, INDEX, 0.1).progress_reached);
    }

    #[test]
    fn play_after_waits_for_the_delay() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 10.0, 1.0));
        animation.play_after(0.5);

        animation.update(&mut f.graph, INDEX, 0.25);
        assert!(animation.elapsed().abs() < EPSILON);
        animation.update(&mut f.graph, INDEX, 0.5);
        assert!((animation.elapsed() - 0.25).abs() < EPSILON);
    }

    #[test]
    fn play_range_wraps_looping_playback() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 10.0, 1.0));
        animation.set_loop_count(0);
        animation.set_play_range(Vec2::new(0.2, 0.6));
        animation.play();
        assert!((animation.elapsed() - 0.2).abs() < EPSILON);

        let outcome = animation.update(&mut f.graph, INDEX, 0.5);
        assert!(outcome.looped);
        assert!((animation.elapsed() - 0.3).abs() < EPSILON, "Got {}", animation.elapsed());
    }

    #[test]
    fn play_range_change_rewinds_a_stopped_animation() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Discard, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 10.0, 1.0));
        animation.set_play_range(Vec2::new(0.5, 1.0));
        animation.play();
        animation.update(&mut f.graph, INDEX, 0.1);
        animation.stop(&mut f.graph, INDEX);
        assert!((animation.elapsed() - 0.5).abs() < EPSILON);

        animation.set_play_range(Vec2::new(0.0, 1.0));
        assert!(animation.elapsed().abs() < EPSILON, "Got {}", animation.elapsed());
    }

    #[test]
    fn play_range_change_clamps_a_playing_animation() {
        let mut f = fixture();
        let mut animation = Animation::new(1.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 10.0, 1.0));
        animation.play();
        animation.update(&mut f.graph, INDEX, 0.7);

        animation.set_play_range(Vec2::new(0.0, 0.5));
        assert!((animation.elapsed() - 0.5).abs() < EPSILON, "Got {}", animation.elapsed());
    }

    #[test]
    fn play_from_is_clamped_to_the_play_range() {
        let mut animation = Animation::new(2.0, EndAction::Bake, EndAction::BakeFinal);
        animation.set_play_range(Vec2::new(0.25, 0.75));
        animation.play_from(0.9);
        assert!((animation.elapsed() - 1.5).abs() < EPSILON, "Got {}", animation.elapsed());
    }

    #[test]
    fn animators_are_resorted_by_end_time() {
        let f = fixture();
        let mut animation = Animation::new(2.0, EndAction::Bake, EndAction::BakeFinal);
        animation.add_animator(animate_to(f.target, 1.0, 2.0));
        animation.add_animator(Animator::new(
            AnimatorId(1),
            f.target,
            AnimatorFunction::To(PropertyValue::Float(2.0)),
            AlphaFunction::Linear,
            TimePeriod::new(0.5),
        ));
        animation.play();

        let ends: Vec<f32> = animation.animators().iter().map(Animator::end_time).collect();
        assert_eq!(ends, vec![0.5, 2.0]);
    }
}
