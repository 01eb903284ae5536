use slotmap::SecondaryMap;

use super::message::{AnimationCommand, Message};
use crate::animation::{Animation, AnimationId};
use crate::constraint::ConstraintPhase;
use crate::property::BufferIndex;
use crate::resetter::{PropertyResetter, ResetterDriver};
use crate::scene::{ObjectId, SceneGraph};

/// Notifications produced by one tick, for the producer side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Number of the tick that produced this report, starting at 1.
    pub frame: u64,
    /// Animations that finished or were stopped while playing.
    pub finished: Vec<AnimationId>,
    /// Animations whose progress marker was crossed.
    pub progress_reached: Vec<AnimationId>,
    /// Messages applied at the start of the tick.
    pub messages: usize,
}

/// Owns all update-side state and runs the per-tick pipeline.
///
/// # Tick Order
///
/// 1. reset every resetter-driven property and the transform manager
/// 2. apply queued messages
/// 3. advance animations
/// 4. compute world transforms
/// 5. evaluate pre constraints, then post constraints, in scene order
/// 6. recompute world transforms if constraints touched local ones
/// 7. compute world colors
/// 8. drop orphaned animators and finished resetters
/// 9. flip the buffer index
#[derive(Debug, Default)]
pub struct UpdateManager {
    graph: SceneGraph,
    animations: SecondaryMap<AnimationId, Animation>,
    resetters: Vec<PropertyResetter>,
    update_index: BufferIndex,
    frame: u64,
}

impl UpdateManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    #[inline]
    #[must_use]
    pub fn animation(&self, id: AnimationId) -> Option<&Animation> {
        self.animations.get(id)
    }

    #[inline]
    #[must_use]
    pub fn resetters(&self) -> &[PropertyResetter] {
        &self.resetters
    }

    /// Slot the next tick writes.
    #[inline]
    #[must_use]
    pub fn update_index(&self) -> BufferIndex {
        self.update_index
    }

    /// Slot holding the output of the last completed tick.
    #[inline]
    #[must_use]
    pub fn render_index(&self) -> BufferIndex {
        self.update_index.other()
    }

    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Runs one tick of `delta` seconds.
    pub(crate) fn update(&mut self, delta: f32, messages: Vec<Message>) -> FrameReport {
        let index = self.update_index;
        let mut report = FrameReport {
            messages: messages.len(),
            ..FrameReport::default()
        };

        self.reset_properties(index);

        for message in messages {
            self.process_message(message, index, &mut report);
        }

        self.animate(index, delta, &mut report);

        self.graph.transforms_mut().update(index);

        let order = self.graph.evaluation_order();
        self.graph.apply_constraints(index, ConstraintPhase::Pre, &order);
        self.graph.apply_constraints(index, ConstraintPhase::Post, &order);
        if self.graph.transforms().has_dirty_components() {
            self.graph.transforms_mut().update(index);
        }

        self.graph.update_world_colors(index);

        self.remove_orphans();

        self.update_index = index.other();
        self.frame += 1;
        report.frame = self.frame;
        report
    }

    // ========================================================================
    // Pipeline Stages
    // ========================================================================

    fn reset_properties(&mut self, index: BufferIndex) {
        self.graph.transforms_mut().reset_to_base_value();

        let Self {
            graph,
            animations,
            resetters,
            ..
        } = self;
        for resetter in resetters.iter_mut() {
            resetter.reset_to_base_value(graph, index);
            let alive = match resetter.driver() {
                ResetterDriver::Animator { animation, animator } => animations
                    .get(animation)
                    .is_some_and(|a| a.is_live() && a.has_animator(animator)),
                ResetterDriver::Constraint(id) => graph
                    .node(resetter.target().object)
                    .is_some_and(|node| node.has_constraint(id)),
                ResetterDriver::Baker(_) => false,
            };
            resetter.update_age(alive);
        }
        resetters.retain(|resetter| !resetter.is_finished() && graph.contains(resetter.target().object));
    }

    fn process_message(&mut self, message: Message, index: BufferIndex, report: &mut FrameReport) {
        match message {
            Message::InstallNode { object, init } => self.graph.install_node(object, &init),
            Message::AddRoot { object } => self.graph.add_root(object),
            Message::DestroyNode { object } => {
                if let Some(node) = self.graph.destroy_node(object) {
                    log::trace!("Destroyed node {object:?} with {} constraints", node.constraints.len());
                }
            }
            Message::SetParent { object, parent } => self.graph.set_parent(object, parent),
            Message::SetConnected { object, connected } => self.set_connected(object, connected, index),
            Message::RegisterProperty { object, slot, initial } => {
                self.graph.register_property(object, slot, initial);
            }
            Message::WriteProperty { target, value, mode } => {
                if !self.graph.write(&target, index, &value, mode) {
                    log::debug!("Dropped write to {target:?}");
                }
            }
            Message::SetColorMode { object, mode } => self.graph.set_color_mode(object, mode),
            Message::SetTransformFlags {
                object,
                inheritance,
                position_uses_anchor_point,
            } => self
                .graph
                .set_transform_flags(object, inheritance, position_uses_anchor_point),
            Message::AddAnimation { id, animation } => {
                self.animations.insert(id, *animation);
            }
            Message::DestroyAnimation { id } => {
                if let Some(mut animation) = self.animations.remove(id) {
                    animation.on_destroy(&mut self.graph, index);
                }
            }
            Message::AnimationCommand { id, command } => self.apply_command(id, command, index, report),
            Message::AddAnimator { animation, mut animator } => {
                let Some(target) = self.animations.get_mut(animation) else {
                    log::debug!("Animator added to destroyed animation {animation:?}");
                    return;
                };
                animator.set_enabled(self.graph.is_connected(animator.target().object));
                target.add_animator(*animator);
            }
            Message::ApplyConstraint {
                object,
                phase,
                constraint,
            } => self.graph.attach_constraint(object, phase, *constraint),
            Message::RemoveConstraint { object, id } => self.graph.detach_constraint(object, id, index),
            Message::AddResetter(resetter) => {
                if self.graph.contains(resetter.target().object) {
                    self.resetters.push(resetter);
                }
            }
        }
    }

    fn apply_command(
        &mut self,
        id: AnimationId,
        command: AnimationCommand,
        index: BufferIndex,
        report: &mut FrameReport,
    ) {
        let Some(animation) = self.animations.get_mut(id) else {
            log::debug!("Command {command:?} for unknown animation {id:?}");
            return;
        };
        match command {
            AnimationCommand::Play => animation.play(),
            AnimationCommand::PlayFrom(progress) => animation.play_from(progress),
            AnimationCommand::PlayAfter(delay) => animation.play_after(delay),
            AnimationCommand::Pause => animation.pause(),
            AnimationCommand::Stop => {
                if animation.stop(&mut self.graph, index) {
                    report.finished.push(id);
                }
            }
            AnimationCommand::SetDuration(duration) => animation.set_duration(duration),
            AnimationCommand::SetLoopCount(count) => animation.set_loop_count(count),
            AnimationCommand::SetEndAction(action) => animation.set_end_action(action),
            AnimationCommand::SetDisconnectAction(action) => animation.set_disconnect_action(action),
            AnimationCommand::SetSpeedFactor(factor) => animation.set_speed_factor(factor),
            AnimationCommand::SetPlayRange(range) => animation.set_play_range(range),
            AnimationCommand::SetProgressNotification(marker) => animation.set_progress_notification(marker),
            AnimationCommand::SetLoopingMode(mode) => animation.set_looping_mode(mode),
            AnimationCommand::SetBlendPoint(point) => animation.set_blend_point(point),
            AnimationCommand::SetCurrentProgress(progress) => animation.set_current_progress(progress),
        }
    }

    fn set_connected(&mut self, object: ObjectId, connected: bool, index: BufferIndex) {
        if self.graph.is_connected(object) == connected || !self.graph.contains(object) {
            return;
        }
        self.graph.set_connected(object, connected);
        for (_, animation) in &mut self.animations {
            animation.on_target_connection_changed(&mut self.graph, index, object, connected);
        }
    }

    fn animate(&mut self, index: BufferIndex, delta: f32, report: &mut FrameReport) {
        for (id, animation) in &mut self.animations {
            let outcome = animation.update(&mut self.graph, index, delta);
            if outcome.finished {
                report.finished.push(id);
            }
            if outcome.progress_reached {
                report.progress_reached.push(id);
            }
        }
    }

    fn remove_orphans(&mut self) {
        let mut removed = 0;
        for (_, animation) in &mut self.animations {
            removed += animation.remove_orphans(&self.graph);
        }
        if removed > 0 {
            log::debug!("Removed {removed} orphaned animators");
        }

        let graph = &self.graph;
        self.resetters.retain(|resetter| graph.contains(resetter.target().object));
    }
}
