use slotmap::SlotMap;
use smallvec::SmallVec;

use super::{
    ApplyRate, CUSTOM_CONSTRAINT_TAG_MAX, ConstraintFunction, ConstraintId, ConstraintPhase, DEFAULT_CONSTRAINT_TAG,
    PropertyInputs, RemoveAction, SceneConstraint, is_custom_tag, is_internal_tag,
};
use crate::engine::Engine;
use crate::errors::{KinemaError, Result, ensure_invariant};
use crate::event::Object;
use crate::property::{PropertyIndex, PropertyKind, PropertyTarget};
use crate::resetter::{Lifetime, PropertyResetter};
use crate::scene::ObjectId;
use crate::update::message::{Message, MessageQueue};

/// Which object a source property is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A property of a specific object.
    ObjectProperty(ObjectId),
    /// A property of the constrained object itself.
    LocalProperty,
    /// A property of the constrained object's parent at connection time.
    ParentProperty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintSource {
    pub kind: SourceKind,
    pub index: PropertyIndex,
}

impl ConstraintSource {
    #[must_use]
    pub const fn object(object: ObjectId, index: PropertyIndex) -> Self {
        Self {
            kind: SourceKind::ObjectProperty(object),
            index,
        }
    }

    #[must_use]
    pub const fn local(index: PropertyIndex) -> Self {
        Self {
            kind: SourceKind::LocalProperty,
            index,
        }
    }

    #[must_use]
    pub const fn parent(index: PropertyIndex) -> Self {
        Self {
            kind: SourceKind::ParentProperty,
            index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintState {
    /// Not applied.
    Detached,
    /// Applied, waiting for the target and sources to be on the scene.
    Pending,
    /// Evaluated every tick on the update side.
    Connected,
    /// The target or a source was destroyed; the constraint is inert.
    ObjectDestroyed,
}

/// Producer-side constraint record.
#[derive(Debug, Clone)]
pub struct Constraint {
    target: Option<ObjectId>,
    target_index: PropertyIndex,
    sources: SmallVec<[ConstraintSource; 4]>,
    function: ConstraintFunction,
    remove_action: RemoveAction,
    apply_rate: ApplyRate,
    tag: u32,
    phase: ConstraintPhase,
    applied: bool,
    connected: bool,
}

impl Constraint {
    fn new(target: ObjectId, target_index: PropertyIndex, function: ConstraintFunction) -> Self {
        Self {
            target: Some(target),
            target_index,
            sources: SmallVec::new(),
            function,
            remove_action: RemoveAction::default(),
            apply_rate: ApplyRate::default(),
            tag: DEFAULT_CONSTRAINT_TAG,
            phase: ConstraintPhase::default(),
            applied: false,
            connected: false,
        }
    }

    /// `None` once the constraint has been disabled by a destroyed object.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<ObjectId> {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn target_property(&self) -> PropertyIndex {
        self.target_index
    }

    #[inline]
    #[must_use]
    pub fn sources(&self) -> &[ConstraintSource] {
        &self.sources
    }

    #[inline]
    #[must_use]
    pub fn remove_action(&self) -> RemoveAction {
        self.remove_action
    }

    #[inline]
    #[must_use]
    pub fn apply_rate(&self) -> ApplyRate {
        self.apply_rate
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> u32 {
        self.tag
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> ConstraintPhase {
        self.phase
    }

    #[inline]
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    #[must_use]
    pub fn state(&self) -> ConstraintState {
        if self.target.is_none() {
            ConstraintState::ObjectDestroyed
        } else if self.connected {
            ConstraintState::Connected
        } else if self.applied {
            ConstraintState::Pending
        } else {
            ConstraintState::Detached
        }
    }

    /// Takes effect the next time the constraint connects.
    pub fn set_remove_action(&mut self, action: RemoveAction) {
        self.remove_action = action;
    }

    /// Takes effect the next time the constraint connects.
    pub fn set_apply_rate(&mut self, rate: ApplyRate) {
        self.apply_rate = rate;
    }

    /// Sets a default or custom tag.
    pub fn set_tag(&mut self, tag: u32) {
        ensure_invariant!(tag <= CUSTOM_CONSTRAINT_TAG_MAX, "Custom tag {tag} out of range");
        self.change_tag(tag);
    }

    /// Sets a default or internal tag.
    pub fn set_internal_tag(&mut self, tag: u32) {
        ensure_invariant!(
            tag == DEFAULT_CONSTRAINT_TAG || is_internal_tag(tag),
            "Internal tag {tag} out of range"
        );
        self.change_tag(tag);
    }

    fn change_tag(&mut self, tag: u32) {
        let crosses = self.tag != DEFAULT_CONSTRAINT_TAG
            && tag != DEFAULT_CONSTRAINT_TAG
            && is_custom_tag(self.tag) != is_custom_tag(tag);
        ensure_invariant!(!crosses, "Cross tag setting is not allowed!");
        self.tag = tag;
    }

    fn references(&self, object: ObjectId) -> bool {
        self.target == Some(object)
            || self
                .sources
                .iter()
                .any(|source| source.kind == SourceKind::ObjectProperty(object))
    }

    /// Resolves every source against the live objects. `None` until the
    /// target and all source owners are on the scene.
    fn resolve(
        &self,
        target: ObjectId,
        objects: &SlotMap<ObjectId, Object>,
    ) -> Option<(PropertyTarget, SmallVec<[PropertyTarget; 4]>)> {
        let target_object = objects.get(target).filter(|object| object.on_scene)?;
        let (property, component) = target_object.animatable_target(self.target_index)?;

        let mut resolved = SmallVec::with_capacity(self.sources.len());
        for source in &self.sources {
            let owner = match source.kind {
                SourceKind::ObjectProperty(object) => object,
                SourceKind::LocalProperty => target,
                SourceKind::ParentProperty => target_object.parent?,
            };
            let object = objects.get(owner).filter(|object| object.on_scene)?;
            let Some((property, component)) = object.input_target(source.index) else {
                log::warn!("Constraint source {} is not readable on {owner:?}", source.index);
                return None;
            };
            resolved.push(PropertyTarget::new(owner, property, component));
        }
        Some((PropertyTarget::new(target, property, component), resolved))
    }

    /// Sends the update-side constraint once everything it touches is on the
    /// scene.
    pub(crate) fn connect(
        &mut self,
        id: ConstraintId,
        objects: &SlotMap<ObjectId, Object>,
        queue: &mut MessageQueue,
    ) -> bool {
        if !self.applied || self.connected {
            return self.connected;
        }
        let Some(target) = self.target else {
            return false;
        };
        let Some((target_property, sources)) = self.resolve(target, objects) else {
            return false;
        };

        queue.push(Message::ApplyConstraint {
            object: target,
            phase: self.phase,
            constraint: Box::new(SceneConstraint::new(
                id,
                target_property,
                sources,
                self.function.clone(),
                self.remove_action,
                self.apply_rate,
            )),
        });
        if !target_property.property.is_transform() {
            let resetter = match self.apply_rate {
                ApplyRate::Always => PropertyResetter::constraint(target_property, id),
                ApplyRate::Once => PropertyResetter::baker(target_property, Lifetime::Bake),
            };
            queue.push(Message::AddResetter(resetter));
        }

        log::debug!("Constraint {id:?} connected to {target:?}");
        self.connected = true;
        true
    }

    /// Detaches the update-side constraint; it stays applied.
    pub(crate) fn disconnect(&mut self, id: ConstraintId, queue: &mut MessageQueue) {
        if !self.connected {
            return;
        }
        if let Some(object) = self.target {
            queue.push(Message::RemoveConstraint { object, id });
        }
        log::debug!("Constraint {id:?} disconnected");
        self.connected = false;
    }
}

// ============================================================================
// Engine: Constraints
// ============================================================================

impl Engine {
    /// Creates a detached constraint on `property` of `target`. The callback
    /// receives the current value and must match the property type.
    pub fn create_constraint<T, F>(&mut self, target: ObjectId, property: PropertyIndex, f: F) -> Result<ConstraintId>
    where
        T: PropertyKind,
        F: Fn(&mut T, &PropertyInputs<'_>) + Send + Sync + 'static,
    {
        let object = self.object_ref(target)?;
        let expected = object
            .property_type(property)
            .ok_or(KinemaError::PropertyNotFound(property))?;
        if !object.is_property_animatable(property) {
            return Err(KinemaError::PropertyNotAnimatable(property));
        }
        if expected != T::TYPE {
            return Err(KinemaError::TypeMismatch {
                expected,
                found: T::TYPE,
            });
        }

        let function = ConstraintFunction::new(f);
        Ok(self.constraints.insert(Constraint::new(target, property, function)))
    }

    #[inline]
    #[must_use]
    pub fn constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(id)
    }

    /// Settings edits (tag, remove action, apply rate) go through here.
    #[inline]
    pub fn constraint_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint> {
        self.constraints.get_mut(id)
    }

    #[must_use]
    pub fn constraint_state(&self, id: ConstraintId) -> Option<ConstraintState> {
        self.constraints.get(id).map(Constraint::state)
    }

    /// Appends an input. Sources must be added before the constraint is
    /// applied.
    pub fn add_constraint_source(&mut self, id: ConstraintId, source: ConstraintSource) -> Result<()> {
        let constraint = self.constraints.get(id).ok_or(KinemaError::ConstraintNotFound(id))?;
        ensure_invariant!(@ret Ok(()); !constraint.applied, "Sources must be added before the constraint is applied");
        let Some(target) = constraint.target else {
            return Ok(());
        };

        let checked = match source.kind {
            SourceKind::ObjectProperty(object) => Some(object),
            SourceKind::LocalProperty => Some(target),
            SourceKind::ParentProperty => None,
        };
        if let Some(object) = checked {
            let owner = self.object_ref(object)?;
            if !owner.is_property_a_constraint_input(source.index) {
                return Err(KinemaError::NotAConstraintInput(source.index));
            }
        }

        if let Some(constraint) = self.constraints.get_mut(id) {
            constraint.sources.push(source);
        }
        Ok(())
    }

    /// Starts evaluating before post constraints. A no-op when already
    /// applied or disabled by a destroyed object.
    pub fn apply_constraint(&mut self, id: ConstraintId) -> Result<()> {
        self.apply_in_phase(id, ConstraintPhase::Pre)
    }

    /// Like [`apply_constraint`](Self::apply_constraint), evaluated after
    /// every pre constraint.
    pub fn apply_post_constraint(&mut self, id: ConstraintId) -> Result<()> {
        self.apply_in_phase(id, ConstraintPhase::Post)
    }

    fn apply_in_phase(&mut self, id: ConstraintId, phase: ConstraintPhase) -> Result<()> {
        let Self {
            constraints,
            objects,
            queue,
            ..
        } = self;
        let constraint = constraints.get_mut(id).ok_or(KinemaError::ConstraintNotFound(id))?;
        if constraint.applied || constraint.target.is_none() {
            return Ok(());
        }
        constraint.applied = true;
        constraint.phase = phase;
        constraint.connect(id, objects, queue);
        Ok(())
    }

    /// Stops evaluation; the remove action decides what the target keeps.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<()> {
        let constraint = self
            .constraints
            .get_mut(id)
            .ok_or(KinemaError::ConstraintNotFound(id))?;
        constraint.disconnect(id, &mut self.queue);
        constraint.applied = false;
        Ok(())
    }

    pub fn destroy_constraint(&mut self, id: ConstraintId) -> Result<()> {
        self.remove_constraint(id)?;
        self.constraints.remove(id);
        Ok(())
    }

    /// Removes the default and custom tagged constraints targeting `object`.
    pub fn remove_constraints(&mut self, object: ObjectId) -> Result<()> {
        self.object_ref(object)?;
        self.remove_constraints_where(|constraint| {
            constraint.target == Some(object) && constraint.tag <= CUSTOM_CONSTRAINT_TAG_MAX
        });
        Ok(())
    }

    /// Removes the constraints targeting `object` that carry `tag`.
    pub fn remove_constraints_with_tag(&mut self, object: ObjectId, tag: u32) -> Result<()> {
        self.object_ref(object)?;
        self.remove_constraints_where(|constraint| constraint.target == Some(object) && constraint.tag == tag);
        Ok(())
    }

    fn remove_constraints_where(&mut self, predicate: impl Fn(&Constraint) -> bool) {
        for (id, constraint) in &mut self.constraints {
            if constraint.applied && predicate(constraint) {
                constraint.disconnect(id, &mut self.queue);
                constraint.applied = false;
            }
        }
    }

    /// Copies a constraint onto `target`. Local and parent sources resolve
    /// against the new target; the copy starts detached.
    pub fn clone_constraint(&mut self, id: ConstraintId, target: ObjectId) -> Result<ConstraintId> {
        let source = self.constraints.get(id).ok_or(KinemaError::ConstraintNotFound(id))?;
        let object = self.object_ref(target)?;
        let expected = object
            .property_type(source.target_index)
            .ok_or(KinemaError::PropertyNotFound(source.target_index))?;
        if expected != source.function.value_type() {
            return Err(KinemaError::TypeMismatch {
                expected,
                found: source.function.value_type(),
            });
        }

        let mut clone = Constraint::new(target, source.target_index, source.function.clone());
        clone.sources.clone_from(&source.sources);
        clone.remove_action = source.remove_action;
        clone.apply_rate = source.apply_rate;
        clone.tag = source.tag;
        Ok(self.constraints.insert(clone))
    }

    // ========================================================================
    // Object Lifecycle Hooks
    // ========================================================================

    pub(crate) fn on_scene_object_added(&mut self, object: ObjectId) {
        let Self {
            constraints,
            objects,
            queue,
            ..
        } = self;
        for (id, constraint) in constraints.iter_mut() {
            if constraint.applied && constraint.references(object) {
                constraint.connect(id, objects, queue);
            }
        }
    }

    pub(crate) fn on_scene_object_removed(&mut self, object: ObjectId) {
        for (id, constraint) in &mut self.constraints {
            if constraint.references(object) {
                constraint.disconnect(id, &mut self.queue);
            }
        }
    }

    /// Disables every constraint targeting or reading `object`, for good.
    pub(crate) fn on_object_destroyed(&mut self, object: ObjectId) {
        for (id, constraint) in &mut self.constraints {
            if !constraint.references(object) {
                continue;
            }
            constraint.disconnect(id, &mut self.queue);
            constraint.sources.clear();
            constraint.target = None;
            log::debug!("Constraint {id:?} disabled: {object:?} destroyed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::INTERNAL_CONSTRAINT_TAG_MIN;

    fn constraint() -> Constraint {
        let mut keys: SlotMap<ObjectId, ()> = SlotMap::with_key();
        let function = ConstraintFunction::new(|_: &mut f32, _: &PropertyInputs<'_>| {});
        Constraint::new(keys.insert(()), PropertyIndex::COLOR_ALPHA, function)
    }

    #[test]
    fn default_tag_moves_freely() {
        let mut c = constraint();
        c.set_tag(5);
        c.set_tag(DEFAULT_CONSTRAINT_TAG);
        c.set_internal_tag(INTERNAL_CONSTRAINT_TAG_MIN);
        assert_eq!(c.tag(), INTERNAL_CONSTRAINT_TAG_MIN);
    }

    #[test]
    #[should_panic(expected = "Cross tag setting is not allowed!")]
    fn custom_to_internal_panics() {
        let mut c = constraint();
        c.set_tag(5);
        c.set_internal_tag(INTERNAL_CONSTRAINT_TAG_MIN);
    }

    #[test]
    fn state_follows_lifecycle_flags() {
        let mut c = constraint();
        assert_eq!(c.state(), ConstraintState::Detached);
        c.applied = true;
        assert_eq!(c.state(), ConstraintState::Pending);
        c.connected = true;
        assert_eq!(c.state(), ConstraintState::Connected);
        c.target = None;
        assert_eq!(c.state(), ConstraintState::ObjectDestroyed);
    }
}
