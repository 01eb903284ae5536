use slotmap::SlotMap;

use super::alpha::AlphaFunction;
use super::animator::{Animator, AnimatorId, TimePeriod};
use super::function::AnimatorFunction;
use super::keyframes::KeyFrameCursor;
use crate::event::Object;
use crate::property::{PropertyIndex, PropertyTarget, PropertyValue};
use crate::scene::ObjectId;

/// Producer-side record of an animator that has not necessarily been
/// created yet.
///
/// The connector holds only the object handle; it never keeps the object
/// alive. The scene-side [`Animator`] is built the first time the owning
/// animation is played while the target still exists.
#[derive(Debug, Clone)]
pub struct AnimatorConnector {
    object: ObjectId,
    property: PropertyIndex,
    function: AnimatorFunction,
    alpha_function: AlphaFunction,
    period: TimePeriod,
    animator: Option<AnimatorId>,
}

impl AnimatorConnector {
    #[must_use]
    pub fn new(
        object: ObjectId,
        property: PropertyIndex,
        function: AnimatorFunction,
        alpha_function: AlphaFunction,
        period: TimePeriod,
    ) -> Self {
        Self {
            object,
            property,
            function,
            alpha_function,
            period,
            animator: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    #[inline]
    #[must_use]
    pub fn property(&self) -> PropertyIndex {
        self.property
    }

    #[inline]
    #[must_use]
    pub fn function(&self) -> &AnimatorFunction {
        &self.function
    }

    #[inline]
    #[must_use]
    pub fn period(&self) -> TimePeriod {
        self.period
    }

    /// The scene-side animator, once created.
    #[inline]
    #[must_use]
    pub fn animator(&self) -> Option<AnimatorId> {
        self.animator
    }

    /// Value the property holds when playback rests at `elapsed` seconds of
    /// animation time, starting from `base`.
    #[must_use]
    pub fn value_at(&self, base: &PropertyValue, elapsed: f32) -> Option<PropertyValue> {
        if elapsed < self.period.delay {
            return Some(*base);
        }
        if self.period.duration <= 0.0 || elapsed >= self.period.end() {
            return self.function.final_value(base);
        }
        let progress = (elapsed - self.period.delay) / self.period.duration;
        let alpha = self.alpha_function.apply(progress);
        self.function.evaluate(alpha, base, &mut KeyFrameCursor::default())
    }

    /// Scene-side address of the driven property, while the object lives.
    pub(crate) fn resolve_target(&self, objects: &SlotMap<ObjectId, Object>) -> Option<PropertyTarget> {
        let Some(object) = objects.get(self.object) else {
            log::debug!("Animator target {:?} destroyed before play", self.object);
            return None;
        };
        let (property, component) = object.animatable_target(self.property)?;
        Some(PropertyTarget::new(self.object, property, component))
    }

    /// Builds the scene-side animator if it does not exist yet and the
    /// target object is still alive.
    pub(crate) fn connect(
        &mut self,
        objects: &SlotMap<ObjectId, Object>,
        id: AnimatorId,
    ) -> Option<Animator> {
        if self.animator.is_some() {
            return None;
        }
        let target = self.resolve_target(objects)?;

        self.animator = Some(id);
        Some(Animator::new(
            id,
            target,
            self.function.clone(),
            self.alpha_function,
            self.period,
        ))
    }
}
