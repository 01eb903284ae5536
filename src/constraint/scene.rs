use std::fmt;

use smallvec::SmallVec;

use super::function::{ConstraintFunction, PropertyInputs};
use super::{ApplyRate, ConstraintId, RemoveAction};
use crate::property::{BufferIndex, PropertyTarget, PropertyValue};
use crate::scene::{SceneGraph, WriteMode};

/// Update-side constraint attached to its target's node.
pub struct SceneConstraint {
    id: ConstraintId,
    target: PropertyTarget,
    sources: SmallVec<[PropertyTarget; 4]>,
    function: ConstraintFunction,
    remove_action: RemoveAction,
    apply_rate: ApplyRate,

    applied_once: bool,
    last_value: Option<PropertyValue>,
    /// Scratch buffer reused across ticks.
    inputs: Vec<PropertyValue>,
}

impl SceneConstraint {
    pub(crate) fn new(
        id: ConstraintId,
        target: PropertyTarget,
        sources: SmallVec<[PropertyTarget; 4]>,
        function: ConstraintFunction,
        remove_action: RemoveAction,
        apply_rate: ApplyRate,
    ) -> Self {
        let inputs = Vec::with_capacity(sources.len());
        Self {
            id,
            target,
            sources,
            function,
            remove_action,
            apply_rate,
            applied_once: false,
            last_value: None,
            inputs,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ConstraintId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> &PropertyTarget {
        &self.target
    }

    /// Last value written to the target.
    #[inline]
    #[must_use]
    pub fn last_value(&self) -> Option<PropertyValue> {
        self.last_value
    }

    /// Evaluates the function and writes the target. Skipped while any
    /// source is gone or not yet initialized.
    pub(crate) fn apply(&mut self, graph: &mut SceneGraph, index: BufferIndex) {
        if self.apply_rate == ApplyRate::Once && self.applied_once {
            return;
        }

        self.inputs.clear();
        for source in &self.sources {
            if !graph.input_initialized(source) {
                return;
            }
            let Some(value) = graph.read_input(source, index) else {
                return;
            };
            self.inputs.push(value);
        }

        let Some(mut current) = graph.read(&self.target, index) else {
            return;
        };
        self.function.call(&mut current, &PropertyInputs::new(&self.inputs));

        let mode = match self.apply_rate {
            ApplyRate::Always => WriteMode::Set,
            ApplyRate::Once => WriteMode::Bake,
        };
        if graph.write(&self.target, index, &current, mode) {
            self.last_value = Some(current);
            self.applied_once = true;
        }
    }

    /// Applies the remove action as the constraint leaves its node.
    pub(crate) fn on_detach(&self, graph: &mut SceneGraph, index: BufferIndex) {
        if self.remove_action != RemoveAction::Bake {
            return;
        }
        if let Some(value) = self.last_value {
            graph.write(&self.target, index, &value, WriteMode::Bake);
        }
    }
}

impl fmt::Debug for SceneConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneConstraint")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("sources", &self.sources)
            .field("apply_rate", &self.apply_rate)
            .finish_non_exhaustive()
    }
}
