use glam::{Quat, Vec3};

use crate::constraint::{ConstraintId, ConstraintPhase, SceneConstraint};
use crate::property::{BufferIndex, Color, InheritedProperty, PropertyCell, PropertyValue};
use crate::transform::{DEFAULT_ANCHOR_POINT, DEFAULT_PARENT_ORIGIN, InheritanceMode, TransformId};

use super::ObjectId;

/// How a node's world color is derived from its parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    UseOwnColor,
    UseParentColor,
    #[default]
    UseOwnMultiplyParentColor,
    UseOwnMultiplyParentAlpha,
}

impl ColorMode {
    #[must_use]
    pub fn combine(self, own: Color, parent: Color) -> Color {
        match self {
            Self::UseOwnColor => own,
            Self::UseParentColor => parent,
            Self::UseOwnMultiplyParentColor => Color(own.0 * parent.0),
            Self::UseOwnMultiplyParentAlpha => {
                let mut color = own;
                color.0.w *= parent.alpha();
                color
            }
        }
    }
}

/// Initial state of a node, snapshotted from the producer-side object.
#[derive(Debug, Clone)]
pub struct NodeInit {
    pub position: Vec3,
    pub orientation: Quat,
    pub scale: Vec3,
    pub size: Vec3,
    pub parent_origin: Vec3,
    pub anchor_point: Vec3,
    pub color: Color,
    pub visible: bool,
    pub color_mode: ColorMode,
    pub inheritance: InheritanceMode,
    pub position_uses_anchor_point: bool,
    pub custom: Vec<PropertyValue>,
}

impl Default for NodeInit {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
            size: Vec3::ZERO,
            parent_origin: DEFAULT_PARENT_ORIGIN,
            anchor_point: DEFAULT_ANCHOR_POINT,
            color: Color::WHITE,
            visible: true,
            color_mode: ColorMode::default(),
            inheritance: InheritanceMode::all(),
            position_uses_anchor_point: true,
            custom: Vec::new(),
        }
    }
}

/// Update-side property owner.
///
/// Transform data lives in the transform manager under `transform_id`; the
/// node keeps the remaining double-buffered state and its constraint lists.
#[derive(Debug)]
pub struct Node {
    pub(crate) transform_id: TransformId,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,

    pub(crate) color: PropertyCell,
    pub(crate) visible: PropertyCell,
    pub(crate) world_color: InheritedProperty<Color>,
    pub(crate) color_mode: ColorMode,
    pub(crate) custom: Vec<PropertyCell>,

    pub(crate) constraints: Vec<SceneConstraint>,
    pub(crate) post_constraints: Vec<SceneConstraint>,

    /// Part of the rendered scene. Animators of disconnected nodes are
    /// disabled and their constraints are detached.
    pub(crate) connected: bool,
}

impl Node {
    pub(crate) fn new(transform_id: TransformId, init: &NodeInit) -> Self {
        Self {
            transform_id,
            parent: None,
            children: Vec::new(),
            color: PropertyCell::new(PropertyValue::Color(init.color)),
            visible: PropertyCell::new(PropertyValue::Boolean(init.visible)),
            world_color: InheritedProperty::new(init.color),
            color_mode: init.color_mode,
            custom: init.custom.iter().copied().map(PropertyCell::new).collect(),
            constraints: Vec::new(),
            post_constraints: Vec::new(),
            connected: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn transform_id(&self) -> TransformId {
        self.transform_id
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn color(&self, index: BufferIndex) -> Color {
        match self.color.get(index) {
            PropertyValue::Color(color) => color,
            _ => Color::WHITE,
        }
    }

    #[must_use]
    pub fn world_color(&self, index: BufferIndex) -> Color {
        self.world_color.get(index)
    }

    #[must_use]
    pub fn is_visible(&self, index: BufferIndex) -> bool {
        matches!(self.visible.get(index), PropertyValue::Boolean(true))
    }

    #[must_use]
    pub fn constraint_count(&self, phase: ConstraintPhase) -> usize {
        match phase {
            ConstraintPhase::Pre => self.constraints.len(),
            ConstraintPhase::Post => self.post_constraints.len(),
        }
    }

    #[must_use]
    pub fn has_constraint(&self, id: ConstraintId) -> bool {
        self.constraints.iter().chain(&self.post_constraints).any(|c| c.id() == id)
    }

    pub(crate) fn constraints_mut(&mut self, phase: ConstraintPhase) -> &mut Vec<SceneConstraint> {
        match phase {
            ConstraintPhase::Pre => &mut self.constraints,
            ConstraintPhase::Post => &mut self.post_constraints,
        }
    }
}
