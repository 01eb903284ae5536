//! Update-side scene graph.
//!
//! Owns every [`Node`] and the [`TransformManager`]. All property access from
//! animators, constraints and resetters goes through [`SceneGraph::read`],
//! [`SceneGraph::write`] and [`SceneGraph::reset_property`], which route a
//! [`PropertyTarget`] to either a node cell or the transform manager.

use glam::{Affine3A, Mat4};
use slotmap::SecondaryMap;

use super::{ColorMode, Node, NodeInit, ObjectId};
use crate::constraint::{ConstraintId, ConstraintPhase, SceneConstraint};
use crate::property::{BufferIndex, Color, Component, PropertyCell, PropertyRef, PropertyTarget, PropertyValue};
use crate::transform::{InheritanceMode, TransformManager, TransformProperty};

/// How a write reaches the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Current slot only; undone by the next reset.
    Set,
    /// Base value and current slot.
    Bake,
    /// Bake `current + value`.
    BakeRelative,
    /// Bake `current * value` (component-wise for vectors).
    BakeMultiply,
}

impl WriteMode {
    #[inline]
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        !matches!(self, Self::Set)
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    pub(crate) nodes: SecondaryMap<ObjectId, Node>,
    pub(crate) roots: Vec<ObjectId>,
    pub(crate) transforms: TransformManager,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, object: ObjectId) -> bool {
        self.nodes.contains_key(object)
    }

    #[inline]
    #[must_use]
    pub fn node(&self, object: ObjectId) -> Option<&Node> {
        self.nodes.get(object)
    }

    #[inline]
    #[must_use]
    pub fn is_connected(&self, object: ObjectId) -> bool {
        self.nodes.get(object).is_some_and(|node| node.connected)
    }

    #[inline]
    #[must_use]
    pub fn transforms(&self) -> &TransformManager {
        &self.transforms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // Structure
    // ========================================================================

    pub(crate) fn install_node(&mut self, object: ObjectId, init: &NodeInit) {
        let transform_id = self.transforms.create_transform();
        let tm = &mut self.transforms;
        tm.bake_vector3(transform_id, TransformProperty::Position, init.position);
        tm.bake_vector3(transform_id, TransformProperty::Scale, init.scale);
        tm.bake_vector3(transform_id, TransformProperty::Size, init.size);
        tm.bake_vector3(transform_id, TransformProperty::ParentOrigin, init.parent_origin);
        tm.bake_vector3(transform_id, TransformProperty::AnchorPoint, init.anchor_point);
        tm.bake_orientation(transform_id, init.orientation);
        tm.set_position_uses_anchor_point(transform_id, init.position_uses_anchor_point);
        tm.set_inherit_position(transform_id, init.inheritance.contains(InheritanceMode::POSITION));
        tm.set_inherit_orientation(transform_id, init.inheritance.contains(InheritanceMode::ORIENTATION));
        tm.set_inherit_scale(transform_id, init.inheritance.contains(InheritanceMode::SCALE));

        if let Some(previous) = self.nodes.insert(object, Node::new(transform_id, init)) {
            log::warn!("Node {object:?} installed twice; replacing");
            self.transforms.remove_transform(previous.transform_id);
        }
    }

    /// Makes `object` a root of the traversal.
    pub(crate) fn add_root(&mut self, object: ObjectId) {
        if self.contains(object) && !self.roots.contains(&object) {
            self.roots.push(object);
        }
    }

    pub(crate) fn destroy_node(&mut self, object: ObjectId) -> Option<Node> {
        self.detach_from_parent(object);
        let node = self.nodes.remove(object)?;
        for &child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
                self.transforms.set_parent(child_node.transform_id, None);
            }
        }
        self.roots.retain(|&root| root != object);
        self.transforms.remove_transform(node.transform_id);
        Some(node)
    }

    pub(crate) fn set_parent(&mut self, object: ObjectId, parent: Option<ObjectId>) {
        if !self.contains(object) {
            return;
        }
        self.detach_from_parent(object);

        let parent_transform = match parent {
            Some(parent_id) => {
                let Some(parent_node) = self.nodes.get_mut(parent_id) else {
                    log::warn!("Parent {parent_id:?} has no scene node");
                    return;
                };
                parent_node.children.push(object);
                Some(parent_node.transform_id)
            }
            None => None,
        };

        if let Some(node) = self.nodes.get_mut(object) {
            node.parent = parent;
            self.transforms.set_parent(node.transform_id, parent_transform);
        }
    }

    fn detach_from_parent(&mut self, object: ObjectId) {
        let Some(parent) = self.nodes.get(object).and_then(|node| node.parent) else {
            return;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|&child| child != object);
        }
        if let Some(node) = self.nodes.get_mut(object) {
            node.parent = None;
            self.transforms.set_parent(node.transform_id, None);
        }
    }

    pub(crate) fn set_connected(&mut self, object: ObjectId, connected: bool) {
        if let Some(node) = self.nodes.get_mut(object) {
            node.connected = connected;
        }
    }

    pub(crate) fn set_color_mode(&mut self, object: ObjectId, mode: ColorMode) {
        if let Some(node) = self.nodes.get_mut(object) {
            node.color_mode = mode;
        }
    }

    pub(crate) fn set_transform_flags(
        &mut self,
        object: ObjectId,
        inheritance: InheritanceMode,
        position_uses_anchor_point: bool,
    ) {
        let Some(node) = self.nodes.get(object) else {
            return;
        };
        let id = node.transform_id;
        let tm = &mut self.transforms;
        tm.set_inherit_position(id, inheritance.contains(InheritanceMode::POSITION));
        tm.set_inherit_orientation(id, inheritance.contains(InheritanceMode::ORIENTATION));
        tm.set_inherit_scale(id, inheritance.contains(InheritanceMode::SCALE));
        tm.set_position_uses_anchor_point(id, position_uses_anchor_point);
    }

    pub(crate) fn register_property(&mut self, object: ObjectId, slot: usize, initial: PropertyValue) {
        let Some(node) = self.nodes.get_mut(object) else {
            return;
        };
        if slot != node.custom.len() {
            log::warn!("Custom property slot {slot} registered out of order on {object:?}");
            return;
        }
        node.custom.push(PropertyCell::new(initial));
    }

    pub(crate) fn transforms_mut(&mut self) -> &mut TransformManager {
        &mut self.transforms
    }

    // ========================================================================
    // Property Access
    // ========================================================================

    /// Reads the value of `target` in the `index` slot.
    #[must_use]
    pub fn read(&self, target: &PropertyTarget, index: BufferIndex) -> Option<PropertyValue> {
        let node = self.nodes.get(target.object)?;
        let value = self.read_node(node, target.property, index)?;
        project(value, target.component)
    }

    /// Reads `target` the way a constraint sees it during the update of
    /// `index`: inherited values come from the previous tick.
    #[must_use]
    pub fn read_input(&self, target: &PropertyTarget, index: BufferIndex) -> Option<PropertyValue> {
        let node = self.nodes.get(target.object)?;
        let value = match target.property {
            PropertyRef::WorldColor => PropertyValue::Color(node.world_color.constraint_input(index)),
            other => self.read_node(node, other, index)?,
        };
        project(value, target.component)
    }

    /// Whether `target` holds a meaningful value yet.
    #[must_use]
    pub fn input_initialized(&self, target: &PropertyTarget) -> bool {
        match self.nodes.get(target.object) {
            Some(node) if target.property == PropertyRef::WorldColor => node.world_color.input_initialized(),
            Some(_) => true,
            None => false,
        }
    }

    fn read_node(&self, node: &Node, property: PropertyRef, index: BufferIndex) -> Option<PropertyValue> {
        let tm = &self.transforms;
        let id = node.transform_id;
        Some(match property {
            PropertyRef::Custom(slot) => node.custom.get(slot)?.get(index),
            PropertyRef::Color => node.color.get(index),
            PropertyRef::Visible => node.visible.get(index),
            PropertyRef::Transform(p) => PropertyValue::Vector3(tm.vector3(id, p)?),
            PropertyRef::Orientation => PropertyValue::Rotation(tm.orientation(id)?),
            PropertyRef::WorldPosition => PropertyValue::Vector3(tm.world_position(id, index)?),
            PropertyRef::WorldOrientation => PropertyValue::Rotation(tm.world_orientation(id, index)?),
            PropertyRef::WorldScale => PropertyValue::Vector3(tm.world_scale(id, index)?),
            PropertyRef::WorldMatrix => PropertyValue::Matrix(Mat4::from(tm.world_matrix(id, index)?)),
            PropertyRef::WorldColor => PropertyValue::Color(node.world_color.get(index)),
        })
    }

    /// Writes `value` into `target`. Returns `false` when the owner is gone,
    /// the property is derived, or the value does not fit.
    pub fn write(
        &mut self,
        target: &PropertyTarget,
        index: BufferIndex,
        value: &PropertyValue,
        mode: WriteMode,
    ) -> bool {
        let Some(node) = self.nodes.get_mut(target.object) else {
            return false;
        };
        let transform_id = node.transform_id;

        match target.property {
            PropertyRef::Custom(slot) => match node.custom.get_mut(slot) {
                Some(cell) => write_cell(cell, index, target.component, value, mode),
                None => false,
            },
            PropertyRef::Color => write_cell(&mut node.color, index, target.component, value, mode),
            PropertyRef::Visible => write_cell(&mut node.visible, index, target.component, value, mode),
            PropertyRef::Transform(property) => {
                let tm = &mut self.transforms;
                let Some(current) = tm.vector3(transform_id, property) else {
                    return false;
                };
                let current = PropertyValue::Vector3(current);
                let Some(PropertyValue::Vector3(next)) = compose(&current, target.component, value, mode) else {
                    return false;
                };
                match (target.component, mode.is_persistent()) {
                    (_, false) => tm.set_vector3(transform_id, property, next),
                    (Some(component), true) => {
                        tm.bake_vector3_component(transform_id, property, component, next[component.index()]);
                    }
                    (None, true) => tm.bake_vector3(transform_id, property, next),
                }
                true
            }
            PropertyRef::Orientation => {
                let tm = &mut self.transforms;
                let Some(current) = tm.orientation(transform_id) else {
                    return false;
                };
                let Some(PropertyValue::Rotation(next)) =
                    compose(&PropertyValue::Rotation(current), None, value, mode)
                else {
                    return false;
                };
                if mode.is_persistent() {
                    tm.bake_orientation(transform_id, next);
                } else {
                    tm.set_orientation(transform_id, next);
                }
                true
            }
            PropertyRef::WorldPosition
            | PropertyRef::WorldOrientation
            | PropertyRef::WorldScale
            | PropertyRef::WorldColor
            | PropertyRef::WorldMatrix => {
                log::warn!("Ignoring write to derived property {:?}", target.property);
                false
            }
        }
    }

    /// Copies the base value of a cell-backed property into `index`.
    /// Transform properties are reset in bulk by the transform manager.
    pub(crate) fn reset_property(&mut self, target: &PropertyTarget, index: BufferIndex) {
        let Some(node) = self.nodes.get_mut(target.object) else {
            return;
        };
        match target.property {
            PropertyRef::Custom(slot) => {
                if let Some(cell) = node.custom.get_mut(slot) {
                    cell.reset_to_base_value(index);
                }
            }
            PropertyRef::Color => node.color.reset_to_base_value(index),
            PropertyRef::Visible => node.visible.reset_to_base_value(index),
            _ => {}
        }
    }

    #[must_use]
    pub fn world_matrix(&self, object: ObjectId, index: BufferIndex) -> Option<Affine3A> {
        let node = self.nodes.get(object)?;
        self.transforms.world_matrix(node.transform_id, index)
    }

    // ========================================================================
    // Traversal Passes
    // ========================================================================

    /// Depth-first pre-order over connected nodes, children in insertion
    /// order. Constraints are evaluated in exactly this order.
    #[must_use]
    pub fn evaluation_order(&self) -> Vec<ObjectId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<ObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if !node.connected {
                continue;
            }
            order.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        order
    }

    pub(crate) fn attach_constraint(&mut self, object: ObjectId, phase: ConstraintPhase, constraint: SceneConstraint) {
        match self.nodes.get_mut(object) {
            Some(node) => node.constraints_mut(phase).push(constraint),
            None => log::debug!("Constraint {:?} dropped: {object:?} has no node", constraint.id()),
        }
    }

    /// Removes constraint `id` from `object`, applying its remove action.
    pub(crate) fn detach_constraint(&mut self, object: ObjectId, id: ConstraintId, index: BufferIndex) {
        let Some(node) = self.nodes.get_mut(object) else {
            return;
        };
        let mut removed = None;
        for phase in [ConstraintPhase::Pre, ConstraintPhase::Post] {
            let list = node.constraints_mut(phase);
            if let Some(at) = list.iter().position(|c| c.id() == id) {
                removed = Some(list.remove(at));
                break;
            }
        }
        if let Some(constraint) = removed {
            constraint.on_detach(self, index);
        }
    }

    /// Runs the constraints of `phase` for every node in `order`.
    pub(crate) fn apply_constraints(&mut self, index: BufferIndex, phase: ConstraintPhase, order: &[ObjectId]) {
        for &object in order {
            let Some(node) = self.nodes.get_mut(object) else {
                continue;
            };
            let list = node.constraints_mut(phase);
            if list.is_empty() {
                continue;
            }
            let mut constraints = std::mem::take(list);

            for constraint in &mut constraints {
                constraint.apply(self, index);
            }

            if let Some(node) = self.nodes.get_mut(object) {
                *node.constraints_mut(phase) = constraints;
            }
        }
    }

    /// Recomputes world colors of connected nodes; disconnected nodes carry
    /// their previous value forward.
    pub(crate) fn update_world_colors(&mut self, index: BufferIndex) {
        for (_, node) in &mut self.nodes {
            node.world_color.copy_previous(index);
        }

        let mut stack: Vec<(ObjectId, Option<Color>)> =
            self.roots.iter().rev().map(|&root| (root, None)).collect();
        while let Some((id, parent_color)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if !node.connected {
                continue;
            }
            let own = node.color(index);
            let world = parent_color.map_or(own, |parent| node.color_mode.combine(own, parent));
            node.world_color.set(index, world);
            stack.extend(node.children.iter().rev().map(|&child| (child, Some(world))));
        }
    }
}

fn project(value: PropertyValue, component: Option<Component>) -> Option<PropertyValue> {
    match component {
        Some(component) => value.component(component).map(PropertyValue::Float),
        None => Some(value),
    }
}

/// Computes the full value that results from applying `value` to `current`.
fn compose(
    current: &PropertyValue,
    component: Option<Component>,
    value: &PropertyValue,
    mode: WriteMode,
) -> Option<PropertyValue> {
    if let Some(component) = component {
        let PropertyValue::Float(v) = *value else {
            return None;
        };
        let old = current.component(component)?;
        let next = match mode {
            WriteMode::Set | WriteMode::Bake => v,
            WriteMode::BakeRelative => old + v,
            WriteMode::BakeMultiply => old * v,
        };
        return current.with_component(component, next);
    }

    match mode {
        WriteMode::Set | WriteMode::Bake => {
            (value.property_type() == current.property_type()).then_some(*value)
        }
        WriteMode::BakeRelative => match (current, value) {
            (PropertyValue::Rotation(a), PropertyValue::Rotation(b)) => {
                Some(PropertyValue::Rotation((*a * *b).normalize()))
            }
            _ => current.add_scaled(value, 1.0),
        },
        WriteMode::BakeMultiply => match (current, value) {
            (PropertyValue::Float(a), PropertyValue::Float(b)) => Some(PropertyValue::Float(a * b)),
            (PropertyValue::Vector2(a), PropertyValue::Vector2(b)) => Some(PropertyValue::Vector2(*a * *b)),
            (PropertyValue::Vector3(a), PropertyValue::Vector3(b)) => Some(PropertyValue::Vector3(*a * *b)),
            (PropertyValue::Vector4(a), PropertyValue::Vector4(b)) => Some(PropertyValue::Vector4(*a * *b)),
            (PropertyValue::Rotation(a), PropertyValue::Rotation(b)) => {
                Some(PropertyValue::Rotation((*a * *b).normalize()))
            }
            _ => None,
        },
    }
}

fn write_cell(
    cell: &mut PropertyCell,
    index: BufferIndex,
    component: Option<Component>,
    value: &PropertyValue,
    mode: WriteMode,
) -> bool {
    let current = cell.get(index);
    let Some(next) = compose(&current, component, value, mode) else {
        return false;
    };
    match (component, mode.is_persistent()) {
        (_, false) => cell.set(index, &next),
        (Some(component), true) => match next.component(component) {
            Some(v) => cell.bake_component(index, component, v),
            None => false,
        },
        (None, true) => cell.bake(index, &next),
    }
}
