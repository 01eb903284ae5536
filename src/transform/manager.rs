//! Transform Manager
//!
//! Structure-of-arrays storage for node transforms.
//!
//! # Data Flow
//!
//! ```text
//! reset_to_base_value()    animators / constraints     update(index)
//!  base ──► current  ──►   set_* / bake_*   ──►  local (cached) ──► world[index]
//! ```
//!
//! - Local matrices are cached and recomputed only when a component (or the
//!   parent's size) changed.
//! - World outputs are double-buffered: [`update`](TransformManager::update)
//!   writes the slot of the update index, consumers read the other slot.
//! - Removal swaps the last entry into the hole and schedules a reorder, so
//!   parents always precede their children when the next batch runs.

use glam::{Affine3A, Quat, Vec3, Vec4};
use slotmap::SlotMap;

use super::{InheritanceMode, TransformId, TransformProperty};
use crate::errors::ensure_invariant;
use crate::property::{BufferIndex, Component};

const HALF: Vec3 = Vec3::new(0.5, 0.5, 0.5);
const TOP_LEFT: Vec3 = Vec3::new(0.0, 0.0, 0.5);

/// Anchor point of new entries: the center of the node.
pub const DEFAULT_ANCHOR_POINT: Vec3 = HALF;
/// Parent origin of new entries: the parent's top-left corner.
pub const DEFAULT_PARENT_ORIGIN: Vec3 = TOP_LEFT;

#[derive(Debug, Clone, Copy, PartialEq)]
struct AnimatableComponents {
    position: Vec3,
    orientation: Quat,
    scale: Vec3,
}

impl Default for AnimatableComponents {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct StaticComponents {
    anchor_point: Vec3,
    parent_origin: Vec3,
    position_uses_anchor_point: bool,
}

impl Default for StaticComponents {
    fn default() -> Self {
        Self {
            anchor_point: DEFAULT_ANCHOR_POINT,
            parent_origin: DEFAULT_PARENT_ORIGIN,
            position_uses_anchor_point: true,
        }
    }
}

/// Per-entry result of a batch pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldOutput {
    pub matrix: Affine3A,
    /// xyz = center, w = radius.
    pub bounding_sphere: Vec4,
}

impl Default for WorldOutput {
    fn default() -> Self {
        Self {
            matrix: Affine3A::IDENTITY,
            bounding_sphere: Vec4::ZERO,
        }
    }
}

/// Batched transform storage. See the module documentation.
#[derive(Debug, Default)]
pub struct TransformManager {
    /// Handle → dense index.
    ids: SlotMap<TransformId, usize>,
    /// Dense index → handle.
    component_ids: Vec<TransformId>,

    animatable: Vec<AnimatableComponents>,
    animatable_base: Vec<AnimatableComponents>,
    statics: Vec<StaticComponents>,
    inheritance: Vec<InheritanceMode>,
    size: Vec<Vec3>,
    size_base: Vec<Vec3>,
    parent: Vec<Option<TransformId>>,

    local: Vec<Affine3A>,
    world: [Vec<WorldOutput>; 2],

    component_dirty: Vec<bool>,
    local_matrix_dirty: Vec<bool>,
    reorder: bool,
}

impl TransformManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.component_ids.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.component_ids.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: TransformId) -> bool {
        self.ids.contains_key(id)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn create_transform(&mut self) -> TransformId {
        let index = self.component_ids.len();
        let id = self.ids.insert(index);

        self.component_ids.push(id);
        self.animatable.push(AnimatableComponents::default());
        self.animatable_base.push(AnimatableComponents::default());
        self.statics.push(StaticComponents::default());
        self.inheritance.push(InheritanceMode::all());
        self.size.push(Vec3::ZERO);
        self.size_base.push(Vec3::ZERO);
        self.parent.push(None);
        self.local.push(Affine3A::IDENTITY);
        for slot in &mut self.world {
            slot.push(WorldOutput::default());
        }
        self.component_dirty.push(true);
        self.local_matrix_dirty.push(false);

        id
    }

    /// Removes an entry. Children still pointing at it become roots.
    pub fn remove_transform(&mut self, id: TransformId) {
        let removed = self.ids.remove(id);
        ensure_invariant!(removed.is_some(), "Invalid transform id {id:?}");
        let Some(index) = removed else {
            return;
        };

        let last = self.component_ids.len() - 1;
        self.component_ids.swap_remove(index);
        self.animatable.swap_remove(index);
        self.animatable_base.swap_remove(index);
        self.statics.swap_remove(index);
        self.inheritance.swap_remove(index);
        self.size.swap_remove(index);
        self.size_base.swap_remove(index);
        self.parent.swap_remove(index);
        self.local.swap_remove(index);
        for slot in &mut self.world {
            slot.swap_remove(index);
        }
        self.component_dirty.swap_remove(index);
        self.local_matrix_dirty.swap_remove(index);

        if index != last {
            let moved = self.component_ids[index];
            self.ids[moved] = index;
        }

        for (parent, dirty) in self.parent.iter_mut().zip(&mut self.component_dirty) {
            if *parent == Some(id) {
                *parent = None;
                *dirty = true;
            }
        }

        self.reorder = true;
    }

    pub fn set_parent(&mut self, id: TransformId, parent: Option<TransformId>) {
        ensure_invariant!(parent != Some(id), "A transform cannot be its own parent");
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.parent[index] = parent;
        self.component_dirty[index] = true;
        self.reorder = true;
    }

    #[must_use]
    pub fn parent(&self, id: TransformId) -> Option<TransformId> {
        self.index_of(id).and_then(|i| self.parent[i])
    }

    // ========================================================================
    // Inheritance & Static Flags
    // ========================================================================

    pub fn set_inherit_position(&mut self, id: TransformId, inherit: bool) {
        self.set_inheritance_flag(id, InheritanceMode::POSITION, inherit);
    }

    pub fn set_inherit_orientation(&mut self, id: TransformId, inherit: bool) {
        self.set_inheritance_flag(id, InheritanceMode::ORIENTATION, inherit);
    }

    pub fn set_inherit_scale(&mut self, id: TransformId, inherit: bool) {
        self.set_inheritance_flag(id, InheritanceMode::SCALE, inherit);
    }

    fn set_inheritance_flag(&mut self, id: TransformId, flag: InheritanceMode, value: bool) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.inheritance[index].set(flag, value);
        self.component_dirty[index] = true;
    }

    #[must_use]
    pub fn inheritance(&self, id: TransformId) -> Option<InheritanceMode> {
        self.index_of(id).map(|i| self.inheritance[i])
    }

    pub fn set_position_uses_anchor_point(&mut self, id: TransformId, value: bool) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.statics[index].position_uses_anchor_point = value;
        self.component_dirty[index] = true;
    }

    // ========================================================================
    // Per-tick Passes
    // ========================================================================

    /// Restores every animatable component to its base value. Entries whose
    /// current values differ from the base are marked dirty.
    pub fn reset_to_base_value(&mut self) {
        for i in 0..self.component_ids.len() {
            if self.animatable[i] != self.animatable_base[i] {
                self.animatable[i] = self.animatable_base[i];
                self.component_dirty[i] = true;
            }
            if self.size[i] != self.size_base[i] {
                self.size[i] = self.size_base[i];
                self.component_dirty[i] = true;
            }
        }
    }

    /// Whether any entry changed since the last batch pass.
    #[must_use]
    pub fn has_dirty_components(&self) -> bool {
        self.reorder || self.component_dirty.iter().any(|&dirty| dirty)
    }

    /// Recomputes local and world matrices in parent-before-child order,
    /// writing world outputs into the `index` slot.
    pub fn update(&mut self, index: BufferIndex) {
        if self.reorder {
            self.reorder_components();
        }
        self.local_matrix_dirty.fill(false);

        let slot = index.as_usize();
        for i in 0..self.component_ids.len() {
            let parent_index = self.parent[i].and_then(|p| self.ids.get(p).copied());

            let matrix = match parent_index {
                Some(p) if self.inheritance[i] == InheritanceMode::all() => {
                    if self.component_dirty[i] || self.local_matrix_dirty[p] {
                        let parent_size = self.size[p];
                        self.local[i] = self.local_transform(i, parent_size);
                        self.local_matrix_dirty[i] = true;
                    }
                    self.world[slot][p].matrix * self.local[i]
                }
                Some(p) => {
                    let parent_world = self.world[slot][p].matrix;
                    let parent_size = self.size[p];
                    self.local_matrix_dirty[i] = true;
                    self.partially_inherited(i, &parent_world, parent_size)
                }
                None => {
                    if self.component_dirty[i] {
                        self.local[i] = self.local_transform(i, Vec3::ZERO);
                        self.local_matrix_dirty[i] = true;
                    }
                    self.local[i]
                }
            };
            self.component_dirty[i] = false;

            let (scale, _, _) = matrix.to_scale_rotation_translation();
            let radius = self.size[i].length() * 0.5 * scale.abs().max_element();
            let center = Vec3::from(matrix.translation);
            self.world[slot][i] = WorldOutput {
                matrix,
                bounding_sphere: center.extend(radius),
            };
        }
    }

    fn center_position(&self, i: usize) -> Vec3 {
        let animatable = &self.animatable[i];
        let statics = &self.statics[i];
        let size = self.size[i];

        let mut center = animatable.orientation * ((HALF - statics.anchor_point) * size * animatable.scale);
        if !statics.position_uses_anchor_point {
            center -= (TOP_LEFT - statics.anchor_point) * size;
        }
        center
    }

    fn local_transform(&self, i: usize, parent_size: Vec3) -> Affine3A {
        let animatable = &self.animatable[i];
        let local_position = animatable.position
            + self.center_position(i)
            + (self.statics[i].parent_origin - HALF) * parent_size;
        Affine3A::from_scale_rotation_translation(
            animatable.scale,
            animatable.orientation,
            local_position,
        )
    }

    fn partially_inherited(&mut self, i: usize, parent_world: &Affine3A, parent_size: Vec3) -> Affine3A {
        let (parent_scale, parent_orientation, _) = parent_world.to_scale_rotation_translation();
        let mode = self.inheritance[i];
        let animatable = self.animatable[i];

        let mut scale = animatable.scale;
        if !mode.contains(InheritanceMode::SCALE) {
            let safe = parent_scale.cmpne(Vec3::ZERO);
            scale = Vec3::select(safe, scale / parent_scale, scale);
        }

        let mut orientation = animatable.orientation;
        if !mode.contains(InheritanceMode::ORIENTATION) {
            orientation = parent_orientation.inverse() * orientation;
        }

        let center = self.center_position(i);
        if mode.contains(InheritanceMode::POSITION) {
            let local_position = animatable.position
                + center
                + (self.statics[i].parent_origin - HALF) * parent_size;
            self.local[i] = Affine3A::from_scale_rotation_translation(scale, orientation, local_position);
            *parent_world * self.local[i]
        } else {
            self.local[i] = Affine3A::from_scale_rotation_translation(scale, orientation, Vec3::ZERO);
            let mut world = *parent_world * self.local[i];
            world.translation = (animatable.position + center).into();
            world
        }
    }

    /// Stable level-order sort so that every parent precedes its children.
    fn reorder_components(&mut self) {
        let count = self.component_ids.len();
        let mut levels = vec![0_usize; count];
        for (i, level) in levels.iter_mut().enumerate() {
            let mut depth = 0;
            let mut current = self.parent[i];
            while let Some(parent) = current {
                let Some(&p) = self.ids.get(parent) else {
                    break;
                };
                depth += 1;
                if depth > count {
                    log::error!("Cycle detected in transform hierarchy");
                    break;
                }
                current = self.parent[p];
            }
            *level = depth;
        }

        let mut order: Vec<usize> = (0..count).collect();
        order.sort_by_key(|&i| levels[i]);

        permute(&mut self.component_ids, &order);
        permute(&mut self.animatable, &order);
        permute(&mut self.animatable_base, &order);
        permute(&mut self.statics, &order);
        permute(&mut self.inheritance, &order);
        permute(&mut self.size, &order);
        permute(&mut self.size_base, &order);
        permute(&mut self.parent, &order);
        permute(&mut self.local, &order);
        for slot in &mut self.world {
            permute(slot, &order);
        }
        permute(&mut self.component_dirty, &order);
        permute(&mut self.local_matrix_dirty, &order);

        for (index, &id) in self.component_ids.iter().enumerate() {
            self.ids[id] = index;
        }
        self.reorder = false;
    }

    // ========================================================================
    // Vector3 Properties
    // ========================================================================

    #[must_use]
    pub fn vector3(&self, id: TransformId, property: TransformProperty) -> Option<Vec3> {
        let index = self.index_of(id)?;
        Some(match property {
            TransformProperty::Position => self.animatable[index].position,
            TransformProperty::Scale => self.animatable[index].scale,
            TransformProperty::ParentOrigin => self.statics[index].parent_origin,
            TransformProperty::AnchorPoint => self.statics[index].anchor_point,
            TransformProperty::Size => self.size[index],
        })
    }

    #[must_use]
    pub fn vector3_base(&self, id: TransformId, property: TransformProperty) -> Option<Vec3> {
        let index = self.index_of(id)?;
        Some(match property {
            TransformProperty::Position => self.animatable_base[index].position,
            TransformProperty::Scale => self.animatable_base[index].scale,
            TransformProperty::Size => self.size_base[index],
            TransformProperty::ParentOrigin => self.statics[index].parent_origin,
            TransformProperty::AnchorPoint => self.statics[index].anchor_point,
        })
    }

    /// Transient write: the next reset restores the base value.
    pub fn set_vector3(&mut self, id: TransformId, property: TransformProperty, value: Vec3) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        *self.current_mut(index, property) = value;
        self.component_dirty[index] = true;
    }

    /// Persistent write of both the current and the base value.
    pub fn bake_vector3(&mut self, id: TransformId, property: TransformProperty, value: Vec3) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        *self.current_mut(index, property) = value;
        if let Some(base) = self.base_mut(index, property) {
            *base = value;
        }
        self.component_dirty[index] = true;
    }

    /// Bakes `current + delta`.
    pub fn bake_relative_vector3(&mut self, id: TransformId, property: TransformProperty, delta: Vec3) {
        if let Some(current) = self.vector3(id, property) {
            self.bake_vector3(id, property, current + delta);
        }
    }

    /// Bakes `current * factor`, component-wise.
    pub fn bake_multiply_vector3(&mut self, id: TransformId, property: TransformProperty, factor: Vec3) {
        if let Some(current) = self.vector3(id, property) {
            self.bake_vector3(id, property, current * factor);
        }
    }

    #[must_use]
    pub fn vector3_component(
        &self,
        id: TransformId,
        property: TransformProperty,
        component: Component,
    ) -> Option<f32> {
        ensure_invariant!(@ret None; component != Component::W, "Vector3 has no W component");
        self.vector3(id, property).map(|v| v[component.index()])
    }

    pub fn set_vector3_component(
        &mut self,
        id: TransformId,
        property: TransformProperty,
        component: Component,
        value: f32,
    ) {
        ensure_invariant!(component != Component::W, "Vector3 has no W component");
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.current_mut(index, property)[component.index()] = value;
        self.component_dirty[index] = true;
    }

    /// Bakes a single component (the `BakeX` / `BakeY` / `BakeZ` family).
    pub fn bake_vector3_component(
        &mut self,
        id: TransformId,
        property: TransformProperty,
        component: Component,
        value: f32,
    ) {
        ensure_invariant!(component != Component::W, "Vector3 has no W component");
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.current_mut(index, property)[component.index()] = value;
        if let Some(base) = self.base_mut(index, property) {
            base[component.index()] = value;
        }
        self.component_dirty[index] = true;
    }

    fn current_mut(&mut self, index: usize, property: TransformProperty) -> &mut Vec3 {
        match property {
            TransformProperty::Position => &mut self.animatable[index].position,
            TransformProperty::Scale => &mut self.animatable[index].scale,
            TransformProperty::ParentOrigin => &mut self.statics[index].parent_origin,
            TransformProperty::AnchorPoint => &mut self.statics[index].anchor_point,
            TransformProperty::Size => &mut self.size[index],
        }
    }

    fn base_mut(&mut self, index: usize, property: TransformProperty) -> Option<&mut Vec3> {
        match property {
            TransformProperty::Position => Some(&mut self.animatable_base[index].position),
            TransformProperty::Scale => Some(&mut self.animatable_base[index].scale),
            TransformProperty::Size => Some(&mut self.size_base[index]),
            TransformProperty::ParentOrigin | TransformProperty::AnchorPoint => None,
        }
    }

    // ========================================================================
    // Orientation
    // ========================================================================

    #[must_use]
    pub fn orientation(&self, id: TransformId) -> Option<Quat> {
        self.index_of(id).map(|i| self.animatable[i].orientation)
    }

    #[must_use]
    pub fn orientation_base(&self, id: TransformId) -> Option<Quat> {
        self.index_of(id).map(|i| self.animatable_base[i].orientation)
    }

    pub fn set_orientation(&mut self, id: TransformId, value: Quat) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.animatable[index].orientation = value;
        self.component_dirty[index] = true;
    }

    pub fn bake_orientation(&mut self, id: TransformId, value: Quat) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        self.animatable[index].orientation = value;
        self.animatable_base[index].orientation = value;
        self.component_dirty[index] = true;
    }

    /// Bakes `current * delta`.
    pub fn bake_relative_orientation(&mut self, id: TransformId, delta: Quat) {
        if let Some(current) = self.orientation(id) {
            self.bake_orientation(id, (current * delta).normalize());
        }
    }

    // ========================================================================
    // World Outputs
    // ========================================================================

    /// World matrix produced by the last batch pass that wrote `index`.
    #[must_use]
    pub fn world_matrix(&self, id: TransformId, index: BufferIndex) -> Option<Affine3A> {
        self.index_of(id).map(|i| self.world[index.as_usize()][i].matrix)
    }

    #[must_use]
    pub fn world_matrix_and_size(&self, id: TransformId, index: BufferIndex) -> Option<(Affine3A, Vec3)> {
        self.index_of(id)
            .map(|i| (self.world[index.as_usize()][i].matrix, self.size[i]))
    }

    #[must_use]
    pub fn bounding_sphere(&self, id: TransformId, index: BufferIndex) -> Option<Vec4> {
        self.index_of(id)
            .map(|i| self.world[index.as_usize()][i].bounding_sphere)
    }

    #[must_use]
    pub fn world_position(&self, id: TransformId, index: BufferIndex) -> Option<Vec3> {
        self.world_matrix(id, index).map(|m| Vec3::from(m.translation))
    }

    #[must_use]
    pub fn world_orientation(&self, id: TransformId, index: BufferIndex) -> Option<Quat> {
        self.world_matrix(id, index)
            .map(|m| m.to_scale_rotation_translation().1)
    }

    #[must_use]
    pub fn world_scale(&self, id: TransformId, index: BufferIndex) -> Option<Vec3> {
        self.world_matrix(id, index)
            .map(|m| m.to_scale_rotation_translation().0)
    }

    fn index_of(&self, id: TransformId) -> Option<usize> {
        let index = self.ids.get(id).copied();
        ensure_invariant!(@ret None; index.is_some(), "Invalid transform id {id:?}");
        index
    }
}

fn permute<T: Copy>(values: &mut Vec<T>, order: &[usize]) {
    let old = std::mem::take(values);
    *values = order.iter().map(|&i| old[i]).collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;
    const UPDATE: BufferIndex = BufferIndex::ZERO;

    #[test]
    fn reorder_puts_parents_first() {
        let mut manager = TransformManager::new();
        let child = manager.create_transform();
        let parent = manager.create_transform();
        manager.set_parent(child, Some(parent));

        manager.bake_vector3(parent, TransformProperty::Position, Vec3::X);
        manager.bake_vector3(child, TransformProperty::Position, Vec3::Y);
        manager.update(UPDATE);

        assert_eq!(manager.ids[parent], 0);
        assert_eq!(manager.ids[child], 1);
        let world = manager.world_position(child, UPDATE).unwrap();
        assert!((world - Vec3::new(1.0, 1.0, 0.0)).length() < EPSILON);
    }

    #[test]
    fn swap_remove_keeps_handles_valid() {
        let mut manager = TransformManager::new();
        let a = manager.create_transform();
        let b = manager.create_transform();
        let c = manager.create_transform();
        manager.bake_vector3(c, TransformProperty::Position, Vec3::Z);

        manager.remove_transform(a);
        assert!(!manager.contains(a));
        assert!(manager.contains(b));
        assert_eq!(manager.vector3(c, TransformProperty::Position), Some(Vec3::Z));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    #[should_panic(expected = "A transform cannot be its own parent")]
    fn self_parenting_is_fatal() {
        let mut manager = TransformManager::new();
        let id = manager.create_transform();
        manager.set_parent(id, Some(id));
    }

    #[test]
    fn world_outputs_are_double_buffered() {
        let mut manager = TransformManager::new();
        let id = manager.create_transform();
        manager.bake_vector3(id, TransformProperty::Position, Vec3::X);
        manager.update(BufferIndex::ZERO);

        manager.set_vector3(id, TransformProperty::Position, Vec3::Y);
        manager.update(BufferIndex::ONE);

        assert_eq!(manager.world_position(id, BufferIndex::ZERO), Some(Vec3::X));
        assert_eq!(manager.world_position(id, BufferIndex::ONE), Some(Vec3::Y));
    }
}
