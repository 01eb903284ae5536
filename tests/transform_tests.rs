//! Transform Manager tests
//!
//! Tests for:
//! - Base values versus transient per-tick values
//! - Hierarchical world matrix propagation and lazy level-order reordering
//! - Anchor point, parent origin and size offsets
//! - Partial inheritance (position / orientation / scale)
//! - Double-buffered world outputs and bounding spheres
//! - Swap-remove of entries

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};
use kinema::InheritanceMode;
use kinema::property::{BufferIndex, Component};
use kinema::transform::{TransformManager, TransformProperty};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

fn world_position(tm: &TransformManager, id: kinema::transform::TransformId, index: BufferIndex) -> Vec3 {
    tm.world_position(id, index).expect("entry exists")
}

// ============================================================================
// Base Values
// ============================================================================

#[test]
fn set_is_undone_by_reset() {
    let mut tm = TransformManager::new();
    let id = tm.create_transform();
    tm.bake_vector3(id, TransformProperty::Position, Vec3::new(1.0, 2.0, 3.0));

    tm.set_vector3(id, TransformProperty::Position, Vec3::splat(9.0));
    assert_eq!(tm.vector3(id, TransformProperty::Position), Some(Vec3::splat(9.0)));

    tm.reset_to_base_value();
    assert_eq!(
        tm.vector3(id, TransformProperty::Position),
        Some(Vec3::new(1.0, 2.0, 3.0))
    );
}

#[test]
fn component_bake_keeps_other_components() {
    let mut tm = TransformManager::new();
    let id = tm.create_transform();
    tm.bake_vector3(id, TransformProperty::Scale, Vec3::new(2.0, 3.0, 4.0));
    tm.bake_vector3_component(id, TransformProperty::Scale, Component::Y, 7.0);
    tm.reset_to_base_value();

    assert_eq!(tm.vector3_base(id, TransformProperty::Scale), Some(Vec3::new(2.0, 7.0, 4.0)));
    assert_eq!(tm.vector3_component(id, TransformProperty::Scale, Component::Y), Some(7.0));
}

#[test]
fn relative_bakes_accumulate() {
    let mut tm = TransformManager::new();
    let id = tm.create_transform();
    tm.bake_relative_vector3(id, TransformProperty::Position, Vec3::X);
    tm.bake_relative_vector3(id, TransformProperty::Position, Vec3::X);
    tm.bake_multiply_vector3(id, TransformProperty::Scale, Vec3::splat(3.0));
    tm.reset_to_base_value();

    assert_eq!(tm.vector3(id, TransformProperty::Position), Some(Vec3::new(2.0, 0.0, 0.0)));
    assert_eq!(tm.vector3(id, TransformProperty::Scale), Some(Vec3::splat(3.0)));
}

#[test]
fn relative_orientation_bake_composes() {
    let mut tm = TransformManager::new();
    let id = tm.create_transform();
    let quarter = Quat::from_rotation_z(FRAC_PI_2);
    tm.bake_relative_orientation(id, quarter);
    tm.bake_relative_orientation(id, quarter);

    let expected = Quat::from_rotation_z(2.0 * FRAC_PI_2);
    let actual = tm.orientation_base(id).expect("entry exists");
    assert!(actual.angle_between(expected) < 1e-4);
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn child_inherits_parent_translation() {
    let mut tm = TransformManager::new();
    let parent = tm.create_transform();
    let child = tm.create_transform();
    tm.set_parent(child, Some(parent));
    tm.bake_vector3(parent, TransformProperty::Position, Vec3::new(10.0, 0.0, 0.0));
    tm.bake_vector3(child, TransformProperty::Position, Vec3::new(1.0, 2.0, 3.0));

    tm.update(BufferIndex::ZERO);
    assert!(vec3_approx(
        world_position(&tm, child, BufferIndex::ZERO),
        Vec3::new(11.0, 2.0, 3.0)
    ));
}

#[test]
fn child_created_before_parent_is_reordered() {
    let mut tm = TransformManager::new();
    let child = tm.create_transform();
    let parent = tm.create_transform();
    tm.set_parent(child, Some(parent));
    tm.bake_vector3(parent, TransformProperty::Position, Vec3::new(0.0, 5.0, 0.0));

    tm.update(BufferIndex::ZERO);
    assert!(vec3_approx(
        world_position(&tm, child, BufferIndex::ZERO),
        Vec3::new(0.0, 5.0, 0.0)
    ));
}

#[test]
fn parent_rotation_moves_child() {
    let mut tm = TransformManager::new();
    let parent = tm.create_transform();
    let child = tm.create_transform();
    tm.set_parent(child, Some(parent));
    tm.bake_orientation(parent, Quat::from_rotation_z(FRAC_PI_2));
    tm.bake_vector3(child, TransformProperty::Position, Vec3::X);

    tm.update(BufferIndex::ZERO);
    assert!(vec3_approx(world_position(&tm, child, BufferIndex::ZERO), Vec3::Y));
}

#[test]
fn scale_is_not_inherited_when_disabled() {
    let mut tm = TransformManager::new();
    let parent = tm.create_transform();
    let child = tm.create_transform();
    tm.set_parent(child, Some(parent));
    tm.bake_vector3(parent, TransformProperty::Scale, Vec3::splat(2.0));
    tm.bake_vector3(child, TransformProperty::Position, Vec3::X);
    tm.set_inherit_scale(child, false);

    tm.update(BufferIndex::ZERO);
    let scale = tm.world_scale(child, BufferIndex::ZERO).expect("entry exists");
    assert!(vec3_approx(scale, Vec3::ONE), "got {scale}");
    assert!(vec3_approx(
        world_position(&tm, child, BufferIndex::ZERO),
        Vec3::new(2.0, 0.0, 0.0)
    ));
    assert_eq!(
        tm.inheritance(child),
        Some(InheritanceMode::POSITION | InheritanceMode::ORIENTATION)
    );
}

#[test]
fn position_is_not_inherited_when_disabled() {
    let mut tm = TransformManager::new();
    let parent = tm.create_transform();
    let child = tm.create_transform();
    tm.set_parent(child, Some(parent));
    tm.bake_vector3(parent, TransformProperty::Position, Vec3::new(10.0, 10.0, 0.0));
    tm.bake_vector3(child, TransformProperty::Position, Vec3::new(1.0, 0.0, 0.0));
    tm.set_inherit_position(child, false);

    tm.update(BufferIndex::ZERO);
    assert!(vec3_approx(
        world_position(&tm, child, BufferIndex::ZERO),
        Vec3::new(1.0, 0.0, 0.0)
    ));
}

// ============================================================================
// Anchor Point, Parent Origin & Size
// ============================================================================

#[test]
fn anchor_point_offsets_by_size() {
    let mut tm = TransformManager::new();
    let id = tm.create_transform();
    tm.bake_vector3(id, TransformProperty::Size, Vec3::new(10.0, 10.0, 0.0));
    tm.bake_vector3(id, TransformProperty::AnchorPoint, Vec3::new(0.0, 0.0, 0.5));

    tm.update(BufferIndex::ZERO);
    assert!(vec3_approx(
        world_position(&tm, id, BufferIndex::ZERO),
        Vec3::new(5.0, 5.0, 0.0)
    ));
}

#[test]
fn parent_origin_offsets_by_parent_size() {
    let mut tm = TransformManager::new();
    let parent = tm.create_transform();
    let child = tm.create_transform();
    tm.set_parent(child, Some(parent));
    tm.bake_vector3(parent, TransformProperty::Size, Vec3::new(20.0, 10.0, 0.0));
    tm.bake_vector3(child, TransformProperty::ParentOrigin, Vec3::splat(0.5));

    tm.update(BufferIndex::ZERO);
    // Parent is centered on its own position; a centered parent origin adds nothing.
    assert!(vec3_approx(world_position(&tm, child, BufferIndex::ZERO), Vec3::ZERO));

    tm.bake_vector3(child, TransformProperty::ParentOrigin, Vec3::new(1.0, 1.0, 0.5));
    tm.update(BufferIndex::ZERO);
    assert!(vec3_approx(
        world_position(&tm, child, BufferIndex::ZERO),
        Vec3::new(10.0, 5.0, 0.0)
    ));
}

#[test]
fn bounding_sphere_follows_size_and_scale() {
    let mut tm = TransformManager::new();
    let id = tm.create_transform();
    tm.bake_vector3(id, TransformProperty::Size, Vec3::new(6.0, 8.0, 0.0));
    tm.bake_vector3(id, TransformProperty::Scale, Vec3::splat(2.0));
    tm.bake_vector3(id, TransformProperty::Position, Vec3::new(1.0, 1.0, 1.0));

    tm.update(BufferIndex::ZERO);
    let sphere = tm.bounding_sphere(id, BufferIndex::ZERO).expect("entry exists");
    assert!(vec3_approx(sphere.truncate(), Vec3::new(1.0, 1.0, 1.0)));
    assert!((sphere.w - 10.0).abs() < EPSILON, "radius {}", sphere.w);
}

// ============================================================================
// Double Buffering
// ============================================================================

#[test]
fn update_only_writes_its_slot() {
    let mut tm = TransformManager::new();
    let id = tm.create_transform();
    tm.bake_vector3(id, TransformProperty::Position, Vec3::X);
    tm.update(BufferIndex::ZERO);

    tm.set_vector3(id, TransformProperty::Position, Vec3::Y);
    tm.update(BufferIndex::ONE);

    assert!(vec3_approx(world_position(&tm, id, BufferIndex::ZERO), Vec3::X));
    assert!(vec3_approx(world_position(&tm, id, BufferIndex::ONE), Vec3::Y));
}

#[test]
fn reset_marks_changed_entries_dirty() {
    let mut tm = TransformManager::new();
    let id = tm.create_transform();
    tm.update(BufferIndex::ZERO);
    assert!(!tm.has_dirty_components());

    tm.reset_to_base_value();
    assert!(!tm.has_dirty_components(), "Nothing changed");

    tm.set_vector3(id, TransformProperty::Position, Vec3::X);
    tm.update(BufferIndex::ONE);
    tm.reset_to_base_value();
    assert!(tm.has_dirty_components());
}

// ============================================================================
// Removal
// ============================================================================

#[test]
fn remove_keeps_remaining_handles_valid() {
    let mut tm = TransformManager::new();
    let a = tm.create_transform();
    let b = tm.create_transform();
    let c = tm.create_transform();
    tm.bake_vector3(c, TransformProperty::Position, Vec3::new(3.0, 0.0, 0.0));

    tm.remove_transform(a);
    assert!(!tm.contains(a));
    assert_eq!(tm.len(), 2);
    assert!(tm.contains(b));
    assert_eq!(tm.vector3(c, TransformProperty::Position), Some(Vec3::new(3.0, 0.0, 0.0)));
}

#[test]
fn removing_parent_orphans_children() {
    let mut tm = TransformManager::new();
    let parent = tm.create_transform();
    let child = tm.create_transform();
    tm.set_parent(child, Some(parent));
    tm.bake_vector3(parent, TransformProperty::Position, Vec3::new(5.0, 0.0, 0.0));
    tm.update(BufferIndex::ZERO);

    tm.remove_transform(parent);
    tm.update(BufferIndex::ZERO);
    assert_eq!(tm.parent(child), None);
    assert!(vec3_approx(world_position(&tm, child, BufferIndex::ZERO), Vec3::ZERO));
}
