//! Property System Tests
//!
//! Tests for:
//! - DoubleBuffered / AnimatableProperty slot discipline
//! - Producer-side validation (unknown, read-only, mistyped properties)
//! - Custom property registration and lookup by name
//! - Cached (`get_property`) versus rendered (`current_property`) values
//! - Color clamping and world color inheritance
//! - Reset to base value for properties nothing drives

use anyhow::Result;
use glam::{Vec3, Vec4};

use kinema::property::{AnimatableProperty, BufferIndex, DoubleBuffered};
use kinema::{
    Color, ColorMode, Engine, EndAction, KinemaError, ObjectId, PropertyIndex, PropertyType, PropertyValue,
};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn float(value: PropertyValue) -> f32 {
    match value {
        PropertyValue::Float(v) => v,
        other => panic!("Expected a float, got {other:?}"),
    }
}

fn engine_with_node() -> Result<(Engine, ObjectId)> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut engine = Engine::default();
    let node = engine.create_object("node");
    engine.add_child(engine.root(), node)?;
    Ok((engine, node))
}

// ============================================================================
// Primitives
// ============================================================================

#[test]
fn double_buffer_slots_are_independent() {
    let mut value = DoubleBuffered::new(1.0_f32);
    value.set(BufferIndex::ZERO, 2.0);
    assert!(approx(value.get(BufferIndex::ZERO), 2.0));
    assert!(approx(value.get(BufferIndex::ONE), 1.0));
    assert_eq!(BufferIndex::ZERO.other(), BufferIndex::ONE);
}

#[test]
fn bake_survives_reset_but_set_does_not() {
    let mut prop = AnimatableProperty::new(0.0_f32);
    prop.set(BufferIndex::ZERO, 5.0);
    prop.reset_to_base_value(BufferIndex::ZERO);
    assert!(approx(prop.get(BufferIndex::ZERO), 0.0));

    prop.bake(BufferIndex::ONE, 7.0);
    prop.reset_to_base_value(BufferIndex::ZERO);
    assert!(approx(prop.get(BufferIndex::ZERO), 7.0));
    assert!(approx(prop.get(BufferIndex::ONE), 7.0));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn unknown_object_is_reported() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    engine.destroy_object(node)?;
    assert_eq!(
        engine.set_property(node, PropertyIndex::COLOR_ALPHA, 0.5_f32),
        Err(KinemaError::ObjectNotFound(node))
    );
    Ok(())
}

#[test]
fn world_properties_are_read_only() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    let result = engine.set_property(node, PropertyIndex::WORLD_POSITION, Vec3::ONE);
    assert_eq!(result, Err(KinemaError::PropertyNotWritable(PropertyIndex::WORLD_POSITION)));
    Ok(())
}

#[test]
fn mistyped_values_are_rejected() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    let result = engine.set_property(node, PropertyIndex::POSITION, 1.0_f32);
    assert_eq!(
        result,
        Err(KinemaError::TypeMismatch {
            expected: PropertyType::Vector3,
            found: PropertyType::Float,
        })
    );
    Ok(())
}

#[test]
fn unknown_custom_index_is_reported() -> Result<()> {
    let (engine, node) = engine_with_node()?;
    let missing = PropertyIndex(PropertyIndex::CUSTOM_START.0 + 3);
    assert_eq!(
        engine.get_property(node, missing),
        Err(KinemaError::PropertyNotFound(missing))
    );
    Ok(())
}

// ============================================================================
// Custom Properties
// ============================================================================

#[test]
fn custom_properties_are_found_by_name() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    let weight = engine.register_property(node, "weight", 0.25_f32)?;
    let tint = engine.register_property(node, "tint", Vec4::ONE)?;

    assert!(weight.is_custom());
    assert_eq!(weight, PropertyIndex::CUSTOM_START);
    let object = engine.object(node).expect("node exists");
    assert_eq!(object.find_property("weight"), Some(weight));
    assert_eq!(object.find_property("tint"), Some(tint));
    assert_eq!(object.property_name(tint), Some("tint"));
    assert_eq!(object.property_type(tint), Some(PropertyType::Vector4));
    Ok(())
}

#[test]
fn duplicate_names_are_rejected() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    engine.register_property(node, "weight", 0.0_f32)?;
    assert_eq!(
        engine.register_property(node, "weight", 1.0_f32),
        Err(KinemaError::DuplicatePropertyName("weight".into()))
    );
    assert_eq!(
        engine.register_property(node, "position", 1.0_f32),
        Err(KinemaError::DuplicatePropertyName("position".into())),
        "Default names are reserved"
    );
    Ok(())
}

#[test]
fn custom_value_reaches_the_scene() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    let weight = engine.register_property(node, "weight", 0.25_f32)?;
    engine.update(0.016);
    assert!(approx(float(engine.current_property(node, weight)?), 0.25));

    engine.set_property(node, weight, 0.75_f32)?;
    assert!(approx(float(engine.get_property(node, weight)?), 0.75), "Cache updates at once");

    engine.update(0.016);
    assert!(approx(float(engine.current_property(node, weight)?), 0.75));
    engine.update(0.016);
    assert!(approx(float(engine.current_property(node, weight)?), 0.75), "Both slots agree");
    Ok(())
}

// ============================================================================
// Transform Properties
// ============================================================================

#[test]
fn component_writes_update_the_whole_vector() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    engine.set_property(node, PropertyIndex::POSITION, Vec3::new(1.0, 2.0, 3.0))?;
    engine.set_property(node, PropertyIndex::POSITION_Y, 5.0_f32)?;
    engine.update(0.016);

    assert_eq!(
        engine.get_property(node, PropertyIndex::POSITION)?,
        PropertyValue::Vector3(Vec3::new(1.0, 5.0, 3.0))
    );
    assert_eq!(
        engine.current_property(node, PropertyIndex::POSITION)?,
        PropertyValue::Vector3(Vec3::new(1.0, 5.0, 3.0))
    );
    Ok(())
}

#[test]
fn world_position_combines_the_hierarchy() -> Result<()> {
    let (mut engine, parent) = engine_with_node()?;
    let child = engine.create_object("child");
    engine.add_child(parent, child)?;
    engine.set_property(parent, PropertyIndex::POSITION, Vec3::new(10.0, 0.0, 0.0))?;
    engine.set_property(child, PropertyIndex::POSITION, Vec3::new(1.0, 2.0, 3.0))?;
    engine.update(0.016);

    let PropertyValue::Vector3(world) = engine.current_property(child, PropertyIndex::WORLD_POSITION)? else {
        panic!("World position is a vector");
    };
    assert!((world - Vec3::new(11.0, 2.0, 3.0)).length() < EPSILON);

    let matrix = engine.render_view().world_matrix(child).expect("child is on the scene");
    assert!((Vec3::from(matrix.translation) - world).length() < EPSILON);
    Ok(())
}

#[test]
fn translate_by_accumulates() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    engine.translate_by(node, Vec3::X)?;
    engine.translate_by(node, Vec3::X)?;
    engine.scale_by(node, Vec3::splat(2.0))?;
    engine.update(0.016);

    assert_eq!(
        engine.current_property(node, PropertyIndex::POSITION)?,
        PropertyValue::Vector3(Vec3::new(2.0, 0.0, 0.0))
    );
    assert_eq!(
        engine.get_property(node, PropertyIndex::SCALE)?,
        PropertyValue::Vector3(Vec3::splat(2.0))
    );
    Ok(())
}

// ============================================================================
// Colors
// ============================================================================

#[test]
fn colors_are_clamped() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    engine.set_color(node, Color::new(2.0, -1.0, 0.5, 1.0))?;
    engine.update(0.016);

    assert_eq!(engine.render_view().color(node), Some(Color::new(1.0, 0.0, 0.5, 1.0)));
    Ok(())
}

#[test]
fn world_color_multiplies_down_the_tree() -> Result<()> {
    let (mut engine, parent) = engine_with_node()?;
    let child = engine.create_object("child");
    engine.add_child(parent, child)?;
    engine.set_property(parent, PropertyIndex::COLOR_ALPHA, 0.5_f32)?;
    engine.set_color(child, Color::new(1.0, 0.5, 1.0, 1.0))?;
    engine.update(0.016);

    let world = engine.render_view().world_color(child).expect("child is on the scene");
    assert!(approx(world.alpha(), 0.5));
    assert!(approx(world.0.y, 0.5));

    engine.set_color_mode(child, ColorMode::UseOwnColor)?;
    engine.update(0.016);
    let world = engine.render_view().world_color(child).expect("child is on the scene");
    assert!(approx(world.alpha(), 1.0));
    Ok(())
}

#[test]
fn visibility_is_double_buffered() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    engine.update(0.016);
    assert!(engine.render_view().is_visible(node));

    engine.set_property(node, PropertyIndex::VISIBLE, false)?;
    engine.update(0.016);
    assert!(!engine.render_view().is_visible(node));
    engine.update(0.016);
    assert!(!engine.render_view().is_visible(node));
    Ok(())
}

// ============================================================================
// Reset Invariant
// ============================================================================

#[test]
fn undriven_property_returns_to_base_value() -> Result<()> {
    let (mut engine, node) = engine_with_node()?;
    let animation = engine.create_animation(1.0);
    engine.set_end_action(animation, EndAction::Discard)?;
    engine.animate_to(animation, node, PropertyIndex::COLOR_ALPHA, 0.0_f32)?;
    engine.play(animation)?;

    engine.update(0.5);
    assert!(approx(float(engine.current_property(node, PropertyIndex::COLOR_ALPHA)?), 0.5));

    engine.stop(animation)?;
    for _ in 0..3 {
        engine.update(0.016);
        assert!(approx(float(engine.current_property(node, PropertyIndex::COLOR_ALPHA)?), 1.0));
    }
    assert!(approx(float(engine.get_property(node, PropertyIndex::COLOR_ALPHA)?), 1.0));
    Ok(())
}
