//! Static table of the properties every object carries.

use super::{Component, PropertyIndex, PropertyRef, PropertyType};
use crate::transform::TransformProperty;

/// Metadata for one default property.
#[derive(Debug, Clone, Copy)]
pub struct DefaultProperty {
    pub index: PropertyIndex,
    pub name: &'static str,
    pub kind: PropertyType,
    pub writable: bool,
    pub animatable: bool,
    pub constraint_input: bool,
    pub location: PropertyRef,
    pub component: Option<Component>,
}

const fn animatable(
    index: PropertyIndex,
    name: &'static str,
    kind: PropertyType,
    location: PropertyRef,
    component: Option<Component>,
) -> DefaultProperty {
    DefaultProperty {
        index,
        name,
        kind,
        writable: true,
        animatable: true,
        constraint_input: true,
        location,
        component,
    }
}

const fn derived(
    index: PropertyIndex,
    name: &'static str,
    kind: PropertyType,
    location: PropertyRef,
) -> DefaultProperty {
    DefaultProperty {
        index,
        name,
        kind,
        writable: false,
        animatable: false,
        constraint_input: true,
        location,
        component: None,
    }
}

const POSITION: PropertyRef = PropertyRef::Transform(TransformProperty::Position);
const SCALE: PropertyRef = PropertyRef::Transform(TransformProperty::Scale);
const SIZE: PropertyRef = PropertyRef::Transform(TransformProperty::Size);

use Component::{W, X, Y, Z};
use PropertyIndex as I;
use PropertyType::{Boolean, Float, Matrix, Rotation, Vector3};

// Ordered by index value.
static DEFAULT_PROPERTIES: [DefaultProperty; 26] = [
    animatable(I::POSITION, "position", Vector3, POSITION, None),
    animatable(I::POSITION_X, "positionX", Float, POSITION, Some(X)),
    animatable(I::POSITION_Y, "positionY", Float, POSITION, Some(Y)),
    animatable(I::POSITION_Z, "positionZ", Float, POSITION, Some(Z)),
    animatable(I::ORIENTATION, "orientation", Rotation, PropertyRef::Orientation, None),
    animatable(I::SCALE, "scale", Vector3, SCALE, None),
    animatable(I::SCALE_X, "scaleX", Float, SCALE, Some(X)),
    animatable(I::SCALE_Y, "scaleY", Float, SCALE, Some(Y)),
    animatable(I::SCALE_Z, "scaleZ", Float, SCALE, Some(Z)),
    animatable(I::SIZE, "size", Vector3, SIZE, None),
    animatable(I::SIZE_WIDTH, "sizeWidth", Float, SIZE, Some(X)),
    animatable(I::SIZE_HEIGHT, "sizeHeight", Float, SIZE, Some(Y)),
    animatable(I::SIZE_DEPTH, "sizeDepth", Float, SIZE, Some(Z)),
    animatable(I::COLOR, "color", PropertyType::Color, PropertyRef::Color, None),
    animatable(I::COLOR_RED, "colorRed", Float, PropertyRef::Color, Some(X)),
    animatable(I::COLOR_GREEN, "colorGreen", Float, PropertyRef::Color, Some(Y)),
    animatable(I::COLOR_BLUE, "colorBlue", Float, PropertyRef::Color, Some(Z)),
    animatable(I::COLOR_ALPHA, "colorAlpha", Float, PropertyRef::Color, Some(W)),
    animatable(I::VISIBLE, "visible", Boolean, PropertyRef::Visible, None),
    DefaultProperty {
        index: I::PARENT_ORIGIN,
        name: "parentOrigin",
        kind: Vector3,
        writable: true,
        animatable: false,
        constraint_input: true,
        location: PropertyRef::Transform(TransformProperty::ParentOrigin),
        component: None,
    },
    DefaultProperty {
        index: I::ANCHOR_POINT,
        name: "anchorPoint",
        kind: Vector3,
        writable: true,
        animatable: false,
        constraint_input: true,
        location: PropertyRef::Transform(TransformProperty::AnchorPoint),
        component: None,
    },
    derived(I::WORLD_POSITION, "worldPosition", Vector3, PropertyRef::WorldPosition),
    derived(I::WORLD_ORIENTATION, "worldOrientation", Rotation, PropertyRef::WorldOrientation),
    derived(I::WORLD_SCALE, "worldScale", Vector3, PropertyRef::WorldScale),
    derived(I::WORLD_COLOR, "worldColor", PropertyType::Color, PropertyRef::WorldColor),
    derived(I::WORLD_MATRIX, "worldMatrix", Matrix, PropertyRef::WorldMatrix),
];

/// Looks up a default property by index.
#[must_use]
pub fn default_property(index: PropertyIndex) -> Option<&'static DefaultProperty> {
    DEFAULT_PROPERTIES.get(index.0 as usize)
}

/// Looks up a default property by name.
#[must_use]
pub fn find_default_property(name: &str) -> Option<&'static DefaultProperty> {
    DEFAULT_PROPERTIES.iter().find(|p| p.name == name)
}
