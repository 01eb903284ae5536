use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::animatable::AnimatableProperty;
use super::buffer::BufferIndex;
use super::Component;
use super::value::{Color, PropertyKind, PropertyType, PropertyValue};

/// Type-erased [`AnimatableProperty`] used for custom properties.
#[derive(Debug, Clone)]
pub enum PropertyCell {
    Boolean(AnimatableProperty<bool>),
    Integer(AnimatableProperty<i32>),
    Float(AnimatableProperty<f32>),
    Vector2(AnimatableProperty<Vec2>),
    Vector3(AnimatableProperty<Vec3>),
    Vector4(AnimatableProperty<Vec4>),
    Color(AnimatableProperty<Color>),
    Rotation(AnimatableProperty<Quat>),
    Matrix(AnimatableProperty<Mat4>),
}

macro_rules! with_cell {
    ($cell:expr, |$p:ident| $body:expr) => {
        match $cell {
            PropertyCell::Boolean($p) => $body,
            PropertyCell::Integer($p) => $body,
            PropertyCell::Float($p) => $body,
            PropertyCell::Vector2($p) => $body,
            PropertyCell::Vector3($p) => $body,
            PropertyCell::Vector4($p) => $body,
            PropertyCell::Color($p) => $body,
            PropertyCell::Rotation($p) => $body,
            PropertyCell::Matrix($p) => $body,
        }
    };
}

impl PropertyCell {
    #[must_use]
    pub fn new(initial: PropertyValue) -> Self {
        match initial {
            PropertyValue::Boolean(v) => Self::Boolean(AnimatableProperty::new(v)),
            PropertyValue::Integer(v) => Self::Integer(AnimatableProperty::new(v)),
            PropertyValue::Float(v) => Self::Float(AnimatableProperty::new(v)),
            PropertyValue::Vector2(v) => Self::Vector2(AnimatableProperty::new(v)),
            PropertyValue::Vector3(v) => Self::Vector3(AnimatableProperty::new(v)),
            PropertyValue::Vector4(v) => Self::Vector4(AnimatableProperty::new(v)),
            PropertyValue::Color(v) => Self::Color(AnimatableProperty::new(v)),
            PropertyValue::Rotation(v) => Self::Rotation(AnimatableProperty::new(v)),
            PropertyValue::Matrix(v) => Self::Matrix(AnimatableProperty::new(v)),
        }
    }

    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        self.base_value().property_type()
    }

    #[must_use]
    pub fn get(&self, index: BufferIndex) -> PropertyValue {
        with_cell!(self, |p| p.get(index).into_value())
    }

    #[must_use]
    pub fn base_value(&self) -> PropertyValue {
        with_cell!(self, |p| p.base_value().into_value())
    }

    /// Transient write. Returns `false` on a type mismatch.
    pub fn set(&mut self, index: BufferIndex, value: &PropertyValue) -> bool {
        with_cell!(self, |p| match PropertyKind::from_value(value) {
            Some(v) => {
                p.set(index, v);
                true
            }
            None => false,
        })
    }

    /// Persistent write. Returns `false` on a type mismatch.
    pub fn bake(&mut self, index: BufferIndex, value: &PropertyValue) -> bool {
        with_cell!(self, |p| match PropertyKind::from_value(value) {
            Some(v) => {
                p.bake(index, v);
                true
            }
            None => false,
        })
    }

    /// Persistent write of one vector component. The other components of
    /// the base value are left as they were.
    pub fn bake_component(&mut self, index: BufferIndex, component: Component, value: f32) -> bool {
        let (Some(current), Some(base)) = (
            self.get(index).with_component(component, value),
            self.base_value().with_component(component, value),
        ) else {
            return false;
        };
        with_cell!(self, |p| match (PropertyKind::from_value(&current), PropertyKind::from_value(&base)) {
            (Some(current), Some(base)) => {
                p.bake_split(index, current, base);
                true
            }
            _ => false,
        })
    }

    pub fn reset_to_base_value(&mut self, index: BufferIndex) {
        with_cell!(self, |p| p.reset_to_base_value(index));
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        with_cell!(self, |p| p.is_clean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_values_of_another_type() {
        let mut cell = PropertyCell::new(PropertyValue::Float(1.0));
        assert!(!cell.set(BufferIndex::ZERO, &PropertyValue::Integer(3)));
        assert!(cell.set(BufferIndex::ZERO, &PropertyValue::Float(3.0)));
        assert_eq!(cell.get(BufferIndex::ZERO), PropertyValue::Float(3.0));
        assert_eq!(cell.property_type(), PropertyType::Float);
    }
}
