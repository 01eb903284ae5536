use std::fmt;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::property::{Color, PropertyKind, PropertyType, PropertyValue};

/// Source values handed to a constraint function, in source order.
#[derive(Debug, Clone, Copy)]
pub struct PropertyInputs<'a> {
    values: &'a [PropertyValue],
}

impl<'a> PropertyInputs<'a> {
    #[must_use]
    pub fn new(values: &'a [PropertyValue]) -> Self {
        Self { values }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&PropertyValue> {
        self.values.get(index)
    }

    /// Typed read; `None` when out of range or of another type.
    #[must_use]
    pub fn get<T: PropertyKind>(&self, index: usize) -> Option<T> {
        T::from_value(self.values.get(index)?)
    }

    /// Like [`get`](Self::get), defaulting to `0.0`.
    #[must_use]
    pub fn float(&self, index: usize) -> f32 {
        self.get(index).unwrap_or_default()
    }

    #[must_use]
    pub fn vector3(&self, index: usize) -> Vec3 {
        self.get(index).unwrap_or_default()
    }

    #[must_use]
    pub fn rotation(&self, index: usize) -> Quat {
        self.get(index).unwrap_or_default()
    }

    #[must_use]
    pub fn color(&self, index: usize) -> Color {
        self.get(index).unwrap_or_default()
    }

    #[must_use]
    pub fn matrix(&self, index: usize) -> Mat4 {
        self.get(index).unwrap_or_default()
    }
}

type DynConstraintFn = dyn Fn(&mut PropertyValue, &PropertyInputs<'_>) + Send + Sync;

/// Type-erased constraint callback. Cloning shares the callback.
#[derive(Clone)]
pub struct ConstraintFunction {
    func: Arc<DynConstraintFn>,
    value_type: PropertyType,
}

impl ConstraintFunction {
    /// Wraps a callback operating on the target's concrete type.
    pub fn new<T, F>(f: F) -> Self
    where
        T: PropertyKind,
        F: Fn(&mut T, &PropertyInputs<'_>) + Send + Sync + 'static,
    {
        let erased = move |current: &mut PropertyValue, inputs: &PropertyInputs<'_>| {
            if let Some(mut value) = T::from_value(current) {
                f(&mut value, inputs);
                *current = value.into_value();
            }
        };
        Self {
            func: Arc::new(erased),
            value_type: T::TYPE,
        }
    }

    /// Type of target this callback accepts.
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> PropertyType {
        self.value_type
    }

    pub(crate) fn call(&self, current: &mut PropertyValue, inputs: &PropertyInputs<'_>) {
        (self.func)(current, inputs);
    }
}

impl fmt::Debug for ConstraintFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintFunction")
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_callback_sees_inputs() {
        let sum = ConstraintFunction::new(|current: &mut f32, inputs: &PropertyInputs<'_>| {
            *current = inputs.float(0) + inputs.float(1);
        });
        let values = [PropertyValue::Float(2.0), PropertyValue::Float(3.0)];
        let mut current = PropertyValue::Float(0.0);
        sum.call(&mut current, &PropertyInputs::new(&values));
        assert_eq!(current, PropertyValue::Float(5.0));
        assert_eq!(sum.value_type(), PropertyType::Float);
    }

    #[test]
    fn wrong_target_type_is_left_untouched() {
        let f = ConstraintFunction::new(|current: &mut Vec3, _: &PropertyInputs<'_>| {
            *current = Vec3::ONE;
        });
        let mut current = PropertyValue::Float(7.0);
        f.call(&mut current, &PropertyInputs::new(&[]));
        assert_eq!(current, PropertyValue::Float(7.0));
    }
}
