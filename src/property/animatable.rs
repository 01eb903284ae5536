use super::buffer::{BufferIndex, DoubleBuffered};
use super::value::{Interpolatable, PropertyKind};

/// Nothing written since the last two resets.
const CLEAN_FLAG: u8 = 0x00;
/// Baked: the other slot still needs one reset to catch up.
const BAKED_FLAG: u8 = 0x01;
/// Set: both slots need a reset before the property is clean again.
const SET_FLAG: u8 = 0x02;

/// A double-buffered property with a persistent base value.
///
/// `set` writes are transient: the owning resetter copies the base value back
/// into the update slot at the start of a following tick. `bake` writes the
/// base value and the update slot only, so the slot being read by the
/// consumer is never touched.
#[derive(Debug, Clone)]
pub struct AnimatableProperty<T: PropertyKind> {
    value: DoubleBuffered<T>,
    base_value: T,
    dirty_flags: u8,
}

impl<T: PropertyKind> AnimatableProperty<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        let initial = initial.sanitize();
        Self {
            value: DoubleBuffered::new(initial),
            base_value: initial,
            dirty_flags: CLEAN_FLAG,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: BufferIndex) -> T {
        self.value.get(index)
    }

    #[inline]
    #[must_use]
    pub fn base_value(&self) -> T {
        self.base_value
    }

    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dirty_flags == CLEAN_FLAG
    }

    /// Transient write into `index`; the base value is unchanged.
    pub fn set(&mut self, index: BufferIndex, value: T) {
        self.value.set(index, value.sanitize());
        self.dirty_flags = SET_FLAG;
    }

    /// Persistent write: base value plus the `index` slot.
    pub fn bake(&mut self, index: BufferIndex, value: T) {
        let value = value.sanitize();
        self.base_value = value;
        self.value.set(index, value);
        self.dirty_flags = BAKED_FLAG;
    }

    /// Persistent write with separately computed slot and base values, used
    /// when only one component of a vector changes.
    pub fn bake_split(&mut self, index: BufferIndex, current: T, base: T) {
        self.base_value = base.sanitize();
        self.value.set(index, current.sanitize());
        self.dirty_flags = BAKED_FLAG;
    }

    /// Copies the base value into `index`. A clean property is left alone.
    pub fn reset_to_base_value(&mut self, index: BufferIndex) {
        if self.dirty_flags == CLEAN_FLAG {
            return;
        }
        self.value.set(index, self.base_value);
        self.dirty_flags >>= 1;
    }
}

impl<T: Interpolatable> AnimatableProperty<T> {
    /// Transient `current + delta`.
    pub fn set_relative(&mut self, index: BufferIndex, delta: T) {
        let current = self.value.get(index);
        self.set(index, current.add_scaled(delta, 1.0));
    }

    /// Persistent `current + delta`.
    pub fn bake_relative(&mut self, index: BufferIndex, delta: T) {
        let current = self.value.get(index);
        self.bake(index, current.add_scaled(delta, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Color;

    const UPDATE: BufferIndex = BufferIndex::ZERO;
    const RENDER: BufferIndex = BufferIndex::ONE;

    #[test]
    fn set_leaves_base_and_other_slot() {
        let mut prop = AnimatableProperty::new(1.0_f32);
        prop.set(UPDATE, 4.0);

        assert_eq!(prop.get(UPDATE), 4.0);
        assert_eq!(prop.get(RENDER), 1.0);
        assert_eq!(prop.base_value(), 1.0);
    }

    #[test]
    fn bake_writes_base_and_current_slot_only() {
        let mut prop = AnimatableProperty::new(1.0_f32);
        prop.bake(UPDATE, 9.0);

        assert_eq!(prop.base_value(), 9.0);
        assert_eq!(prop.get(UPDATE), 9.0);
        assert_eq!(prop.get(RENDER), 1.0, "Render slot must not be touched");

        // One reset on the other slot brings it in line.
        prop.reset_to_base_value(RENDER);
        assert_eq!(prop.get(RENDER), 9.0);
        assert!(prop.is_clean());
    }

    #[test]
    fn set_needs_two_resets_to_become_clean() {
        let mut prop = AnimatableProperty::new(0_i32);
        prop.set(UPDATE, 3);

        prop.reset_to_base_value(RENDER);
        assert!(!prop.is_clean());
        prop.reset_to_base_value(UPDATE);
        assert!(prop.is_clean());
        assert_eq!(prop.get(UPDATE), 0);
    }

    #[test]
    fn colors_are_clamped_on_set_and_bake() {
        let mut prop = AnimatableProperty::new(Color::WHITE);
        prop.set(UPDATE, Color::new(2.0, 0.5, -1.0, 1.0));
        assert_eq!(prop.get(UPDATE), Color::new(1.0, 0.5, 0.0, 1.0));

        prop.bake(UPDATE, Color::new(0.5, 3.0, 0.5, -2.0));
        assert_eq!(prop.base_value(), Color::new(0.5, 1.0, 0.5, 0.0));
    }

    #[test]
    fn relative_writes_accumulate_on_current_value() {
        let mut prop = AnimatableProperty::new(2.0_f32);
        prop.bake_relative(UPDATE, 3.0);
        assert_eq!(prop.base_value(), 5.0);

        prop.set_relative(UPDATE, 1.0);
        assert_eq!(prop.get(UPDATE), 6.0);
        assert_eq!(prop.base_value(), 5.0);
    }
}
