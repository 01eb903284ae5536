use super::buffer::{BufferIndex, DoubleBuffered};
use super::value::PropertyKind;

/// A double-buffered value computed from a parent each tick (e.g. world
/// color). It has no base value and is never baked.
#[derive(Debug, Clone)]
pub struct InheritedProperty<T: PropertyKind> {
    value: DoubleBuffered<T>,
    /// Written at least once since creation.
    inherited: bool,
    /// Written during the previous tick.
    reinherited: bool,
}

impl<T: PropertyKind> InheritedProperty<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            value: DoubleBuffered::new(initial.sanitize()),
            inherited: false,
            reinherited: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: BufferIndex) -> T {
        self.value.get(index)
    }

    /// Whether a value has ever been inherited. Constraints reading this
    /// property hold back until it has.
    #[inline]
    #[must_use]
    pub fn input_initialized(&self) -> bool {
        self.inherited
    }

    /// Value seen by constraints during the update of `index`: the one
    /// produced by the previous tick.
    #[inline]
    #[must_use]
    pub fn constraint_input(&self, index: BufferIndex) -> T {
        self.value.get(index.other())
    }

    pub fn set(&mut self, index: BufferIndex, value: T) {
        self.value.set(index, value.sanitize());
        self.inherited = true;
        self.reinherited = true;
    }

    /// Carries the previous tick's value forward when the property was not
    /// recomputed this tick.
    pub fn copy_previous(&mut self, index: BufferIndex) {
        if self.reinherited {
            self.value.copy_from_other(index);
            self.reinherited = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_is_uninitialized_until_first_set() {
        let mut prop = InheritedProperty::new(0.0_f32);
        assert!(!prop.input_initialized());

        prop.set(BufferIndex::ZERO, 1.0);
        assert!(prop.input_initialized());
        assert_eq!(prop.constraint_input(BufferIndex::ONE), 1.0);
    }

    #[test]
    fn copy_previous_runs_once_after_a_set() {
        let mut prop = InheritedProperty::new(0.0_f32);
        prop.set(BufferIndex::ZERO, 2.0);

        prop.copy_previous(BufferIndex::ONE);
        assert_eq!(prop.get(BufferIndex::ONE), 2.0);

        prop.set(BufferIndex::ZERO, 5.0);
        prop.copy_previous(BufferIndex::ONE);
        prop.copy_previous(BufferIndex::ZERO);
        assert_eq!(prop.get(BufferIndex::ZERO), 5.0, "Second copy is a no-op");
    }
}
