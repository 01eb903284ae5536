//! Property Resetters
//!
//! A resetter copies a property's base value back into the update slot at
//! the start of every tick, so transient (`Set`) writes last exactly one
//! tick. One resetter exists per driven property and driver:
//!
//! - animator resetters live while the driving animation is playing or paused
//! - constraint resetters live while the constraint is attached
//! - baker resetters run once (`Bake`) or twice (`Set`) after a write from
//!   the producer side, bringing the other buffer slot up to date
//!
//! Once the driver is gone the resetter ages out over two ticks, one reset
//! per buffer slot, and is then removed. Transform-manager properties never
//! get resetters; the manager resets all of them in bulk.

use crate::animation::{AnimationId, AnimatorId};
use crate::constraint::ConstraintId;
use crate::property::{BufferIndex, PropertyTarget};
use crate::scene::SceneGraph;

const ACTIVE: u8 = 2;
const AGING: u8 = 1;
const STOPPED: u8 = 0;

/// How many ticks a baker resetter keeps resetting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// One reset: the write already reached the base value and one slot.
    Bake,
    /// Two resets: undo a transient write in both slots.
    Set,
}

/// What keeps a resetter active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetterDriver {
    Animator {
        animation: AnimationId,
        animator: AnimatorId,
    },
    Constraint(ConstraintId),
    Baker(Lifetime),
}

#[derive(Debug, Clone)]
pub struct PropertyResetter {
    target: PropertyTarget,
    driver: ResetterDriver,
    age: u8,
}

impl PropertyResetter {
    #[must_use]
    pub fn animator(target: PropertyTarget, animation: AnimationId, animator: AnimatorId) -> Self {
        Self {
            target,
            driver: ResetterDriver::Animator { animation, animator },
            age: ACTIVE,
        }
    }

    #[must_use]
    pub fn constraint(target: PropertyTarget, id: ConstraintId) -> Self {
        Self {
            target,
            driver: ResetterDriver::Constraint(id),
            age: ACTIVE,
        }
    }

    #[must_use]
    pub fn baker(target: PropertyTarget, lifetime: Lifetime) -> Self {
        let age = match lifetime {
            Lifetime::Bake => AGING,
            Lifetime::Set => ACTIVE,
        };
        Self {
            target,
            driver: ResetterDriver::Baker(lifetime),
            age,
        }
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> &PropertyTarget {
        &self.target
    }

    #[inline]
    #[must_use]
    pub fn driver(&self) -> ResetterDriver {
        self.driver
    }

    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.age == STOPPED
    }

    pub(crate) fn reset_to_base_value(&self, graph: &mut SceneGraph, index: BufferIndex) {
        if self.age > STOPPED {
            graph.reset_property(&self.target, index);
        }
    }

    /// Stays active while `driver_alive`; otherwise counts down one slot.
    pub(crate) fn update_age(&mut self, driver_alive: bool) {
        if driver_alive && !matches!(self.driver, ResetterDriver::Baker(_)) {
            self.age = ACTIVE;
        } else {
            self.age >>= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::property::PropertyRef;
    use crate::scene::ObjectId;

    fn target() -> PropertyTarget {
        let mut keys: SlotMap<ObjectId, ()> = SlotMap::with_key();
        PropertyTarget::new(keys.insert(()), PropertyRef::Color, None)
    }

    #[test]
    fn bake_baker_runs_once() {
        let mut resetter = PropertyResetter::baker(target(), Lifetime::Bake);
        assert!(!resetter.is_finished());
        resetter.update_age(true);
        assert!(resetter.is_finished());
    }

    #[test]
    fn set_baker_runs_twice() {
        let mut resetter = PropertyResetter::baker(target(), Lifetime::Set);
        resetter.update_age(true);
        assert!(!resetter.is_finished());
        resetter.update_age(true);
        assert!(resetter.is_finished());
    }

    #[test]
    fn driven_resetter_ages_out_after_its_driver() {
        let mut keys: SlotMap<ConstraintId, ()> = SlotMap::with_key();
        let mut resetter = PropertyResetter::constraint(target(), keys.insert(()));
        for _ in 0..5 {
            resetter.update_age(true);
            assert!(!resetter.is_finished());
        }
        resetter.update_age(false);
        assert!(!resetter.is_finished(), "One more reset for the other slot");
        resetter.update_age(false);
        assert!(resetter.is_finished());
    }
}
