//! Property System
//!
//! Storage primitives for per-frame values plus the addressing types used to
//! name a property from the producer side ([`PropertyIndex`]) and on the
//! scene side ([`PropertyTarget`]).
//!
//! # Cells
//!
//! - [`DoubleBuffered`]: two slots addressed by a caller-supplied [`BufferIndex`]
//! - [`AnimatableProperty`]: double buffer plus base value and dirty flags
//! - [`InheritedProperty`]: double buffer recomputed from a parent every tick
//! - [`PropertyCell`]: type-erased animatable property for custom properties
//!
//! Transform properties (position, orientation, scale, size, anchor point,
//! parent origin) are not stored in cells. They live in the
//! [`TransformManager`](crate::transform::TransformManager).

mod animatable;
mod buffer;
mod cell;
mod defaults;
mod inherited;
mod value;

use std::fmt;

pub use animatable::AnimatableProperty;
pub use buffer::{BufferIndex, DoubleBuffered};
pub use cell::PropertyCell;
pub use defaults::{DefaultProperty, default_property, find_default_property};
pub use inherited::InheritedProperty;
pub use value::{Color, Interpolatable, PropertyKind, PropertyType, PropertyValue};

use crate::scene::ObjectId;
use crate::transform::TransformProperty;

/// Index of a property on an object, as seen by the producer side.
///
/// Default properties use the associated constants. Custom properties start
/// at [`PropertyIndex::CUSTOM_START`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyIndex(pub u32);

impl PropertyIndex {
    pub const POSITION: Self = Self(0);
    pub const POSITION_X: Self = Self(1);
    pub const POSITION_Y: Self = Self(2);
    pub const POSITION_Z: Self = Self(3);
    pub const ORIENTATION: Self = Self(4);
    pub const SCALE: Self = Self(5);
    pub const SCALE_X: Self = Self(6);
    pub const SCALE_Y: Self = Self(7);
    pub const SCALE_Z: Self = Self(8);
    pub const SIZE: Self = Self(9);
    pub const SIZE_WIDTH: Self = Self(10);
    pub const SIZE_HEIGHT: Self = Self(11);
    pub const SIZE_DEPTH: Self = Self(12);
    pub const COLOR: Self = Self(13);
    pub const COLOR_RED: Self = Self(14);
    pub const COLOR_GREEN: Self = Self(15);
    pub const COLOR_BLUE: Self = Self(16);
    pub const COLOR_ALPHA: Self = Self(17);
    pub const VISIBLE: Self = Self(18);
    pub const PARENT_ORIGIN: Self = Self(19);
    pub const ANCHOR_POINT: Self = Self(20);
    pub const WORLD_POSITION: Self = Self(21);
    pub const WORLD_ORIENTATION: Self = Self(22);
    pub const WORLD_SCALE: Self = Self(23);
    pub const WORLD_COLOR: Self = Self(24);
    pub const WORLD_MATRIX: Self = Self(25);

    /// First index handed out to custom properties.
    pub const CUSTOM_START: Self = Self(10_000_000);

    #[inline]
    #[must_use]
    pub const fn is_custom(self) -> bool {
        self.0 >= Self::CUSTOM_START.0
    }

    #[inline]
    #[must_use]
    pub(crate) const fn custom_slot(self) -> Option<usize> {
        if self.is_custom() {
            Some((self.0 - Self::CUSTOM_START.0) as usize)
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn from_custom_slot(slot: usize) -> Self {
        Self(Self::CUSTOM_START.0 + slot as u32)
    }
}

impl fmt::Display for PropertyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match default_property(*self) {
            Some(info) => write!(f, "{} ({})", self.0, info.name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Selects one scalar of a vector or color property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    X,
    Y,
    Z,
    W,
}

impl Component {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::W => 3,
        }
    }
}

/// Where a property lives on the scene side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyRef {
    /// Slot in the node's custom property list.
    Custom(usize),
    Color,
    Visible,
    /// Vector3 property held by the transform manager.
    Transform(TransformProperty),
    /// Local orientation held by the transform manager.
    Orientation,
    WorldPosition,
    WorldOrientation,
    WorldScale,
    WorldColor,
    WorldMatrix,
}

impl PropertyRef {
    /// Managed by the transform manager, which resets itself every tick.
    #[inline]
    #[must_use]
    pub const fn is_transform(self) -> bool {
        matches!(self, Self::Transform(_) | Self::Orientation)
    }

    /// Computed by the update pass; readable only.
    #[inline]
    #[must_use]
    pub const fn is_derived(self) -> bool {
        matches!(
            self,
            Self::WorldPosition
                | Self::WorldOrientation
                | Self::WorldScale
                | Self::WorldColor
                | Self::WorldMatrix
        )
    }
}

/// A fully resolved scene-side property address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyTarget {
    pub object: ObjectId,
    pub property: PropertyRef,
    pub component: Option<Component>,
}

impl PropertyTarget {
    #[must_use]
    pub const fn new(object: ObjectId, property: PropertyRef, component: Option<Component>) -> Self {
        Self {
            object,
            property,
            component,
        }
    }
}
