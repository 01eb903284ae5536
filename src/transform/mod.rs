//! Transform System
//!
//! Batched local/world matrix computation for every scene node.
//!
//! Nodes do not own their transform data. Each node holds a [`TransformId`]
//! into the [`TransformManager`], which stores all entries as parallel arrays
//! kept in parent-before-child order so that a single forward pass can
//! compute every world matrix.

mod manager;

use bitflags::bitflags;
use slotmap::new_key_type;

pub use manager::{DEFAULT_ANCHOR_POINT, DEFAULT_PARENT_ORIGIN, TransformManager, WorldOutput};

new_key_type! {
    /// Opaque handle to a transform manager entry.
    pub struct TransformId;
}

/// Vector3 properties stored in the transform manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformProperty {
    Position,
    Scale,
    ParentOrigin,
    AnchorPoint,
    Size,
}

impl TransformProperty {
    /// Anchor point and parent origin have no base value: every write is
    /// persistent.
    #[inline]
    #[must_use]
    pub const fn has_base_value(self) -> bool {
        matches!(self, Self::Position | Self::Scale | Self::Size)
    }
}

bitflags! {
    /// Which parts of the parent's world transform a node inherits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InheritanceMode: u8 {
        const POSITION = 1 << 0;
        const ORIENTATION = 1 << 1;
        const SCALE = 1 << 2;
    }
}

impl Default for InheritanceMode {
    fn default() -> Self {
        Self::all()
    }
}
