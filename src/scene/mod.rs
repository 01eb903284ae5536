//! Scene Graph (update side)
//!
//! The update-side mirror of every producer-side object: a [`Node`] per
//! object, keyed by the same [`ObjectId`], plus the shared
//! [`TransformManager`](crate::transform::TransformManager).
//!
//! Nodes are created and destroyed only by draining queued messages. A
//! destroyed node is simply absent from the arena, which is how animators,
//! constraints and resetters detect that their owner is gone.

mod graph;
mod node;

use slotmap::new_key_type;

pub use graph::{SceneGraph, WriteMode};
pub use node::{ColorMode, Node, NodeInit};

new_key_type! {
    /// Handle shared by a producer-side object and its scene node.
    pub struct ObjectId;
}
