//! Update Pipeline
//!
//! The producer side never touches scene state directly. Every change is
//! queued as a [`Message`](message::Message) and applied by the
//! [`UpdateManager`] at the start of the next tick, before animation and
//! constraint evaluation.

mod manager;
pub(crate) mod message;

pub use manager::{FrameReport, UpdateManager};
