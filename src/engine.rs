//! Engine Core Module
//!
//! This module contains [`Engine`], the central coordinator of the property,
//! animation and constraint subsystems. It owns both halves of the engine:
//!
//! - **Producer side**: objects, animations and constraints as the caller
//!   sees them. Every mutation is validated here and queued as a message.
//! - **Update side**: the [`UpdateManager`], which drains the queue once per
//!   tick, advances animations, evaluates constraints and flips the buffer
//!   index.
//!
//! Reads of the last completed tick go through [`RenderView`], bound to the
//! render index.
//!
//! # Example
//!
//! ```rust,ignore
//! use kinema::{Engine, EngineSettings, PropertyIndex};
//!
//! let mut engine = Engine::new(EngineSettings::default());
//! let node = engine.create_object("node");
//! engine.add_child(engine.root(), node)?;
//!
//! let animation = engine.create_animation(1.0);
//! engine.animate_to(animation, node, PropertyIndex::POSITION_X, 10.0_f32)?;
//! engine.play(animation)?;
//!
//! loop {
//!     let report = engine.update(1.0 / 60.0);
//!     let view = engine.render_view();
//!     // ... draw from `view` ...
//! }
//! ```

use glam::{Affine3A, Vec4};
use slotmap::SlotMap;

use crate::animation::AnimationId;
use crate::constraint::{Constraint, ConstraintId};
use crate::event::{AnimationControl, Object};
use crate::property::{BufferIndex, Color, PropertyTarget, PropertyValue};
use crate::scene::{ObjectId, SceneGraph};
use crate::settings::EngineSettings;
use crate::update::message::{Message, MessageQueue};
use crate::update::{FrameReport, UpdateManager};
use crate::utils::time::FrameClock;

/// The core engine instance that owns every object, animation and
/// constraint, plus the update pipeline driving them.
///
/// # Lifecycle
///
/// 1. Create with [`Engine::new`] or [`Engine::default`]
/// 2. Build the scene under [`Engine::root`] and configure animations and
///    constraints
/// 3. Call [`Engine::update`] (or [`Engine::tick`]) once per frame
/// 4. Read results through [`Engine::render_view`]
pub struct Engine {
    pub(crate) settings: EngineSettings,
    pub(crate) objects: SlotMap<ObjectId, Object>,
    pub(crate) animations: SlotMap<AnimationId, AnimationControl>,
    pub(crate) constraints: SlotMap<ConstraintId, Constraint>,
    pub(crate) queue: MessageQueue,
    pub(crate) update_manager: UpdateManager,
    pub(crate) root: ObjectId,
    pub(crate) next_animator: u32,
    clock: FrameClock,
}

impl Engine {
    /// Creates an engine whose scene holds only the root object.
    #[must_use]
    pub fn new(settings: EngineSettings) -> Self {
        let mut objects = SlotMap::with_key();
        let mut queue = MessageQueue::with_capacity(settings.message_queue_capacity);
        let clock = FrameClock::new(settings.max_frame_delta);

        let mut root_object = Object::new("root".to_owned());
        root_object.on_scene = true;
        let init = Box::new(root_object.cache.clone());
        let root = objects.insert(root_object);
        queue.push(Message::InstallNode { object: root, init });
        queue.push(Message::AddRoot { object: root });
        queue.push(Message::SetConnected {
            object: root,
            connected: true,
        });

        Self {
            settings,
            objects,
            animations: SlotMap::with_key(),
            constraints: SlotMap::with_key(),
            queue,
            update_manager: UpdateManager::new(),
            root,
            next_animator: 0,
            clock,
        }
    }

    /// The scene root. Objects are on the scene while connected to it.
    #[inline]
    #[must_use]
    pub fn root(&self) -> ObjectId {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Number of completed ticks.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.update_manager.frame()
    }

    #[inline]
    #[must_use]
    pub fn update_index(&self) -> BufferIndex {
        self.update_manager.update_index()
    }

    #[inline]
    #[must_use]
    pub fn render_index(&self) -> BufferIndex {
        self.update_manager.render_index()
    }

    /// Messages queued since the last tick.
    #[inline]
    #[must_use]
    pub fn pending_messages(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    #[must_use]
    pub fn update_manager(&self) -> &UpdateManager {
        &self.update_manager
    }

    /// Animation time simulated so far, after frame delta capping.
    #[inline]
    #[must_use]
    pub fn simulated_seconds(&self) -> f64 {
        self.clock.simulated_seconds()
    }

    /// Runs exactly one tick of `dt` seconds.
    pub fn update(&mut self, dt: f32) -> FrameReport {
        let dt = self.clock.advance(dt);

        let messages = self.queue.drain();
        let report = self.update_manager.update(dt, messages);
        log::trace!(
            "Frame {}: {} messages, {} finished",
            report.frame,
            report.messages,
            report.finished.len()
        );

        self.sync_animation_states();
        for &id in &report.finished {
            log::debug!("Animation {id:?} finished");
            self.on_animation_finished(id);
        }
        report
    }

    /// Runs one tick of the wall time elapsed since the previous one.
    pub fn tick(&mut self) -> FrameReport {
        let dt = self.clock.measure();
        self.update(dt)
    }

    /// Read-only view of the last completed tick.
    #[must_use]
    pub fn render_view(&self) -> RenderView<'_> {
        RenderView {
            graph: self.update_manager.graph(),
            index: self.update_manager.render_index(),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}

/// Scene values as of the last completed tick.
///
/// Bound to the render index, which the update pass never writes.
#[derive(Debug, Clone, Copy)]
pub struct RenderView<'a> {
    graph: &'a SceneGraph,
    index: BufferIndex,
}

impl RenderView<'_> {
    #[inline]
    #[must_use]
    pub fn index(&self) -> BufferIndex {
        self.index
    }

    #[must_use]
    pub fn world_matrix(&self, object: ObjectId) -> Option<Affine3A> {
        self.graph.world_matrix(object, self.index)
    }

    /// Bounding sphere as `(center, radius)` packed into a `Vec4`.
    #[must_use]
    pub fn bounding_sphere(&self, object: ObjectId) -> Option<Vec4> {
        let node = self.graph.node(object)?;
        self.graph.transforms().bounding_sphere(node.transform_id(), self.index)
    }

    #[must_use]
    pub fn color(&self, object: ObjectId) -> Option<Color> {
        self.graph.node(object).map(|node| node.color(self.index))
    }

    #[must_use]
    pub fn world_color(&self, object: ObjectId) -> Option<Color> {
        self.graph.node(object).map(|node| node.world_color(self.index))
    }

    #[must_use]
    pub fn is_visible(&self, object: ObjectId) -> bool {
        self.graph.node(object).is_some_and(|node| node.is_visible(self.index))
    }

    #[must_use]
    pub fn is_connected(&self, object: ObjectId) -> bool {
        self.graph.is_connected(object)
    }

    /// Reads any property address.
    #[must_use]
    pub fn read(&self, target: &PropertyTarget) -> Option<PropertyValue> {
        self.graph.read(target, self.index)
    }
}
