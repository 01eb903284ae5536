use glam::{Quat, Vec3};
use rustc_hash::FxHashMap;

use crate::engine::Engine;
use crate::errors::{KinemaError, Result};
use crate::property::{
    Color, Component, PropertyIndex, PropertyRef, PropertyTarget, PropertyType, PropertyValue, default_property,
    find_default_property,
};
use crate::resetter::{Lifetime, PropertyResetter};
use crate::scene::{ColorMode, NodeInit, ObjectId, WriteMode};
use crate::transform::{InheritanceMode, TransformProperty};
use crate::update::message::Message;

/// Producer-side half of a scene object.
///
/// Holds the hierarchy as the caller sees it and a cache of the last value
/// requested for every property, so reads never wait for a tick.
#[derive(Debug, Clone)]
pub struct Object {
    pub(crate) name: String,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
    pub(crate) on_scene: bool,
    pub(crate) cache: NodeInit,
    custom_names: Vec<String>,
    custom_lookup: FxHashMap<String, PropertyIndex>,
}

impl Object {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            on_scene: false,
            cache: NodeInit::default(),
            custom_names: Vec::new(),
            custom_lookup: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn is_on_scene(&self) -> bool {
        self.on_scene
    }

    #[inline]
    #[must_use]
    pub fn custom_property_count(&self) -> usize {
        self.custom_names.len()
    }

    // ========================================================================
    // Property Metadata
    // ========================================================================

    /// Looks up a default or custom property by name.
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<PropertyIndex> {
        find_default_property(name)
            .map(|info| info.index)
            .or_else(|| self.custom_lookup.get(name).copied())
    }

    #[must_use]
    pub fn property_name(&self, index: PropertyIndex) -> Option<&str> {
        match index.custom_slot() {
            Some(slot) => self.custom_names.get(slot).map(String::as_str),
            None => default_property(index).map(|info| info.name),
        }
    }

    #[must_use]
    pub fn property_type(&self, index: PropertyIndex) -> Option<PropertyType> {
        match index.custom_slot() {
            Some(slot) => self.cache.custom.get(slot).map(PropertyValue::property_type),
            None => default_property(index).map(|info| info.kind),
        }
    }

    #[must_use]
    pub fn is_property_writable(&self, index: PropertyIndex) -> bool {
        match index.custom_slot() {
            Some(slot) => slot < self.cache.custom.len(),
            None => default_property(index).is_some_and(|info| info.writable),
        }
    }

    #[must_use]
    pub fn is_property_animatable(&self, index: PropertyIndex) -> bool {
        match index.custom_slot() {
            Some(_) => self.property_type(index).is_some_and(PropertyType::is_animatable),
            None => default_property(index).is_some_and(|info| info.animatable),
        }
    }

    #[must_use]
    pub fn is_property_a_constraint_input(&self, index: PropertyIndex) -> bool {
        match index.custom_slot() {
            Some(slot) => slot < self.cache.custom.len(),
            None => default_property(index).is_some_and(|info| info.constraint_input),
        }
    }

    /// Component addressed by a per-axis default property.
    #[must_use]
    pub fn property_component(&self, index: PropertyIndex) -> Option<Component> {
        default_property(index).and_then(|info| info.component)
    }

    /// Scene-side location of any property.
    pub(crate) fn locate(&self, index: PropertyIndex) -> Option<(PropertyRef, Option<Component>)> {
        match index.custom_slot() {
            Some(slot) => (slot < self.cache.custom.len()).then_some((PropertyRef::Custom(slot), None)),
            None => default_property(index).map(|info| (info.location, info.component)),
        }
    }

    /// Location of a property an animator may drive.
    pub(crate) fn animatable_target(&self, index: PropertyIndex) -> Option<(PropertyRef, Option<Component>)> {
        if self.is_property_animatable(index) {
            self.locate(index)
        } else {
            None
        }
    }

    /// Location of a property a constraint may read.
    pub(crate) fn input_target(&self, index: PropertyIndex) -> Option<(PropertyRef, Option<Component>)> {
        if self.is_property_a_constraint_input(index) {
            self.locate(index)
        } else {
            None
        }
    }

    // ========================================================================
    // Value Cache
    // ========================================================================

    /// Last value requested for `index`. Derived properties have none.
    #[must_use]
    pub fn cached_value(&self, index: PropertyIndex) -> Option<PropertyValue> {
        let (location, component) = self.locate(index)?;
        let whole = self.cached_whole(location)?;
        match component {
            Some(component) => whole.component(component).map(PropertyValue::Float),
            None => Some(whole),
        }
    }

    pub(crate) fn cache_value(&mut self, index: PropertyIndex, value: PropertyValue) -> bool {
        let Some((location, component)) = self.locate(index) else {
            return false;
        };
        let Some(whole) = self.cached_whole(location) else {
            return false;
        };
        let next = match (component, value) {
            (Some(component), PropertyValue::Float(v)) => whole.with_component(component, v),
            (None, value) if value.property_type() == whole.property_type() => Some(value),
            _ => None,
        };
        match next {
            Some(next) => self.store_whole(location, next),
            None => false,
        }
    }

    fn cached_whole(&self, location: PropertyRef) -> Option<PropertyValue> {
        let cache = &self.cache;
        Some(match location {
            PropertyRef::Custom(slot) => *cache.custom.get(slot)?,
            PropertyRef::Color => PropertyValue::Color(cache.color),
            PropertyRef::Visible => PropertyValue::Boolean(cache.visible),
            PropertyRef::Orientation => PropertyValue::Rotation(cache.orientation),
            PropertyRef::Transform(property) => PropertyValue::Vector3(match property {
                TransformProperty::Position => cache.position,
                TransformProperty::Scale => cache.scale,
                TransformProperty::Size => cache.size,
                TransformProperty::ParentOrigin => cache.parent_origin,
                TransformProperty::AnchorPoint => cache.anchor_point,
            }),
            _ => return None,
        })
    }

    fn store_whole(&mut self, location: PropertyRef, value: PropertyValue) -> bool {
        let cache = &mut self.cache;
        match (location, value) {
            (PropertyRef::Custom(slot), value) => match cache.custom.get_mut(slot) {
                Some(stored) => *stored = value,
                None => return false,
            },
            (PropertyRef::Color, PropertyValue::Color(color)) => cache.color = color.clamped(),
            (PropertyRef::Visible, PropertyValue::Boolean(visible)) => cache.visible = visible,
            (PropertyRef::Orientation, PropertyValue::Rotation(q)) => cache.orientation = q,
            (PropertyRef::Transform(property), PropertyValue::Vector3(v)) => match property {
                TransformProperty::Position => cache.position = v,
                TransformProperty::Scale => cache.scale = v,
                TransformProperty::Size => cache.size = v,
                TransformProperty::ParentOrigin => cache.parent_origin = v,
                TransformProperty::AnchorPoint => cache.anchor_point = v,
            },
            _ => return false,
        }
        true
    }
}

// ============================================================================
// Engine: Objects
// ============================================================================

impl Engine {
    /// Creates an object off the scene.
    pub fn create_object(&mut self, name: impl Into<String>) -> ObjectId {
        let object = Object::new(name.into());
        let init = Box::new(object.cache.clone());
        let id = self.objects.insert(object);
        self.queue.push(Message::InstallNode { object: id, init });
        id
    }

    #[inline]
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id)
    }

    #[must_use]
    pub fn is_on_scene(&self, id: ObjectId) -> bool {
        self.objects.get(id).is_some_and(|object| object.on_scene)
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        self.objects.get_mut(id).ok_or(KinemaError::ObjectNotFound(id))
    }

    pub(crate) fn object_ref(&self, id: ObjectId) -> Result<&Object> {
        self.objects.get(id).ok_or(KinemaError::ObjectNotFound(id))
    }

    /// Destroys `id`. Its children stay alive, detached from the scene.
    pub fn destroy_object(&mut self, id: ObjectId) -> Result<()> {
        if id == self.root {
            return Err(KinemaError::RootObject);
        }
        self.unparent(id)?;
        let children = self.object_ref(id)?.children.clone();
        for child in children {
            self.unparent(child)?;
        }

        self.on_object_destroyed(id);
        self.objects.remove(id);
        self.queue.push(Message::DestroyNode { object: id });
        Ok(())
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Moves `child` under `parent`; the subtree joins the scene when
    /// `parent` is on it.
    pub fn add_child(&mut self, parent: ObjectId, child: ObjectId) -> Result<()> {
        self.object_ref(parent)?;
        if self.object_ref(child)?.parent == Some(parent) {
            return Ok(());
        }
        if child == self.root {
            return Err(KinemaError::RootObject);
        }
        if self.ancestors_of(parent).contains(&child) || parent == child {
            return Err(KinemaError::InvalidHierarchy { parent, child });
        }

        self.unparent(child)?;
        let parent_on_scene = {
            let parent_object = self.object_mut(parent)?;
            parent_object.children.push(child);
            parent_object.on_scene
        };
        self.object_mut(child)?.parent = Some(parent);
        self.queue.push(Message::SetParent {
            object: child,
            parent: Some(parent),
        });

        if parent_on_scene {
            self.set_subtree_on_scene(child, true);
        }
        Ok(())
    }

    /// Detaches `child` from its parent, taking its subtree off the scene.
    pub fn unparent(&mut self, child: ObjectId) -> Result<()> {
        let object = self.object_mut(child)?;
        let Some(parent) = object.parent.take() else {
            return Ok(());
        };
        let was_on_scene = object.on_scene;
        if let Some(parent_object) = self.objects.get_mut(parent) {
            parent_object.children.retain(|&c| c != child);
        }
        self.queue.push(Message::SetParent {
            object: child,
            parent: None,
        });

        if was_on_scene {
            self.set_subtree_on_scene(child, false);
        }
        Ok(())
    }

    fn ancestors_of(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut ancestors = Vec::new();
        let mut current = self.objects.get(id).and_then(|object| object.parent);
        while let Some(ancestor) = current {
            ancestors.push(ancestor);
            current = self.objects.get(ancestor).and_then(|object| object.parent);
        }
        ancestors
    }

    /// `root` and all its descendants, parents before children.
    pub(crate) fn subtree(&self, root: ObjectId) -> Vec<ObjectId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(object) = self.objects.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(object.children.iter().rev().copied());
        }
        order
    }

    fn set_subtree_on_scene(&mut self, root: ObjectId, on_scene: bool) {
        for id in self.subtree(root) {
            let Some(object) = self.objects.get_mut(id) else {
                continue;
            };
            if object.on_scene == on_scene {
                continue;
            }
            object.on_scene = on_scene;
            self.queue.push(Message::SetConnected {
                object: id,
                connected: on_scene,
            });
            if on_scene {
                self.on_scene_object_added(id);
            } else {
                self.on_scene_object_removed(id);
            }
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Registers a custom property. Names are unique per object, including
    /// the default property names.
    pub fn register_property(
        &mut self,
        id: ObjectId,
        name: &str,
        initial: impl Into<PropertyValue>,
    ) -> Result<PropertyIndex> {
        let initial = initial.into();
        let object = self.object_mut(id)?;
        if object.find_property(name).is_some() {
            return Err(KinemaError::DuplicatePropertyName(name.to_owned()));
        }

        let slot = object.cache.custom.len();
        let index = PropertyIndex::from_custom_slot(slot);
        object.cache.custom.push(initial);
        object.custom_names.push(name.to_owned());
        object.custom_lookup.insert(name.to_owned(), index);

        self.queue.push(Message::RegisterProperty {
            object: id,
            slot,
            initial,
        });
        Ok(index)
    }

    /// Bakes `value` into the property at the next tick.
    pub fn set_property(&mut self, id: ObjectId, index: PropertyIndex, value: impl Into<PropertyValue>) -> Result<()> {
        let value = value.into();
        let object = self.object_mut(id)?;
        let expected = object.property_type(index).ok_or(KinemaError::PropertyNotFound(index))?;
        if !object.is_property_writable(index) {
            return Err(KinemaError::PropertyNotWritable(index));
        }
        if value.property_type() != expected {
            return Err(KinemaError::TypeMismatch {
                expected,
                found: value.property_type(),
            });
        }
        let (property, component) = object.locate(index).ok_or(KinemaError::PropertyNotFound(index))?;
        object.cache_value(index, value);

        let target = PropertyTarget::new(id, property, component);
        self.queue.push(Message::WriteProperty {
            target,
            value,
            mode: WriteMode::Bake,
        });
        if !property.is_transform() {
            self.queue
                .push(Message::AddResetter(PropertyResetter::baker(target, Lifetime::Bake)));
        }
        Ok(())
    }

    /// Last requested value. Derived properties fall back to the rendered
    /// value.
    pub fn get_property(&self, id: ObjectId, index: PropertyIndex) -> Result<PropertyValue> {
        let object = self.object_ref(id)?;
        object.property_type(index).ok_or(KinemaError::PropertyNotFound(index))?;
        match object.cached_value(index) {
            Some(value) => Ok(value),
            None => self.current_property(id, index),
        }
    }

    /// Value produced by the last completed tick.
    pub fn current_property(&self, id: ObjectId, index: PropertyIndex) -> Result<PropertyValue> {
        let object = self.object_ref(id)?;
        let (property, component) = object
            .input_target(index)
            .ok_or(KinemaError::NotAConstraintInput(index))?;
        let target = PropertyTarget::new(id, property, component);
        self.update_manager
            .graph()
            .read(&target, self.update_manager.render_index())
            .or_else(|| object.cached_value(index))
            .ok_or(KinemaError::PropertyNotFound(index))
    }

    pub fn translate_by(&mut self, id: ObjectId, delta: Vec3) -> Result<()> {
        let object = self.object_mut(id)?;
        object.cache.position += delta;
        self.queue_transform_write(id, PropertyRef::Transform(TransformProperty::Position), delta.into(), WriteMode::BakeRelative);
        Ok(())
    }

    pub fn scale_by(&mut self, id: ObjectId, factor: Vec3) -> Result<()> {
        let object = self.object_mut(id)?;
        object.cache.scale *= factor;
        self.queue_transform_write(id, PropertyRef::Transform(TransformProperty::Scale), factor.into(), WriteMode::BakeMultiply);
        Ok(())
    }

    pub fn rotate_by(&mut self, id: ObjectId, rotation: Quat) -> Result<()> {
        let object = self.object_mut(id)?;
        object.cache.orientation = (object.cache.orientation * rotation).normalize();
        self.queue_transform_write(id, PropertyRef::Orientation, rotation.into(), WriteMode::BakeRelative);
        Ok(())
    }

    fn queue_transform_write(&mut self, id: ObjectId, property: PropertyRef, value: PropertyValue, mode: WriteMode) {
        self.queue.push(Message::WriteProperty {
            target: PropertyTarget::new(id, property, None),
            value,
            mode,
        });
    }

    pub fn set_color_mode(&mut self, id: ObjectId, mode: ColorMode) -> Result<()> {
        self.object_mut(id)?.cache.color_mode = mode;
        self.queue.push(Message::SetColorMode { object: id, mode });
        Ok(())
    }

    pub fn set_inheritance(&mut self, id: ObjectId, inheritance: InheritanceMode) -> Result<()> {
        let object = self.object_mut(id)?;
        object.cache.inheritance = inheritance;
        let position_uses_anchor_point = object.cache.position_uses_anchor_point;
        self.queue.push(Message::SetTransformFlags {
            object: id,
            inheritance,
            position_uses_anchor_point,
        });
        Ok(())
    }

    pub fn set_position_uses_anchor_point(&mut self, id: ObjectId, enabled: bool) -> Result<()> {
        let object = self.object_mut(id)?;
        object.cache.position_uses_anchor_point = enabled;
        let inheritance = object.cache.inheritance;
        self.queue.push(Message::SetTransformFlags {
            object: id,
            inheritance,
            position_uses_anchor_point: enabled,
        });
        Ok(())
    }

    /// Convenience for [`set_property`](Self::set_property) on the color.
    pub fn set_color(&mut self, id: ObjectId, color: Color) -> Result<()> {
        self.set_property(id, PropertyIndex::COLOR, color)
    }
}
