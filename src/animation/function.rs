use glam::{Quat, Vec3};

use super::keyframes::{Interpolation, KeyFrameCursor, KeyFrames};
use crate::property::{PropertyType, PropertyValue};

/// What an animator does with the property value it reads each tick.
#[derive(Debug, Clone)]
pub enum AnimatorFunction {
    /// Interpolates from the current value to the target.
    To(PropertyValue),
    /// Adds `delta * alpha` to the current value.
    By(PropertyValue),
    /// Samples a key-frame set; leaves the value alone before the first frame.
    Between {
        key_frames: KeyFrames,
        interpolation: Interpolation,
    },
    /// Rotates the current orientation by `angle` radians about `axis`.
    RotateBy { angle: f32, axis: Vec3 },
    /// Slerps from the current orientation to the target.
    RotateTo(Quat),
}

impl AnimatorFunction {
    /// Type of property this function can drive.
    #[must_use]
    pub fn value_type(&self) -> Option<PropertyType> {
        match self {
            Self::To(value) | Self::By(value) => Some(value.property_type()),
            Self::Between { key_frames, .. } => key_frames.value_type(),
            Self::RotateBy { .. } | Self::RotateTo(_) => Some(PropertyType::Rotation),
        }
    }

    pub(crate) fn evaluate(
        &self,
        alpha: f32,
        current: &PropertyValue,
        cursor: &mut KeyFrameCursor,
    ) -> Option<PropertyValue> {
        match self {
            Self::To(target) => current.interpolate(target, alpha),
            Self::By(delta) => current.add_scaled(delta, alpha),
            Self::Between {
                key_frames,
                interpolation,
            } => Some(
                key_frames
                    .sample_with_cursor(alpha, *interpolation, cursor)
                    .unwrap_or(*current),
            ),
            Self::RotateBy { angle, axis } => {
                let PropertyValue::Rotation(q) = *current else {
                    return None;
                };
                let delta = Quat::from_axis_angle(axis.normalize_or(Vec3::Z), angle * alpha);
                Some(PropertyValue::Rotation((q * delta).normalize()))
            }
            Self::RotateTo(target) => {
                let PropertyValue::Rotation(q) = *current else {
                    return None;
                };
                Some(PropertyValue::Rotation(q.slerp(*target, alpha)))
            }
        }
    }

    /// Value the property holds once the function has fully run from `start`.
    #[must_use]
    pub fn final_value(&self, start: &PropertyValue) -> Option<PropertyValue> {
        match self {
            Self::Between { key_frames, .. } => key_frames.last_value(),
            other => other.evaluate(1.0, start, &mut KeyFrameCursor::default()),
        }
    }
}
