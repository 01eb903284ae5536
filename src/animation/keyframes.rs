use crate::errors::{KinemaError, Result};
use crate::property::{PropertyType, PropertyValue};

/// How values between two key frames are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    /// Catmull-Rom through neighbouring key frames.
    Cubic,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the last segment sampled so monotonic playback is O(1).
#[derive(Debug, Clone, Default)]
pub struct KeyFrameCursor {
    last_index: usize,
}

/// Progress-ordered values of a single property type.
#[derive(Debug, Clone, Default)]
pub struct KeyFrames {
    progress: Vec<f32>,
    values: Vec<PropertyValue>,
}

impl KeyFrames {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key frame at `progress` (clamped to `[0, 1]`). Frames with
    /// equal progress keep their insertion order.
    pub fn add(&mut self, progress: f32, value: impl Into<PropertyValue>) -> Result<()> {
        let value = value.into();
        let found = value.property_type();
        if !found.is_animatable() {
            return Err(KinemaError::UnsupportedType(found));
        }
        if let Some(expected) = self.value_type()
            && expected != found
        {
            return Err(KinemaError::TypeMismatch { expected, found });
        }

        let progress = progress.clamp(0.0, 1.0);
        let at = self.progress.partition_point(|&p| p <= progress);
        self.progress.insert(at, progress);
        self.values.insert(at, value);
        Ok(())
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, progress: f32, value: impl Into<PropertyValue>) -> Result<Self> {
        self.add(progress, value)?;
        Ok(self)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.progress.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.progress.is_empty()
    }

    #[must_use]
    pub fn value_type(&self) -> Option<PropertyType> {
        self.values.first().map(PropertyValue::property_type)
    }

    #[must_use]
    pub fn last_value(&self) -> Option<PropertyValue> {
        self.values.last().copied()
    }

    /// Samples without a cursor. Returns `None` before the first key frame.
    #[must_use]
    pub fn sample(&self, progress: f32, interpolation: Interpolation) -> Option<PropertyValue> {
        let next = self.progress.partition_point(|&p| p <= progress);
        let index = next.checked_sub(1)?;
        self.sample_at_frame(index, progress, interpolation)
    }

    /// Samples using `cursor` as the search hint and updates it.
    pub fn sample_with_cursor(
        &self,
        progress: f32,
        interpolation: Interpolation,
        cursor: &mut KeyFrameCursor,
    ) -> Option<PropertyValue> {
        let len = self.progress.len();
        let first = *self.progress.first()?;
        if progress < first {
            return None;
        }
        if len == 1 {
            return self.values.first().copied();
        }

        let i = cursor.last_index.min(len - 1);
        let found = if progress >= self.progress[i] {
            let mut hit = None;
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx >= len - 1 {
                    hit = Some(len - 1);
                    break;
                }
                if progress < self.progress[idx + 1] {
                    hit = Some(idx);
                    break;
                }
            }
            hit
        } else {
            (0..=MAX_SCAN_OFFSET.min(i))
                .map(|offset| i - offset)
                .find(|&idx| progress >= self.progress[idx])
        };

        let index = found.unwrap_or_else(|| {
            let next = self.progress.partition_point(|&p| p <= progress);
            next.saturating_sub(1)
        });
        cursor.last_index = index;
        self.sample_at_frame(index, progress, interpolation)
    }

    fn sample_at_frame(&self, index: usize, progress: f32, interpolation: Interpolation) -> Option<PropertyValue> {
        let last = self.progress.len().checked_sub(1)?;
        if index >= last {
            return self.values.last().copied();
        }

        let (p0, p1) = (self.progress[index], self.progress[index + 1]);
        let span = p1 - p0;
        if span <= f32::EPSILON {
            return Some(self.values[index + 1]);
        }
        let t = ((progress - p0) / span).clamp(0.0, 1.0);
        let (v0, v1) = (&self.values[index], &self.values[index + 1]);

        match interpolation {
            Interpolation::Linear => v0.interpolate(v1, t),
            Interpolation::Cubic => {
                let m0 = self.tangent_at(index)?;
                let m1 = self.tangent_at(index + 1)?;
                PropertyValue::interpolate_cubic(v0, &m0, &m1, v1, t, span)
            }
        }
    }

    /// Catmull-Rom tangent, one-sided at the ends.
    fn tangent_at(&self, index: usize) -> Option<PropertyValue> {
        let prev = index.saturating_sub(1);
        let next = (index + 1).min(self.progress.len() - 1);
        let span = self.progress[next] - self.progress[prev];
        if span <= f32::EPSILON {
            return PropertyValue::tangent(&self.values[index], &self.values[index], 1.0);
        }
        PropertyValue::tangent(&self.values[prev], &self.values[next], span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> KeyFrames {
        KeyFrames::new()
            .with(0.0, 0.0_f32)
            .and_then(|k| k.with(0.5, 10.0_f32))
            .and_then(|k| k.with(1.0, 0.0_f32))
            .unwrap()
    }

    #[test]
    fn linear_sampling_between_frames() {
        let frames = ramp();
        assert_eq!(frames.sample(0.25, Interpolation::Linear), Some(PropertyValue::Float(5.0)));
        assert_eq!(frames.sample(0.75, Interpolation::Linear), Some(PropertyValue::Float(5.0)));
        assert_eq!(frames.sample(1.0, Interpolation::Linear), Some(PropertyValue::Float(0.0)));
    }

    #[test]
    fn cursor_matches_plain_sampling_in_both_directions() {
        let frames = ramp();
        let mut cursor = KeyFrameCursor::default();
        let forward = [0.0, 0.1, 0.4, 0.6, 0.9, 1.0];
        for p in forward.iter().chain(forward.iter().rev()) {
            assert_eq!(
                frames.sample_with_cursor(*p, Interpolation::Linear, &mut cursor),
                frames.sample(*p, Interpolation::Linear),
                "Mismatch at {p}"
            );
        }
    }

    #[test]
    fn inactive_before_first_frame() {
        let frames = KeyFrames::new().with(0.5, 1.0_f32).unwrap();
        assert_eq!(frames.sample(0.25, Interpolation::Linear), None);
        assert_eq!(frames.sample(0.75, Interpolation::Linear), Some(PropertyValue::Float(1.0)));
    }

    #[test]
    fn mixed_types_are_rejected() {
        let mut frames = KeyFrames::new();
        frames.add(0.0, 1.0_f32).unwrap();
        assert!(matches!(
            frames.add(1.0, glam::Vec3::ONE),
            Err(KinemaError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn cubic_passes_through_key_frames() {
        let frames = ramp();
        let mid = frames.sample(0.5, Interpolation::Cubic);
        assert_eq!(mid, Some(PropertyValue::Float(10.0)));
    }
}
