use std::fmt;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::Component;

// ============================================================================
// Color
// ============================================================================

/// Linear RGBA color. Stored channels are always clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color(pub Vec4);

impl Color {
    pub const WHITE: Self = Self(Vec4::ONE);
    pub const BLACK: Self = Self(Vec4::new(0.0, 0.0, 0.0, 1.0));
    pub const TRANSPARENT: Self = Self(Vec4::ZERO);

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self(Vec4::new(r, g, b, a))
    }

    #[inline]
    #[must_use]
    pub fn clamped(self) -> Self {
        Self(self.0.clamp(Vec4::ZERO, Vec4::ONE))
    }

    #[inline]
    #[must_use]
    pub fn alpha(self) -> f32 {
        self.0.w
    }
}

// ============================================================================
// Property Types
// ============================================================================

/// Type tag of a [`PropertyValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Boolean,
    Integer,
    Float,
    Vector2,
    Vector3,
    Vector4,
    Color,
    Rotation,
    Matrix,
}

impl PropertyType {
    /// Whether values of this type can be interpolated by an animator.
    #[must_use]
    pub const fn is_animatable(self) -> bool {
        !matches!(self, Self::Matrix)
    }

    /// Number of scalar components addressable through [`Component`].
    #[must_use]
    pub const fn component_count(self) -> usize {
        match self {
            Self::Vector2 => 2,
            Self::Vector3 => 3,
            Self::Vector4 | Self::Color => 4,
            _ => 0,
        }
    }
}

/// A dynamically typed property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i32),
    Float(f32),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector4(Vec4),
    Color(Color),
    Rotation(Quat),
    Matrix(Mat4),
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Applies `$body` to two values of the same animatable type.
macro_rules! zip_values {
    ($lhs:expr, $rhs:expr, |$a:ident, $b:ident| $body:expr) => {
        match ($lhs, $rhs) {
            (PropertyValue::Boolean($a), PropertyValue::Boolean($b)) => {
                Some(PropertyValue::Boolean($body))
            }
            (PropertyValue::Integer($a), PropertyValue::Integer($b)) => {
                Some(PropertyValue::Integer($body))
            }
            (PropertyValue::Float($a), PropertyValue::Float($b)) => Some(PropertyValue::Float($body)),
            (PropertyValue::Vector2($a), PropertyValue::Vector2($b)) => {
                Some(PropertyValue::Vector2($body))
            }
            (PropertyValue::Vector3($a), PropertyValue::Vector3($b)) => {
                Some(PropertyValue::Vector3($body))
            }
            (PropertyValue::Vector4($a), PropertyValue::Vector4($b)) => {
                Some(PropertyValue::Vector4($body))
            }
            (PropertyValue::Color($a), PropertyValue::Color($b)) => Some(PropertyValue::Color($body)),
            (PropertyValue::Rotation($a), PropertyValue::Rotation($b)) => {
                Some(PropertyValue::Rotation($body))
            }
            _ => None,
        }
    };
}

impl PropertyValue {
    #[must_use]
    pub const fn property_type(&self) -> PropertyType {
        match self {
            Self::Boolean(_) => PropertyType::Boolean,
            Self::Integer(_) => PropertyType::Integer,
            Self::Float(_) => PropertyType::Float,
            Self::Vector2(_) => PropertyType::Vector2,
            Self::Vector3(_) => PropertyType::Vector3,
            Self::Vector4(_) => PropertyType::Vector4,
            Self::Color(_) => PropertyType::Color,
            Self::Rotation(_) => PropertyType::Rotation,
            Self::Matrix(_) => PropertyType::Matrix,
        }
    }

    /// Reads one scalar component of a vector or color value.
    #[must_use]
    pub fn component(&self, component: Component) -> Option<f32> {
        let i = component.index();
        match *self {
            Self::Vector2(v) if i < 2 => Some(v[i]),
            Self::Vector3(v) if i < 3 => Some(v[i]),
            Self::Vector4(v) => Some(v[i]),
            Self::Color(c) => Some(c.0[i]),
            _ => None,
        }
    }

    /// Returns a copy with one scalar component replaced.
    #[must_use]
    pub fn with_component(mut self, component: Component, value: f32) -> Option<Self> {
        let i = component.index();
        match &mut self {
            Self::Vector2(v) if i < 2 => v[i] = value,
            Self::Vector3(v) if i < 3 => v[i] = value,
            Self::Vector4(v) => v[i] = value,
            Self::Color(c) => c.0[i] = value,
            _ => return None,
        }
        Some(self)
    }

    /// `start + (end - start) * t`, typed per variant.
    #[must_use]
    pub fn interpolate(&self, end: &Self, t: f32) -> Option<Self> {
        zip_values!(*self, *end, |a, b| Interpolatable::interpolate_linear(a, b, t))
    }

    /// `self + delta * alpha`, typed per variant.
    #[must_use]
    pub fn add_scaled(&self, delta: &Self, alpha: f32) -> Option<Self> {
        zip_values!(*self, *delta, |a, b| Interpolatable::add_scaled(a, b, alpha))
    }

    /// Hermite interpolation between `v0` and `v1` with the given tangents.
    #[must_use]
    pub fn interpolate_cubic(
        v0: &Self,
        out_tangent0: &Self,
        in_tangent1: &Self,
        v1: &Self,
        t: f32,
        dt: f32,
    ) -> Option<Self> {
        let (tangent0, tangent1) = (*out_tangent0, *in_tangent1);
        zip_values!(*v0, *v1, |a, b| {
            let (Some(m0), Some(m1)) = (
                Interpolatable::from_property(&tangent0),
                Interpolatable::from_property(&tangent1),
            ) else {
                return None;
            };
            Interpolatable::interpolate_cubic(a, m0, m1, b, t, dt)
        })
    }

    /// Finite-difference tangent `(next - prev) / span`.
    #[must_use]
    pub fn tangent(prev: &Self, next: &Self, span: f32) -> Option<Self> {
        zip_values!(*prev, *next, |a, b| Interpolatable::tangent(a, b, span))
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_for_value!(
    bool => Boolean,
    i32 => Integer,
    f32 => Float,
    Vec2 => Vector2,
    Vec3 => Vector3,
    Vec4 => Vector4,
    Color => Color,
    Quat => Rotation,
    Mat4 => Matrix,
);

// ============================================================================
// Typed access
// ============================================================================

/// A concrete Rust type that can be stored in a property cell.
pub trait PropertyKind: Copy + PartialEq + fmt::Debug + 'static {
    const TYPE: PropertyType;

    fn into_value(self) -> PropertyValue;

    fn from_value(value: &PropertyValue) -> Option<Self>;

    /// Normalises a value before it is stored.
    #[inline]
    #[must_use]
    fn sanitize(self) -> Self {
        self
    }
}

macro_rules! impl_property_kind {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl PropertyKind for $ty {
                const TYPE: PropertyType = PropertyType::$variant;

                #[inline]
                fn into_value(self) -> PropertyValue {
                    PropertyValue::$variant(self)
                }

                #[inline]
                fn from_value(value: &PropertyValue) -> Option<Self> {
                    match value {
                        PropertyValue::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_property_kind!(
    bool => Boolean,
    i32 => Integer,
    f32 => Float,
    Vec2 => Vector2,
    Vec3 => Vector3,
    Vec4 => Vector4,
    Quat => Rotation,
    Mat4 => Matrix,
);

impl PropertyKind for Color {
    const TYPE: PropertyType = PropertyType::Color;

    #[inline]
    fn into_value(self) -> PropertyValue {
        PropertyValue::Color(self)
    }

    #[inline]
    fn from_value(value: &PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    #[inline]
    fn sanitize(self) -> Self {
        self.clamped()
    }
}

// ============================================================================
// Interpolation
// ============================================================================

/// Arithmetic needed by animators and key frames.
pub trait Interpolatable: PropertyKind {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;

    fn interpolate_cubic(
        v0: Self,
        out_tangent0: Self,
        in_tangent1: Self,
        v1: Self,
        t: f32,
        dt: f32,
    ) -> Self;

    /// Relative application used by "animate by".
    fn add_scaled(self, delta: Self, alpha: f32) -> Self;

    /// Slope between two samples `span` apart.
    fn tangent(prev: Self, next: Self, span: f32) -> Self;

    #[inline]
    fn from_property(value: &PropertyValue) -> Option<Self> {
        Self::from_value(value)
    }
}

#[inline]
fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;

    let s2 = -2.0 * t3 + 3.0 * t2;
    let s3 = t3 - t2;
    let s0 = 1.0 - s2;
    let s1 = s3 - t2 + t;
    (s0, s1, s2, s3)
}

macro_rules! impl_interpolatable_linear_space {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Interpolatable for $ty {
                #[inline]
                fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
                    start + (end - start) * t
                }

                fn interpolate_cubic(
                    v0: Self,
                    out_tangent0: Self,
                    in_tangent1: Self,
                    v1: Self,
                    t: f32,
                    dt: f32,
                ) -> Self {
                    let (s0, s1, s2, s3) = hermite_basis(t);
                    v0 * s0 + out_tangent0 * (s1 * dt) + v1 * s2 + in_tangent1 * (s3 * dt)
                }

                #[inline]
                fn add_scaled(self, delta: Self, alpha: f32) -> Self {
                    self + delta * alpha
                }

                fn tangent(prev: Self, next: Self, span: f32) -> Self {
                    if span > f32::EPSILON {
                        (next - prev) * (1.0 / span)
                    } else {
                        prev * 0.0
                    }
                }
            }
        )*
    };
}

impl_interpolatable_linear_space!(f32, Vec2, Vec3, Vec4);

impl Interpolatable for Color {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        Self(Vec4::interpolate_linear(start.0, end.0, t))
    }

    fn interpolate_cubic(
        v0: Self,
        out_tangent0: Self,
        in_tangent1: Self,
        v1: Self,
        t: f32,
        dt: f32,
    ) -> Self {
        Self(Vec4::interpolate_cubic(
            v0.0,
            out_tangent0.0,
            in_tangent1.0,
            v1.0,
            t,
            dt,
        ))
    }

    fn add_scaled(self, delta: Self, alpha: f32) -> Self {
        Self(self.0 + delta.0 * alpha)
    }

    // Tangents are unclamped intermediates, so they bypass `Color::clamped`.
    fn tangent(prev: Self, next: Self, span: f32) -> Self {
        Self(Vec4::tangent(prev.0, next.0, span))
    }
}

impl Interpolatable for Quat {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.slerp(end, t)
    }

    // Rotations have no meaningful Hermite form here; fall back to slerp.
    fn interpolate_cubic(v0: Self, _: Self, _: Self, v1: Self, t: f32, _dt: f32) -> Self {
        v0.slerp(v1, t)
    }

    fn add_scaled(self, delta: Self, alpha: f32) -> Self {
        let (axis, angle) = delta.to_axis_angle();
        if angle.abs() <= f32::EPSILON {
            return self;
        }
        (self * Quat::from_axis_angle(axis, angle * alpha)).normalize()
    }

    fn tangent(_: Self, _: Self, _: f32) -> Self {
        Quat::IDENTITY
    }
}

impl Interpolatable for i32 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        (start as f32 + (end - start) as f32 * t).round() as i32
    }

    fn interpolate_cubic(
        v0: Self,
        out_tangent0: Self,
        in_tangent1: Self,
        v1: Self,
        t: f32,
        dt: f32,
    ) -> Self {
        f32::interpolate_cubic(
            v0 as f32,
            out_tangent0 as f32,
            in_tangent1 as f32,
            v1 as f32,
            t,
            dt,
        )
        .round() as i32
    }

    fn add_scaled(self, delta: Self, alpha: f32) -> Self {
        (self as f32 + delta as f32 * alpha).round() as i32
    }

    fn tangent(prev: Self, next: Self, span: f32) -> Self {
        f32::tangent(prev as f32, next as f32, span).round() as i32
    }
}

/// Booleans only change once the animation has fully arrived.
impl Interpolatable for bool {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        if t >= 1.0 { end } else { start }
    }

    fn interpolate_cubic(v0: Self, _: Self, _: Self, v1: Self, t: f32, _dt: f32) -> Self {
        Self::interpolate_linear(v0, v1, t)
    }

    fn add_scaled(self, delta: Self, alpha: f32) -> Self {
        if alpha >= 1.0 { self || delta } else { self }
    }

    fn tangent(_: Self, _: Self, _: f32) -> Self {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_sanitize_clamps_every_channel() {
        let color = Color::new(1.5, -0.25, 0.5, 2.0).sanitize();
        assert_eq!(color, Color::new(1.0, 0.0, 0.5, 1.0));
    }

    #[test]
    fn integers_round_and_booleans_switch_at_the_end() {
        assert_eq!(i32::interpolate_linear(0, 3, 0.5), 2);
        assert!(!bool::interpolate_linear(false, true, 0.99));
        assert!(bool::interpolate_linear(false, true, 1.0));
    }

    #[test]
    fn mismatched_types_do_not_interpolate() {
        let a = PropertyValue::Float(1.0);
        let b = PropertyValue::Vector2(Vec2::ONE);
        assert_eq!(a.interpolate(&b, 0.5), None);
    }

    #[test]
    fn component_access_respects_arity() {
        let value = PropertyValue::Vector2(Vec2::new(1.0, 2.0));
        assert_eq!(value.component(Component::Y), Some(2.0));
        assert_eq!(value.component(Component::Z), None);
        assert_eq!(
            value.with_component(Component::X, 7.0),
            Some(PropertyValue::Vector2(Vec2::new(7.0, 2.0)))
        );
    }
}
