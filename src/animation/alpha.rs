use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec4;

/// Maximum number of bisection steps when inverting a Bezier curve.
const BEZIER_MAX_ITERATIONS: u32 = 32;
const BEZIER_TOLERANCE: f32 = 0.001;

/// Maps animation progress `[0, 1]` to an interpolation weight.
#[derive(Debug, Clone, Copy, Default)]
pub enum AlphaFunction {
    /// Same as [`Linear`](Self::Linear).
    #[default]
    Default,
    Linear,
    Reverse,
    EaseInSquare,
    EaseOutSquare,
    /// Cubic ease-in.
    EaseIn,
    /// Cubic ease-out.
    EaseOut,
    /// Smoothstep.
    EaseInOut,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    /// Goes to 1 at the midpoint and back to 0.
    Bounce,
    /// One full sine period, starting and ending at 0.
    Sin,
    EaseOutBack,
    Custom(fn(f32) -> f32),
    /// Cubic Bezier with endpoints (0,0) and (1,1) and control points
    /// `(x1, y1, x2, y2)`.
    Bezier(Vec4),
}

impl AlphaFunction {
    #[must_use]
    pub fn apply(&self, progress: f32) -> f32 {
        let p = progress;
        match *self {
            Self::Default | Self::Linear => p,
            Self::Reverse => 1.0 - p,
            Self::EaseInSquare => p * p,
            Self::EaseOutSquare => 1.0 - (1.0 - p) * (1.0 - p),
            Self::EaseIn => p * p * p,
            Self::EaseOut => {
                let q = p - 1.0;
                q * q * q + 1.0
            }
            Self::EaseInOut => p * p * (3.0 - 2.0 * p),
            Self::EaseInSine => 1.0 - (p * FRAC_PI_2).cos(),
            Self::EaseOutSine => (p * FRAC_PI_2).sin(),
            Self::EaseInOutSine => -0.5 * ((PI * p).cos() - 1.0),
            Self::Bounce => (p * PI).sin(),
            Self::Sin => 0.5 - (p * 2.0 * PI).cos() * 0.5,
            Self::EaseOutBack => {
                const SHOOT: f32 = 1.701_58;
                let q = p - 1.0;
                q * q * ((SHOOT + 1.0) * q + SHOOT) + 1.0
            }
            Self::Custom(f) => f(p),
            Self::Bezier(control) => bezier(p, control),
        }
    }
}

fn cubic(t: f32, p1: f32, p2: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

fn bezier(progress: f32, control: Vec4) -> f32 {
    if progress <= 0.0 || progress >= 1.0 {
        return progress;
    }

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    let mut t = progress;
    for _ in 0..BEZIER_MAX_ITERATIONS {
        let x = cubic(t, control.x, control.z);
        if (x - progress).abs() < BEZIER_TOLERANCE {
            break;
        }
        if x < progress {
            lo = t;
        } else {
            hi = t;
        }
        t = 0.5 * (lo + hi);
    }
    cubic(t, control.y, control.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn builtins_hit_their_endpoints() {
        let functions = [
            AlphaFunction::Linear,
            AlphaFunction::EaseInSquare,
            AlphaFunction::EaseOutSquare,
            AlphaFunction::EaseIn,
            AlphaFunction::EaseOut,
            AlphaFunction::EaseInOut,
            AlphaFunction::EaseInSine,
            AlphaFunction::EaseOutSine,
            AlphaFunction::EaseInOutSine,
            AlphaFunction::EaseOutBack,
        ];
        for f in functions {
            assert!(f.apply(0.0).abs() < EPSILON, "{f:?} at 0");
            assert!((f.apply(1.0) - 1.0).abs() < EPSILON, "{f:?} at 1");
        }
    }

    #[test]
    fn bounce_and_sin_return_to_zero() {
        assert!((AlphaFunction::Bounce.apply(0.5) - 1.0).abs() < EPSILON);
        assert!(AlphaFunction::Bounce.apply(1.0).abs() < EPSILON);
        assert!((AlphaFunction::Sin.apply(0.5) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn linear_bezier_is_identity() {
        let f = AlphaFunction::Bezier(Vec4::new(1.0 / 3.0, 1.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0));
        for p in [0.1, 0.25, 0.5, 0.9] {
            assert!((f.apply(p) - p).abs() < 0.01, "Expected {p}, got {}", f.apply(p));
        }
    }

    #[test]
    fn custom_function_is_called() {
        let f = AlphaFunction::Custom(|p| p * 0.5);
        assert_eq!(f.apply(0.8), 0.4);
    }
}
