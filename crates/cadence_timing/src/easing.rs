//! Easing curves for ramps and value interpolation

use serde::{Deserialize, Serialize};

/// Easing curve applied to a normalized progress value
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InSine,
    OutSine,
    InOutSine,
    /// Hermite smoothstep (`3t² - 2t³`)
    Smoothstep,
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Apply the curve to `t`, clamped to `[0, 1]` first
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        match *self {
            Easing::Linear => t,
            Easing::InQuad => t * t,
            Easing::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::InOutQuad => in_out(t, 2),
            Easing::InCubic => t * t * t,
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::InOutCubic => in_out(t, 3),
            Easing::InQuart => t.powi(4),
            Easing::OutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::InOutQuart => in_out(t, 4),
            Easing::InSine => 1.0 - (t * std::f32::consts::FRAC_PI_2).cos(),
            Easing::OutSine => (t * std::f32::consts::FRAC_PI_2).sin(),
            Easing::InOutSine => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
            Easing::Smoothstep => t * t * (3.0 - 2.0 * t),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, x1, y1, x2, y2),
        }
    }

    /// Interpolate from `from` to `to` along this curve
    pub fn interpolate(&self, from: f32, to: f32, t: f32) -> f32 {
        from + (to - from) * self.apply(t)
    }
}

/// Symmetric in/out polynomial of the given power
fn in_out(t: f32, power: i32) -> f32 {
    if t < 0.5 {
        2f32.powi(power - 1) * t.powi(power)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(power) / 2.0
    }
}

/// One axis of a cubic bezier running from 0 to 1, in polynomial form
#[derive(Clone, Copy)]
struct BezierAxis {
    a: f32,
    b: f32,
    c: f32,
}

impl BezierAxis {
    fn new(p1: f32, p2: f32) -> Self {
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        Self { a: 1.0 - c - b, b, c }
    }

    fn at(self, s: f32) -> f32 {
        ((self.a * s + self.b) * s + self.c) * s
    }
}

/// CSS-style `cubic-bezier(x1, y1, x2, y2)`.
///
/// The x control points are clamped to `[0, 1]`, which keeps x monotonic so
/// the curve parameter can be found by bisection.
fn cubic_bezier(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let x = BezierAxis::new(x1.clamp(0.0, 1.0), x2.clamp(0.0, 1.0));
    let y = BezierAxis::new(y1, y2);

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    for _ in 0..24 {
        let mid = 0.5 * (lo + hi);
        if x.at(mid) < t {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    y.at(0.5 * (lo + hi))
}
