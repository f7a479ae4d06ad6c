//! One-dimensional ramp curves mapping a normalized position to a value.

use serde::{Deserialize, Serialize};

/// Anything that can be sampled at a position in `[0, 1)`.
pub trait RampCurve {
    fn evaluate(&self, position: f64) -> f64;
}

/// How a ramp blends from one control point to the next. The mode of the
/// left-hand point of a segment applies to that segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RampInterpolation {
    /// Holds the left value up to the next point.
    None,
    #[default]
    Linear,
    /// Smoothstep between the two values.
    Smooth,
    /// Catmull-Rom through the neighbouring points.
    Spline,
}

impl RampInterpolation {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" | "step" => Some(Self::None),
            "linear" => Some(Self::Linear),
            "smooth" => Some(Self::Smooth),
            "spline" => Some(Self::Spline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampPoint {
    pub position: f64,
    pub value: f64,
    #[serde(default)]
    pub interpolation: RampInterpolation,
}

impl RampPoint {
    #[must_use]
    pub const fn new(position: f64, value: f64, interpolation: RampInterpolation) -> Self {
        Self {
            position,
            value,
            interpolation,
        }
    }
}

/// Control-point ramp. Points are kept sorted by position; non-finite points
/// are dropped on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<RampPoint>", into = "Vec<RampPoint>")]
pub struct Ramp {
    points: Vec<RampPoint>,
}

impl Ramp {
    #[must_use]
    pub fn new(points: Vec<RampPoint>) -> Self {
        let mut points: Vec<RampPoint> = points
            .into_iter()
            .filter(|p| p.position.is_finite() && p.value.is_finite())
            .collect();
        points.sort_by(|a, b| a.position.total_cmp(&b.position));
        Self { points }
    }

    /// Ramp returning `value` everywhere.
    #[must_use]
    pub fn flat(value: f64) -> Self {
        Self::new(vec![RampPoint::new(0.0, value, RampInterpolation::Linear)])
    }

    #[must_use]
    pub fn points(&self) -> &[RampPoint] {
        &self.points
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for Ramp {
    fn default() -> Self {
        Self::flat(1.0)
    }
}

impl From<Vec<RampPoint>> for Ramp {
    fn from(points: Vec<RampPoint>) -> Self {
        Self::new(points)
    }
}

impl From<Ramp> for Vec<RampPoint> {
    fn from(ramp: Ramp) -> Self {
        ramp.points
    }
}

impl RampCurve for Ramp {
    fn evaluate(&self, position: f64) -> f64 {
        let points = &self.points;
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return 0.0;
        };
        if !(position > first.position) {
            return first.value;
        }
        if position >= last.position {
            return last.value;
        }

        // first.position < position < last.position, so 1 <= k < len.
        let k = points.partition_point(|p| p.position <= position);
        let a = points[k - 1];
        let b = points[k];
        let span = b.position - a.position;
        if span <= f64::EPSILON {
            return b.value;
        }
        let t = ((position - a.position) / span).clamp(0.0, 1.0);

        match a.interpolation {
            RampInterpolation::None => a.value,
            RampInterpolation::Linear => a.value + (b.value - a.value) * t,
            RampInterpolation::Smooth => {
                let s = t * t * (3.0 - 2.0 * t);
                a.value + (b.value - a.value) * s
            }
            RampInterpolation::Spline => {
                let before = if k >= 2 { points[k - 2].value } else { a.value };
                let after = points.get(k + 1).map_or(b.value, |p| p.value);
                catmull_rom(before, a.value, b.value, after, t)
            }
        }
    }
}

impl<F: Fn(f64) -> f64> RampCurve for F {
    fn evaluate(&self, position: f64) -> f64 {
        self(position)
    }
}

fn catmull_rom(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn empty_ramp_evaluates_to_zero() {
        assert_eq!(Ramp::new(Vec::new()).evaluate(0.5), 0.0);
    }

    #[test]
    fn default_is_flat_one() {
        let ramp = Ramp::default();
        for position in [0.0, 0.25, 0.999, 1.0, -3.0, f64::NAN] {
            assert_eq!(ramp.evaluate(position), 1.0);
        }
    }

    #[test]
    fn points_are_sorted_and_ends_clamp() {
        let ramp = Ramp::new(vec![
            RampPoint::new(0.8, 4.0, RampInterpolation::Linear),
            RampPoint::new(0.2, 2.0, RampInterpolation::Linear),
        ]);
        assert_eq!(ramp.points()[0].position, 0.2);
        assert_eq!(ramp.evaluate(0.0), 2.0);
        assert_eq!(ramp.evaluate(1.0), 4.0);
        assert!(close(ramp.evaluate(0.5), 3.0));
    }

    #[test]
    fn interpolation_modes() {
        let make = |mode| {
            Ramp::new(vec![
                RampPoint::new(0.0, 0.0, mode),
                RampPoint::new(1.0, 1.0, mode),
            ])
        };
        assert_eq!(make(RampInterpolation::None).evaluate(0.7), 0.0);
        assert!(close(make(RampInterpolation::Linear).evaluate(0.25), 0.25));
        assert!(close(make(RampInterpolation::Smooth).evaluate(0.25), 0.156_25));
        // Spline with clamped neighbours passes through the control points.
        let spline = make(RampInterpolation::Spline);
        assert!(close(spline.evaluate(0.0), 0.0));
        assert!(close(spline.evaluate(0.5), 0.5));
    }

    #[test]
    fn spline_passes_through_interior_points() {
        let ramp = Ramp::new(vec![
            RampPoint::new(0.0, 0.0, RampInterpolation::Spline),
            RampPoint::new(0.5, 1.0, RampInterpolation::Spline),
            RampPoint::new(1.0, 0.0, RampInterpolation::Spline),
        ]);
        assert!(close(ramp.evaluate(0.5), 1.0));
        assert!(ramp.evaluate(0.25) > 0.5);
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let ramp = Ramp::new(vec![
            RampPoint::new(f64::NAN, 5.0, RampInterpolation::Linear),
            RampPoint::new(0.3, 0.5, RampInterpolation::Linear),
        ]);
        assert_eq!(ramp.points().len(), 1);
        assert_eq!(ramp.evaluate(0.9), 0.5);
    }

    #[test]
    fn interpolation_names() {
        assert_eq!(RampInterpolation::from_name("Smooth"), Some(RampInterpolation::Smooth));
        assert_eq!(RampInterpolation::from_name(" step "), Some(RampInterpolation::None));
        assert_eq!(RampInterpolation::from_name("cubic"), None);
    }
}
