//! Read-only curve query surface consumed by the instancing engine.
//!
//! The engine never walks curve internals. It asks for total arc length, maps
//! arc length to the curve's native parameter, and samples point and frame
//! data at that parameter. [`ArcLengthCurve`] provides the surface for any
//! [`Curve3`] by building an arc-length lookup table once up front; hosts
//! with an exact arc-length parameterisation can implement [`CurveQuery`]
//! directly.

use serde::{Deserialize, Serialize};

use super::core::{Point3, Vec3};
use super::curve::{Curve3, orthogonal_unit_vector};

/// Topology of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveForm {
    Open,
    Closed,
}

impl CurveForm {
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Point and orthonormal frame sampled at one curve parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFrame {
    pub point: Point3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub bitangent: Vec3,
}

pub trait CurveQuery {
    /// Total arc length. Never negative.
    fn length(&self) -> f64;

    /// Parameter at arc length `distance` from the start. Monotonic non-decreasing.
    fn param_from_length(&self, distance: f64) -> f64;

    fn point_at(&self, param: f64) -> Point3;

    /// Unit tangent, `None` where the curve is degenerate.
    fn tangent_at(&self, param: f64) -> Option<Vec3>;

    /// Unit normal, `None` where the curve is degenerate.
    fn normal_at(&self, param: f64) -> Option<Vec3>;

    fn form(&self) -> CurveForm;

    #[must_use]
    fn min_param(&self) -> f64 {
        0.0
    }

    fn max_param(&self) -> f64;

    /// Samples the full frame at `param`, or `None` if any axis is undefined.
    #[must_use]
    fn frame_at(&self, param: f64) -> Option<CurveFrame> {
        let point = self.point_at(param);
        if !point.is_finite() {
            return None;
        }
        let tangent = self.tangent_at(param)?;
        let normal = self.normal_at(param)?;
        let bitangent = normal.cross(tangent).normalized()?;
        Some(CurveFrame {
            point,
            tangent,
            normal,
            bitangent,
        })
    }
}

struct ArcLengthEntry {
    parameter: f64,
    arc_length: f64,
}

/// Adapts a parametric [`Curve3`] to [`CurveQuery`] through a sampled
/// arc-length table.
pub struct ArcLengthCurve<C> {
    curve: C,
    table: Vec<ArcLengthEntry>,
}

impl<C: Curve3> ArcLengthCurve<C> {
    pub const DEFAULT_SAMPLES: usize = 1024;

    #[must_use]
    pub fn new(curve: C) -> Self {
        Self::with_samples(curve, Self::DEFAULT_SAMPLES)
    }

    #[must_use]
    pub fn with_samples(curve: C, samples: usize) -> Self {
        let table = build_arc_length_table(&curve, samples);
        Self { curve, table }
    }

    #[must_use]
    pub fn curve(&self) -> &C {
        &self.curve
    }
}

impl<C: Curve3> CurveQuery for ArcLengthCurve<C> {
    fn length(&self) -> f64 {
        self.table.last().map_or(0.0, |e| e.arc_length)
    }

    fn param_from_length(&self, distance: f64) -> f64 {
        let (t0, t1) = self.curve.domain();
        parameter_at_arc_length(&self.table, t0, t1, distance)
    }

    fn point_at(&self, param: f64) -> Point3 {
        self.curve.point_at(param)
    }

    fn tangent_at(&self, param: f64) -> Option<Vec3> {
        self.curve.tangent_at(param)
    }

    fn normal_at(&self, param: f64) -> Option<Vec3> {
        let d1 = self.curve.derivative_at(param);
        let tangent = d1.normalized()?;
        let d2 = self.curve.second_derivative_at(param);

        // Normal points toward the centre of curvature; straight stretches
        // get an arbitrary perpendicular.
        let d2_proj = d2.sub(tangent.mul_scalar(d2.dot(tangent)));
        let curvature = d2_proj.length() / d1.length_squared();
        if curvature.is_finite() && curvature > STRAIGHT_CURVATURE {
            d2_proj.normalized()
        } else {
            Some(orthogonal_unit_vector(tangent))
        }
    }

    fn form(&self) -> CurveForm {
        if self.curve.is_closed() {
            CurveForm::Closed
        } else {
            CurveForm::Open
        }
    }

    fn min_param(&self) -> f64 {
        self.curve.domain().0
    }

    fn max_param(&self) -> f64 {
        self.curve.domain().1
    }
}

/// Curvature below which a curve is treated as locally straight.
const STRAIGHT_CURVATURE: f64 = 1e-9;

fn build_arc_length_table<C: Curve3>(curve: &C, samples: usize) -> Vec<ArcLengthEntry> {
    let samples = samples.max(2);
    let (t0, t1) = curve.domain();
    let span = t1 - t0;

    let mut table = Vec::with_capacity(samples);
    let mut prev = curve.point_at(t0);
    let mut cumulative = 0.0;

    table.push(ArcLengthEntry {
        parameter: t0,
        arc_length: 0.0,
    });

    for i in 1..samples {
        let u = i as f64 / (samples - 1) as f64;
        let t = t0 + span * u;
        let curr = curve.point_at(t);
        let step = curr.sub_point(prev).length();
        if step.is_finite() {
            cumulative += step;
        }
        table.push(ArcLengthEntry {
            parameter: t,
            arc_length: cumulative,
        });
        prev = curr;
    }

    table
}

fn parameter_at_arc_length(table: &[ArcLengthEntry], t0: f64, t1: f64, target_length: f64) -> f64 {
    if table.len() < 2 {
        return t0;
    }

    let total = table.last().map_or(0.0, |e| e.arc_length);
    if !(target_length > 0.0) {
        return t0;
    }
    if target_length >= total {
        return t1;
    }

    let idx = table
        .partition_point(|entry| entry.arc_length <= target_length)
        .saturating_sub(1)
        .min(table.len() - 2);
    let e0 = &table[idx];
    let e1 = &table[idx + 1];

    let segment_length = e1.arc_length - e0.arc_length;
    if segment_length.abs() < 1e-14 {
        return e0.parameter;
    }

    let ratio = (target_length - e0.arc_length) / segment_length;
    (e0.parameter + (e1.parameter - e0.parameter) * ratio.clamp(0.0, 1.0)).clamp(t0, t1)
}
