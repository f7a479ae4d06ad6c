mod core;
mod curve;
mod query;

pub use core::{Point3, Quat, Tolerance, Transform, Vec3};
pub use curve::{Arc3, Circle3, Curve3, CurveError, Line3, Polyline3};
pub use query::{ArcLengthCurve, CurveForm, CurveFrame, CurveQuery};
