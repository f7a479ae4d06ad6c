//! Per-instance curve frames and the orientation pass.
//!
//! [`resolve_frames`] samples the curve once per instance and settles where
//! the instance sits and how it is aligned before any ramp twist. The
//! position pass reads the same frames, so placement, local offsets and
//! rotation always agree on the arc length and basis of an instance.
//!
//! Rotations compose in application order:
//!
//! ```text
//! local offset -> axis remap -> tangent alignment -> mode -> handle twist
//!   -> ramp twist (right, up, forward) -> global offset
//! ```

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

use super::SourceSnapshot;
use super::amplitude::{AxisPolicy, RampChannel, RampSampler};
use super::distribution::DistributionPlan;
use super::handles::ResolvedHandles;
use super::settings::{LocalAxis, OrientationMode, OrientationOptions};
use crate::geom::{CurveQuery, Point3, Quat, Vec3};

/// Right, up and forward axes of an instance in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl Basis {
    pub const CANONICAL: Self = Self {
        right: Vec3::X,
        up: Vec3::Y,
        forward: Vec3::Z,
    };

    #[must_use]
    pub fn rotated(self, rotation: Quat) -> Self {
        Self {
            right: rotation.rotate(self.right),
            up: rotation.rotate(self.up),
            forward: rotation.rotate(self.forward),
        }
    }

    /// `right * v.x + up * v.y + forward * v.z`.
    #[must_use]
    pub fn to_world(self, v: Vec3) -> Vec3 {
        self.right * v.x + self.up * v.y + self.forward * v.z
    }
}

/// Object-space axes for a [`LocalAxis`] choice, and the rotation taking
/// them onto the canonical basis.
#[must_use]
pub fn local_axes(axis: LocalAxis) -> (Basis, Quat) {
    match axis {
        LocalAxis::Z => (Basis::CANONICAL, Quat::IDENTITY),
        // Quarter turn about -Y.
        LocalAxis::X => (
            Basis {
                right: -Vec3::Z,
                up: Vec3::Y,
                forward: Vec3::X,
            },
            Quat::new(FRAC_1_SQRT_2, 0.0, -FRAC_1_SQRT_2, 0.0),
        ),
        // Half turn about (0, 1, 1).
        LocalAxis::Y => (
            Basis {
                right: -Vec3::X,
                up: Vec3::Z,
                forward: Vec3::Y,
            },
            Quat::new(0.0, 0.0, FRAC_1_SQRT_2, FRAC_1_SQRT_2),
        ),
    }
}

/// Everything the engines share about one instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceFrame {
    pub index: usize,
    pub arc_length: f64,
    /// Arc length over total curve length.
    pub u: f64,
    pub parameter: f64,
    pub point: Point3,
    pub tangent: Vec3,
    /// Rotation before ramp twist and global offset.
    pub rotation: Quat,
    /// The instance's local axes rotated by `rotation`.
    pub basis: Basis,
    /// Whether the curve frame was undefined here.
    pub degenerate: bool,
}

/// Samples the curve and resolves the base orientation of every planned
/// instance. `handles` is `Some` only when the handle track is enabled.
pub fn resolve_frames<C: CurveQuery + ?Sized>(
    curve: &C,
    plan: &DistributionPlan,
    orientation: &OrientationOptions,
    handles: Option<&ResolvedHandles>,
    source: &SourceSnapshot,
) -> Vec<InstanceFrame> {
    let (local_basis, axis_remap) = local_axes(orientation.local_axis);
    let local_offset = Quat::from_euler_xyz(orientation.local_rotation_offset);
    let min_param = curve.min_param();
    let max_param = curve.max_param();
    let form = curve.form();

    (0..plan.count())
        .map(|index| {
            let arc_length = plan.arc_length_of(index);
            let u = plan.normalized_position(arc_length);
            let parameter = curve.param_from_length(arc_length).max(min_param).min(max_param);

            let sampled = curve.point_at(parameter);
            let frame = curve.frame_at(parameter);
            let degenerate = frame.is_none() || !sampled.is_finite();
            let point = if sampled.is_finite() { sampled } else { Point3::ORIGIN };
            let tangent = frame.map_or(Vec3::Z, |f| f.tangent);

            let tangent_rotation = Quat::rotation_between(Vec3::Z, tangent).unwrap_or(Quat::IDENTITY);
            let aligned = local_offset.then(axis_remap).then(tangent_rotation);

            let mut rotation = match orientation.mode {
                OrientationMode::Identity => Quat::IDENTITY,
                OrientationMode::CopySource => source.rotation.normalized(),
                OrientationMode::Curve => aligned,
                OrientationMode::Chain if index % 2 == 1 => {
                    aligned.then(about(tangent, FRAC_PI_2))
                }
                OrientationMode::Chain => aligned,
            };

            if let Some(handles) = handles {
                let angle = handles.angle_at(parameter, form, max_param);
                rotation = rotation.then(about(tangent, -angle));
            }

            InstanceFrame {
                index,
                arc_length,
                u,
                parameter,
                point,
                tangent,
                rotation,
                basis: local_basis.rotated(rotation),
                degenerate,
            }
        })
        .collect()
}

/// Final rotation of every instance: base rotation, then ramp twist about
/// the instance's right, up and forward axes, then the global offset.
///
/// The rotation channel is read in degrees and its axis is normalized.
pub fn orient(frames: &[InstanceFrame], orientation: &OrientationOptions, channel: &RampChannel) -> Vec<Quat> {
    let global = Quat::from_euler_xyz(orientation.global_rotation_offset);
    let mut sampler = RampSampler::new(channel, frames.len(), AxisPolicy::Normalized);

    frames
        .iter()
        .map(|frame| {
            let twist = sampler.per_axis(frame.index, frame.u);
            let basis = frame.basis;
            frame
                .rotation
                .then(about(basis.right, twist.x.to_radians()))
                .then(about(basis.up, twist.y.to_radians()))
                .then(about(basis.forward, twist.z.to_radians()))
                .then(global)
                .normalized()
        })
        .collect()
}

fn about(axis: Vec3, radians: f64) -> Quat {
    Quat::from_axis_angle(axis, radians).unwrap_or(Quat::IDENTITY)
}
