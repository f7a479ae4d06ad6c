//! Instancing along a curve.
//!
//! [`evaluate`] is a pure function of a curve, settings and a source-object
//! snapshot. Hosts call it again whenever an input changes; nothing is cached
//! between calls.

pub mod amplitude;
pub mod diagnostics;
pub mod distribution;
pub mod handles;
pub mod orientation;
pub mod position;
pub mod ramp;
pub mod scale;
pub mod settings;

use serde::{Deserialize, Serialize};

use crate::geom::{CurveQuery, Quat, Transform, Vec3};

pub use amplitude::{AmplitudeSource, AxisPolicy, DynamicAmplitude, RampChannel, RampSampler, Signal2D, SignalLine};
pub use diagnostics::InstancingDiagnostics;
pub use distribution::DistributionPlan;
pub use handles::{Handle, HandleTrack, ResolvedHandles};
pub use orientation::{Basis, InstanceFrame};
pub use ramp::{Ramp, RampCurve, RampInterpolation, RampPoint};
pub use settings::{
    DistributionMode, InstancerSettings, InstancingOptions, LocalAxis, OrientationMode, OrientationOptions,
    RampChannels, TransformOffsets,
};

/// World rotation and rotate pivot of the object being instanced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSnapshot {
    pub rotation: Quat,
    pub pivot: Vec3,
}

impl Default for SourceSnapshot {
    fn default() -> Self {
        Self {
            rotation: Quat::IDENTITY,
            pivot: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerInstanceResult {
    pub index: usize,
    pub arc_length: f64,
    pub parameter: f64,
    pub translation: Vec3,
    /// Euler XYZ, radians.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl PerInstanceResult {
    /// Translate, rotate, scale; scale applies first.
    #[must_use]
    pub fn matrix(&self) -> Transform {
        Transform::translate(self.translation)
            * Transform::rotate(Quat::from_euler_xyz(self.rotation))
            * Transform::scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancingResult {
    pub instances: Vec<PerInstanceResult>,
    pub diagnostics: InstancingDiagnostics,
}

impl InstancingResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Computes placement, rotation and scale for every instance.
///
/// A missing curve or source yields an empty result. Settings are validated
/// first, so out-of-range values are clamped rather than rejected.
pub fn evaluate<C: CurveQuery + ?Sized>(
    curve: Option<&C>,
    settings: &InstancerSettings,
    source: Option<&SourceSnapshot>,
) -> InstancingResult {
    let (Some(curve), Some(source)) = (curve, source) else {
        log::debug!(
            "instancing skipped: curve {}, source {}",
            if curve.is_some() { "present" } else { "missing" },
            if source.is_some() { "present" } else { "missing" },
        );
        return InstancingResult::default();
    };

    let settings = settings.validated();
    let mut diagnostics = InstancingDiagnostics::default();

    let curve_length = curve.length();
    let plan = DistributionPlan::new(&settings.instancing, curve_length);
    diagnostics.curve_length = plan.curve_length();
    diagnostics.effective_length = plan.effective_length();
    diagnostics.effective_length_clamped = plan.effective_length_clamped();

    if plan.count() == 0 {
        if !(curve_length > 0.0) {
            diagnostics.warn(format!("curve length {curve_length} is not usable; no instances placed"));
        }
        return InstancingResult {
            instances: Vec::new(),
            diagnostics,
        };
    }

    log::debug!(
        "instancing {} along curve of length {:.4} ({:?} mode)",
        plan.count(),
        curve_length,
        settings.instancing.mode,
    );

    let resolved_handles = settings.handles.resolve();
    diagnostics.ignored_handles = resolved_handles.ignored();
    let handles = settings.handles.enabled.then_some(&resolved_handles);

    let frames = orientation::resolve_frames(curve, &plan, &settings.orientation, handles, source);
    let rotations = orientation::orient(&frames, &settings.orientation, &settings.ramps.rotation);
    let translations = position::place(&frames, &settings.offsets, &settings.ramps.position, source.pivot);
    let scales = scale::scale(&frames, settings.offsets.local_scale, &settings.ramps.scale);

    diagnostics.degenerate_frames = frames.iter().filter(|f| f.degenerate).count();
    if diagnostics.degenerate_frames > 0 {
        diagnostics.warn(format!(
            "{} instance(s) sit on degenerate curve points and use the canonical basis",
            diagnostics.degenerate_frames
        ));
    }

    let instances: Vec<PerInstanceResult> = frames
        .iter()
        .zip(rotations)
        .zip(translations)
        .zip(scales)
        .map(|(((frame, rotation), translation), scale)| PerInstanceResult {
            index: frame.index,
            arc_length: frame.arc_length,
            parameter: frame.parameter,
            translation,
            rotation: rotation.to_euler_xyz(),
            scale,
        })
        .collect();

    diagnostics.instance_count = instances.len();
    InstancingResult {
        instances,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{ArcLengthCurve, Line3, Point3, Polyline3};

    fn line() -> ArcLengthCurve<Line3> {
        ArcLengthCurve::new(Line3::new(Point3::ORIGIN, Point3::new(0.0, 0.0, 10.0)))
    }

    #[test]
    fn missing_inputs_give_empty_results() {
        let curve = line();
        let settings = InstancerSettings::default();
        assert!(evaluate(Some(&curve), &settings, None).is_empty());
        assert!(evaluate::<ArcLengthCurve<Line3>>(None, &settings, Some(&SourceSnapshot::default())).is_empty());
    }

    #[test]
    fn default_settings_place_five_instances() {
        let result = evaluate(Some(&line()), &InstancerSettings::default(), Some(&SourceSnapshot::default()));
        assert_eq!(result.len(), 5);
        assert_eq!(result.diagnostics.instance_count, 5);
        for (i, instance) in result.instances.iter().enumerate() {
            assert_eq!(instance.index, i);
            assert!((instance.translation.z - 2.0 * i as f64).abs() < 1e-9);
            assert_eq!(instance.scale, Vec3::ONE);
        }
    }

    #[test]
    fn zero_length_curve_warns() {
        let curve = ArcLengthCurve::new(Line3::new(Point3::ORIGIN, Point3::ORIGIN));
        let result = evaluate(Some(&curve), &InstancerSettings::default(), Some(&SourceSnapshot::default()));
        assert!(result.is_empty());
        assert_eq!(result.diagnostics.warnings.len(), 1);
    }

    #[test]
    fn handle_truncation_is_reported() {
        let mut settings = InstancerSettings::default();
        settings.handles = HandleTrack {
            enabled: true,
            count: Some(1),
            handles: vec![Handle::new(0.2, 0.0), Handle::new(0.4, 0.0)],
        };
        let result = evaluate(Some(&line()), &settings, Some(&SourceSnapshot::default()));
        assert_eq!(result.diagnostics.ignored_handles, 1);
    }

    #[test]
    fn matrix_places_the_local_origin_at_the_translation() {
        let curve = ArcLengthCurve::new(
            Polyline3::new(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0)], false).unwrap(),
        );
        let result = evaluate(Some(&curve), &InstancerSettings::default(), Some(&SourceSnapshot::default()));
        for instance in &result.instances {
            let origin = instance.matrix().apply_point(Point3::ORIGIN);
            assert!((origin.x - instance.translation.x).abs() < 1e-12);
            // Local +Z is carried onto the tangent.
            let forward = instance.matrix().apply_vec(Vec3::Z);
            assert!((forward.x - 1.0).abs() < 1e-9);
        }
    }
}
