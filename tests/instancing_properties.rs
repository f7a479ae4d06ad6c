use std::f64::consts::TAU;

use curve_instancer::geom::{ArcLengthCurve, Circle3, CurveForm, CurveQuery, Point3, Polyline3, Quat, Vec3};
use curve_instancer::instancing::{
    self, DistributionMode, DistributionPlan, Handle, HandleTrack, InstancerSettings, InstancingResult,
    LocalAxis, OrientationMode, RampChannel, SourceSnapshot,
};

/// Circle in the XY plane with an exact arc-length parameterisation on `[0, 1]`.
struct ExactCircle {
    length: f64,
}

impl ExactCircle {
    fn radius(&self) -> f64 {
        self.length / TAU
    }
}

impl CurveQuery for ExactCircle {
    fn length(&self) -> f64 {
        self.length
    }

    fn param_from_length(&self, distance: f64) -> f64 {
        distance / self.length
    }

    fn point_at(&self, param: f64) -> Point3 {
        let (s, c) = (param * TAU).sin_cos();
        Point3::new(self.radius() * c, self.radius() * s, 0.0)
    }

    fn tangent_at(&self, param: f64) -> Option<Vec3> {
        let (s, c) = (param * TAU).sin_cos();
        Some(Vec3::new(-s, c, 0.0))
    }

    fn normal_at(&self, param: f64) -> Option<Vec3> {
        let (s, c) = (param * TAU).sin_cos();
        Some(Vec3::new(-c, -s, 0.0))
    }

    fn form(&self) -> CurveForm {
        CurveForm::Closed
    }

    fn max_param(&self) -> f64 {
        1.0
    }
}

fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual} (tolerance {tol})"
    );
}

fn assert_vec_close(actual: Vec3, expected: Vec3, tol: f64) {
    assert_close(actual.x, expected.x, tol);
    assert_close(actual.y, expected.y, tol);
    assert_close(actual.z, expected.z, tol);
}

fn run<C: CurveQuery>(curve: &C, settings: &InstancerSettings) -> InstancingResult {
    instancing::evaluate(Some(curve), settings, Some(&SourceSnapshot::default()))
}

fn wavy_polyline() -> ArcLengthCurve<Polyline3> {
    let points = (0..40)
        .map(|i| {
            let t = f64::from(i) * 0.25;
            Point3::new(t, t.sin() * 2.0, (t * 0.7).cos())
        })
        .collect();
    ArcLengthCurve::new(Polyline3::new(points, false).unwrap())
}

fn noisy_settings() -> InstancerSettings {
    let mut settings = InstancerSettings::default();
    settings.instancing.count = 17;
    settings.orientation.mode = OrientationMode::Chain;
    settings.orientation.local_axis = LocalAxis::X;
    settings.handles = HandleTrack::new(vec![Handle::new(0.2, 0.4), Handle::new(0.7, -1.1)]);
    settings.ramps.position = RampChannel {
        random_amplitude: 0.3,
        ..RampChannel::with_axis(Vec3::new(1.0, 0.5, 0.0))
    };
    settings.ramps.rotation = RampChannel {
        amplitude: 15.0,
        random_amplitude: 40.0,
        ..RampChannel::with_axis(Vec3::ONE)
    };
    settings.ramps.scale = RampChannel {
        amplitude: 0.0,
        random_amplitude: 0.25,
        ..RampChannel::with_axis(Vec3::ONE)
    };
    settings
}

#[test]
fn repeated_evaluation_is_bit_identical() {
    let curve = wavy_polyline();
    let settings = noisy_settings();
    let first = run(&curve, &settings);
    let second = run(&curve, &settings);
    assert_eq!(first.len(), 17);
    assert_eq!(first, second);
}

#[test]
fn changing_one_channel_leaves_the_others_untouched() {
    let curve = wavy_polyline();
    let settings = noisy_settings();
    let mut rotated = settings.clone();
    rotated.ramps.rotation.random_amplitude = 0.0;
    rotated.ramps.rotation.amplitude = 90.0;

    let a = run(&curve, &settings);
    let b = run(&curve, &rotated);
    for (x, y) in a.instances.iter().zip(&b.instances) {
        assert_eq!(x.translation, y.translation);
        assert_eq!(x.scale, y.scale);
        assert_ne!(x.rotation, y.rotation);
    }
}

#[test]
fn all_engines_agree_on_arc_length() {
    let curve = ExactCircle { length: 100.0 };
    let mut settings = InstancerSettings::default();
    settings.instancing.count = 12;
    settings.instancing.curve_start = 0.25;
    settings.instancing.curve_end = 0.75;
    settings.instancing.distance_offset = 7.0;

    let plan = DistributionPlan::new(&settings.instancing, curve.length());
    let result = run(&curve, &settings);
    assert_eq!(result.len(), plan.count());

    for instance in &result.instances {
        let arc = plan.arc_length_of(instance.index);
        assert_eq!(instance.arc_length, arc);
        assert_eq!(instance.parameter, curve.param_from_length(arc));
        // Translation with untouched ramps sits exactly on the curve point.
        let point = curve.point_at(instance.parameter);
        assert_vec_close(instance.translation, point.to_vec3(), 1e-12);
        // And the rotation follows the tangent at the same parameter.
        let tangent = curve.tangent_at(instance.parameter).unwrap();
        let forward = Quat::from_euler_xyz(instance.rotation).rotate(Vec3::Z);
        assert_vec_close(forward, tangent, 1e-9);
    }
}

#[test]
fn count_and_distance_modes_agree_on_closed_curve() {
    let curve = ExactCircle { length: 100.0 };

    let mut by_count = InstancerSettings::default();
    by_count.instancing.mode = DistributionMode::Count;
    by_count.instancing.count = 10;

    let mut by_distance = InstancerSettings::default();
    by_distance.instancing.mode = DistributionMode::Distance;
    by_distance.instancing.spacing = 10.0;
    by_distance.instancing.max_count_by_spacing = 50;

    let a = run(&curve, &by_count);
    let b = run(&curve, &by_distance);
    assert_eq!(a.len(), 10);
    assert_eq!(b.len(), 10);
    for (i, (x, y)) in a.instances.iter().zip(&b.instances).enumerate() {
        assert_close(x.arc_length, 10.0 * i as f64, 1e-9);
        assert_eq!(x.arc_length, y.arc_length);
    }
}

#[test]
fn offset_past_the_curve_length_wraps_around() {
    let curve = ExactCircle { length: 100.0 };
    let arcs = |offset: f64| {
        let mut settings = InstancerSettings::default();
        settings.instancing.count = 10;
        settings.instancing.distance_offset = offset;
        let mut arcs: Vec<f64> = run(&curve, &settings)
            .instances
            .iter()
            .map(|i| i.arc_length.rem_euclid(100.0))
            .collect();
        arcs.sort_by(f64::total_cmp);
        arcs
    };

    let wrapped = arcs(105.0);
    let direct = arcs(5.0);
    assert_eq!(wrapped.len(), direct.len());
    for (a, b) in wrapped.iter().zip(&direct) {
        assert_close(*a, *b, 1e-9);
    }
}

#[test]
fn handles_return_their_own_angle_and_nothing_without_handles() {
    let track = HandleTrack::new(vec![
        Handle::new(0.6, -0.25),
        Handle::new(0.1, 1.5),
        Handle::new(0.35, 0.75),
    ]);
    let resolved = track.resolve();
    for handle in &track.handles {
        for form in [CurveForm::Open, CurveForm::Closed] {
            assert_eq!(resolved.angle_at(handle.parameter, form, 1.0), handle.angle);
        }
    }

    // An enabled but empty track behaves like no track at all.
    let curve = wavy_polyline();
    let plain = InstancerSettings::default();
    let mut empty = InstancerSettings::default();
    empty.handles.enabled = true;
    let a = run(&curve, &plain);
    let b = run(&curve, &empty);
    for (x, y) in a.instances.iter().zip(&b.instances) {
        assert_vec_close(x.rotation, y.rotation, 1e-12);
    }
}

#[test]
fn identity_mode_produces_zero_rotation() {
    let curve = wavy_polyline();
    let mut settings = InstancerSettings::default();
    settings.instancing.count = 25;
    settings.orientation.mode = OrientationMode::Identity;
    for instance in run(&curve, &settings).instances {
        assert_eq!(instance.rotation, Vec3::ZERO);
    }
}

#[test]
fn zero_ramps_leave_only_the_deterministic_terms() {
    let curve = ExactCircle { length: 40.0 };
    let mut settings = InstancerSettings::default();
    settings.offsets.global_translation = Vec3::new(1.0, -2.0, 0.5);
    settings.offsets.local_translation = Vec3::new(0.3, 0.2, -0.1);
    for channel in [
        &mut settings.ramps.position,
        &mut settings.ramps.rotation,
        &mut settings.ramps.scale,
    ] {
        *channel = RampChannel {
            amplitude: 0.0,
            random_amplitude: 0.0,
            ..RampChannel::with_axis(Vec3::ONE)
        };
    }
    let source = SourceSnapshot {
        rotation: Quat::IDENTITY,
        pivot: Vec3::new(0.5, 0.5, 0.5),
    };

    for count in (1..=1000).step_by(9).chain([1000]) {
        settings.instancing.count = count;
        let result = instancing::evaluate(Some(&curve), &settings, Some(&source));
        assert_eq!(result.len(), count);
        for instance in &result.instances {
            let rotation = Quat::from_euler_xyz(instance.rotation);
            let local = rotation.rotate(Vec3::X) * 0.3 + rotation.rotate(Vec3::Y) * 0.2
                - rotation.rotate(Vec3::Z) * 0.1;
            let expected = curve.point_at(instance.parameter).to_vec3() + settings.offsets.global_translation
                - source.pivot
                + local;
            assert_vec_close(instance.translation, expected, 1e-9);
            assert_eq!(instance.scale, settings.offsets.local_scale);
        }
    }
}

#[test]
fn scale_axes_share_one_random_draw() {
    let curve = wavy_polyline();
    let mut settings = InstancerSettings::default();
    settings.instancing.count = 60;
    settings.ramps.scale = RampChannel {
        random_amplitude: 0.4,
        ..RampChannel::with_axis(Vec3::ONE)
    };
    let result = run(&curve, &settings);
    for instance in &result.instances {
        assert_eq!(instance.scale.x, instance.scale.y);
        assert_eq!(instance.scale.y, instance.scale.z);
    }
    let first = result.instances[0].scale.x;
    assert!(result.instances.iter().any(|i| i.scale.x != first));
}

#[test]
fn circle_of_radius_ten_with_four_instances() {
    let circle = Circle3::new(Point3::ORIGIN, Vec3::Z, 10.0);
    let curve = ArcLengthCurve::new(circle);
    assert_close(curve.length(), TAU * 10.0, 1e-3);

    let mut settings = InstancerSettings::default();
    settings.instancing.count = 4;
    let result = run(&curve, &settings);

    assert_eq!(result.len(), 4);
    let expected = [0.0, 15.71, 31.42, 47.12];
    for (instance, arc) in result.instances.iter().zip(expected) {
        assert_close(instance.arc_length, arc, 1e-2);

        let point = curve.point_at(instance.parameter);
        assert_close(point.to_vec3().length(), 10.0, 1e-9);
        assert_vec_close(instance.translation, point.to_vec3(), 1e-12);

        let tangent = curve.tangent_at(instance.parameter).unwrap();
        let forward = Quat::from_euler_xyz(instance.rotation).rotate(Vec3::Z);
        assert_vec_close(forward, tangent, 1e-6);

        assert_eq!(instance.scale, settings.offsets.local_scale);
    }
    assert_eq!(result.diagnostics.degenerate_frames, 0);
    assert!(result.diagnostics.warnings.is_empty());
}
