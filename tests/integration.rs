use curve_instancer::Instancer;
use curve_instancer::geom::{ArcLengthCurve, Polyline3, Quat, Vec3};
use curve_instancer::instancing::{self, DistributionMode, OrientationMode, SourceSnapshot};
use curve_instancer::parse::preset_xml;

const CHAIN_PRESET: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<instancer>
  <instancing mode="distance" spacing="2" max-count="6" offset="1"/>
  <orientation mode="chain"/>
  <offsets>
    <global-translation z="1"/>
  </offsets>
</instancer>"#;

fn square() -> ArcLengthCurve<Polyline3> {
    let flat = [
        0.0, 0.0, 0.0, //
        4.0, 0.0, 0.0, //
        4.0, 4.0, 0.0, //
        0.0, 4.0, 0.0,
    ];
    ArcLengthCurve::new(Polyline3::from_flat(&flat, true).expect("square polyline"))
}

#[test]
fn instancer_constructs_with_defaults() {
    let mut instancer = Instancer::new();
    instancer.set_polyline_curve(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0], false).expect("valid polyline");
    instancer.clear_curve();
}

#[test]
fn preset_drives_a_full_evaluation() {
    let settings = preset_xml::parse_str(CHAIN_PRESET).expect("parse preset");
    assert_eq!(settings.instancing.mode, DistributionMode::Distance);
    assert_eq!(settings.orientation.mode, OrientationMode::Chain);

    let curve = square();
    let result = instancing::evaluate(Some(&curve), &settings, Some(&SourceSnapshot::default()));

    // Sixteen units of perimeter at spacing two would fit eight; the cap wins.
    assert_eq!(result.len(), 6);
    assert_eq!(result.diagnostics.instance_count, 6);

    for instance in &result.instances {
        assert!((instance.translation.z - 1.0).abs() < 1e-9);
        assert!((instance.arc_length - (2.0 * instance.index as f64 + 1.0)).abs() < 1e-9);
    }

    // Instances 0 and 1 share the first edge; the odd link is turned a quarter
    // about the tangent.
    let up = |i: usize| Quat::from_euler_xyz(result.instances[i].rotation).rotate(Vec3::Y);
    assert!(up(0).dot(up(1)).abs() < 1e-6);
}

#[test]
fn source_pivot_and_rotation_flow_through() {
    let mut settings = preset_xml::parse_str(r#"<instancer><orientation mode="copy-source"/></instancer>"#)
        .expect("parse preset");
    settings.instancing.count = 3;

    let source = SourceSnapshot {
        rotation: Quat::from_axis_angle(Vec3::X, 0.8).expect("axis"),
        pivot: Vec3::new(0.0, 0.0, 2.0),
    };
    let curve = square();
    let result = instancing::evaluate(Some(&curve), &settings, Some(&source));

    for instance in &result.instances {
        let rotation = Quat::from_euler_xyz(instance.rotation);
        assert!(rotation.angle_to(source.rotation) < 1e-6);
        assert!((instance.translation.z + 2.0).abs() < 1e-9);
    }
}

#[test]
fn partial_preset_keeps_untouched_defaults() {
    let settings = preset_xml::parse_str(
        r#"<instancer><ramp channel="rotation" random="12.5"><axis x="0" y="0" z="1"/></ramp></instancer>"#,
    )
    .expect("parse preset");
    assert_eq!(settings.ramps.rotation.random_amplitude, 12.5);
    assert_eq!(settings.ramps.rotation.axis, Vec3::Z);
    assert_eq!(settings.ramps.position.amplitude, 1.0);
    assert_eq!(settings.instancing.count, 5);
}
