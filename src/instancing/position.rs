use super::amplitude::{AxisPolicy, RampChannel, RampSampler};
use super::orientation::InstanceFrame;
use super::settings::TransformOffsets;
use crate::geom::Vec3;

/// Translation of every instance.
///
/// Curve point, plus ramp offsets along the instance's right, up and forward
/// axes, plus the global offset, minus the source pivot, plus the local offset
/// expressed in the same basis. The channel axis is used as authored.
pub fn place(frames: &[InstanceFrame], offsets: &TransformOffsets, channel: &RampChannel, pivot: Vec3) -> Vec<Vec3> {
    let mut sampler = RampSampler::new(channel, frames.len(), AxisPolicy::Verbatim);

    frames
        .iter()
        .map(|frame| {
            let jitter = sampler.per_axis(frame.index, frame.u);
            frame.point.to_vec3() + frame.basis.to_world(jitter) + offsets.global_translation - pivot
                + frame.basis.to_world(offsets.local_translation)
        })
        .collect()
}
