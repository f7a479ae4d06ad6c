use super::amplitude::{AxisPolicy, RampChannel, RampSampler};
use super::orientation::InstanceFrame;
use crate::geom::Vec3;

/// Scale of every instance: one shared random draw per instance times the
/// channel axis, plus the local scale offset.
pub fn scale(frames: &[InstanceFrame], local_scale: Vec3, channel: &RampChannel) -> Vec<Vec3> {
    let mut sampler = RampSampler::new(channel, frames.len(), AxisPolicy::Verbatim);

    frames
        .iter()
        .map(|frame| sampler.unified(frame.index, frame.u) + local_scale)
        .collect()
}
