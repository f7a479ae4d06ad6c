//! Configuration for one instancing evaluation.
//!
//! All structs are plain data with serde support. Missing fields fall back to
//! their defaults, so hosts only send what they change.

use serde::{Deserialize, Serialize};

use super::amplitude::RampChannel;
use super::handles::HandleTrack;
use crate::geom::Vec3;

/// Smallest spacing accepted in [`DistributionMode::Distance`].
pub const MIN_SPACING: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistributionMode {
    /// A fixed number of instances spread over the effective length.
    #[default]
    Count,
    /// Instances every `spacing` units, capped at `max_count_by_spacing`.
    Distance,
}

impl DistributionMode {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "count" => Some(Self::Count),
            "distance" | "spacing" => Some(Self::Distance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstancingOptions {
    pub mode: DistributionMode,
    pub count: usize,
    pub spacing: f64,
    pub max_count_by_spacing: usize,
    /// Normalized start of the used curve range.
    pub curve_start: f64,
    /// Normalized end of the used curve range.
    pub curve_end: f64,
    /// Arc-length shift applied to every instance, wrapping around.
    pub distance_offset: f64,
}

impl Default for InstancingOptions {
    fn default() -> Self {
        Self {
            mode: DistributionMode::Count,
            count: 5,
            spacing: 1.0,
            max_count_by_spacing: 50,
            curve_start: 0.0,
            curve_end: 1.0,
            distance_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrientationMode {
    /// No rotation at all.
    Identity,
    /// The source object's own rotation on every instance.
    CopySource,
    /// Local forward follows the curve tangent.
    #[default]
    Curve,
    /// Like `Curve`, with every odd instance turned a quarter about the tangent.
    Chain,
}

impl OrientationMode {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "identity" => Some(Self::Identity),
            "copysource" | "copy-source" | "copy_source" => Some(Self::CopySource),
            "curve" => Some(Self::Curve),
            "chain" => Some(Self::Chain),
            _ => None,
        }
    }
}

/// Which local axis of the instanced object is its forward axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalAxis {
    X,
    Y,
    #[default]
    Z,
}

impl LocalAxis {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "z" => Some(Self::Z),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrientationOptions {
    pub mode: OrientationMode,
    pub local_axis: LocalAxis,
    /// Euler XYZ, radians.
    pub local_rotation_offset: Vec3,
    /// Euler XYZ, radians.
    pub global_rotation_offset: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformOffsets {
    /// Expressed in each instance's right/up/forward basis.
    pub local_translation: Vec3,
    pub global_translation: Vec3,
    pub local_scale: Vec3,
}

impl Default for TransformOffsets {
    fn default() -> Self {
        Self {
            local_translation: Vec3::ZERO,
            global_translation: Vec3::ZERO,
            local_scale: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RampChannels {
    pub position: RampChannel,
    /// Twist angles in degrees.
    pub rotation: RampChannel,
    pub scale: RampChannel,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstancerSettings {
    pub instancing: InstancingOptions,
    pub orientation: OrientationOptions,
    pub offsets: TransformOffsets,
    pub handles: HandleTrack,
    pub ramps: RampChannels,
}

impl InstancerSettings {
    /// Copy with every out-of-range or non-finite value pulled back into a
    /// usable range. Never fails.
    #[must_use]
    pub fn validated(&self) -> Self {
        let mut out = self.clone();
        let defaults = InstancingOptions::default();

        let options = &mut out.instancing;
        options.count = options.count.max(1);
        options.spacing = finite_or(options.spacing, defaults.spacing).max(MIN_SPACING);
        options.curve_start = finite_or(options.curve_start, defaults.curve_start).clamp(0.0, 1.0);
        options.curve_end = finite_or(options.curve_end, defaults.curve_end).clamp(0.0, 1.0);
        options.distance_offset = finite_or(options.distance_offset, defaults.distance_offset);

        let orientation = &mut out.orientation;
        orientation.local_rotation_offset = finite_vec_or(orientation.local_rotation_offset, Vec3::ZERO);
        orientation.global_rotation_offset =
            finite_vec_or(orientation.global_rotation_offset, Vec3::ZERO);

        let offset_defaults = TransformOffsets::default();
        let offsets = &mut out.offsets;
        offsets.local_translation =
            finite_vec_or(offsets.local_translation, offset_defaults.local_translation);
        offsets.global_translation =
            finite_vec_or(offsets.global_translation, offset_defaults.global_translation);
        offsets.local_scale = finite_vec_or(offsets.local_scale, offset_defaults.local_scale);

        for channel in [
            &mut out.ramps.position,
            &mut out.ramps.rotation,
            &mut out.ramps.scale,
        ] {
            validate_channel(channel);
        }

        out
    }
}

fn validate_channel(channel: &mut RampChannel) {
    let defaults = RampChannel::default();
    channel.offset = finite_or(channel.offset, defaults.offset);
    channel.repeat = finite_or(channel.repeat, defaults.repeat);
    channel.amplitude = finite_or(channel.amplitude, defaults.amplitude);
    channel.random_amplitude = finite_or(channel.random_amplitude, defaults.random_amplitude).max(0.0);
    channel.axis = finite_vec_or(channel.axis, defaults.axis);
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

fn finite_vec_or(value: Vec3, fallback: Vec3) -> Vec3 {
    if value.is_finite() { value } else { fallback }
}
