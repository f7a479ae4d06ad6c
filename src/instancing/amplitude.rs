//! Ramp-modulated amplitude with deterministic random jitter.
//!
//! Each engine pass (position, rotation, scale) builds its own
//! [`RampSampler`], which reseeds the generator with the instance count. The
//! three passes therefore draw identical sequences regardless of what the
//! other channels are configured to, and re-running a pass with unchanged
//! inputs reproduces it bit for bit.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::ramp::{Ramp, RampCurve};
use crate::geom::Vec3;

/// Per-instance amplitude supplied from outside the ramp channel.
pub trait AmplitudeSource {
    /// Returns one amplitude per instance. Shorter results are allowed; the
    /// missing tail falls back to the channel's constant amplitude.
    fn sample(&self, count: usize) -> Vec<f64>;
}

/// Row-major grid of scalars addressed in wrapping UV space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal2D {
    pub width: usize,
    pub height: usize,
    pub values: Vec<f64>,
}

impl Signal2D {
    #[must_use]
    pub fn new(width: usize, height: usize, values: Vec<f64>) -> Self {
        Self {
            width,
            height,
            values,
        }
    }

    fn texel(&self, x: usize, y: usize) -> f64 {
        self.values
            .get(y * self.width + x)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Bilinear sample; `u` and `v` wrap into `[0, 1)`.
    #[must_use]
    pub fn sample(&self, u: f64, v: f64) -> f64 {
        if self.width == 0 || self.height == 0 || !u.is_finite() || !v.is_finite() {
            return 0.0;
        }

        let fx = u.rem_euclid(1.0) * self.width as f64;
        let fy = v.rem_euclid(1.0) * self.height as f64;
        let x0 = (fx.floor() as usize) % self.width;
        let y0 = (fy.floor() as usize) % self.height;
        let x1 = (x0 + 1) % self.width;
        let y1 = (y0 + 1) % self.height;
        let tx = fx - fx.floor();
        let ty = fy - fy.floor();

        let top = self.texel(x0, y0) + (self.texel(x1, y0) - self.texel(x0, y0)) * tx;
        let bottom = self.texel(x0, y1) + (self.texel(x1, y1) - self.texel(x0, y1)) * tx;
        top + (bottom - top) * ty
    }
}

/// A straight line through a [`Signal2D`], sampled at `u = i / count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalLine {
    pub signal: Signal2D,
    pub start: [f64; 2],
    pub end: [f64; 2],
}

impl AmplitudeSource for SignalLine {
    fn sample(&self, count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| {
                let t = i as f64 / count as f64;
                let u = self.start[0] + (self.end[0] - self.start[0]) * t;
                let v = self.start[1] + (self.end[1] - self.start[1]) * t;
                self.signal.sample(u, v)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DynamicAmplitude {
    Values(Vec<f64>),
    Signal(SignalLine),
}

impl AmplitudeSource for DynamicAmplitude {
    fn sample(&self, count: usize) -> Vec<f64> {
        match self {
            Self::Values(values) => values.iter().take(count).copied().collect(),
            Self::Signal(line) => line.sample(count),
        }
    }
}

/// Ramp settings for one of the position, rotation or scale channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RampChannel {
    pub ramp: Ramp,
    pub offset: f64,
    pub repeat: f64,
    pub amplitude: f64,
    pub dynamic_amplitude: Option<DynamicAmplitude>,
    pub random_amplitude: f64,
    pub axis: Vec3,
}

impl RampChannel {
    /// Channel with the given axis and all other settings at their defaults.
    #[must_use]
    pub fn with_axis(axis: Vec3) -> Self {
        Self {
            axis,
            ..Self::default()
        }
    }
}

impl Default for RampChannel {
    fn default() -> Self {
        Self {
            ramp: Ramp::default(),
            offset: 0.0,
            repeat: 1.0,
            amplitude: 1.0,
            dynamic_amplitude: None,
            random_amplitude: 0.0,
            axis: Vec3::ZERO,
        }
    }
}

/// Whether the channel axis is used as authored or as a unit direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisPolicy {
    Verbatim,
    Normalized,
}

/// Samples one [`RampChannel`] for a full pass over `count` instances.
///
/// Calls must be made in increasing instance order; every call consumes
/// random draws even when the random amplitude is zero.
pub struct RampSampler<'a> {
    channel: &'a RampChannel,
    axis: Vec3,
    amplitudes: Vec<f64>,
    rng: StdRng,
}

impl<'a> RampSampler<'a> {
    #[must_use]
    pub fn new(channel: &'a RampChannel, count: usize, policy: AxisPolicy) -> Self {
        let axis = match policy {
            AxisPolicy::Verbatim => channel.axis,
            AxisPolicy::Normalized => channel.axis.normalized().unwrap_or(Vec3::ZERO),
        };
        let axis = if axis.is_finite() { axis } else { Vec3::ZERO };
        let amplitudes = channel
            .dynamic_amplitude
            .as_ref()
            .map(|source| source.sample(count))
            .unwrap_or_default();

        Self {
            channel,
            axis,
            amplitudes,
            rng: StdRng::seed_from_u64(count as u64),
        }
    }

    /// Ramp value at normalized curve position `u`, honouring repeat and offset.
    #[must_use]
    pub fn ramp_value(&self, u: f64) -> f64 {
        let position = (u * self.channel.repeat + self.channel.offset).rem_euclid(1.0);
        self.channel.ramp.evaluate(position)
    }

    #[must_use]
    pub fn amplitude_at(&self, index: usize) -> f64 {
        self.amplitudes
            .get(index)
            .copied()
            .filter(|a| a.is_finite())
            .unwrap_or(self.channel.amplitude)
    }

    fn jitter(&mut self, base: f64) -> f64 {
        let r: f64 = self.rng.random();
        (r * 2.0 - 1.0) * self.channel.random_amplitude + base
    }

    /// Three independent draws, in X, Y, Z order.
    pub fn per_axis(&mut self, index: usize, u: f64) -> Vec3 {
        let base = self.ramp_value(u) * self.amplitude_at(index);
        let x = self.jitter(base);
        let y = self.jitter(base);
        let z = self.jitter(base);
        self.axis.mul_components(Vec3::new(x, y, z))
    }

    /// One draw shared by all three axes.
    pub fn unified(&mut self, index: usize, u: f64) -> Vec3 {
        let base = self.ramp_value(u) * self.amplitude_at(index);
        let value = self.jitter(base);
        self.axis.mul_scalar(value)
    }
}
