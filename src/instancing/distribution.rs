//! Instance count and arc-length placement.

use super::settings::{DistributionMode, InstancingOptions, MIN_SPACING};

/// Lower bound for the used curve range, so a collapsed range never divides
/// by zero.
pub const MIN_EFFECTIVE_LENGTH: f64 = 1e-6;

/// Resolved placement for one evaluation over a curve of known length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionPlan {
    count: usize,
    curve_length: f64,
    effective_length: f64,
    effective_length_clamped: bool,
    increment: f64,
    start_length: f64,
    offset: f64,
}

impl DistributionPlan {
    /// Plans placement over a curve of length `curve_length`. A zero or
    /// non-finite length yields an empty plan.
    #[must_use]
    pub fn new(options: &InstancingOptions, curve_length: f64) -> Self {
        if !curve_length.is_finite() || curve_length <= 0.0 {
            return Self {
                count: 0,
                curve_length: 0.0,
                effective_length: 0.0,
                effective_length_clamped: false,
                increment: 0.0,
                start_length: 0.0,
                offset: 0.0,
            };
        }

        let start_length = options.curve_start * curve_length;
        let raw = options.curve_end * curve_length - start_length;
        let floor = MIN_EFFECTIVE_LENGTH.min(curve_length);
        let effective_length_clamped = !(raw >= floor);
        let effective_length = if effective_length_clamped {
            floor
        } else {
            raw.min(curve_length)
        };

        let (count, increment) = match options.mode {
            DistributionMode::Count => {
                let count = options.count;
                let increment = if count > 0 {
                    effective_length / count as f64
                } else {
                    0.0
                };
                (count, increment)
            }
            DistributionMode::Distance => {
                let spacing = if options.spacing.is_finite() {
                    options.spacing.max(MIN_SPACING)
                } else {
                    MIN_SPACING
                };
                let fitting = (effective_length / spacing).ceil();
                let count = fitting.min(options.max_count_by_spacing as f64).max(0.0) as usize;
                (count, spacing)
            }
        };

        let offset = if options.distance_offset.is_finite() {
            options.distance_offset
        } else {
            0.0
        };

        Self {
            count,
            curve_length,
            effective_length,
            effective_length_clamped,
            increment,
            start_length: if start_length.is_finite() { start_length } else { 0.0 },
            offset,
        }
    }

    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub const fn curve_length(&self) -> f64 {
        self.curve_length
    }

    #[must_use]
    pub const fn effective_length(&self) -> f64 {
        self.effective_length
    }

    /// Whether the requested range was shorter than the minimum and got
    /// widened.
    #[must_use]
    pub const fn effective_length_clamped(&self) -> bool {
        self.effective_length_clamped
    }

    #[must_use]
    pub const fn increment(&self) -> f64 {
        self.increment
    }

    /// Arc length of instance `index`.
    ///
    /// The step and offset wrap within the used range, then the result wraps
    /// around the whole curve, so a range starting mid-curve can slide past
    /// the seam. Negative offsets wrap the same way as positive ones.
    #[must_use]
    pub fn arc_length_of(&self, index: usize) -> f64 {
        if self.curve_length <= 0.0 {
            return 0.0;
        }
        let within = (self.increment * index as f64 + self.offset).rem_euclid(self.effective_length);
        let arc = (self.start_length + within).rem_euclid(self.curve_length);
        // rem_euclid may round up to the modulus for tiny negative inputs.
        if arc >= self.curve_length { 0.0 } else { arc }
    }

    /// Position on the whole curve in `[0, 1)`, ignoring the used range.
    #[must_use]
    pub fn normalized_position(&self, arc_length: f64) -> f64 {
        if self.curve_length <= 0.0 {
            0.0
        } else {
            arc_length / self.curve_length
        }
    }

    pub fn arc_lengths(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count).map(|i| self.arc_length_of(i))
    }
}
