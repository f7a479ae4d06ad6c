//! Manually authored twist angles along the curve.
//!
//! Handles are sparse `(parameter, angle)` pairs. Between handles the angle is
//! blended linearly; on closed curves the stretch past the last handle blends
//! back into the first one across the seam.

use serde::{Deserialize, Serialize};

use crate::geom::{CurveForm, Tolerance};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Handle {
    /// Curve parameter the handle sits at.
    pub parameter: f64,
    /// Twist angle in radians.
    pub angle: f64,
}

impl Handle {
    #[must_use]
    pub const fn new(parameter: f64, angle: f64) -> Self {
        Self { parameter, angle }
    }
}

/// Handle data as authored by the host.
///
/// `count` is the declared handle count. It may disagree with the number of
/// stored handles while the host is still syncing; only the first
/// `min(count, handles.len())` entries are consulted. `None` uses them all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandleTrack {
    pub enabled: bool,
    pub count: Option<usize>,
    pub handles: Vec<Handle>,
}

impl HandleTrack {
    #[must_use]
    pub fn new(handles: Vec<Handle>) -> Self {
        Self {
            enabled: true,
            count: None,
            handles,
        }
    }

    /// Snapshot of the usable handles, sorted by parameter.
    #[must_use]
    pub fn resolve(&self) -> ResolvedHandles {
        let available = self.handles.len();
        let usable = self.count.map_or(available, |declared| declared.min(available));

        let mut handles: Vec<Handle> = self.handles[..usable]
            .iter()
            .copied()
            .filter(|h| h.parameter.is_finite() && h.angle.is_finite())
            .collect();
        handles.sort_by(|a, b| a.parameter.total_cmp(&b.parameter));

        ResolvedHandles {
            handles,
            ignored: available - usable,
        }
    }
}

/// Sorted, immutable handle snapshot for one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedHandles {
    handles: Vec<Handle>,
    ignored: usize,
}

impl ResolvedHandles {
    #[must_use]
    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    /// Stored handles beyond the declared count.
    #[must_use]
    pub const fn ignored(&self) -> usize {
        self.ignored
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Interpolated twist angle at curve parameter `param`.
    #[must_use]
    pub fn angle_at(&self, param: f64, form: CurveForm, max_param: f64) -> f64 {
        let (Some(first), Some(last)) = (self.handles.first(), self.handles.last()) else {
            return 0.0;
        };
        if self.handles.len() == 1 {
            return first.angle;
        }

        if param < first.parameter {
            return match form {
                CurveForm::Closed => blend(
                    last.parameter,
                    last.angle,
                    first.parameter + max_param,
                    first.angle,
                    param + max_param,
                ),
                CurveForm::Open => first.angle,
            };
        }

        if param >= last.parameter {
            return match form {
                CurveForm::Closed => blend(
                    last.parameter,
                    last.angle,
                    first.parameter + max_param,
                    first.angle,
                    param,
                ),
                CurveForm::Open => last.angle,
            };
        }

        // first.parameter <= param < last.parameter, so 1 <= k < len.
        let k = self.handles.partition_point(|h| h.parameter <= param);
        let a = self.handles[k - 1];
        let b = self.handles[k];
        blend(a.parameter, a.angle, b.parameter, b.angle, param)
    }
}

fn blend(param_k: f64, angle_k: f64, param_k1: f64, angle_k1: f64, param: f64) -> f64 {
    let span = param_k1 - param_k;
    if span.abs() < Tolerance::HANDLE_PARAMETER.eps {
        return angle_k;
    }
    let t = ((param - param_k) / span).clamp(0.0, 1.0);
    angle_k + (angle_k1 - angle_k) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(handles: &[(f64, f64)]) -> ResolvedHandles {
        HandleTrack::new(handles.iter().map(|&(p, a)| Handle::new(p, a)).collect()).resolve()
    }

    #[test]
    fn zero_handles_give_zero_angle() {
        let resolved = track(&[]);
        for p in [0.0, 0.3, 1.0] {
            assert_eq!(resolved.angle_at(p, CurveForm::Open, 1.0), 0.0);
            assert_eq!(resolved.angle_at(p, CurveForm::Closed, 1.0), 0.0);
        }
    }

    #[test]
    fn single_handle_is_constant() {
        let resolved = track(&[(0.4, 0.7)]);
        assert_eq!(resolved.angle_at(0.0, CurveForm::Closed, 1.0), 0.7);
        assert_eq!(resolved.angle_at(0.9, CurveForm::Open, 1.0), 0.7);
    }

    #[test]
    fn exact_handle_parameters_return_exact_angles() {
        let resolved = track(&[(0.1, 0.3), (0.5, -1.2), (0.8, 2.0)]);
        for form in [CurveForm::Open, CurveForm::Closed] {
            assert_eq!(resolved.angle_at(0.1, form, 1.0), 0.3);
            assert_eq!(resolved.angle_at(0.5, form, 1.0), -1.2);
            assert_eq!(resolved.angle_at(0.8, form, 1.0), 2.0);
        }
    }

    #[test]
    fn interior_blend_is_linear() {
        let resolved = track(&[(0.0, 0.0), (1.0, 2.0)]);
        assert!((resolved.angle_at(0.25, CurveForm::Open, 1.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn open_curve_clamps_outside_handles() {
        let resolved = track(&[(0.2, 1.0), (0.6, 3.0)]);
        assert_eq!(resolved.angle_at(0.0, CurveForm::Open, 1.0), 1.0);
        assert_eq!(resolved.angle_at(0.9, CurveForm::Open, 1.0), 3.0);
    }

    #[test]
    fn closed_curve_wraps_across_the_seam() {
        let resolved = track(&[(0.25, 0.0), (0.75, 1.0)]);
        // Halfway between 0.75 and 1.25 sits at 0.0 / 1.0.
        assert!((resolved.angle_at(1.0, CurveForm::Closed, 1.0) - 0.5).abs() < 1e-12);
        assert!((resolved.angle_at(0.0, CurveForm::Closed, 1.0) - 0.5).abs() < 1e-12);
        assert!((resolved.angle_at(0.125, CurveForm::Closed, 1.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn near_duplicate_handles_do_not_interpolate() {
        let resolved = track(&[(0.5, 1.0), (0.5005, 9.0)]);
        assert_eq!(resolved.angle_at(0.5002, CurveForm::Open, 1.0), 1.0);
    }

    #[test]
    fn declared_count_truncates_before_sorting() {
        let authored = HandleTrack {
            enabled: true,
            count: Some(2),
            handles: vec![
                Handle::new(0.9, 5.0),
                Handle::new(0.1, 1.0),
                Handle::new(0.0, 100.0),
            ],
        };
        let resolved = authored.resolve();
        assert_eq!(resolved.handles().len(), 2);
        assert_eq!(resolved.ignored(), 1);
        assert_eq!(resolved.handles()[0].parameter, 0.1);
    }

    #[test]
    fn declared_count_beyond_storage_is_harmless() {
        let authored = HandleTrack {
            enabled: true,
            count: Some(10),
            handles: vec![Handle::new(0.3, 1.0)],
        };
        let resolved = authored.resolve();
        assert_eq!(resolved.handles().len(), 1);
        assert_eq!(resolved.ignored(), 0);
    }
}
