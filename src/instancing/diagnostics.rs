use serde::Serialize;

/// Diagnostics for one instancing evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstancingDiagnostics {
    /// Number of instances produced.
    pub instance_count: usize,
    /// Total arc length of the curve.
    pub curve_length: f64,
    /// Length of the used curve range after clamping.
    pub effective_length: f64,
    /// Whether the used range was widened to the minimum length.
    pub effective_length_clamped: bool,
    /// Instances whose curve frame was undefined and used the canonical basis.
    pub degenerate_frames: usize,
    /// Stored handles ignored because of the declared handle count.
    pub ignored_handles: usize,
    /// Warnings generated during the evaluation.
    pub warnings: Vec<String>,
}

impl InstancingDiagnostics {
    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.warnings.push(message);
    }
}
