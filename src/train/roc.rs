//! ROC helpers used to place stage thresholds.
//!
//! A sample is positive when its label is `> 0` and predicted positive when
//! its output is `>= threshold`.

use crate::error::{CascadeError, Result};
use serde::Serialize;

/// True/false positive rates at one threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RocPoint {
    pub tpr: f32,
    pub fpr: f32,
}

/// Result of [`search_threshold`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ThresholdSearch {
    pub tpr: f32,
    pub fpr: f32,
    pub threshold: f32,
}

#[inline]
fn rate(hits: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        hits as f32 / total as f32
    }
}

/// Rates at `threshold`. A class with no samples reports a rate of zero.
pub fn roc_point(labels: &[f32], outputs: &[f32], threshold: f32) -> RocPoint {
    debug_assert_eq!(labels.len(), outputs.len());
    let (mut tp, mut fn_, mut fp, mut tn) = (0usize, 0usize, 0usize, 0usize);
    for (&label, &out) in labels.iter().zip(outputs) {
        match (label > 0.0, out >= threshold) {
            (true, true) => tp += 1,
            (true, false) => fn_ += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
        }
    }
    RocPoint {
        tpr: rate(tp, tp + fn_),
        fpr: rate(fp, fp + tn),
    }
}

/// Walk the threshold down from `max(outputs)` in steps of `step` and return
/// the first one whose TPR reaches `min_tpr`.
///
/// Thresholds are computed as `max - k * step`, so the walk cannot stall on
/// large magnitudes. Once the threshold is below every output the TPR is 1;
/// if the target is still unmet at that point the search fails.
pub fn search_threshold(
    labels: &[f32],
    outputs: &[f32],
    min_tpr: f32,
    step: f32,
) -> Result<ThresholdSearch> {
    if labels.len() != outputs.len() {
        return Err(CascadeError::InvalidData(format!(
            "{} labels for {} outputs",
            labels.len(),
            outputs.len()
        )));
    }
    if !labels.iter().any(|&l| l > 0.0) {
        return Err(CascadeError::InvalidData(
            "ROC search needs at least one positive sample".into(),
        ));
    }
    if !(step > 0.0 && step.is_finite()) {
        return Err(CascadeError::InvalidParams(format!(
            "ROC step must be positive, got {step}"
        )));
    }
    if outputs.iter().any(|o| !o.is_finite()) {
        return Err(CascadeError::InvalidData(
            "ROC search over non-finite outputs".into(),
        ));
    }

    let (lo, hi) = outputs
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &o| {
            (lo.min(o), hi.max(o))
        });
    let (lo, hi, step64) = (f64::from(lo), f64::from(hi), f64::from(step));
    let max_steps = ((hi - lo) / step64).ceil() as usize + 1;

    for k in 0..=max_steps {
        let threshold = (hi - k as f64 * step64) as f32;
        let p = roc_point(labels, outputs, threshold);
        if p.tpr >= min_tpr {
            return Ok(ThresholdSearch {
                tpr: p.tpr,
                fpr: p.fpr,
                threshold,
            });
        }
    }
    Err(CascadeError::UnreachableTpr {
        min_tpr,
        steps: max_steps + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const LABELS: [f32; 4] = [1.0, 1.0, -1.0, -1.0];
    const OUTPUTS: [f32; 4] = [0.9, 0.1, 0.8, -0.2];

    #[test]
    fn roc_point_counts_by_hand() {
        let p = roc_point(&LABELS, &OUTPUTS, 0.5);
        assert_abs_diff_eq!(p.tpr, 0.5);
        assert_abs_diff_eq!(p.fpr, 0.5);
    }

    #[test]
    fn search_stops_at_first_threshold_meeting_target() {
        let s = search_threshold(&LABELS, &OUTPUTS, 0.5, 0.001).unwrap();
        assert!(s.threshold <= 0.9);
        assert!(s.threshold > 0.8, "threshold {} admits the negative", s.threshold);
        assert!(s.tpr >= 0.5);
        assert_abs_diff_eq!(s.fpr, 0.0);
    }

    #[test]
    fn full_recall_lowers_threshold_to_weakest_positive() {
        let s = search_threshold(&LABELS, &OUTPUTS, 1.0, 0.001).unwrap();
        assert!(s.threshold <= 0.1 && s.threshold > 0.098);
        assert_abs_diff_eq!(s.tpr, 1.0);
        assert_abs_diff_eq!(s.fpr, 0.5);
    }

    #[test]
    fn unreachable_target_fails() {
        let err = search_threshold(&LABELS, &OUTPUTS, 1.01, 0.001).unwrap_err();
        assert!(matches!(err, CascadeError::UnreachableTpr { .. }));
    }

    #[test]
    fn requires_positives() {
        assert!(search_threshold(&[-1.0, -1.0], &[0.2, 0.3], 0.5, 0.001).is_err());
    }

    #[test]
    fn large_magnitudes_terminate() {
        let labels = [1.0, -1.0];
        let outputs = [20000.0, 19999.0];
        let s = search_threshold(&labels, &outputs, 1.0, 0.001).unwrap();
        assert!(s.threshold <= 20000.0);
        assert_abs_diff_eq!(s.tpr, 1.0);
    }
}
