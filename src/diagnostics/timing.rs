use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Milliseconds elapsed since `start`.
#[inline]
pub fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Wall time of one named phase (sampling, boosting, persisting, ...).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

/// Ordered phase timings of a training stage or scan.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub phases: Vec<PhaseTiming>,
}

impl TimingBreakdown {
    /// Record the phase that started at `start`; the total grows with it.
    pub fn record(&mut self, label: impl Into<String>, start: Instant) {
        let ms = elapsed_ms(start);
        self.total_ms += ms;
        self.phases.push(PhaseTiming {
            label: label.into(),
            elapsed_ms: ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_total() {
        let mut t = TimingBreakdown::default();
        t.record("a", Instant::now());
        t.record("b", Instant::now());
        assert_eq!(t.phases.len(), 2);
        let sum: f64 = t.phases.iter().map(|p| p.elapsed_ms).sum();
        assert!((t.total_ms - sum).abs() < 1e-9);
        assert_eq!(t.phases[1].label, "b");
    }
}
