use crate::types::Detection;
use serde::Serialize;

/// One window size of the multi-scale scan.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleReport {
    pub window_width: usize,
    pub window_height: usize,
    pub step: usize,
    pub windows: usize,
    pub detections: usize,
}

/// Detector output together with per-scale counters.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub image_width: usize,
    pub image_height: usize,
    pub scales: Vec<ScaleReport>,
    pub windows_evaluated: usize,
    pub detections: Vec<Detection>,
    pub latency_ms: f64,
}
