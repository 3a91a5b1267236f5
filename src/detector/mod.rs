//! Multi-scale sliding-window detector.
//!
//! Overview
//! - Window heights follow [`ScaleSchedule`]: from `min_size` up to the
//!   shorter image side, growing by `scale_increase` each step.
//! - Window width is `floor(height * wh_ratio)` with the cascade's ratio.
//! - At each scale, windows start at every `step` pixels over rows
//!   `[0, H - h)` and columns `[0, W - w)`.
//! - Every window is a zero-copy view handed to the cascade; the surviving
//!   ones are reported with their final confidence.
//!
//! Overlapping detections are not merged. With the `parallel` feature, rows
//! of a scale are scanned concurrently and results keep scan order.

pub mod params;
pub mod scales;

pub use params::DetectorParams;
pub use scales::{ScaleSchedule, WindowScale};

use crate::diagnostics::{elapsed_ms, ScaleReport, ScanReport};
use crate::error::{CascadeError, Result};
use crate::image::ImageU8;
use crate::model::Cascade;
use crate::types::{Detection, Rect};
use log::debug;
use std::time::Instant;

/// Read-only cascade plus scan schedule.
#[derive(Clone, Debug)]
pub struct Detector {
    cascade: Cascade,
    params: DetectorParams,
}

impl Detector {
    pub fn new(cascade: Cascade, params: DetectorParams) -> Result<Self> {
        params.validate()?;
        if !(cascade.wh_ratio.is_finite() && cascade.wh_ratio > 0.0) {
            return Err(CascadeError::InvalidParams(format!(
                "cascade width/height ratio {} cannot size a window",
                cascade.wh_ratio
            )));
        }
        Ok(Self { cascade, params })
    }

    pub fn cascade(&self) -> &Cascade {
        &self.cascade
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Every window accepted by the cascade, in scale, row, column order.
    pub fn detect(&self, image: &ImageU8<'_>) -> Vec<Detection> {
        self.detect_with_report(image).detections
    }

    /// [`Detector::detect`] with per-scale window counts and latency.
    pub fn detect_with_report(&self, image: &ImageU8<'_>) -> ScanReport {
        let t0 = Instant::now();
        let mut scales = Vec::new();
        let mut detections = Vec::new();
        let mut windows_evaluated = 0;

        for scale in ScaleSchedule::new(self.params, self.cascade.wh_ratio, image.w, image.h) {
            if scale.width == 0 || scale.width > image.w {
                continue;
            }
            let rows: Vec<usize> = (0..image.h - scale.height).step_by(scale.step).collect();
            let cols = (0..image.w - scale.width).step_by(scale.step).len();
            let found = scan_rows(&self.cascade, image, scale, &rows);
            debug!(
                "scale {}x{} step {}: {} windows, {} detections",
                scale.width,
                scale.height,
                scale.step,
                rows.len() * cols,
                found.len()
            );
            windows_evaluated += rows.len() * cols;
            scales.push(ScaleReport {
                window_width: scale.width,
                window_height: scale.height,
                step: scale.step,
                windows: rows.len() * cols,
                detections: found.len(),
            });
            detections.extend(found);
        }

        ScanReport {
            image_width: image.w,
            image_height: image.h,
            scales,
            windows_evaluated,
            detections,
            latency_ms: elapsed_ms(t0),
        }
    }
}

fn scan_row(cascade: &Cascade, image: &ImageU8<'_>, scale: WindowScale, y: usize) -> Vec<Detection> {
    let mut out = Vec::new();
    for x in (0..image.w - scale.width).step_by(scale.step) {
        let rect = Rect::new(x, y, scale.width, scale.height);
        let Some(window) = image.sub_view(rect) else {
            continue;
        };
        if let Some(confidence) = cascade.classify(&window) {
            out.push(Detection { rect, confidence });
        }
    }
    out
}

#[cfg(not(feature = "parallel"))]
fn scan_rows(
    cascade: &Cascade,
    image: &ImageU8<'_>,
    scale: WindowScale,
    rows: &[usize],
) -> Vec<Detection> {
    rows.iter()
        .flat_map(|&y| scan_row(cascade, image, scale, y))
        .collect()
}

#[cfg(feature = "parallel")]
fn scan_rows(
    cascade: &Cascade,
    image: &ImageU8<'_>,
    scale: WindowScale,
    rows: &[usize],
) -> Vec<Detection> {
    use rayon::prelude::*;

    rows.par_iter()
        .map(|&y| scan_row(cascade, image, scale, y))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}
