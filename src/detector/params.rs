//! Parameters of the multi-scale window scan.

use crate::error::{CascadeError, Result};
use serde::{Deserialize, Serialize};

/// Window schedule of the detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Smallest window height in pixels.
    pub min_size: usize,
    /// Growth factor of the window height between scales (> 1).
    pub scale_increase: f32,
    /// Scan step as a fraction of the window height.
    pub step_scale: f32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            min_size: 50,
            scale_increase: 1.2,
            step_scale: 0.1,
        }
    }
}

impl DetectorParams {
    pub fn validate(&self) -> Result<()> {
        if self.min_size == 0 {
            return Err(CascadeError::InvalidParams(
                "min_size must be at least 1".into(),
            ));
        }
        if !(self.scale_increase.is_finite() && self.scale_increase > 1.0) {
            return Err(CascadeError::InvalidParams(format!(
                "scale_increase must be > 1, got {}",
                self.scale_increase
            )));
        }
        if !(self.step_scale.is_finite() && self.step_scale > 0.0) {
            return Err(CascadeError::InvalidParams(format!(
                "step_scale must be > 0, got {}",
                self.step_scale
            )));
        }
        Ok(())
    }
}
