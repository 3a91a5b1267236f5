#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod detector;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod model;
pub mod types;

// Training side: sample sources, trainers and tool configs.
pub mod config;
pub mod dataset;
pub mod train;

// --- High-level re-exports -------------------------------------------------

// Detection entry points + results.
pub use crate::detector::{Detector, DetectorParams};
pub use crate::types::{Detection, Rect};

// Model and its binary format.
pub use crate::error::{CascadeError, Result};
pub use crate::model::{load_cascade, save_cascade, Cascade, Prediction};

// Training entry points.
pub use crate::train::{train_to_file, CascadeTrainer, TrainParams};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use cascade_detector::prelude::*;
/// use std::path::Path;
///
/// # fn main() -> cascade_detector::Result<()> {
/// let cascade = load_cascade(Path::new("face.bin"))?;
/// let detector = Detector::new(cascade, DetectorParams::default())?;
///
/// let (w, h) = (640usize, 480usize);
/// let gray = vec![0u8; w * h];
/// let img = ImageU8 { w, h, stride: w, data: &gray };
/// for det in detector.detect(&img) {
///     println!("{:?} confidence={:.3}", det.rect, det.confidence);
/// }
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{GrayImageU8, ImageU8, ImageView};
    pub use crate::{load_cascade, Cascade, Detection, Detector, DetectorParams, Rect};
}
