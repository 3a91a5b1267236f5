//! Patch sources feeding the cascade trainer.
//!
//! Training only needs indexable access to grayscale patches. Labelled
//! images are turned into positive crops (the annotated regions, optionally
//! jittered) and an endless stream of random negative crops that avoid every
//! annotated region.

pub mod negatives;
pub mod positives;

pub use negatives::NegativeSamples;
pub use positives::{fit_ratio, PositiveSamples, RoiJitter};

use crate::error::{CascadeError, Result};
use crate::image::GrayImageU8;
use crate::types::Rect;

/// Indexable supply of training patches.
pub trait PatchSource {
    /// Number of addressable patches. Random sources may report `usize::MAX`.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Patch number `idx`. Random sources may ignore the index.
    fn patch(&mut self, idx: usize) -> Result<GrayImageU8>;
}

/// A grayscale image with its annotated object regions.
#[derive(Clone, Debug)]
pub struct LabeledImage {
    pub image: GrayImageU8,
    pub regions: Vec<Rect>,
}

impl LabeledImage {
    pub fn new(image: GrayImageU8, regions: Vec<Rect>) -> Self {
        Self { image, regions }
    }
}

/// Pre-cut patches held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPatches {
    patches: Vec<GrayImageU8>,
}

impl InMemoryPatches {
    pub fn new(patches: Vec<GrayImageU8>) -> Self {
        Self { patches }
    }
}

impl PatchSource for InMemoryPatches {
    fn len(&self) -> usize {
        self.patches.len()
    }

    fn patch(&mut self, idx: usize) -> Result<GrayImageU8> {
        self.patches.get(idx).cloned().ok_or_else(|| {
            CascadeError::Dataset(format!(
                "patch {idx} requested from a pool of {}",
                self.patches.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_index_is_checked() {
        let mut src = InMemoryPatches::new(vec![GrayImageU8::filled(2, 2, 1)]);
        assert_eq!(src.len(), 1);
        assert!(src.patch(0).is_ok());
        assert!(matches!(src.patch(1), Err(CascadeError::Dataset(_))));
    }
}
