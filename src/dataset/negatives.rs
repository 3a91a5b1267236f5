use super::{LabeledImage, PatchSource};
use crate::error::{CascadeError, Result};
use crate::image::{GrayImageU8, ImageView};
use crate::types::Rect;
use rand::Rng;

/// Crops overlapping an annotated region by this IoU or more are redrawn.
pub const MAX_NEGATIVE_IOU: f32 = 0.5;

/// Redraws allowed per requested patch before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

/// Endless stream of random crops that avoid every annotated region.
///
/// Crops keep the configured width/height ratio and are at least `min_size`
/// pixels tall. Images too small to host such a crop are never drawn from.
pub struct NegativeSamples<'a, R> {
    images: &'a [LabeledImage],
    eligible: Vec<usize>,
    min_size: usize,
    wh_ratio: f32,
    max_attempts: usize,
    rng: R,
}

impl<'a, R: Rng> NegativeSamples<'a, R> {
    pub fn new(images: &'a [LabeledImage], min_size: usize, wh_ratio: f32, rng: R) -> Result<Self> {
        if min_size == 0 || !(wh_ratio.is_finite() && wh_ratio > 0.0) {
            return Err(CascadeError::InvalidParams(format!(
                "negative crops need min_size >= 1 and a positive ratio (got {min_size}, {wh_ratio})"
            )));
        }
        let eligible: Vec<usize> = images
            .iter()
            .enumerate()
            .filter(|(_, l)| {
                let min_w = (wh_ratio * min_size as f32) as usize;
                l.image.height() >= min_size && l.image.width() >= min_w.max(1)
            })
            .map(|(i, _)| i)
            .collect();
        if eligible.is_empty() {
            return Err(CascadeError::Dataset(format!(
                "no image can host a negative crop of height {min_size}"
            )));
        }
        Ok(Self {
            images,
            eligible,
            min_size,
            wh_ratio,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rng,
        })
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    fn random_rect(&mut self, width: usize, height: usize) -> Option<Rect> {
        let h = self.rng.gen_range(self.min_size..=height);
        let w = (self.wh_ratio * h as f32) as usize;
        if w == 0 || w > width {
            return None;
        }
        let x = self.rng.gen_range(0..=width - w);
        let y = self.rng.gen_range(0..=height - h);
        Some(Rect::new(x, y, w, h))
    }
}

impl<'a, R: Rng> PatchSource for NegativeSamples<'a, R> {
    fn len(&self) -> usize {
        usize::MAX
    }

    fn patch(&mut self, _idx: usize) -> Result<GrayImageU8> {
        for _ in 0..self.max_attempts {
            let pick = self.eligible[self.rng.gen_range(0..self.eligible.len())];
            let labeled = &self.images[pick];
            let Some(rect) = self.random_rect(labeled.image.width(), labeled.image.height())
            else {
                continue;
            };
            if labeled
                .regions
                .iter()
                .any(|r| rect.iou(r) >= MAX_NEGATIVE_IOU)
            {
                continue;
            }
            if let Some(patch) = labeled.image.crop(rect) {
                return Ok(patch);
            }
        }
        Err(CascadeError::Dataset(format!(
            "no negative crop found in {} attempts",
            self.max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn crops_respect_size_and_overlap() {
        let object = Rect::new(10, 10, 30, 30);
        let images = vec![LabeledImage::new(
            GrayImageU8::filled(80, 60, 5),
            vec![object],
        )];
        let mut src =
            NegativeSamples::new(&images, 20, 1.0, Xoshiro256PlusPlus::seed_from_u64(9)).unwrap();
        assert_eq!(src.len(), usize::MAX);
        for i in 0..100 {
            let p = src.patch(i).unwrap();
            assert!(p.height() >= 20 && p.height() <= 60);
            assert_eq!(p.width(), p.height());
        }
    }

    #[test]
    fn fully_covered_image_gives_up() {
        // The only crop size that fits is the annotated box itself.
        let images = vec![LabeledImage::new(
            GrayImageU8::filled(10, 10, 0),
            vec![Rect::new(0, 0, 10, 10)],
        )];
        let mut src = NegativeSamples::new(&images, 10, 1.0, Xoshiro256PlusPlus::seed_from_u64(1))
            .unwrap()
            .with_max_attempts(20);
        assert!(matches!(src.patch(0), Err(CascadeError::Dataset(_))));
    }

    #[test]
    fn small_images_are_skipped() {
        let images = vec![LabeledImage::new(GrayImageU8::filled(8, 8, 0), vec![])];
        assert!(NegativeSamples::new(&images, 16, 1.0, Xoshiro256PlusPlus::seed_from_u64(0)).is_err());
    }
}
