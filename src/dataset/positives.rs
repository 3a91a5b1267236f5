use super::{LabeledImage, PatchSource};
use crate::error::{CascadeError, Result};
use crate::image::{GrayImageU8, ImageView};
use crate::types::Rect;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Random perturbation of annotated regions.
///
/// The centre moves by up to `translate` of the box size on each axis and the
/// height is rescaled by up to `scale`, the width following to keep the box's
/// aspect ratio.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiJitter {
    pub translate: f32,
    pub scale: f32,
}

impl Default for RoiJitter {
    fn default() -> Self {
        Self {
            translate: 0.07,
            scale: 0.07,
        }
    }
}

fn symmetric<R: Rng>(rng: &mut R, amount: f32) -> f32 {
    if amount > 0.0 {
        rng.gen_range(-amount..=amount)
    } else {
        0.0
    }
}

impl RoiJitter {
    /// Jittered copy of `roi`, `None` when it would start left of or above
    /// the image origin or collapse to nothing.
    pub fn apply<R: Rng>(&self, roi: Rect, rng: &mut R) -> Option<Rect> {
        if roi.w == 0 || roi.h == 0 {
            return None;
        }
        let (w, h) = (roi.w as f32, roi.h as f32);
        let cx = roi.x as f32 + 0.5 * w + symmetric(rng, self.translate) * w;
        let cy = roi.y as f32 + 0.5 * h + symmetric(rng, self.translate) * h;
        let nh = (h * (1.0 + symmetric(rng, self.scale))).round();
        let nw = (nh * w / h).round();
        let (x, y) = ((cx - 0.5 * nw).round(), (cy - 0.5 * nh).round());
        if x < 0.0 || y < 0.0 || nw < 1.0 || nh < 1.0 {
            return None;
        }
        Some(Rect::new(x as usize, y as usize, nw as usize, nh as usize))
    }
}

/// `roi` with its width reset to `floor(wh_ratio * h)` around the same
/// horizontal centre. `None` when the box would collapse or start left of the
/// image.
pub fn fit_ratio(roi: Rect, wh_ratio: f32) -> Option<Rect> {
    let w = (roi.h as f32 * wh_ratio).floor() as usize;
    if w == 0 {
        return None;
    }
    // `2x + w` is twice the centre column.
    let twice_x = (2 * roi.x + roi.w).checked_sub(w)?;
    Some(Rect::new(twice_x / 2, roi.y, w, roi.h))
}

/// Annotated regions of a set of images, one patch per region.
///
/// Every region keeps its height and is widened or narrowed to the window
/// aspect ratio before jitter, so patches match the detector's windows.
pub struct PositiveSamples<'a, R> {
    images: &'a [LabeledImage],
    /// `(image, region)` pairs in image-major order.
    entries: Vec<(usize, usize)>,
    wh_ratio: f32,
    jitter: Option<RoiJitter>,
    rng: R,
}

impl<'a, R: Rng> PositiveSamples<'a, R> {
    pub fn new(
        images: &'a [LabeledImage],
        wh_ratio: f32,
        jitter: Option<RoiJitter>,
        rng: R,
    ) -> Self {
        let entries = images
            .iter()
            .enumerate()
            .flat_map(|(i, img)| (0..img.regions.len()).map(move |r| (i, r)))
            .collect();
        Self {
            images,
            entries,
            wh_ratio,
            jitter,
            rng,
        }
    }
}

impl<'a, R: Rng> PatchSource for PositiveSamples<'a, R> {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn patch(&mut self, idx: usize) -> Result<GrayImageU8> {
        let &(img_idx, roi_idx) = self.entries.get(idx).ok_or_else(|| {
            CascadeError::Dataset(format!(
                "positive {idx} requested from a pool of {}",
                self.entries.len()
            ))
        })?;
        let labeled = &self.images[img_idx];
        let annotated = labeled.regions[roi_idx];
        let roi = fit_ratio(annotated, self.wh_ratio).ok_or_else(|| {
            CascadeError::Dataset(format!(
                "region {annotated:?} of image {img_idx} cannot take width/height ratio {}",
                self.wh_ratio
            ))
        })?;

        // Jittered boxes that leave the image fall back to the annotation.
        if let Some(jitter) = self.jitter {
            if let Some(patch) = jitter
                .apply(roi, &mut self.rng)
                .and_then(|rect| labeled.image.crop(rect))
            {
                return Ok(patch);
            }
        }
        labeled.image.crop(roi).ok_or_else(|| {
            CascadeError::Dataset(format!(
                "region {roi:?} of image {img_idx} lies outside its {}x{} image",
                labeled.image.width(),
                labeled.image.height()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn jitter_stays_close_to_roi() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4);
        let roi = Rect::new(100, 100, 40, 80);
        let jitter = RoiJitter::default();
        for _ in 0..200 {
            let r = jitter.apply(roi, &mut rng).unwrap();
            assert!(r.h >= 74 && r.h <= 86, "height {}", r.h);
            assert!((r.w as f32 / r.h as f32 - 0.5).abs() < 0.02);
            assert!(r.iou(&roi) > 0.6);
        }
    }

    #[test]
    fn zero_jitter_is_identity() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let roi = Rect::new(3, 5, 10, 12);
        let none = RoiJitter {
            translate: 0.0,
            scale: 0.0,
        };
        assert_eq!(none.apply(roi, &mut rng), Some(roi));
    }

    #[test]
    fn regions_enumerated_across_images() {
        let images = vec![
            LabeledImage::new(
                GrayImageU8::filled(20, 20, 1),
                vec![Rect::new(0, 0, 5, 5), Rect::new(10, 10, 4, 6)],
            ),
            LabeledImage::new(GrayImageU8::filled(20, 20, 2), vec![]),
            LabeledImage::new(GrayImageU8::filled(20, 20, 3), vec![Rect::new(1, 1, 8, 8)]),
        ];
        let mut src =
            PositiveSamples::new(&images, 1.0, None, Xoshiro256PlusPlus::seed_from_u64(1));
        assert_eq!(src.len(), 3);
        let p = src.patch(1).unwrap();
        assert_eq!((p.width(), p.height()), (6, 6));
        assert_eq!(src.patch(2).unwrap().pixel(0, 0), 3);
        assert!(src.patch(3).is_err());
    }

    #[test]
    fn region_outside_image_is_an_error() {
        let images = vec![LabeledImage::new(
            GrayImageU8::filled(8, 8, 0),
            vec![Rect::new(4, 4, 8, 8)],
        )];
        let mut src = PositiveSamples::new(
            &images,
            1.0,
            Some(RoiJitter::default()),
            Xoshiro256PlusPlus::seed_from_u64(1),
        );
        assert!(matches!(src.patch(0), Err(CascadeError::Dataset(_))));
    }

    #[test]
    fn regions_take_window_ratio() {
        assert_eq!(fit_ratio(Rect::new(30, 10, 20, 40), 1.0), Some(Rect::new(20, 10, 40, 40)));
        assert_eq!(fit_ratio(Rect::new(30, 10, 40, 40), 0.5), Some(Rect::new(40, 10, 20, 40)));
        assert_eq!(fit_ratio(Rect::new(2, 0, 4, 20), 1.0), None);
        assert_eq!(fit_ratio(Rect::new(2, 0, 4, 1), 0.5), None);

        let mut image = GrayImageU8::filled(100, 100, 0);
        image.set(20, 10, 200);
        let images = vec![LabeledImage::new(image, vec![Rect::new(30, 10, 20, 40)])];
        let mut src =
            PositiveSamples::new(&images, 1.0, None, Xoshiro256PlusPlus::seed_from_u64(2));
        let p = src.patch(0).unwrap();
        assert_eq!((p.width(), p.height()), (40, 40));
        assert_eq!(p.pixel(0, 0), 200);
    }

    #[test]
    fn region_widened_past_left_edge_is_an_error() {
        let images = vec![LabeledImage::new(
            GrayImageU8::filled(50, 50, 0),
            vec![Rect::new(2, 0, 4, 20)],
        )];
        let mut src =
            PositiveSamples::new(&images, 1.0, None, Xoshiro256PlusPlus::seed_from_u64(3));
        assert!(matches!(src.patch(0), Err(CascadeError::Dataset(_))));
    }
}
