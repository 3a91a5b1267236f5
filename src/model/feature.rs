use crate::error::{CascadeError, Result};
use crate::image::ImageView;
use serde::{Deserialize, Serialize};

/// Largest magnitude drawn for a random feature offset.
pub const MAX_OFFSET: i8 = 127;

/// Fixed-point denominator of the feature offsets.
const OFFSET_SCALE: i64 = 256;

/// Binary pixel-comparison test.
///
/// Each endpoint is stored as a signed offset from the patch centre in units
/// of 1/256 of the patch height (rows) or width (columns), so a single feature
/// applies to patches of any size. The test answers `patch[A] <= patch[B]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Feature {
    pub row_a: i8,
    pub col_a: i8,
    pub row_b: i8,
    pub col_b: i8,
}

/// Map a fixed-point offset to an absolute coordinate along a dimension of
/// length `dim`, truncating towards zero.
#[inline]
pub fn resolve_offset(offset: i8, dim: usize) -> i64 {
    let dim = dim as i64;
    ((dim / 2) * OFFSET_SCALE + i64::from(offset) * dim) / OFFSET_SCALE
}

/// Reject patches the feature arithmetic cannot address.
///
/// With truncating division every `i8` offset resolves inside `[0, dim)` once
/// `dim >= 1`, so a non-empty patch is the whole contract.
pub fn check_patch_dims(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(CascadeError::PatchTooSmall { width, height });
    }
    Ok(())
}

impl Feature {
    pub const fn new(row_a: i8, col_a: i8, row_b: i8, col_b: i8) -> Self {
        Self {
            row_a,
            col_a,
            row_b,
            col_b,
        }
    }

    /// Absolute `(row, col)` pairs of both endpoints for a `width x height` patch.
    #[inline]
    pub fn points(&self, width: usize, height: usize) -> [(i64, i64); 2] {
        [
            (
                resolve_offset(self.row_a, height),
                resolve_offset(self.col_a, width),
            ),
            (
                resolve_offset(self.row_b, height),
                resolve_offset(self.col_b, width),
            ),
        ]
    }

    /// Checked evaluation; fails instead of reading outside the patch.
    pub fn try_evaluate<I>(&self, patch: &I) -> Result<bool>
    where
        I: ImageView<Pixel = u8> + ?Sized,
    {
        let (width, height) = (patch.width(), patch.height());
        let mut values = [0u8; 2];
        for (value, (row, col)) in values.iter_mut().zip(self.points(width, height)) {
            if row < 0 || col < 0 || row as usize >= height || col as usize >= width {
                return Err(CascadeError::FeatureOutOfBounds {
                    row,
                    col,
                    width,
                    height,
                });
            }
            *value = patch.pixel(row as usize, col as usize);
        }
        Ok(values[0] <= values[1])
    }

    /// Unchecked hot-path evaluation. Callers validate the patch with
    /// [`check_patch_dims`] once at their entry point.
    #[inline]
    pub fn evaluate<I>(&self, patch: &I) -> bool
    where
        I: ImageView<Pixel = u8> + ?Sized,
    {
        let [(ra, ca), (rb, cb)] = self.points(patch.width(), patch.height());
        debug_assert!(ra >= 0 && ca >= 0 && rb >= 0 && cb >= 0);
        patch.pixel(ra as usize, ca as usize) <= patch.pixel(rb as usize, cb as usize)
    }
}
