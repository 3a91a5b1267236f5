use crate::types::Rect;

/// Borrowed 8-bit grayscale view with an explicit row stride.
#[derive(Clone, Copy, Debug)]
pub struct ImageU8<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize, // bytes between rows
    pub data: &'a [u8],
}

impl<'a> ImageU8<'a> {
    /// Tightly packed view over `data`; `None` when the buffer is too short.
    pub fn from_slice(w: usize, h: usize, data: &'a [u8]) -> Option<Self> {
        (data.len() >= w * h).then_some(Self {
            w,
            h,
            stride: w,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Zero-copy window into this view. Returns `None` when `rect` leaves the image.
    pub fn sub_view(&self, rect: Rect) -> Option<ImageU8<'a>> {
        if !rect.fits_within(self.w, self.h) {
            return None;
        }
        if rect.w == 0 || rect.h == 0 {
            return Some(ImageU8 {
                w: rect.w,
                h: rect.h,
                stride: self.stride,
                data: &[],
            });
        }
        let start = rect.y * self.stride + rect.x;
        let end = (rect.bottom() - 1) * self.stride + rect.right();
        Some(ImageU8 {
            w: rect.w,
            h: rect.h,
            stride: self.stride,
            data: &self.data[start..end],
        })
    }
}

impl<'a> crate::image::traits::ImageView for ImageU8<'a> {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.w]
    }
}
