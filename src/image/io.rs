//! I/O helpers for grayscale images and JSON.
//!
//! - `load_grayscale_image`: read a PNG/JPEG/BMP into an owned 8-bit gray buffer.
//! - `save_grayscale_u8`: write an owned 8-bit gray buffer to a PNG.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::{ImageU8, ImageView};
use crate::types::Rect;
use image::{GrayImage, ImageBuffer};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Owned 8-bit grayscale buffer with stride and borrowed view conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImageU8 {
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<u8>,
}

impl GrayImageU8 {
    /// Construct an owned grayscale buffer given raw, tightly packed bytes.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Self {
        debug_assert!(data.len() >= width * height);
        Self {
            width,
            height,
            stride: width,
            data,
        }
    }

    /// Buffer of `width x height` pixels all set to `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self::new(width, height, vec![value; width * height])
    }

    /// Copy a (possibly strided) view into a tightly packed buffer.
    pub fn from_view(view: &ImageU8<'_>) -> Self {
        let mut data = Vec::with_capacity(view.w * view.h);
        for row in view.rows() {
            data.extend_from_slice(row);
        }
        Self::new(view.w, view.h, data)
    }

    /// Borrow as a read-only `ImageU8` view
    pub fn as_view(&self) -> ImageU8<'_> {
        ImageU8 {
            w: self.width,
            h: self.height,
            stride: self.stride,
            data: &self.data,
        }
    }

    /// Owned copy of `rect`, or `None` when it leaves the image.
    pub fn crop(&self, rect: Rect) -> Option<GrayImageU8> {
        self.as_view()
            .sub_view(rect)
            .map(|view| Self::from_view(&view))
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.stride + x] = value;
    }

    /// One-pixel outline of `rect`, clipped to the image.
    pub fn draw_rect(&mut self, rect: Rect, value: u8) {
        if rect.w == 0 || rect.h == 0 || rect.x >= self.width || rect.y >= self.height {
            return;
        }
        let right = rect.right().min(self.width) - 1;
        let bottom = rect.bottom().min(self.height) - 1;
        for x in rect.x..=right {
            self.set(x, rect.y, value);
            self.set(x, bottom, value);
        }
        for y in rect.y..=bottom {
            self.set(rect.x, y, value);
            self.set(right, y, value);
        }
    }
}

impl ImageView for GrayImageU8 {
    type Pixel = u8;

    #[inline]
    fn width(&self) -> usize {
        self.width
    }
    #[inline]
    fn height(&self) -> usize {
        self.height
    }
    #[inline]
    fn stride(&self) -> usize {
        self.stride
    }
    #[inline]
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }
}

/// Load an image from disk and convert to 8-bit grayscale.
pub fn load_grayscale_image(path: &Path) -> Result<GrayImageU8, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img.into_raw();
    Ok(GrayImageU8::new(width, height, data))
}

/// Write an owned 8-bit gray buffer to disk; the format follows the extension.
pub fn save_grayscale_u8(buffer: &GrayImageU8, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut data = Vec::with_capacity(buffer.width * buffer.height);
    for row in buffer.rows() {
        data.extend_from_slice(row);
    }
    let image: GrayImage = ImageBuffer::from_raw(buffer.width as u32, buffer.height as u32, data)
        .ok_or_else(|| "Failed to create image buffer".to_string())?;
    image
        .save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
