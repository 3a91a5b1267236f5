use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle, top-left anchored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Self { x, y, w, h }
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.w * self.h
    }

    #[inline]
    pub fn right(&self) -> usize {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> usize {
        self.y + self.h
    }

    pub fn intersection_area(&self, other: &Rect) -> usize {
        let iw = self
            .right()
            .min(other.right())
            .saturating_sub(self.x.max(other.x));
        let ih = self
            .bottom()
            .min(other.bottom())
            .saturating_sub(self.y.max(other.y));
        iw * ih
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection_area(other) > 0
    }

    /// Intersection over union in `[0, 1]`; zero for two empty boxes.
    pub fn iou(&self, other: &Rect) -> f32 {
        let inter = self.intersection_area(other);
        let union = self.area() + other.area() - inter;
        if union == 0 {
            return 0.0;
        }
        inter as f32 / union as f32
    }

    /// True when the rectangle lies fully inside a `width x height` image.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.right() <= width && self.bottom() <= height
    }
}

/// A window that survived every stage of the cascade.
///
/// Detections are reported as-is: overlapping windows from neighbouring
/// positions or scales are not merged.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub rect: Rect,
    /// Sum of the leaf values of every tree in the cascade.
    pub confidence: f32,
}
