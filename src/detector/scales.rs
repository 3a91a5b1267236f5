use super::params::DetectorParams;

/// Window geometry at one scale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowScale {
    pub width: usize,
    pub height: usize,
    pub step: usize,
}

/// Window heights from `min_size` up to `min(width, height)`.
///
/// Heights grow by `floor(s * scale_increase)` and by at least one pixel, so
/// the schedule always terminates.
pub struct ScaleSchedule {
    next: usize,
    limit: usize,
    wh_ratio: f32,
    params: DetectorParams,
}

impl ScaleSchedule {
    pub fn new(params: DetectorParams, wh_ratio: f32, width: usize, height: usize) -> Self {
        Self {
            next: params.min_size,
            limit: width.min(height),
            wh_ratio,
            params,
        }
    }
}

impl Iterator for ScaleSchedule {
    type Item = WindowScale;

    fn next(&mut self) -> Option<WindowScale> {
        let s = self.next;
        if s == 0 || s > self.limit {
            return None;
        }
        let grown = (s as f32 * self.params.scale_increase).floor() as usize;
        self.next = grown.max(s + 1);
        Some(WindowScale {
            width: (s as f32 * self.wh_ratio).floor() as usize,
            height: s,
            step: ((self.params.step_scale * s as f32).floor() as usize).max(1),
        })
    }
}
