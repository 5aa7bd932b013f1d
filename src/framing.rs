// Owns the framing rectangle, the way the camera/session manager does
// in the full scanner. The overlay never computes this itself; it asks
// on every pass and simply skips drawing while the answer is None.

use crate::types::Rect;

/// Smallest frame side we will offer, in pixels.
const MIN_FRAME_SIDE: i32 = 240;
/// Largest frame side, so huge surfaces keep a scannable density.
const MAX_FRAME_SIDE: i32 = 675;

pub struct FramingSource {
    surface: Option<(usize, usize)>,
}

impl FramingSource {
    /// No rect is available until the surface size is reported.
    pub fn new() -> Self {
        Self { surface: None }
    }

    /// Report the drawable surface size. Zero-sized surfaces are
    /// treated as unknown.
    pub fn set_surface_size(&mut self, width: usize, height: usize) {
        if width == 0 || height == 0 {
            self.surface = None;
        } else {
            self.surface = Some((width, height));
        }
    }

    /// The centered square region the preview treats as the scan
    /// target: 5/8 of the smaller surface side, clamped to
    /// [MIN_FRAME_SIDE, MAX_FRAME_SIDE], never more than 7/8 of the
    /// smaller side so it always fits with a visible mask around it.
    pub fn framing_rect(&self) -> Option<Rect> {
        let (w, h) = self.surface?;
        let (w, h) = (w as i32, h as i32);
        let short = w.min(h);

        let side = (short * 5 / 8)
            .clamp(MIN_FRAME_SIDE, MAX_FRAME_SIDE)
            .min(short * 7 / 8);

        let left = (w - side) / 2;
        let top = (h - side) / 2;
        Some(Rect::new(left, top, left + side, top + side))
    }
}

impl Default for FramingSource {
    fn default() -> Self {
        Self::new()
    }
}
