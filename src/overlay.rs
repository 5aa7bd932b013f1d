// The viewfinder overlay painted on top of the camera preview.
// What you see each pass: the exterior dimmed, four corner marks, a
// scan line sweeping down the frame, a caption under the frame, and
// the decoder's candidate points flashing inside it. Once a result is
// frozen, the live region is replaced by the result image until a new
// scan session starts.

use std::time::Duration;

use image::RgbaImage;
use tracing::info;

use crate::draw;
use crate::theme::Theme;
use crate::types::{FrameBuffer, Rect, ResultPoint};

/// How long until the next self-scheduled repaint while scanning.
const ANIMATION_DELAY: Duration = Duration::from_millis(100);
/// How far the scan line moves per repaint.
const SCAN_STEP: i32 = 5;
/// Thickness of the scan line.
const SCAN_LINE_WIDTH: i32 = 6;
/// Gap between the scan line and the frame's left/right edges.
const SCAN_LINE_PADDING: i32 = 5;
/// Corner marks are CORNER_LONG along the edge, CORNER_SHORT across it.
const CORNER_LONG: i32 = 50;
const CORNER_SHORT: i32 = 15;
/// Caption baseline offset below the frame.
const CAPTION_PADDING: i32 = 30;
const CAPTION_SCALE: i32 = 2;
/// Candidate markers: current generation, then one faded echo.
const POINT_RADIUS: i32 = 6;
const FADED_POINT_RADIUS: i32 = 3;

/// A repaint request queued for the host pipeline. `area` of None
/// means the whole surface; a delay of zero means "as soon as you can".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Redraw {
    pub area: Option<Rect>,
    pub delay: Duration,
}

impl Redraw {
    fn now() -> Self {
        Self {
            area: None,
            delay: Duration::ZERO,
        }
    }
}

pub struct ViewfinderOverlay {
    theme: Theme,
    caption: String,
    /// Some = result-shown mode, None = live scanning.
    result_image: Option<RgbaImage>,
    /// Scan line position; pinned to the frame top on the first pass
    /// that actually sees a frame.
    scan_y: Option<i32>,
    /// Candidate points, current generation. Cleared into `last_points`
    /// by the live render pass.
    points: Vec<ResultPoint>,
    last_points: Option<Vec<ResultPoint>>,
    /// Repaint requests not yet drained by the host.
    pending: Vec<Redraw>,
}

impl ViewfinderOverlay {
    pub fn new(theme: Theme, caption: impl Into<String>) -> Self {
        Self {
            theme,
            caption: caption.into(),
            result_image: None,
            scan_y: None,
            points: Vec::new(),
            last_points: None,
            // The host has nothing on screen yet; ask for a first paint.
            pending: vec![Redraw::now()],
        }
    }

    /// True while no result image is being shown.
    pub fn is_live(&self) -> bool {
        self.result_image.is_none()
    }

    /// Hand the queued repaint requests to the host pipeline.
    pub fn take_redraws(&mut self) -> Vec<Redraw> {
        std::mem::take(&mut self.pending)
    }

    /// Clear any frozen result and go back to live scanning.
    pub fn show_live_view(&mut self) {
        info!("live view resumed");
        self.result_image = None;
        self.pending.push(Redraw::now());
    }

    /// Freeze a decoded result image over the live region.
    pub fn show_result(&mut self, image: RgbaImage) {
        info!(width = image.width(), height = image.height(), "result image frozen");
        self.result_image = Some(image);
        self.pending.push(Redraw::now());
    }

    /// Record a candidate feature point, relative to the frame's
    /// top-left. Duplicate coordinates are ignored.
    pub fn add_possible_result_point(&mut self, point: ResultPoint) {
        if !self.points.iter().any(|p| *p == point) {
            self.points.push(point);
        }
    }

    /// Paint one pass. With no framing rect there is nothing to aim
    /// at, so the pass is skipped entirely: no pixels, no reschedule.
    pub fn render(&mut self, fb: &mut FrameBuffer, frame: Option<Rect>) {
        let Some(frame) = frame else { return };

        self.draw_corners(fb, frame);
        self.draw_scan_line(fb, frame);

        draw::draw_text_5x7(
            fb,
            frame.left,
            frame.bottom + CAPTION_PADDING,
            &self.caption,
            self.theme.caption,
            CAPTION_SCALE,
        );

        // Darken everything outside the framing rect. A frozen result
        // gets the heavier dim so it reads as "done".
        let mask = if self.result_image.is_some() {
            self.theme.result_mask
        } else {
            self.theme.mask
        };
        let w = fb.width as i32;
        let h = fb.height as i32;
        draw::fill_rect(fb, 0, 0, w, frame.top, mask);
        draw::fill_rect(fb, 0, frame.top, frame.left, frame.bottom + 1, mask);
        draw::fill_rect(fb, frame.right + 1, frame.top, w, frame.bottom + 1, mask);
        draw::fill_rect(fb, 0, frame.bottom + 1, w, h, mask);

        if let Some(image) = &self.result_image {
            // Result mode: the frozen image replaces the live region.
            draw::blit_rgba(fb, image, frame.left, frame.top);
        } else {
            self.draw_border(fb, frame);
            self.draw_points(fb, frame);

            // Keep the animation running while scanning. The request
            // covers just the frame box, like the original invalidate.
            self.pending.push(Redraw {
                area: Some(frame),
                delay: ANIMATION_DELAY,
            });
        }
    }

    /// Four L-shaped corner marks, two rects each.
    fn draw_corners(&self, fb: &mut FrameBuffer, f: Rect) {
        let c = self.theme.corner;
        draw::fill_rect(fb, f.left, f.top, f.left + CORNER_LONG, f.top + CORNER_SHORT, c);
        draw::fill_rect(fb, f.left, f.top, f.left + CORNER_SHORT, f.top + CORNER_LONG, c);
        draw::fill_rect(fb, f.right - CORNER_LONG, f.top, f.right, f.top + CORNER_SHORT, c);
        draw::fill_rect(fb, f.right - CORNER_SHORT, f.top, f.right, f.top + CORNER_LONG, c);
        draw::fill_rect(fb, f.left, f.bottom - CORNER_SHORT, f.left + CORNER_LONG, f.bottom, c);
        draw::fill_rect(fb, f.left, f.bottom - CORNER_LONG, f.left + CORNER_SHORT, f.bottom, c);
        draw::fill_rect(fb, f.right - CORNER_LONG, f.bottom - CORNER_SHORT, f.right, f.bottom, c);
        draw::fill_rect(fb, f.right - CORNER_SHORT, f.bottom - CORNER_LONG, f.right, f.bottom, c);
    }

    /// Advance the scan line by one step, wrapping back to the top
    /// edge when it passes the bottom, and draw it.
    fn draw_scan_line(&mut self, fb: &mut FrameBuffer, frame: Rect) {
        let previous = self.scan_y.unwrap_or(frame.top);
        let mut y = previous + SCAN_STEP;
        if y >= frame.bottom {
            y = frame.top;
        }
        self.scan_y = Some(y);

        draw::fill_rect(
            fb,
            frame.left + SCAN_LINE_PADDING,
            y - SCAN_LINE_WIDTH / 2,
            frame.right - SCAN_LINE_PADDING,
            y + SCAN_LINE_WIDTH / 2,
            self.theme.scan_line,
        );
    }

    /// Thin border just inside the frame, live mode only.
    fn draw_border(&self, fb: &mut FrameBuffer, f: Rect) {
        let c = self.theme.border;
        draw::fill_rect(fb, f.left, f.top, f.right + 1, f.top + 2, c);
        draw::fill_rect(fb, f.left, f.top + 2, f.left + 2, f.bottom - 1, c);
        draw::fill_rect(fb, f.right - 1, f.top, f.right + 1, f.bottom - 1, c);
        draw::fill_rect(fb, f.left, f.bottom - 1, f.right + 1, f.bottom + 1, c);
    }

    /// Rotate the point generations and draw both: the fresh batch at
    /// full size, the previous batch smaller and fainter, after which
    /// it is gone for good.
    fn draw_points(&mut self, fb: &mut FrameBuffer, frame: Rect) {
        let current = std::mem::take(&mut self.points);
        let last = self.last_points.take();

        if !current.is_empty() {
            for p in &current {
                draw::fill_disc(
                    fb,
                    frame.left + p.x as i32,
                    frame.top + p.y as i32,
                    POINT_RADIUS,
                    self.theme.point,
                );
            }
            self.last_points = Some(current);
        }

        if let Some(last) = &last {
            let faded = draw::half_alpha(self.theme.point);
            for p in last {
                draw::fill_disc(
                    fb,
                    frame.left + p.x as i32,
                    frame.top + p.y as i32,
                    FADED_POINT_RADIUS,
                    faded,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: u32 = 0x00FF_FFFF;

    fn white_fb() -> FrameBuffer {
        let mut fb = FrameBuffer::new(200, 200);
        fb.pixels.fill(WHITE);
        fb
    }

    fn frame() -> Rect {
        Rect::new(50, 50, 150, 150)
    }

    fn overlay() -> ViewfinderOverlay {
        let mut overlay = ViewfinderOverlay::new(Theme::default(), "SCAN");
        overlay.take_redraws(); // drop the initial paint request
        overlay
    }

    fn pixel(fb: &FrameBuffer, x: usize, y: usize) -> u32 {
        fb.pixels[y * fb.width + x]
    }

    #[test]
    fn test_render_without_frame_has_no_side_effects() {
        let mut fb = white_fb();
        let mut overlay = overlay();

        overlay.render(&mut fb, None);

        assert!(fb.pixels.iter().all(|&p| p == WHITE));
        assert!(overlay.take_redraws().is_empty());
        assert_eq!(overlay.scan_y, None);
    }

    #[test]
    fn test_scan_line_advances_then_wraps_to_top() {
        let mut overlay = overlay();
        let f = frame();

        overlay.render(&mut white_fb(), Some(f));
        assert_eq!(overlay.scan_y, Some(f.top + SCAN_STEP));

        // The line itself is on screen at the new position
        let mut fb = white_fb();
        overlay.render(&mut fb, Some(f));
        let y = overlay.scan_y.unwrap() as usize;
        assert_eq!(pixel(&fb, 100, y), 0x0000_C853);

        // Monotonic until the bottom edge, then back to the top
        let mut previous = overlay.scan_y.unwrap();
        loop {
            overlay.render(&mut white_fb(), Some(f));
            let y = overlay.scan_y.unwrap();
            if y == f.top {
                break; // wrapped
            }
            assert!(y > previous, "scan line went backwards before wrapping");
            assert!(y < f.bottom);
            previous = y;
        }
    }

    #[test]
    fn test_exterior_mask_dims_outside_the_frame_only() {
        let mut fb = white_fb();
        let mut overlay = overlay();
        overlay.render(&mut fb, Some(frame()));

        // Outside: white dimmed by the 0x60 mask
        assert_eq!(pixel(&fb, 10, 10), 0x009F_9F9F);
        // Inside, away from line/corners/border: untouched
        assert_eq!(pixel(&fb, 80, 80), WHITE);
    }

    #[test]
    fn test_show_result_freezes_image_and_show_live_reverts() {
        let mut overlay = overlay();
        let f = frame();

        let img = RgbaImage::from_pixel(
            f.width() as u32,
            f.height() as u32,
            image::Rgba([0x09, 0x08, 0x07, 0xFF]),
        );
        overlay.show_result(img);
        assert!(!overlay.is_live());
        assert_eq!(
            overlay.take_redraws(),
            vec![Redraw { area: None, delay: Duration::ZERO }]
        );

        let mut fb = white_fb();
        overlay.render(&mut fb, Some(f));
        // The live region shows the frozen image
        assert_eq!(pixel(&fb, 80, 80), 0x0009_0807);
        // Exterior uses the heavier result mask (0xB0 over white)
        assert_eq!(pixel(&fb, 10, 10), 0x004F_4F4F);
        // No animation reschedule while a result is shown
        assert!(overlay.take_redraws().is_empty());

        overlay.show_live_view();
        assert!(overlay.is_live());
        assert_eq!(
            overlay.take_redraws(),
            vec![Redraw { area: None, delay: Duration::ZERO }]
        );

        let mut fb = white_fb();
        overlay.render(&mut fb, Some(f));
        assert_eq!(pixel(&fb, 80, 80), WHITE); // live again
    }

    #[test]
    fn test_point_fades_over_two_passes_then_disappears() {
        let mut overlay = overlay();
        let f = frame();
        // (30, 30) relative to the frame lands at surface (80, 80)
        overlay.add_possible_result_point(ResultPoint::new(30.0, 30.0));

        // Pass 1: full-size marker (0xC0 yellow over white)
        let mut fb = white_fb();
        overlay.render(&mut fb, Some(f));
        assert_eq!(pixel(&fb, 80, 80), 0x00FF_FF3F);
        assert_eq!(pixel(&fb, 85, 80), 0x00FF_FF3F); // radius 6 reaches here

        // Pass 2: smaller, fainter echo
        let mut fb = white_fb();
        overlay.render(&mut fb, Some(f));
        assert_eq!(pixel(&fb, 80, 80), 0x00FF_FF9F);
        assert_eq!(pixel(&fb, 85, 80), WHITE); // outside the faded radius

        // Pass 3: gone
        let mut fb = white_fb();
        overlay.render(&mut fb, Some(f));
        assert_eq!(pixel(&fb, 80, 80), WHITE);
    }

    #[test]
    fn test_duplicate_points_are_ignored() {
        let mut overlay = overlay();
        overlay.add_possible_result_point(ResultPoint::new(10.0, 10.0));
        overlay.add_possible_result_point(ResultPoint::new(10.0, 10.0));
        overlay.add_possible_result_point(ResultPoint::new(11.0, 10.0));
        assert_eq!(overlay.points.len(), 2);
    }

    #[test]
    fn test_live_render_schedules_frame_area_repaint() {
        let mut overlay = overlay();
        let f = frame();
        overlay.render(&mut white_fb(), Some(f));

        assert_eq!(
            overlay.take_redraws(),
            vec![Redraw { area: Some(f), delay: ANIMATION_DELAY }]
        );
    }

    #[test]
    fn test_new_overlay_requests_an_initial_paint() {
        let mut overlay = ViewfinderOverlay::new(Theme::default(), "SCAN");
        assert_eq!(
            overlay.take_redraws(),
            vec![Redraw { area: None, delay: Duration::ZERO }]
        );
        assert!(overlay.take_redraws().is_empty());
    }
}
