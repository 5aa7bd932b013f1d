// Window + software drawing utilities.
// Everything the viewfinder paints goes through here:
// 1) A window that presents the composed preview.
// 2) Alpha-blended rects and discs for the mask, border and point markers.
// 3) A tiny scalable 5x7 bitmap font for the caption and HUD text.

use crate::error::Error;
use crate::types::FrameBuffer;
use image::RgbaImage;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

pub struct Drawer {
    window: Window, // the on-screen window you see
}

impl Drawer {
    /// Create a window sized to the scan surface.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self { window })
    }

    /// Push the pixels for this tick to the screen.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Freeze the current frame region as the decode result.
    pub fn d_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::D, KeyRepeat::No)
    }

    /// Start a new scan session (back to the live view).
    pub fn n_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::N, KeyRepeat::No)
    }
}

/* ---------- Software drawing: blending, rects, discs, bitmap font ---------- */

/// Write an opaque pixel if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    fb.pixels[y * fb.width + x] = color & 0x00FF_FFFF;
}

/// Blend a 0xAARRGGBB color over the pixel at (x,y).
/// Visual: alpha 0x60 dims the pixel, 0xFF replaces it outright.
#[inline]
fn blend_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    let a = color >> 24;
    if a == 0 {
        return;
    }
    if a == 0xFF {
        put_pixel(fb, x, y, color);
        return;
    }
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }

    let idx = y * fb.width + x;
    let dst = fb.pixels[idx];
    let inv = 255 - a;

    let sr = (color >> 16) & 0xFF;
    let sg = (color >> 8) & 0xFF;
    let sb = color & 0xFF;
    let dr = (dst >> 16) & 0xFF;
    let dg = (dst >> 8) & 0xFF;
    let db = dst & 0xFF;

    // Integer "source over" per channel, rounded
    let r = (sr * a + dr * inv + 127) / 255;
    let g = (sg * a + dg * inv + 127) / 255;
    let b = (sb * a + db * inv + 127) / 255;

    fb.pixels[idx] = (r << 16) | (g << 8) | b;
}

/// Fill the half-open rect [left, right) x [top, bottom), blending with
/// the color's alpha. Out-of-bounds parts are clipped away.
pub fn fill_rect(fb: &mut FrameBuffer, left: i32, top: i32, right: i32, bottom: i32, color: u32) {
    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = right.min(fb.width as i32);
    let y1 = bottom.min(fb.height as i32);
    for y in y0..y1 {
        for x in x0..x1 {
            blend_pixel(fb, x, y, color);
        }
    }
}

/// Fill a disc of the given radius centered at (cx,cy), blending with
/// the color's alpha. Scans just the bounding box.
pub fn fill_disc(fb: &mut FrameBuffer, cx: i32, cy: i32, radius: i32, color: u32) {
    if radius <= 0 {
        return;
    }
    let r2 = radius * radius;
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            let dx = x - cx;
            let dy = y - cy;
            if dx * dx + dy * dy <= r2 {
                blend_pixel(fb, x, y, color);
            }
        }
    }
}

/// Copy a result image onto the buffer at (dst_x, dst_y), opaquely,
/// clipped to the buffer. The image's own alpha is ignored.
pub fn blit_rgba(fb: &mut FrameBuffer, image: &RgbaImage, dst_x: i32, dst_y: i32) {
    for (px, py, pixel) in image.enumerate_pixels() {
        let x = dst_x + px as i32;
        let y = dst_y + py as i32;
        let r = pixel[0] as u32;
        let g = pixel[1] as u32;
        let b = pixel[2] as u32;
        put_pixel(fb, x, y, (r << 16) | (g << 8) | b);
    }
}

/// Same color with its alpha halved, for the faded point generation.
pub fn half_alpha(color: u32) -> u32 {
    ((color >> 24) / 2) << 24 | (color & 0x00FF_FFFF)
}

/* ---------- 5x7 bitmap font (A-Z, digits, a little punctuation) ---------- */

/// Return a 5x7 glyph bitmap. Each u8 is a row; the low 5 bits are the
/// pixels (bit 4 = leftmost). Unknown characters return None and render
/// as a blank cell.
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01110),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b01110,0b00000,0b00000,0b00000),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y), each font pixel scaled to a
/// scale-by-scale block, with a black shadow for contrast over video.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32, scale: i32) {
    if let Some(rows) = glyph5x7(ch) {
        // Shadow pass: offset by one scaled pixel
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5i32 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    let bx = x + (rx + 1) * scale;
                    let by = y + (ry as i32 + 1) * scale;
                    fill_rect(fb, bx, by, bx + scale, by + scale, 0xFF00_0000);
                }
            }
        }

        // Foreground pass: actual glyph in the chosen color
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5i32 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    let bx = x + rx * scale;
                    let by = y + ry as i32 * scale;
                    fill_rect(fb, bx, by, bx + scale, by + scale, color);
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs; each glyph advances 6 scaled
/// pixels (5 glyph + 1 spacing). Lowercase is drawn as uppercase.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32, scale: i32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch.to_ascii_uppercase(), color, scale);
        x += 6 * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_pixel_mixes_by_alpha() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.pixels[0] = 0x00FF_FFFF;
        fb.pixels[1] = 0x00FF_FFFF;

        // 0x60 black over white: channels drop to about 255 * (159/255)
        blend_pixel(&mut fb, 0, 0, 0x6000_0000);
        let r = (fb.pixels[0] >> 16) & 0xFF;
        assert!(r > 150 && r < 170, "got {r:#x}");

        // Full alpha replaces outright
        blend_pixel(&mut fb, 1, 0, 0xFF12_3456);
        assert_eq!(fb.pixels[1], 0x0012_3456);
    }

    #[test]
    fn test_fill_rect_clips_to_buffer() {
        let mut fb = FrameBuffer::new(4, 4);
        fill_rect(&mut fb, -10, -10, 100, 2, 0xFFAB_CDEF);
        // Rows 0..2 filled, rows 2..4 untouched
        assert_eq!(fb.pixels[0], 0x00AB_CDEF);
        assert_eq!(fb.pixels[4 * 2], 0);
    }

    #[test]
    fn test_fill_rect_is_half_open() {
        let mut fb = FrameBuffer::new(4, 4);
        fill_rect(&mut fb, 1, 1, 3, 3, 0xFFFF_FFFF);
        assert_eq!(fb.pixels[4 + 1], 0x00FF_FFFF);
        assert_eq!(fb.pixels[2 * 4 + 2], 0x00FF_FFFF);
        assert_eq!(fb.pixels[3 * 4 + 3], 0); // right/bottom edge excluded
    }

    #[test]
    fn test_fill_disc_stays_within_radius() {
        let mut fb = FrameBuffer::new(11, 11);
        fill_disc(&mut fb, 5, 5, 3, 0xFFFF_FFFF);
        assert_eq!(fb.pixels[5 * 11 + 5], 0x00FF_FFFF); // center
        assert_eq!(fb.pixels[5 * 11 + 8], 0x00FF_FFFF); // on the radius
        assert_eq!(fb.pixels[0], 0); // corner untouched
        // Off-screen center must not panic
        fill_disc(&mut fb, -20, -20, 3, 0xFFFF_FFFF);
    }

    #[test]
    fn test_blit_rgba_clips_and_ignores_alpha() {
        let mut fb = FrameBuffer::new(3, 3);
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([0x11, 0x22, 0x33, 0x00]));
        blit_rgba(&mut fb, &img, 2, 2);
        assert_eq!(fb.pixels[2 * 3 + 2], 0x0011_2233); // the one in-bounds pixel
        assert_eq!(fb.pixels[0], 0);
    }

    #[test]
    fn test_half_alpha() {
        assert_eq!(half_alpha(0xC0FF_FF00), 0x60FF_FF00);
        assert_eq!(half_alpha(0xFF12_3456), 0x7F12_3456);
    }

    #[test]
    fn test_text_draws_known_glyphs_and_skips_unknown() {
        let mut fb = FrameBuffer::new(40, 10);
        draw_text_5x7(&mut fb, 0, 0, "A", 0xFFFF_FFFF, 1);
        // 'A' row 0 is 01110: pixel (1,0) set, (0,0) clear
        assert_eq!(fb.pixels[1], 0x00FF_FFFF);
        assert_eq!(fb.pixels[0], 0);

        let before = fb.pixels.clone();
        draw_text_5x7(&mut fb, 12, 0, "~", 0xFFFF_FFFF, 1);
        assert_eq!(fb.pixels, before); // unknown glyph renders nothing
    }

    #[test]
    fn test_text_scale_doubles_advance() {
        let mut fb = FrameBuffer::new(40, 20);
        draw_text_5x7(&mut fb, 0, 0, " I", 0xFFFF_FFFF, 2);
        // Second glyph cell starts at x = 12; 'I' row 0 is 01110, so
        // its second scaled column (x = 14..16) is lit.
        assert_eq!(fb.pixels[14], 0x00FF_FFFF);
        assert_eq!(fb.pixels[12], 0); // leftmost font column of 'I' is clear
    }
}
