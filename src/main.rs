// What you SEE when you run this:
// • A simulated camera preview with the scan frame centered on it.
// • Corner marks, a scan line sweeping the frame, a caption below it,
//   and yellow candidate points flashing while "decoding" runs.
// • D freezes the frame region as the decode result; N starts a new
//   scan session. ESC quits.

mod draw;
mod error;
mod framing;
mod overlay;
mod sim;
mod theme;
mod types;

use std::time::{Duration, Instant};

use clap::Parser;
use image::RgbaImage;
use tracing::{debug, info};

use draw::Drawer;
use error::Error;
use framing::FramingSource;
use overlay::ViewfinderOverlay;
use sim::{CandidateFeed, Preview};
use theme::Theme;
use types::{FrameBuffer, Rect};

#[derive(Parser)]
#[command(name = "viewfinder")]
#[command(about = "Barcode scanner viewfinder overlay demo")]
#[command(version)]
struct Cli {
    /// Surface width in pixels
    #[arg(long, default_value_t = 640)]
    width: usize,

    /// Surface height in pixels
    #[arg(long, default_value_t = 480)]
    height: usize,

    /// Caption drawn under the framing rect
    #[arg(long, default_value = "PLACE BARCODE INSIDE FRAME")]
    caption: String,
}

fn main() -> Result<(), Error> {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=viewfinder=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!(width = cli.width, height = cli.height, "starting viewfinder");

    let mut window = Drawer::new("Barcode Scanner", cli.width, cli.height)?;
    let mut screen = FrameBuffer::new(cli.width, cli.height);

    // The framing provider owns the scan rect; the overlay only reads it.
    let mut framing = FramingSource::new();
    framing.set_surface_size(cli.width, cli.height);

    let mut overlay = ViewfinderOverlay::new(Theme::default(), cli.caption);
    let mut preview = Preview::new();
    let mut feed = CandidateFeed::new();

    // Repaint deadlines built from the overlay's queued requests.
    let mut deadlines: Vec<Instant> = Vec::new();

    // HUD / FPS bookkeeping, logged once per second
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    while window.is_open() && !window.esc_pressed() {
        let now = Instant::now();

        // Inputs first; both queue immediate repaints on the overlay.
        if window.d_pressed_once() {
            if let Some(frame) = framing.framing_rect() {
                overlay.show_result(freeze_region(&screen, frame));
            }
        }
        if window.n_pressed_once() {
            overlay.show_live_view();
        }

        // Turn the overlay's requests into deadlines on our clock. The
        // requested area is informational here: the base is always
        // recomposed in full, because the translucent mask must never
        // blend onto an already-masked image.
        for request in overlay.take_redraws() {
            debug!(
                area = ?request.area,
                delay_ms = request.delay.as_millis() as u64,
                "repaint queued"
            );
            deadlines.push(now + request.delay);
        }

        // Repaint when a deadline has come due.
        if deadlines.iter().any(|&at| at <= now) {
            deadlines.retain(|&at| at > now);

            preview.compose(&mut screen);
            let frame = framing.framing_rect();

            // While scanning, pull this pass's candidate points.
            if overlay.is_live() {
                if let Some(frame) = frame {
                    for point in feed.next_points(frame) {
                        overlay.add_possible_result_point(point);
                    }
                }
            }

            overlay.render(&mut screen, frame);

            let mode = if overlay.is_live() { "LIVE" } else { "RESULT" };
            let hud = format!("{mode} | D: FREEZE  N: NEW SCAN  ESC: QUIT | {hud_fps_text}");
            draw::draw_text_5x7(&mut screen, 8, 8, &hud, 0xFFFF_FFFF, 1);
        }

        window.present(&screen)?;

        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            debug!(fps = fps as f64, "tick rate");
            hud_fps_text = format!("FPS: {fps:.1}");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    info!("window closed");
    Ok(())
}

/// Copy the frame region out of the screen buffer as the frozen result
/// image. Parts outside the buffer read as black.
fn freeze_region(screen: &FrameBuffer, frame: Rect) -> RgbaImage {
    RgbaImage::from_fn(frame.width() as u32, frame.height() as u32, |x, y| {
        let sx = frame.left + x as i32;
        let sy = frame.top + y as i32;
        let in_bounds =
            sx >= 0 && sy >= 0 && (sx as usize) < screen.width && (sy as usize) < screen.height;
        let px = if in_bounds {
            screen.pixels[sy as usize * screen.width + sx as usize]
        } else {
            0
        };
        image::Rgba([
            ((px >> 16) & 0xFF) as u8,
            ((px >> 8) & 0xFF) as u8,
            (px & 0xFF) as u8,
            0xFF,
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_region_copies_frame_pixels() {
        let mut screen = FrameBuffer::new(4, 4);
        screen.pixels[4 + 1] = 0x0011_2233;

        let image = freeze_region(&screen, Rect::new(1, 1, 3, 3));
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0).0, [0x11, 0x22, 0x33, 0xFF]);
        assert_eq!(image.get_pixel(1, 1).0, [0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_freeze_region_clips_out_of_bounds_to_black() {
        let mut screen = FrameBuffer::new(2, 2);
        screen.pixels.fill(0x00FF_FFFF);

        let image = freeze_region(&screen, Rect::new(1, 1, 3, 3));
        assert_eq!(image.get_pixel(0, 0).0, [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(image.get_pixel(1, 1).0, [0, 0, 0, 0xFF]); // outside the screen
    }
}
