// Demo stand-ins for the two collaborators this app does not ship:
// the camera delivers frames and the decoder reports candidate points,
// so the window has something to scan without either being present.

use crate::types::{FrameBuffer, Rect, ResultPoint};

/// Deterministic xorshift32 RNG for lightweight randomness.
#[derive(Clone)]
struct Rng32 {
    state: u32,
}

impl Rng32 {
    fn from_seed(seed: u32) -> Self {
        Self { state: seed | 1 }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    #[inline]
    fn next_f32(&mut self) -> f32 {
        // Uniform [0,1)
        (self.next_u32() >> 8) as f32 / ((1u32 << 24) as f32)
    }

    #[inline]
    fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }
}

/// A drifting test pattern that stands in for the live camera feed.
/// Visual: soft diagonal color bands sliding sideways a little on
/// every repaint, so you can tell the preview is "running".
pub struct Preview {
    tick: u32,
}

impl Preview {
    pub fn new() -> Self {
        Self { tick: 0 }
    }

    /// Repaint the whole base image for this pass.
    pub fn compose(&mut self, fb: &mut FrameBuffer) {
        self.tick = self.tick.wrapping_add(1);
        let t = self.tick.wrapping_mul(3);

        for y in 0..fb.height {
            let row = y * fb.width;
            for x in 0..fb.width {
                let band = ((x as u32).wrapping_add(y as u32).wrapping_add(t)) & 0xFF;
                let r = 0x30 + (band >> 2);
                let g = 0x38 + (band >> 1);
                let b = 0x48 + (band >> 2);
                fb.pixels[row + x] = (r << 16) | (g << 8) | b;
            }
        }
    }
}

impl Default for Preview {
    fn default() -> Self {
        Self::new()
    }
}

/// Pseudo-random candidate points, standing in for the decoder's
/// feature hits. Most passes report nothing; some report a few points
/// somewhere inside the frame, the way a decode attempt would.
pub struct CandidateFeed {
    rng: Rng32,
}

impl CandidateFeed {
    pub fn new() -> Self {
        Self {
            rng: Rng32::from_seed(0xC0FFEE),
        }
    }

    /// Points for this pass, relative to the frame's top-left.
    pub fn next_points(&mut self, frame: Rect) -> Vec<ResultPoint> {
        if self.rng.next_f32() > 0.4 {
            return Vec::new();
        }

        let count = 1 + (self.rng.next_u32() % 3) as usize;
        (0..count)
            .map(|_| {
                ResultPoint::new(
                    self.rng.range(0.0, frame.width() as f32),
                    self.rng.range(0.0, frame.height() as f32),
                )
            })
            .collect()
    }
}

impl Default for CandidateFeed {
    fn default() -> Self {
        Self::new()
    }
}
