//! RGBA pixel surfaces backing the gallery canvases.
//!
//! The buffer layout matches `ImageData`: row-major, four bytes per pixel in
//! R, G, B, A order, so the browser side can blit it without conversion.

use crate::error::GlitchError;
use crate::rng::RandomSource;

const WHITE: [u8; 3] = [255, 255, 255];
const SCAN_LINE: [u8; 3] = [0, 255, 65];
const OVERLAY_ALPHA: f64 = 0.1;

/// Pixel buffer mirroring one `<canvas>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanvasSurface {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl CanvasSurface {
    /// Transparent black surface.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    /// Wrap an existing RGBA buffer, e.g. the bytes of an `ImageData`.
    pub fn from_rgba(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self, GlitchError> {
        let expected = width * height * 4;
        if pixels.len() != expected {
            return Err(GlitchError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_rgba(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let o = (y * self.width + x) * 4;
        [
            self.pixels[o],
            self.pixels[o + 1],
            self.pixels[o + 2],
            self.pixels[o + 3],
        ]
    }

    /// Paint the tile's resting image.
    ///
    /// A diagonal gradient from `palette[index % len]` at the top-left corner
    /// to black at the bottom-right, overlaid with `rect_count` translucent
    /// white squares at random positions and a green scan line on every
    /// `scan_period`-th row.
    pub fn paint_initial<R: RandomSource + ?Sized>(
        &mut self,
        index: usize,
        palette: &[[u8; 3]],
        rect_count: usize,
        rect_size: (f64, f64),
        scan_period: usize,
        rng: &mut R,
    ) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let start = palette.get(index % palette.len().max(1)).copied().unwrap_or(WHITE);
        self.fill_gradient(start);

        let (min_size, size_range) = rect_size;
        for _ in 0..rect_count {
            let x = rng.next_f64() * self.width as f64;
            let y = rng.next_f64() * self.height as f64;
            let size = rng.next_f64() * size_range + min_size;
            self.blend_rect(x, y, size, size, WHITE, OVERLAY_ALPHA);
        }

        let period = scan_period.max(1);
        for y in (0..self.height).step_by(period) {
            self.blend_rect(0.0, y as f64, self.width as f64, 1.0, SCAN_LINE, OVERLAY_ALPHA);
        }
    }

    /// Canvas linear gradient along the `(0,0)-(w,h)` diagonal.
    fn fill_gradient(&mut self, start: [u8; 3]) {
        let (w, h) = (self.width as f64, self.height as f64);
        let norm = w * w + h * h;
        for y in 0..self.height {
            for x in 0..self.width {
                // Sample at the pixel centre, as canvas does.
                let px = x as f64 + 0.5;
                let py = y as f64 + 0.5;
                let t = ((px * w + py * h) / norm).clamp(0.0, 1.0);
                let o = (y * self.width + x) * 4;
                for c in 0..3 {
                    self.pixels[o + c] = (start[c] as f64 * (1.0 - t)).round() as u8;
                }
                self.pixels[o + 3] = 255;
            }
        }
    }

    /// Source-over blend of a solid colour into the rectangle, clipped.
    fn blend_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: [u8; 3], alpha: f64) {
        let x0 = x.max(0.0).floor() as usize;
        let y0 = y.max(0.0).floor() as usize;
        let x1 = ((x + w).ceil().max(0.0) as usize).min(self.width);
        let y1 = ((y + h).ceil().max(0.0) as usize).min(self.height);
        for py in y0..y1 {
            for px in x0..x1 {
                let o = (py * self.width + px) * 4;
                for c in 0..3 {
                    let dst = self.pixels[o + c] as f64;
                    self.pixels[o + c] = (dst * (1.0 - alpha) + color[c] as f64 * alpha).round() as u8;
                }
                self.pixels[o + 3] = 255;
            }
        }
    }

    /// Corrupt the buffer in place.
    ///
    /// First pass: each pixel, with probability `shear_p`, takes its red
    /// channel from the pixel `shift` positions away, where `shift` is
    /// uniform in `[-max_shift, max_shift)`; out-of-range sources are
    /// skipped. Second pass: each pixel, with probability `noise_p`, gets
    /// fresh random RGB. Alpha is never touched.
    ///
    /// Returns the number of pixels changed by either pass.
    pub fn glitch<R: RandomSource + ?Sized>(
        &mut self,
        shear_p: f64,
        max_shift: i64,
        noise_p: f64,
        rng: &mut R,
    ) -> usize {
        let len = self.pixels.len() as i64;
        let mut touched = 0;

        for i in (0..self.pixels.len()).step_by(4) {
            if rng.chance(shear_p) {
                let shift = (rng.next_f64() * (2 * max_shift) as f64).floor() as i64 - max_shift;
                let src = i as i64 + shift * 4;
                if (0..len).contains(&src) {
                    self.pixels[i] = self.pixels[src as usize];
                    touched += 1;
                }
            }
        }

        for i in (0..self.pixels.len()).step_by(4) {
            if rng.chance(noise_p) {
                for c in 0..3 {
                    // Uint8ClampedArray stores round-half-to-even.
                    self.pixels[i + c] = (rng.next_f64() * 255.0).round_ties_even() as u8;
                }
                touched += 1;
            }
        }

        touched
    }
}
