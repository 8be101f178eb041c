//! Clipped drawing primitives over a 32-bit pixel buffer.

use std::ops::DerefMut;

use crate::FramebufferError;

const BYTES_PER_PIXEL: usize = 4;
const OPAQUE: u32 = 0xff00_0000;

/// Blend `src` over `dst` with `alpha` coverage. The result is always opaque.
#[inline]
pub fn blend(src: u32, dst: u32, alpha: u8) -> u32 {
    let a = alpha as u32;
    let inv = 255 - a;
    let channel = |shift: u32| {
        let s = (src >> shift) & 0xff;
        let d = (dst >> shift) & 0xff;
        ((s * a + d * inv) / 255) << shift
    };
    OPAQUE | channel(16) | channel(8) | channel(0)
}

/// Row-major pixel surface with top-left origin.
///
/// Every drawing operation clips to `[0, width) x [0, height)`; nothing is
/// ever written past the end of a row or outside the buffer.
pub struct Surface<B> {
    buf: B,
    width: i32,
    height: i32,
    /// Row stride in pixels. May exceed `width`.
    stride: usize,
}

impl<B> Surface<B>
where
    B: DerefMut<Target = [u8]>,
{
    /// Wrap `buf` as a `width` x `height` surface whose rows are `stride` pixels apart.
    pub fn new(buf: B, width: u32, height: u32, stride: u32) -> Result<Self, FramebufferError> {
        let needed = stride as usize * height as usize * BYTES_PER_PIXEL;
        if stride < width || buf.len() < needed || width > i32::MAX as u32 || height > i32::MAX as u32
        {
            return Err(FramebufferError::BufferTooSmall {
                len: buf.len(),
                width,
                height,
                stride,
            });
        }
        Ok(Self {
            buf,
            width: width as i32,
            height: height as i32,
            stride: stride as usize,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        (y as usize * self.stride + x as usize) * BYTES_PER_PIXEL
    }

    #[inline]
    fn read(&self, x: i32, y: i32) -> u32 {
        let o = self.offset(x, y);
        let b = &self.buf[o..o + BYTES_PER_PIXEL];
        u32::from_ne_bytes([b[0], b[1], b[2], b[3]])
    }

    #[inline]
    fn write(&mut self, x: i32, y: i32, color: u32) {
        let o = self.offset(x, y);
        self.buf[o..o + BYTES_PER_PIXEL].copy_from_slice(&color.to_ne_bytes());
    }

    /// Pixel at `(x, y)`, or `None` off-surface.
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.read(x, y))
    }

    /// Clip a rectangle to the surface (and to rows above `max_y`).
    fn clip(&self, x: i32, y: i32, w: i32, h: i32, max_y: i32) -> Option<(i32, i32, i32, i32)> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height).min(max_y);
        (x1 > x0 && y1 > y0).then_some((x0, y0, x1, y1))
    }

    /// Opaque rectangle fill. Empty after clipping is a no-op.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        self.fill_rect_clipped(x, y, w, h, self.height, color);
    }

    /// `fill_rect` that also leaves rows at or below `max_y` untouched.
    pub fn fill_rect_clipped(&mut self, x: i32, y: i32, w: i32, h: i32, max_y: i32, color: u32) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h, max_y) else {
            return;
        };
        let bytes = color.to_ne_bytes();
        for row in y0..y1 {
            let start = self.offset(x0, row);
            let end = self.offset(x1, row);
            for px in self.buf[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
                px.copy_from_slice(&bytes);
            }
        }
    }

    /// Composite an 8-bit coverage bitmap (`w` x `h`, row-major) in `fg` at `(x, y)`.
    ///
    /// Coverage 0 leaves the destination alone, 255 replaces it, anything
    /// else blends. Off-surface pixels are skipped individually.
    pub fn blit_alpha(&mut self, x: i32, y: i32, bitmap: &[u8], w: usize, h: usize, fg: u32) {
        self.blit_alpha_clipped(x, y, bitmap, w, h, self.height, fg);
    }

    /// `blit_alpha` that also skips rows at or below `max_y`.
    pub fn blit_alpha_clipped(
        &mut self,
        x: i32,
        y: i32,
        bitmap: &[u8],
        w: usize,
        h: usize,
        max_y: i32,
        fg: u32,
    ) {
        if w == 0 {
            return;
        }
        let limit = self.height.min(max_y);
        for (j, row) in bitmap.chunks(w).take(h).enumerate() {
            let dy = y + j as i32;
            if dy < 0 || dy >= limit {
                continue;
            }
            for (i, &alpha) in row.iter().enumerate() {
                let dx = x + i as i32;
                if dx < 0 || dx >= self.width || alpha == 0 {
                    continue;
                }
                let out = if alpha == 255 {
                    fg
                } else {
                    blend(fg, self.read(dx, dy), alpha)
                };
                self.write(dx, dy, out);
            }
        }
    }

    /// XOR the RGB channels of a rectangle, leaving rows at or below `max_y` untouched.
    pub fn invert_rect(&mut self, x: i32, y: i32, w: i32, h: i32, max_y: i32, mask: u32) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h, max_y) else {
            return;
        };
        for row in y0..y1 {
            for col in x0..x1 {
                let px = self.read(col, row);
                self.write(col, row, px ^ mask);
            }
        }
    }

    /// Fill the whole surface.
    pub fn clear(&mut self, color: u32) {
        self.fill_rect(0, 0, self.width, self.height, color);
    }
}
