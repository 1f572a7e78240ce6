//! CPU-side mirror of the atlas texture.
//!
//! A flat row-major RGBA8 buffer with an explicit stride. Every glyph
//! write lands here first; the GPU texture is a projection of this
//! buffer, refreshed when [`PixelBuffer::is_dirty`] is set.

use crate::atlas::AtlasRect;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Square RGBA8 pixel buffer (`size * size * 4` bytes).
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    size: u32,
    background: [u8; 4],
    data: Vec<u8>,
    dirty: bool,
}

impl PixelBuffer {
    /// Create a buffer filled with `background`.
    ///
    /// A fresh buffer starts dirty so the first flush initialises the
    /// texture with the background.
    pub fn new(size: u32, background: [u8; 4]) -> Self {
        let pixel_count = (size as usize) * (size as usize);
        let data = background.repeat(pixel_count);
        Self {
            size,
            background,
            data,
            dirty: true,
        }
    }

    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.size as usize * BYTES_PER_PIXEL
    }

    /// Fill color for regions without a resident glyph.
    pub fn background(&self) -> [u8; 4] {
        self.background
    }

    /// Raw RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the buffer changed since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag, returning its previous value.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// RGBA value at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let idx = self.offset(x, y);
        let px = &self.data[idx..idx + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Reset the whole buffer to the background color.
    pub fn fill_background(&mut self) {
        for px in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&self.background);
        }
        self.dirty = true;
    }

    /// Reset one rectangle to the background color.
    pub fn clear_rect(&mut self, rect: &AtlasRect) {
        if rect.is_empty() {
            return;
        }
        let background = self.background;
        for row in 0..rect.height {
            let start = self.offset(rect.x, rect.y + row);
            let end = start + rect.width as usize * BYTES_PER_PIXEL;
            for px in self.data[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
                px.copy_from_slice(&background);
            }
        }
        self.dirty = true;
    }

    /// Blit an alpha-coverage bitmap into `rect`.
    ///
    /// Coverage `c` is stored as premultiplied white `(c, c, c, c)`.
    /// `coverage` is row-major with `rect.width` bytes per row; missing
    /// trailing bytes are treated as zero coverage.
    pub fn write_coverage(&mut self, rect: &AtlasRect, coverage: &[u8]) {
        if rect.is_empty() {
            return;
        }
        debug_assert!(rect.x + rect.width <= self.size && rect.y + rect.height <= self.size);

        let width = rect.width as usize;
        for row in 0..rect.height as usize {
            let dst_start = self.offset(rect.x, rect.y + row as u32);
            let dst = &mut self.data[dst_start..dst_start + width * BYTES_PER_PIXEL];
            for (col, px) in dst.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
                let c = coverage.get(row * width + col).copied().unwrap_or(0);
                px.copy_from_slice(&[c, c, c, c]);
            }
        }
        self.dirty = true;
    }

    /// Whether every pixel in `rect` equals the background color.
    pub fn is_background(&self, rect: &AtlasRect) -> bool {
        (rect.y..rect.y + rect.height).all(|y| {
            (rect.x..rect.x + rect.width).all(|x| self.pixel(x, y) == Some(self.background))
        })
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride() + x as usize * BYTES_PER_PIXEL
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: [u8; 4] = [100, 149, 237, 255];

    #[test]
    fn test_new_buffer_is_background() {
        let buf = PixelBuffer::new(16, BLUE);
        assert_eq!(buf.data().len(), 16 * 16 * 4);
        assert_eq!(buf.stride(), 64);
        assert!(buf.is_background(&AtlasRect::new(0, 0, 16, 16)));
        assert!(buf.is_dirty());
    }

    #[test]
    fn test_write_coverage_premultiplied() {
        let mut buf = PixelBuffer::new(8, BLUE);
        buf.take_dirty();
        let rect = AtlasRect::new(2, 3, 2, 2);
        buf.write_coverage(&rect, &[0, 64, 128, 255]);

        assert!(buf.is_dirty());
        assert_eq!(buf.pixel(2, 3), Some([0, 0, 0, 0]));
        assert_eq!(buf.pixel(3, 3), Some([64, 64, 64, 64]));
        assert_eq!(buf.pixel(2, 4), Some([128, 128, 128, 128]));
        assert_eq!(buf.pixel(3, 4), Some([255, 255, 255, 255]));
        // Neighbours untouched.
        assert_eq!(buf.pixel(1, 3), Some(BLUE));
        assert_eq!(buf.pixel(4, 4), Some(BLUE));
    }

    #[test]
    fn test_clear_rect_restores_background() {
        let mut buf = PixelBuffer::new(8, BLUE);
        let rect = AtlasRect::new(0, 0, 4, 4);
        buf.write_coverage(&rect, &[255; 16]);
        assert!(!buf.is_background(&rect));

        buf.clear_rect(&rect);
        assert!(buf.is_background(&rect));
    }

    #[test]
    fn test_fill_background() {
        let mut buf = PixelBuffer::new(8, BLUE);
        buf.write_coverage(&AtlasRect::new(5, 5, 3, 3), &[200; 9]);
        buf.take_dirty();
        buf.fill_background();
        assert!(buf.is_dirty());
        assert!(buf.is_background(&AtlasRect::new(0, 0, 8, 8)));
    }

    #[test]
    fn test_take_dirty() {
        let mut buf = PixelBuffer::new(4, BLUE);
        assert!(buf.take_dirty());
        assert!(!buf.take_dirty());
        assert!(!buf.is_dirty());
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let buf = PixelBuffer::new(4, BLUE);
        assert_eq!(buf.pixel(4, 0), None);
        assert_eq!(buf.pixel(0, 4), None);
    }
}
