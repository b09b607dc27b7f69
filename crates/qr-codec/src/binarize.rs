//! Image binarization: grayscale reduction followed by an adaptive local
//! threshold over 8x8 blocks.

use crate::bitmap::{Bitmap, Cell};
use crate::error::QrError;

const BLOCK: usize = 8;
const MIN_DIMENSION: usize = 40;
const MIN_DYNAMIC_RANGE: u32 = 24;

/// A borrowed raster of 3-byte RGB or 4-byte RGBA pixels, row-major from the
/// top-left corner.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuf<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

impl<'a> PixelBuf<'a> {
    /// Bytes per pixel, validated against the buffer length.
    pub fn channels(&self) -> Result<usize, QrError> {
        let pixels = self.width * self.height;
        if pixels == 0 {
            return Err(QrError::ImageTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        if self.data.len() == pixels * 3 {
            Ok(3)
        } else if self.data.len() == pixels * 4 {
            Ok(4)
        } else {
            Err(QrError::UnknownPixelFormat)
        }
    }

    /// Reduces to one luminance byte per pixel, `(R + 2G + B) / 4`.
    pub fn to_grayscale(&self) -> Result<Vec<u8>, QrError> {
        let channels = self.channels()?;
        let mut gray = Vec::with_capacity(self.width * self.height);
        for px in self.data.chunks_exact(channels) {
            let y = (u32::from(px[0]) + 2 * u32::from(px[1]) + u32::from(px[2])) / 4;
            gray.push(y as u8);
        }
        Ok(gray)
    }
}

/// Binarizes a pixel buffer into a fully drawn matrix, dark where the local
/// luminance falls at or below the block threshold.
pub fn binarize(image: &PixelBuf) -> Result<Bitmap, QrError> {
    let gray = image.to_grayscale()?;
    binarize_grayscale(&gray, image.width, image.height)
}

/// Binarizes a prepared grayscale buffer.
///
/// Block means are computed over an 8x8 tiling (the last row and column of
/// blocks clamp inward to stay inside the image). A block with dynamic range
/// of at most 24 counts as near-uniform: its mean becomes `min/2`, raised to
/// the weighted mean `(top + 2*left + top_left) / 4` of its already-scored
/// neighbors when that is larger. The final threshold of each block is the
/// average of the 5x5 neighborhood of block means.
pub fn binarize_grayscale(gray: &[u8], width: usize, height: usize) -> Result<Bitmap, QrError> {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(QrError::ImageTooSmall { width, height });
    }
    assert_eq!(gray.len(), width * height, "Illegal argument");

    let sub_w = (width + BLOCK - 1) / BLOCK;
    let sub_h = (height + BLOCK - 1) / BLOCK;
    let clamp_x = |bx: usize| (bx * BLOCK).min(width - BLOCK);
    let clamp_y = |by: usize| (by * BLOCK).min(height - BLOCK);

    // First pass: one representative level per block
    let mut levels = vec![0u32; sub_w * sub_h];
    for by in 0..sub_h {
        for bx in 0..sub_w {
            let (x0, y0) = (clamp_x(bx), clamp_y(by));
            let mut sum = 0u32;
            let mut min = u32::MAX;
            let mut max = 0u32;
            for y in y0..y0 + BLOCK {
                for x in x0..x0 + BLOCK {
                    let v = u32::from(gray[y * width + x]);
                    sum += v;
                    min = min.min(v);
                    max = max.max(v);
                }
            }
            let mut level = sum / (BLOCK * BLOCK) as u32;
            if max - min <= MIN_DYNAMIC_RANGE {
                // Near-uniform block: assume background, bias toward dark
                level = min / 2;
                if bx > 0 && by > 0 {
                    let top = levels[(by - 1) * sub_w + bx];
                    let left = levels[by * sub_w + bx - 1];
                    let top_left = levels[(by - 1) * sub_w + bx - 1];
                    let neighbors = (top + 2 * left + top_left) / 4;
                    if min < neighbors {
                        level = neighbors;
                    }
                }
            }
            levels[by * sub_w + bx] = level;
        }
    }

    // Second pass: threshold each block with its 5x5 neighborhood mean
    let mut out = Bitmap::new(width as u32, height as u32);
    for by in 0..sub_h {
        let cy = by.clamp(2, sub_h - 3);
        for bx in 0..sub_w {
            let cx = bx.clamp(2, sub_w - 3);
            let mut sum = 0u32;
            for ny in cy - 2..=cy + 2 {
                for nx in cx - 2..=cx + 2 {
                    sum += levels[ny * sub_w + nx];
                }
            }
            let threshold = sum / 25;
            let (x0, y0) = (clamp_x(bx), clamp_y(by));
            for y in y0..y0 + BLOCK {
                for x in x0..x0 + BLOCK {
                    let dark = u32::from(gray[y * width + x]) <= threshold;
                    out.set(x as i32, y as i32, Cell::from_dark(dark))?;
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_rgb(width: usize, height: usize, value: u8) -> Vec<u8> {
        vec![value; width * height * 3]
    }

    #[test]
    fn rejects_unknown_pixel_formats() {
        let data = vec![0u8; 50 * 50 * 2];
        let buf = PixelBuf { width: 50, height: 50, data: &data };
        assert_eq!(buf.channels(), Err(QrError::UnknownPixelFormat));
        assert!(binarize(&buf).is_err());
    }

    #[test]
    fn rejects_small_images() {
        let data = flat_rgb(39, 64, 128);
        let buf = PixelBuf { width: 39, height: 64, data: &data };
        assert_eq!(
            binarize(&buf),
            Err(QrError::ImageTooSmall { width: 39, height: 64 })
        );
    }

    #[test]
    fn luminance_weights_green_double() {
        let data = [100u8, 200, 40, 0, 0, 0];
        let buf = PixelBuf { width: 2, height: 1, data: &data };
        let gray = buf.to_grayscale().unwrap();
        assert_eq!(gray, vec![135, 0]);
    }

    #[test]
    fn rgba_alpha_is_ignored() {
        let data = [10u8, 10, 10, 255, 250, 250, 250, 0];
        let buf = PixelBuf { width: 2, height: 1, data: &data };
        assert_eq!(buf.channels().unwrap(), 4);
        assert_eq!(buf.to_grayscale().unwrap(), vec![10, 250]);
    }

    #[test]
    fn contrasting_halves_split_cleanly() {
        // Left half dark, right half bright
        let (w, h) = (64, 48);
        let mut gray = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                gray[y * w + x] = if x < w / 2 { 20 } else { 220 };
            }
        }
        let bm = binarize_grayscale(&gray, w, h).unwrap();
        assert!(bm.assert_drawn().is_ok());
        assert!(bm.get(4, 24).unwrap().is_dark());
        assert!(!bm.get(60, 24).unwrap().is_dark());
    }

    #[test]
    fn uniform_white_stays_light() {
        // Near-uniform bright blocks threshold at min/2, far below white
        let gray = vec![200u8; 80 * 80];
        let bm = binarize_grayscale(&gray, 80, 80).unwrap();
        assert_eq!(bm.popcount(), 0);
    }

    #[test]
    fn checkerboard_pattern_survives_binarization() {
        // 8px checker tiles of black and white
        let (w, h) = (64, 64);
        let mut gray = vec![0u8; w * h];
        for y in 0..h {
            for x in 0..w {
                gray[y * w + x] = if (x / 8 + y / 8) % 2 == 0 { 15 } else { 240 };
            }
        }
        let bm = binarize_grayscale(&gray, w, h).unwrap();
        assert!(bm.get(4, 4).unwrap().is_dark());
        assert!(!bm.get(12, 4).unwrap().is_dark());
        assert!(bm.get(12, 12).unwrap().is_dark());
    }
}
