//! Output renderers over a fully drawn [`Bitmap`].
//!
//! Unset cells render as light; symbol construction asserts full coverage
//! before any of these run.

use crate::bitmap::Bitmap;
use crate::error::QrError;

impl Bitmap {
    /// Renders two module rows per text line with Unicode half blocks.
    pub fn to_ascii(&self) -> String {
        let mut out = String::new();
        let mut y = 0;
        while y < self.height() {
            for x in 0..self.width() {
                let top = self.dark_at(x as i32, y as i32);
                let bottom = y + 1 < self.height() && self.dark_at(x as i32, y as i32 + 1);
                out.push(match (top, bottom) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            out.push('\n');
            y += 2;
        }
        out
    }

    /// Renders with ANSI background colors, one reset per cell.
    pub fn to_term(&self) -> String {
        let mut out = String::new();
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.dark_at(x as i32, y as i32) {
                    out.push_str("\u{1b}[40m  \u{1b}[0m");
                } else {
                    out.push_str("\u{1b}[47m  \u{1b}[0m");
                }
            }
            out.push('\n');
        }
        out
    }

    /// Renders an SVG document. With `optimize` every dark cell contributes
    /// one `M<x> <y>h1v1H<x>Z` subpath to a single `<path>`, switching to a
    /// relative `m` whenever that is shorter; otherwise one unit `<rect>` is
    /// emitted per dark cell.
    pub fn to_svg(&self, optimize: bool) -> String {
        let mut out = format!(
            "<svg viewBox=\"0 0 {} {}\" xmlns=\"http://www.w3.org/2000/svg\">",
            self.width(),
            self.height()
        );
        if optimize {
            out.push_str("<path d=\"");
            let mut prev: Option<(u32, u32)> = None;
            for y in 0..self.height() {
                for x in 0..self.width() {
                    if !self.dark_at(x as i32, y as i32) {
                        continue;
                    }
                    let abs = format!("M{} {}", x, y);
                    let moved = match prev {
                        Some((px, py)) => {
                            let rel = format!("m{} {}", x as i64 - px as i64, y as i64 - py as i64);
                            if rel.len() < abs.len() {
                                rel
                            } else {
                                abs
                            }
                        }
                        None => abs,
                    };
                    out.push_str(&moved);
                    out.push_str("h1v1");
                    if x >= 10 {
                        out.push_str("h-1");
                    } else {
                        out.push_str(&format!("H{}", x));
                    }
                    out.push('Z');
                    prev = Some((x, y));
                }
            }
            out.push_str("\"/>");
        } else {
            for y in 0..self.height() {
                for x in 0..self.width() {
                    if self.dark_at(x as i32, y as i32) {
                        out.push_str(&format!(
                            "<rect x=\"{}\" y=\"{}\" width=\"1\" height=\"1\"/>",
                            x, y
                        ));
                    }
                }
            }
        }
        out.push_str("</svg>");
        out
    }

    /// Renders an uncompressed GIF87a. The stream uses a fixed 8-bit code
    /// table: a clear code leads every sub-block so the LZW dictionary never
    /// grows and pixel bytes pass through literally.
    pub fn to_gif(&self) -> Vec<u8> {
        let w = self.width() as u16;
        let h = self.height() as u16;
        let mut out = Vec::with_capacity(6 + 7 + 384 + 10 + self.width() as usize * self.height() as usize + 16);
        out.extend_from_slice(b"GIF87a");
        out.extend_from_slice(&w.to_le_bytes());
        out.extend_from_slice(&h.to_le_bytes());
        // Global color table flag, 8-bit color resolution, 128 entries
        out.push(0xF6);
        out.push(0x00); // Background color index
        out.push(0x00); // Pixel aspect ratio
        out.extend_from_slice(&[0xFF, 0xFF, 0xFF]); // Entry 0: white
        for _ in 1..128 {
            out.extend_from_slice(&[0x00, 0x00, 0x00]);
        }
        // Image descriptor at (0, 0), full size, no local color table
        out.push(0x2C);
        out.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        out.extend_from_slice(&w.to_le_bytes());
        out.extend_from_slice(&h.to_le_bytes());
        out.push(0x00);
        out.push(0x07); // LZW minimum code size
        let mut pixels = Vec::with_capacity(self.width() as usize * self.height() as usize);
        for y in 0..self.height() {
            for x in 0..self.width() {
                pixels.push(u8::from(self.dark_at(x as i32, y as i32)));
            }
        }
        for chunk in pixels.chunks(126) {
            out.push(chunk.len() as u8 + 1);
            out.push(0x80); // Clear code
            out.extend_from_slice(chunk);
        }
        out.push(0x01);
        out.push(0x81); // End-of-information code
        out.push(0x00); // Block terminator
        out.push(0x3B); // Trailer
        out
    }

    /// Renders a grayscale pixel buffer with `channels` bytes per pixel
    /// (3 for RGB, 4 for RGBA). Dark cells are 0, light cells 255, alpha 255.
    pub fn to_image(&self, channels: usize) -> Result<Vec<u8>, QrError> {
        if channels != 3 && channels != 4 {
            return Err(QrError::UnknownPixelFormat);
        }
        let mut out = Vec::with_capacity(self.width() as usize * self.height() as usize * channels);
        for y in 0..self.height() {
            for x in 0..self.width() {
                let v = if self.dark_at(x as i32, y as i32) { 0 } else { 255 };
                out.extend_from_slice(&[v, v, v]);
                if channels == 4 {
                    out.push(255);
                }
            }
        }
        Ok(out)
    }

    // In-bounds dark probe for the renderers.
    fn dark_at(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Ok(c) if c.is_dark())
    }
}
