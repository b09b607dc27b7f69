//! Decoder entry points: from a raster image, or directly from a module
//! matrix, back to the payload text.

use crate::binarize::{binarize_grayscale, PixelBuf};
use crate::bit_buffer::BitReader;
use crate::bitmap::Bitmap;
use crate::detect::{find_alignment, find_finder_patterns, PatternHit};
use crate::ecc_level::EccLevel;
use crate::error::QrError;
use crate::interleave::deinterleave;
use crate::layout::{build_template, format_code, version_code, zigzag};
use crate::mask::Mask;
use crate::perspective::{sample_grid, Perspective};
use crate::segment_mode::SegmentMode;
use crate::version::{Capacity, Version};
use crate::ALPHANUMERIC_CHARSET;

/// Decoder options.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Center-crops the larger dimension before decoding.
    pub crop_to_square: bool,
    /// Bytes-to-text hook for byte segments; strict UTF-8 when absent.
    pub text_decoder: Option<fn(&[u8]) -> Result<String, QrError>>,
}

/// The located pattern centers handed to [`DecodeObserver::on_detect`].
/// `bottom_right` is present only when the alignment pattern was found;
/// `bottom_right_estimate` always carries the extrapolated corner.
#[derive(Debug, Clone)]
pub struct DetectedPoints {
    pub top_left: PatternHit,
    pub top_right: PatternHit,
    pub bottom_left: PatternHit,
    pub bottom_right: Option<PatternHit>,
    pub bottom_right_estimate: (f64, f64),
}

/// Snapshot hooks into the decode pipeline. Every callback fires before any
/// later phase can fail; a later failure does not revoke earlier snapshots.
pub trait DecodeObserver {
    /// The binarized image.
    fn on_bitmap(&mut self, _bitmap: &Bitmap) {}
    /// The located pattern centers.
    fn on_detect(&mut self, _points: &DetectedPoints) {}
    /// The rectified module matrix.
    fn on_result(&mut self, _modules: &Bitmap) {}
}

struct NoopObserver;

impl DecodeObserver for NoopObserver {}

/// Decodes the text payload of the QR Code in `image`.
pub fn decode(image: &PixelBuf, opts: &DecodeOptions) -> Result<String, QrError> {
    decode_with_observer(image, opts, &mut NoopObserver)
}

/// Like [`decode`], with pipeline snapshots.
pub fn decode_with_observer(
    image: &PixelBuf,
    opts: &DecodeOptions,
    observer: &mut dyn DecodeObserver,
) -> Result<String, QrError> {
    let cropped;
    let image = if opts.crop_to_square && image.width != image.height {
        cropped = crop_to_square(image)?;
        PixelBuf {
            width: cropped.1,
            height: cropped.1,
            data: &cropped.0,
        }
    } else {
        *image
    };

    let gray = image.to_grayscale()?;
    let bitmap = binarize_grayscale(&gray, image.width, image.height)?;
    observer.on_bitmap(&bitmap);

    let [tl, tr, bl] = find_finder_patterns(&bitmap)?;
    let module = (tl.module_size + tr.module_size + bl.module_size) / 3.0;
    let size = estimate_dimension(&tl, &tr, &bl, module)?;
    let size_f = f64::from(size);

    // Expected bottom-right alignment center: the parallelogram corner
    // pulled inward by three modules on each axis.
    let corner = (tr.x - tl.x + bl.x, tr.y - tl.y + bl.y);
    let c = 1.0 - 3.0 / (size_f - 7.0);
    let est = (tl.x + c * (corner.0 - tl.x), tl.y + c * (corner.1 - tl.y));
    let alignment = if size > 21 {
        find_alignment(&bitmap, est.0, est.1, module).ok()
    } else {
        None
    };
    observer.on_detect(&DetectedPoints {
        top_left: tl,
        top_right: tr,
        bottom_left: bl,
        bottom_right: alignment,
        bottom_right_estimate: est,
    });

    let (br_src, br_dst) = match &alignment {
        Some(hit) => ((hit.x, hit.y), (size_f - 6.5, size_f - 6.5)),
        None => (corner, (size_f - 3.5, size_f - 3.5)),
    };
    let grid = [
        (3.5, 3.5),
        (size_f - 3.5, 3.5),
        br_dst,
        (3.5, size_f - 3.5),
    ];
    let quad = [(tl.x, tl.y), (tr.x, tr.y), br_src, (bl.x, bl.y)];
    let transform = Perspective::quadrilateral_to_quadrilateral(grid, quad);
    let modules = sample_grid(&bitmap, &transform, size);
    observer.on_result(&modules);

    decode_matrix(&modules, opts)
}

// Center-crops the larger dimension; returns the pixel data and the side.
fn crop_to_square(image: &PixelBuf) -> Result<(Vec<u8>, usize), QrError> {
    let channels = image.channels()?;
    let side = image.width.min(image.height);
    let x0 = (image.width - side) / 2;
    let y0 = (image.height - side) / 2;
    let mut data = Vec::with_capacity(side * side * channels);
    for y in y0..y0 + side {
        let start = (y * image.width + x0) * channels;
        data.extend_from_slice(&image.data[start..start + side * channels]);
    }
    Ok((data, side))
}

// Symbol side length from the finder geometry, snapped to 4k + 1.
fn estimate_dimension(
    tl: &PatternHit,
    tr: &PatternHit,
    bl: &PatternHit,
    module: f64,
) -> Result<u32, QrError> {
    if module <= 0.0 {
        return Err(QrError::FinderNotFound);
    }
    let dist = |a: &PatternHit, b: &PatternHit| ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
    let est = (dist(tl, tr) + dist(tl, bl)) / (2.0 * module) + 7.0;
    let mut dim = est.round() as i64;
    match dim & 3 {
        0 => dim += 1,
        2 => dim -= 1,
        3 => return Err(QrError::FinderNotFound),
        _ => {}
    }
    if !(21..=177).contains(&dim) {
        return Err(QrError::FinderNotFound);
    }
    Ok(dim as u32)
}

/// Decodes a rectified module matrix, the tail of the image pipeline: format
/// and version recovery, masked zig-zag read-out, de-interleaving with error
/// correction, and segment parsing.
pub fn decode_matrix(modules: &Bitmap, opts: &DecodeOptions) -> Result<String, QrError> {
    if modules.width() != modules.height() {
        return Err(QrError::LayoutMismatch);
    }
    let size = modules.width();
    let geometric = Version::from_size(size)?;
    let dark = |x: i32, y: i32| matches!(modules.get(x, y), Ok(c) if c.is_dark());

    let (ecc, mask) = recover_format(modules)?;
    let version = if geometric.value() < 7 {
        geometric
    } else {
        let decoded = recover_version(modules)?;
        if decoded != geometric {
            return Err(QrError::WrongVersionPattern);
        }
        decoded
    };

    // Rebuild the template to know which cells carry data, then read the
    // zig-zag path with the mask undone.
    let template = build_template(version, ecc, mask, false)?;
    let cap = Capacity::new(version, ecc);
    let mut cells = Vec::new();
    zigzag(&template, |x, y| cells.push((x, y)));
    let total_bits = cap.total_codewords * 8;
    if cells.len() < total_bits {
        return Err(QrError::LayoutMismatch);
    }
    let mut stream = vec![0u8; cap.total_codewords];
    for (i, (x, y)) in cells.into_iter().take(total_bits).enumerate() {
        if dark(x as i32, y as i32) ^ mask.is_inverted(x, y) {
            stream[i >> 3] |= 1 << (7 - (i & 7));
        }
    }

    let data = deinterleave(&stream, &cap)?;
    parse_segments(&data, version, opts)
}

// Reads one format copy as a 15-bit value given the bit position probes.
fn read_format_copy(modules: &Bitmap, positions: [(i32, i32); 15]) -> u32 {
    let mut bits = 0u32;
    for (i, (x, y)) in positions.into_iter().enumerate() {
        if matches!(modules.get(x, y), Ok(c) if c.is_dark()) {
            bits |= 1 << i;
        }
    }
    bits
}

// Recovers (ecc, mask) from the two format copies: exact match first, then
// the nearest candidate within Hamming distance 3.
fn recover_format(modules: &Bitmap) -> Result<(EccLevel, Mask), QrError> {
    let size = modules.width() as i32;
    let mut first = [(0i32, 0i32); 15];
    for (i, slot) in first.iter_mut().enumerate() {
        let i = i as i32;
        *slot = match i {
            0..=5 => (8, i),
            6 => (8, 7),
            7 => (8, 8),
            8 => (7, 8),
            _ => (14 - i, 8),
        };
    }
    let mut second = [(0i32, 0i32); 15];
    for (i, slot) in second.iter_mut().enumerate() {
        let i = i as i32;
        *slot = if i < 8 {
            (size - 1 - i, 8)
        } else {
            (8, size - 15 + i)
        };
    }
    let copies = [
        read_format_copy(modules, first),
        read_format_copy(modules, second),
    ];

    let mut best: Option<(u32, EccLevel, Mask)> = None;
    for ecc in EccLevel::ALL {
        for m in 0..8 {
            let mask = Mask::new(m)?;
            let code = format_code(ecc, mask);
            if copies.contains(&code) {
                return Ok((ecc, mask));
            }
            let dist = copies
                .iter()
                .map(|&c| (c ^ code).count_ones())
                .min()
                .unwrap_or(u32::MAX);
            if best.map_or(true, |(d, _, _)| dist < d) {
                best = Some((dist, ecc, mask));
            }
        }
    }
    match best {
        Some((d, ecc, mask)) if d <= 3 => Ok((ecc, mask)),
        _ => Err(QrError::WrongFormatPattern),
    }
}

// Recovers the version from the two 18-bit copies beside the top-right and
// bottom-left finders.
fn recover_version(modules: &Bitmap) -> Result<Version, QrError> {
    let size = modules.width() as i32;
    let dark = |x: i32, y: i32| matches!(modules.get(x, y), Ok(c) if c.is_dark());
    let mut copies = [0u32; 2];
    for i in 0..18i32 {
        let a = size - 11 + i % 3;
        let b = i / 3;
        if dark(a, b) {
            copies[0] |= 1 << i;
        }
        if dark(b, a) {
            copies[1] |= 1 << i;
        }
    }

    let mut best: Option<(u32, u8)> = None;
    for v in 7..=40u8 {
        let code = version_code(Version::new(v)?);
        if copies.contains(&code) {
            return Version::new(v);
        }
        let dist = copies.iter().map(|&c| (c ^ code).count_ones()).min();
        let dist = dist.unwrap_or(u32::MAX);
        if best.map_or(true, |(d, _)| dist < d) {
            best = Some((dist, v));
        }
    }
    match best {
        Some((d, v)) if d <= 3 => Version::new(v),
        _ => Err(QrError::WrongVersionPattern),
    }
}

// Parses the segment stream: mode, length, payload, repeated until the
// terminator or the end of the data codewords. ECI headers are skipped and
// parsing continues; kanji is recognized but unsupported.
fn parse_segments(
    data: &[u8],
    version: Version,
    opts: &DecodeOptions,
) -> Result<String, QrError> {
    let mut reader = BitReader::new(data);
    let mut out = String::new();
    loop {
        if reader.remaining() < 4 {
            break;
        }
        let mode_bits = reader.read_bits(4)?;
        if mode_bits == 0 {
            break;
        }
        let mode = SegmentMode::from_mode_bits(mode_bits)?;
        match mode {
            SegmentMode::Numeric => {
                let mut left = reader.read_bits(mode.char_count_bits(version))? as usize;
                while left > 0 {
                    let (bits, digits, max) = match left {
                        1 => (4, 1, 9),
                        2 => (7, 2, 99),
                        _ => (10, 3, 999),
                    };
                    let value = reader.read_bits(bits)?;
                    if value > max {
                        return Err(QrError::SegmentParse);
                    }
                    let text = format!("{:0width$}", value, width = digits);
                    out.push_str(&text);
                    left -= digits;
                }
            }
            SegmentMode::Alphanumeric => {
                let charset = ALPHANUMERIC_CHARSET.as_bytes();
                let mut left = reader.read_bits(mode.char_count_bits(version))? as usize;
                while left >= 2 {
                    let value = reader.read_bits(11)?;
                    if value >= 45 * 45 {
                        return Err(QrError::SegmentParse);
                    }
                    out.push(charset[(value / 45) as usize] as char);
                    out.push(charset[(value % 45) as usize] as char);
                    left -= 2;
                }
                if left == 1 {
                    let value = reader.read_bits(6)?;
                    if value >= 45 {
                        return Err(QrError::SegmentParse);
                    }
                    out.push(charset[value as usize] as char);
                }
            }
            SegmentMode::Byte => {
                let count = reader.read_bits(mode.char_count_bits(version))? as usize;
                let mut bytes = Vec::with_capacity(count);
                for _ in 0..count {
                    bytes.push(reader.read_bits(8)? as u8);
                }
                let text = match opts.text_decoder {
                    Some(f) => f(&bytes)?,
                    None => String::from_utf8(bytes).map_err(|_| QrError::SegmentParse)?,
                };
                out.push_str(&text);
            }
            SegmentMode::Eci => skip_eci_header(&mut reader)?,
            SegmentMode::Kanji => {
                return Err(QrError::UnsupportedMode(mode.mode_bits() as u8));
            }
        }
    }
    Ok(out)
}

// Skips an ECI assignment number: 8, 16 or 24 bits total depending on the
// 0 / 10 / 110 prefix.
fn skip_eci_header(reader: &mut BitReader) -> Result<(), QrError> {
    if reader.read_bits(1)? == 0 {
        reader.read_bits(7)?;
    } else if reader.read_bits(1)? == 0 {
        reader.read_bits(14)?;
    } else if reader.read_bits(1)? == 0 {
        reader.read_bits(21)?;
    } else {
        return Err(QrError::SegmentParse);
    }
    Ok(())
}
