use crate::bit_buffer::BitBuffer;
use crate::bitmap::{Bitmap, Cell};
use crate::ecc_level::EccLevel;
use crate::error::QrError;
use crate::interleave::interleave;
use crate::layout::{build_template, zigzag};
use crate::mask::Mask;
use crate::penalty::penalty_score;
use crate::segment::Segment;
use crate::segment_mode::SegmentMode;
use crate::version::{Capacity, Version};

/// Encoder options. The defaults match `EncodeOptions::default()`: medium
/// error correction, automatic mode and version and mask, a two-module quiet
/// zone, unit scale, and the compact SVG path form.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Error correction level.
    pub ecc: EccLevel,
    /// Forces a segment mode instead of the automatic classifier.
    pub encoding: Option<SegmentMode>,
    /// Text-to-bytes hook for byte mode; UTF-8 when absent.
    pub text_encoder: Option<fn(&str) -> Vec<u8>>,
    /// Forces a version instead of the smallest that fits.
    pub version: Option<u8>,
    /// Forces a mask instead of the penalty-optimal choice.
    pub mask: Option<u8>,
    /// Quiet-zone width in modules.
    pub border: u32,
    /// Pixel scale applied by the renderers.
    pub scale: u32,
    /// Whether `to_svg` uses the single-path serialization.
    pub svg_optimize: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            ecc: EccLevel::Medium,
            encoding: None,
            text_encoder: None,
            version: None,
            mask: None,
            border: 2,
            scale: 1,
            svg_optimize: true,
        }
    }
}

/// Requested encoder output representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Raw,
    Ascii,
    Term,
    Gif,
    Svg,
}

/// One rendered symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Raw(Vec<Vec<bool>>),
    Ascii(String),
    Term(String),
    Gif(Vec<u8>),
    Svg(String),
}

/// An encoded QR Code symbol: the chosen parameters and the finished module
/// matrix, without quiet zone or scaling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCode {
    version: Version,
    ecc: EccLevel,
    mask: Mask,
    matrix: Bitmap,
}

impl QrCode {
    /// Encodes a text payload. The classifier picks the densest segment mode
    /// unless one is forced, the smallest fitting version is chosen unless
    /// one is forced, and the penalty-optimal mask is chosen unless one is
    /// forced.
    pub fn encode(text: &str, opts: &EncodeOptions) -> Result<Self, QrError> {
        let segment = Segment::make(text, opts.encoding, opts.text_encoder)?;
        Self::encode_segment(&segment, opts)
    }

    /// Encodes raw binary data in byte mode.
    pub fn encode_bytes(data: &[u8], opts: &EncodeOptions) -> Result<Self, QrError> {
        Self::encode_segment(&Segment::make_bytes(data), opts)
    }

    fn encode_segment(segment: &Segment, opts: &EncodeOptions) -> Result<Self, QrError> {
        let forced_mask = opts.mask.map(Mask::new).transpose()?;

        // Find the smallest version that fits, or validate the forced one.
        // Each failed trial records its overflow; the last one surfaces when
        // nothing fits.
        let versions: Vec<u8> = match opts.version {
            Some(v) => {
                Version::new(v)?;
                vec![v]
            }
            None => (Version::MIN.value()..=Version::MAX.value()).collect(),
        };
        let mut chosen: Option<(Version, Capacity)> = None;
        let mut last_overflow = QrError::CapacityOverflow { needed: 0, capacity: 0 };
        for v in versions {
            let ver = Version::new(v)?;
            let cap = Capacity::new(ver, opts.ecc);
            let needed = match segment.total_bits(ver) {
                Some(n) => n,
                None => {
                    // The character count does not fit the length field
                    last_overflow = QrError::CapacityOverflow {
                        needed: segment.data.len() + 4,
                        capacity: cap.data_bit_capacity,
                    };
                    continue;
                }
            };
            if needed <= cap.data_bit_capacity {
                chosen = Some((ver, cap));
                break;
            }
            last_overflow = QrError::CapacityOverflow {
                needed,
                capacity: cap.data_bit_capacity,
            };
        }
        let (version, cap) = chosen.ok_or(last_overflow)?;

        // Assemble the data bit stream: header, payload, terminator, byte
        // padding, then the alternating pad codewords.
        let mut bb = BitBuffer::new();
        bb.append_bits(segment.mode.mode_bits(), 4);
        bb.append_bits(segment.numchars as u32, segment.mode.char_count_bits(version));
        bb.0.extend_from_slice(&segment.data);
        let terminator = (cap.data_bit_capacity - bb.0.len()).min(4);
        bb.append_bits(0, terminator as u8);
        bb.append_bits(0, (bb.0.len().wrapping_neg() & 7) as u8);
        for &pad in [0xEC, 0x11].iter().cycle() {
            if bb.0.len() >= cap.data_bit_capacity {
                break;
            }
            bb.append_bits(pad, 8);
        }
        Self::encode_codewords(version, opts.ecc, &bb.to_bytes(), forced_mask)
    }

    /// Creates a QR Code from fully assembled data codewords (segment
    /// headers and padding included, error correction excluded). This is a
    /// low-level API; most callers want [`QrCode::encode`].
    pub fn encode_codewords(
        version: Version,
        ecc: EccLevel,
        data: &[u8],
        mask: Option<Mask>,
    ) -> Result<Self, QrError> {
        let cap = Capacity::new(version, ecc);
        if data.len() != cap.data_codewords() {
            return Err(QrError::CapacityOverflow {
                needed: data.len() * 8,
                capacity: cap.data_bit_capacity,
            });
        }
        let stream = interleave(data, &cap);

        // Score all eight masks on trial renders unless one is forced; ties
        // go to the lowest index.
        let mask = match mask {
            Some(m) => m,
            None => {
                let base = build_template(version, ecc, Mask::new(0)?, true)?;
                let mut best_mask = Mask::new(0)?;
                let mut best_score = u32::MAX;
                for i in 0..8 {
                    let mask = Mask::new(i)?;
                    let mut trial = base.clone();
                    place_data(&mut trial, &stream, mask)?;
                    let score = penalty_score(&trial);
                    if score < best_score {
                        best_score = score;
                        best_mask = mask;
                    }
                }
                best_mask
            }
        };

        let mut matrix = build_template(version, ecc, mask, false)?;
        place_data(&mut matrix, &stream, mask)?;
        matrix.assert_drawn()?;

        Ok(Self {
            version,
            ecc,
            mask,
            matrix,
        })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn error_correction_level(&self) -> EccLevel {
        self.ecc
    }

    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Side length in modules.
    pub fn size(&self) -> u32 {
        self.matrix.width()
    }

    /// The bare module matrix.
    pub fn matrix(&self) -> &Bitmap {
        &self.matrix
    }

    /// Whether the module at `(x, y)` is dark; out-of-bounds coordinates
    /// read light.
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && matches!(self.matrix.get(x, y), Ok(c) if c.is_dark())
    }

    /// The matrix with quiet zone and scaling applied.
    pub fn to_bitmap(&self, border: u32, scale: u32) -> Result<Bitmap, QrError> {
        self.matrix.border(border, Cell::Light).scale(scale)
    }
}

/// Encodes and renders in one step.
pub fn encode_to(text: &str, kind: OutputKind, opts: &EncodeOptions) -> Result<Output, QrError> {
    let qr = QrCode::encode(text, opts)?;
    let art = qr.to_bitmap(opts.border, opts.scale)?;
    Ok(match kind {
        OutputKind::Raw => Output::Raw(art.to_bools()),
        OutputKind::Ascii => Output::Ascii(art.to_ascii()),
        OutputKind::Term => Output::Term(art.to_term()),
        OutputKind::Gif => Output::Gif(art.to_gif()),
        OutputKind::Svg => Output::Svg(art.to_svg(opts.svg_optimize)),
    })
}

// Writes the interleaved stream along the zig-zag path, XORing every bit
// with the mask predicate. Cells past the stream (the 0-7 remainder bits)
// carry a masked zero.
fn place_data(template: &mut Bitmap, stream: &[u8], mask: Mask) -> Result<(), QrError> {
    let mut cells = Vec::new();
    zigzag(template, |x, y| cells.push((x, y)));
    let total_bits = stream.len() * 8;
    for (i, (x, y)) in cells.into_iter().enumerate() {
        let bit = i < total_bits && (stream[i >> 3] >> (7 - (i & 7))) & 1 != 0;
        let dark = bit ^ mask.is_inverted(x, y);
        template.set(x as i32, y as i32, Cell::from_dark(dark))?;
    }
    Ok(())
}
