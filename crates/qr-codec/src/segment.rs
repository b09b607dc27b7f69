use crate::bit_buffer::BitBuffer;
use crate::error::QrError;
use crate::segment_mode::SegmentMode;
use crate::version::Version;
use crate::ALPHANUMERIC_CHARSET;

/// A segment of character or binary data in a QR Code symbol.
///
/// This library encodes exactly one segment per payload: the classifier
/// picks the densest mode whose alphabet covers the whole text, and never
/// splits the text to mix modes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    // The mode indicator of this segment.
    pub mode: SegmentMode,

    // The length of the unencoded data, in characters for numeric and
    // alphanumeric mode and in bytes for byte mode.
    pub numchars: usize,

    // The data bits of this segment.
    pub data: Vec<bool>,
}

impl Segment {
    /*---- Static factory functions ----*/

    /// Returns a segment representing the given binary data in byte mode.
    pub fn make_bytes(data: &[u8]) -> Self {
        let mut bb = BitBuffer(Vec::with_capacity(data.len() * 8));
        for &b in data {
            bb.append_bits(u32::from(b), 8);
        }
        Segment::new(SegmentMode::Byte, data.len(), bb.0)
    }

    /// Returns a segment representing the given string of decimal digits in
    /// numeric mode: triplets in 10 bits, a trailing pair in 7, a trailing
    /// digit in 4.
    pub fn make_numeric(text: &str) -> Result<Self, QrError> {
        let mut bb = BitBuffer(Vec::with_capacity(text.len() * 3 + (text.len() + 2) / 3));
        let mut accumdata: u32 = 0;
        let mut accumcount: u8 = 0;
        for b in text.bytes() {
            if !b.is_ascii_digit() {
                return Err(QrError::InvalidEncoding);
            }
            accumdata = accumdata * 10 + u32::from(b - b'0');
            accumcount += 1;
            if accumcount == 3 {
                bb.append_bits(accumdata, 10);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            // 1 or 2 digits remaining
            bb.append_bits(accumdata, accumcount * 3 + 1);
        }
        Ok(Segment::new(SegmentMode::Numeric, text.len(), bb.0))
    }

    /// Returns a segment representing the given text in alphanumeric mode:
    /// pairs as `45 * a + b` in 11 bits, a trailing singleton in 6.
    pub fn make_alphanumeric(text: &str) -> Result<Self, QrError> {
        let mut bb = BitBuffer(Vec::with_capacity(text.len() * 5 + (text.len() + 1) / 2));
        let mut accumdata: u32 = 0;
        let mut accumcount: u32 = 0;
        for c in text.chars() {
            let i = ALPHANUMERIC_CHARSET.find(c).ok_or(QrError::InvalidEncoding)?;
            accumdata = accumdata * 45 + i as u32;
            accumcount += 1;
            if accumcount == 2 {
                bb.append_bits(accumdata, 11);
                accumdata = 0;
                accumcount = 0;
            }
        }
        if accumcount > 0 {
            // 1 character remaining
            bb.append_bits(accumdata, 6);
        }
        Ok(Segment::new(SegmentMode::Alphanumeric, text.len(), bb.0))
    }

    /// Builds the single segment for the given text. Without a forced mode
    /// the classifier applies: all digits use numeric, otherwise the
    /// 45-character set uses alphanumeric, otherwise byte mode over the
    /// encoded bytes (`text_encoder`, defaulting to UTF-8).
    pub fn make(
        text: &str,
        forced: Option<SegmentMode>,
        text_encoder: Option<fn(&str) -> Vec<u8>>,
    ) -> Result<Self, QrError> {
        let to_bytes = |t: &str| match text_encoder {
            Some(f) => f(t),
            None => t.as_bytes().to_vec(),
        };
        match forced {
            Some(SegmentMode::Numeric) => Segment::make_numeric(text),
            Some(SegmentMode::Alphanumeric) => Segment::make_alphanumeric(text),
            Some(SegmentMode::Byte) => Ok(Segment::make_bytes(&to_bytes(text))),
            Some(mode @ (SegmentMode::Kanji | SegmentMode::Eci)) => {
                Err(QrError::UnsupportedMode(mode.mode_bits() as u8))
            }
            None => {
                if Segment::is_numeric(text) {
                    Segment::make_numeric(text)
                } else if Segment::is_alphanumeric(text) {
                    Segment::make_alphanumeric(text)
                } else {
                    Ok(Segment::make_bytes(&to_bytes(text)))
                }
            }
        }
    }

    fn new(mode: SegmentMode, numchars: usize, data: Vec<bool>) -> Self {
        Self {
            mode,
            numchars,
            data,
        }
    }

    /*---- Other functions ----*/

    /// The number of bits this segment occupies at the given version:
    /// mode indicator, length field, payload. `None` when the character
    /// count does not fit the length field.
    pub fn total_bits(&self, version: Version) -> Option<usize> {
        let ccbits = self.mode.char_count_bits(version);
        if self.numchars >= (1usize << ccbits) {
            return None;
        }
        Some(4 + usize::from(ccbits) + self.data.len())
    }

    /// Tests whether every character is a decimal digit.
    pub fn is_numeric(text: &str) -> bool {
        text.chars().all(|c| c.is_ascii_digit())
    }

    /// Tests whether every character is in the 45-character alphanumeric set.
    pub fn is_alphanumeric(text: &str) -> bool {
        text.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c))
    }
}
