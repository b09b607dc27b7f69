use crate::error::QrError;
use crate::version::Version;

/// Describes how a segment's data bits are interpreted.
///
/// Kanji and ECI are recognized on the wire but rejected by the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
    Eci,
}

impl SegmentMode {
    // The 4-bit mode indicator.
    pub fn mode_bits(self) -> u32 {
        use SegmentMode::*;
        match self {
            Numeric => 0x1,
            Alphanumeric => 0x2,
            Byte => 0x4,
            Kanji => 0x8,
            Eci => 0x7,
        }
    }

    /// Maps a 4-bit mode indicator back to a mode.
    pub fn from_mode_bits(bits: u32) -> Result<Self, QrError> {
        use SegmentMode::*;
        match bits {
            0x1 => Ok(Numeric),
            0x2 => Ok(Alphanumeric),
            0x4 => Ok(Byte),
            0x8 => Ok(Kanji),
            0x7 => Ok(Eci),
            _ => Err(QrError::SegmentParse),
        }
    }

    // Bit width of the character count field at the given version; the three
    // columns are the size classes 1-9, 10-26, 27-40.
    pub fn char_count_bits(self, ver: Version) -> u8 {
        use SegmentMode::*;
        (match self {
            Numeric => [10, 12, 14],
            Alphanumeric => [9, 11, 13],
            Byte => [8, 16, 16],
            Kanji => [8, 10, 12],
            Eci => [0, 0, 0],
        })[usize::from((ver.value() + 7) / 17)]
    }
}
