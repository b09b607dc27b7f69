use thiserror::Error;

/// The error type for every fallible operation in this crate.
///
/// All failures surface at the entry call; no operation returns a partial
/// result. Encoder version auto-selection catches `CapacityOverflow` per
/// trial version and advances, surfacing the last capture only when no
/// version fits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QrError {
    #[error("version out of range: {0} (expected 1..=40)")]
    InvalidVersion(u8),

    #[error("mask index out of range: {0} (expected 0..=7)")]
    InvalidMask(u8),

    #[error("error correction code out of range: {0} (expected 0..=3)")]
    InvalidEcc(u8),

    #[error("payload cannot be represented in the requested segment mode")]
    InvalidEncoding,

    #[error("segment mode {0:#06b} is recognized but not supported")]
    UnsupportedMode(u8),

    #[error("data length = {needed} bits, capacity = {capacity} bits")]
    CapacityOverflow { needed: usize, capacity: usize },

    #[error("coordinate or size out of bounds")]
    OutOfBounds,

    #[error("image {width}x{height} is below the 40px minimum")]
    ImageTooSmall { width: usize, height: usize },

    #[error("pixel buffer is not 3 or 4 bytes per pixel")]
    UnknownPixelFormat,

    #[error("could not locate three finder patterns")]
    FinderNotFound,

    #[error("could not locate the alignment pattern")]
    AlignmentNotFound,

    #[error("format information unrecoverable (> 3 bit errors)")]
    WrongFormatPattern,

    #[error("version information unrecoverable (> 3 bit errors)")]
    WrongVersionPattern,

    #[error("Reed-Solomon decoding failed, too many errors")]
    RsUndecodable,

    #[error("module layout violates a drawing invariant")]
    LayoutMismatch,

    #[error("bit stream ended mid-segment or contained an unknown mode")]
    SegmentParse,
}
