//! Encodes and decodes QR Code symbols, as per the QR Code Model 2 standard.
//!
//! The encoder turns a text payload into a two-color module matrix and
//! renders it as raw booleans, Unicode half-block art, ANSI terminal escapes,
//! an uncompressed GIF, or an SVG document. The decoder recovers the text
//! from a raster of RGB/RGBA pixels: adaptive binarization, finder and
//! alignment pattern detection, perspective rectification, and the reverse
//! of the symbol layout.
//!
//! Both directions support all 40 versions and all 4 error correction
//! levels. Payloads are encoded as a single numeric, alphanumeric, or byte
//! segment; kanji and ECI segments are recognized on decode but never
//! produced.
//!
//! # Examples
//!
//! Simple operation:
//!
//! ```
//! use qr_codec::{encode_to, EncodeOptions, OutputKind, Output};
//!
//! let out = encode_to("Hello, world!", OutputKind::Ascii, &EncodeOptions::default()).unwrap();
//! if let Output::Ascii(art) = out {
//!     println!("{art}");
//! }
//! ```
//!
//! Manual operation:
//!
//! ```
//! use qr_codec::{decode_matrix, DecodeOptions, EccLevel, EncodeOptions, QrCode};
//!
//! let qr = QrCode::encode(
//!     "3141592653589793238462643383",
//!     &EncodeOptions { ecc: EccLevel::High, version: Some(5), mask: Some(2), ..Default::default() },
//! )
//! .unwrap();
//! let text = decode_matrix(qr.matrix(), &DecodeOptions::default()).unwrap();
//! assert_eq!(text, "3141592653589793238462643383");
//! ```

// The set of all legal characters in alphanumeric mode,
// where each character value maps to the index in the string.
pub static ALPHANUMERIC_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

mod binarize;
mod bit_buffer;
mod bitmap;
mod decode;
mod detect;
mod ecc_level;
mod encode;
mod error;
pub mod gf;
mod interleave;
mod layout;
mod mask;
mod penalty;
mod perspective;
mod reed_solomon;
mod render;
mod segment;
mod segment_mode;
mod version;

pub use binarize::*;
pub use bit_buffer::*;
pub use bitmap::*;
pub use decode::*;
pub use detect::*;
pub use ecc_level::*;
pub use encode::*;
pub use error::*;
pub use interleave::*;
pub use layout::*;
pub use mask::*;
pub use penalty::*;
pub use perspective::*;
pub use reed_solomon::*;
pub use segment::*;
pub use segment_mode::*;
pub use version::*;

/*---- Constants and tables ----*/

// For use in penalty_score(), when evaluating which mask is best.
pub const PENALTY_N1: u32 = 3;
pub const PENALTY_N2: u32 = 3;
pub const PENALTY_N3: u32 = 40;
pub const PENALTY_N4: u32 = 10;

pub static ECC_CODEWORDS_PER_BLOCK: [[i8; 41]; 4] = [
    // Version: (note that index 0 is for padding, and is set to an illegal value)
    //0,  1,  2,  3,  4,  5,  6,  7,  8,  9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40    Error correction level
    [
        -1, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Low
    [
        -1, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // Medium
    [
        -1, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Quartile
    [
        -1, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // High
];

pub static NUM_ERROR_CORRECTION_BLOCKS: [[i8; 41]; 4] = [
    // Version: (note that index 0 is for padding, and is set to an illegal value)
    //0, 1, 2, 3, 4, 5, 6, 7, 8, 9,10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40    Error correction level
    [
        -1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // Low
    [
        -1, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // Medium
    [
        -1, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Quartile
    [
        -1, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // High
];
