use crate::ecc_level::EccLevel;
use crate::error::QrError;
use crate::{ECC_CODEWORDS_PER_BLOCK, NUM_ERROR_CORRECTION_BLOCKS};

/// A symbol version, a number between 1 and 40 (inclusive).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version(u8);

impl Version {
    pub const MIN: Version = Version(1);
    pub const MAX: Version = Version(40);

    /// Creates a version object, rejecting numbers outside 1..=40.
    pub fn new(ver: u8) -> Result<Self, QrError> {
        if (Version::MIN.0..=Version::MAX.0).contains(&ver) {
            Ok(Self(ver))
        } else {
            Err(QrError::InvalidVersion(ver))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Module side length, `21 + 4 * (v - 1)`, in the range [21, 177].
    pub fn size(self) -> u32 {
        21 + 4 * (u32::from(self.0) - 1)
    }

    /// The version whose symbol has the given side length.
    pub fn from_size(size: u32) -> Result<Self, QrError> {
        if size < 21 || size > 177 || size % 4 != 1 {
            return Err(QrError::InvalidVersion(0));
        }
        Version::new(((size - 17) / 4) as u8)
    }

    // Number of data modules available after all function patterns are
    // excluded, including the 0-7 remainder bits.
    fn num_raw_data_modules(self) -> usize {
        let ver = usize::from(self.0);
        let mut result: usize = (16 * ver + 128) * ver + 64;
        if ver >= 2 {
            let numalign: usize = ver / 7 + 2;
            result -= (25 * numalign - 10) * numalign - 55;
            if ver >= 7 {
                result -= 36;
            }
        }
        result
    }

    /// Ascending center coordinates of the alignment pattern grid, used on
    /// both axes. Empty for version 1.
    pub fn alignment_positions(self) -> Vec<u32> {
        let ver = self.0;
        if ver == 1 {
            return Vec::new();
        }
        let numalign = u32::from(ver) / 7 + 2;
        let step: u32 = if ver == 32 {
            26
        } else {
            (u32::from(ver) * 4 + numalign * 2 + 1) / (numalign * 2 - 2) * 2
        };
        let mut result: Vec<u32> = (0..numalign - 1).map(|i| self.size() - 7 - i * step).collect();
        result.push(6);
        result.reverse();
        result
    }
}

/// Codeword and block geometry for one `(version, ecc)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    /// Error correction codewords per block.
    pub words_per_block: usize,
    /// Total number of blocks.
    pub num_blocks: usize,
    /// Number of blocks carrying one data codeword fewer.
    pub short_blocks: usize,
    /// Data codewords in a short block; long blocks carry one more.
    pub short_block_len: usize,
    /// Payload capacity in bits (data codewords times eight).
    pub data_bit_capacity: usize,
    /// Data plus error correction codewords.
    pub total_codewords: usize,
}

impl Capacity {
    pub fn new(ver: Version, ecc: EccLevel) -> Self {
        let words_per_block =
            ECC_CODEWORDS_PER_BLOCK[ecc.ordinal()][usize::from(ver.value())] as usize;
        let num_blocks =
            NUM_ERROR_CORRECTION_BLOCKS[ecc.ordinal()][usize::from(ver.value())] as usize;
        let total_codewords = ver.num_raw_data_modules() / 8;
        let data_codewords = total_codewords - words_per_block * num_blocks;
        Self {
            words_per_block,
            num_blocks,
            short_blocks: num_blocks - data_codewords % num_blocks,
            short_block_len: data_codewords / num_blocks,
            data_bit_capacity: data_codewords * 8,
            total_codewords,
        }
    }

    /// Data codewords across all blocks.
    pub fn data_codewords(&self) -> usize {
        self.data_bit_capacity / 8
    }
}
