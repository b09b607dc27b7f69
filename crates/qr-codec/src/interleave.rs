//! Block splitting and codeword interleaving.
//!
//! Data codewords are split into blocks, short blocks first, each block gets
//! its own Reed-Solomon parity, and the transmitted stream emits data
//! column-by-column across blocks followed by parity column-by-column.

use crate::error::QrError;
use crate::reed_solomon::{rs_decode, rs_encode};
use crate::version::Capacity;

/// Splits `data` into blocks, appends per-block parity, and interleaves.
/// `data` must hold exactly the data codewords of the capacity.
pub fn interleave(data: &[u8], cap: &Capacity) -> Vec<u8> {
    assert_eq!(data.len(), cap.data_codewords(), "Illegal argument");

    let mut blocks: Vec<(&[u8], Vec<u8>)> = Vec::with_capacity(cap.num_blocks);
    let mut k = 0;
    for i in 0..cap.num_blocks {
        let datlen = cap.short_block_len + usize::from(i >= cap.short_blocks);
        let dat = &data[k..k + datlen];
        k += datlen;
        blocks.push((dat, rs_encode(dat, cap.words_per_block)));
    }

    let mut out = Vec::with_capacity(cap.total_codewords);
    for col in 0..cap.short_block_len + 1 {
        for (dat, _) in &blocks {
            // Short blocks have no codeword in the final data column
            if col < dat.len() {
                out.push(dat[col]);
            }
        }
    }
    for col in 0..cap.words_per_block {
        for (_, ecc) in &blocks {
            out.push(ecc[col]);
        }
    }
    out
}

/// Reverses the interleaving, Reed-Solomon-corrects every reconstructed
/// block, and concatenates the data portions.
pub fn deinterleave(stream: &[u8], cap: &Capacity) -> Result<Vec<u8>, QrError> {
    if stream.len() != cap.total_codewords {
        return Err(QrError::LayoutMismatch);
    }

    let block_len = |i: usize| cap.short_block_len + usize::from(i >= cap.short_blocks);
    let mut blocks: Vec<Vec<u8>> = (0..cap.num_blocks)
        .map(|i| Vec::with_capacity(block_len(i) + cap.words_per_block))
        .collect();

    let mut pos = 0;
    for col in 0..cap.short_block_len + 1 {
        for (i, block) in blocks.iter_mut().enumerate() {
            if col < block_len(i) {
                block.push(stream[pos]);
                pos += 1;
            }
        }
    }
    for _ in 0..cap.words_per_block {
        for block in blocks.iter_mut() {
            block.push(stream[pos]);
            pos += 1;
        }
    }
    debug_assert_eq!(pos, stream.len());

    let mut out = Vec::with_capacity(cap.data_codewords());
    for (i, block) in blocks.iter_mut().enumerate() {
        rs_decode(block, cap.words_per_block)?;
        out.extend_from_slice(&block[..block_len(i)]);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecc_level::EccLevel;
    use crate::version::Version;

    fn cap(v: u8, ecc: EccLevel) -> Capacity {
        Capacity::new(Version::new(v).unwrap(), ecc)
    }

    #[test]
    fn single_block_is_data_then_parity() {
        let cap = cap(1, EccLevel::Quartile);
        let data: Vec<u8> = (0..13).collect();
        let stream = interleave(&data, &cap);
        assert_eq!(stream.len(), 26);
        assert_eq!(&stream[..13], &data[..]);
        assert_eq!(&stream[13..], &rs_encode(&data, 13)[..]);
    }

    #[test]
    fn columns_rotate_across_blocks() {
        // Version 5-H: blocks of 11, 11, 12, 12 data codewords
        let cap = cap(5, EccLevel::High);
        let data: Vec<u8> = (0..46).collect();
        let stream = interleave(&data, &cap);
        // First column carries the first codeword of each block
        assert_eq!(&stream[0..4], &[0, 11, 22, 34]);
        // Final data column only exists in the two long blocks
        assert_eq!(&stream[44..46], &[33, 45]);
    }

    #[test]
    fn deinterleave_inverts_interleave() {
        for (v, ecc) in [
            (1, EccLevel::Low),
            (3, EccLevel::Medium),
            (5, EccLevel::High),
            (7, EccLevel::Quartile),
            (13, EccLevel::Medium),
        ] {
            let cap = cap(v, ecc);
            let data: Vec<u8> = (0..cap.data_codewords()).map(|i| (i * 37 + 11) as u8).collect();
            let stream = interleave(&data, &cap);
            assert_eq!(stream.len(), cap.total_codewords);
            assert_eq!(deinterleave(&stream, &cap).unwrap(), data, "v{v} {ecc:?}");
        }
    }

    #[test]
    fn deinterleave_corrects_scattered_errors() {
        let cap = cap(5, EccLevel::High);
        let data: Vec<u8> = (0..46).map(|i| (i * 101 + 7) as u8).collect();
        let mut stream = interleave(&data, &cap);
        // words_per_block = 22 corrects up to 11 errors per block
        for pos in [0usize, 9, 40, 77, 130] {
            stream[pos] ^= 0xA5;
        }
        assert_eq!(deinterleave(&stream, &cap).unwrap(), data);
    }

    #[test]
    fn wrong_stream_length_is_rejected() {
        let cap = cap(1, EccLevel::Low);
        assert_eq!(deinterleave(&[0u8; 10], &cap), Err(QrError::LayoutMismatch));
    }
}
