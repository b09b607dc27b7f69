//! Symbol layout: function-pattern placement, format and version BCH codes,
//! and the zig-zag data path.
//!
//! A template is a [`Bitmap`] in which every function module is drawn and
//! every data position is still unset; the unset cells are exactly the cells
//! the zig-zag walk visits.

use crate::bit_buffer::get_bit;
use crate::bitmap::{Bitmap, Cell};
use crate::ecc_level::EccLevel;
use crate::error::QrError;
use crate::mask::Mask;
use crate::version::Version;

/// The 15-bit format code: ecc and mask bits followed by BCH remainder,
/// XORed with the fixed masking constant.
pub fn format_code(ecc: EccLevel, mask: Mask) -> u32 {
    let data = u32::from(ecc.format_bits() << 3 | mask.value());
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * 0x537);
    }
    (data << 10 | rem) ^ 0x5412
}

/// The 18-bit version code for versions 7 and up.
pub fn version_code(ver: Version) -> u32 {
    let data = u32::from(ver.value());
    let mut rem = data;
    for _ in 0..12 {
        rem = (rem << 1) ^ ((rem >> 11) * 0x1F25);
    }
    data << 12 | rem
}

/// Builds a fresh template. With `test_mode` the format positions and the
/// dark module are reserved as light, so the template can carry trial data
/// for mask scoring without committing to format values.
pub fn build_template(
    ver: Version,
    ecc: EccLevel,
    mask: Mask,
    test_mode: bool,
) -> Result<Bitmap, QrError> {
    let size = ver.size();
    let mut m = Bitmap::square(size);

    // Finder patterns with their light separators. The separator strips are
    // drawn first; the 7x7 pattern then lands inside them.
    let finder = {
        let mut core = Bitmap::square(3);
        core.fill_rect(0, 0, 3, 3, Cell::Dark)?;
        core.border(1, Cell::Light).border(1, Cell::Dark)
    };
    for (fx, fy) in [(0i32, 0i32), (size as i32 - 7, 0), (0, size as i32 - 7)] {
        // The separator is the L-shaped light strip on the symbol-interior
        // sides of the finder.
        let sx = if fx == 0 { 0 } else { fx - 1 };
        let sy = if fy == 0 { 0 } else { fy - 1 };
        let col = if fx == 0 { 7 } else { fx - 1 };
        let row = if fy == 0 { 7 } else { fy - 1 };
        m.v_line(col, sy, 8, Cell::Light)?;
        m.h_line(sx, row, 8, Cell::Light)?;
        m.embed(fx, fy, &finder)?;
    }

    // Alignment patterns wherever the grid position is still free
    let align = {
        let mut core = Bitmap::square(1);
        core.set(0, 0, Cell::Dark)?;
        core.border(1, Cell::Light).border(1, Cell::Dark)
    };
    let positions = ver.alignment_positions();
    for &cy in &positions {
        for &cx in &positions {
            if !m.is_defined(cx as i32, cy as i32)? {
                m.embed(cx as i32 - 2, cy as i32 - 2, &align)?;
            }
        }
    }

    // Timing patterns fill whatever row 6 and column 6 have left
    for i in 0..size as i32 {
        let cell = Cell::from_dark(i % 2 == 0);
        if !m.is_defined(6, i)? {
            m.set(6, i, cell)?;
        }
        if !m.is_defined(i, 6)? {
            m.set(i, 6, cell)?;
        }
    }

    draw_format(&mut m, ecc, mask, test_mode)?;

    // Version information for version 7 and up: two 3x6 blocks
    if ver.value() >= 7 {
        let bits = version_code(ver);
        for i in 0..18i32 {
            let bit = Cell::from_dark(get_bit(bits, i));
            let a = size as i32 - 11 + i % 3;
            let b = i / 3;
            m.set(a, b, bit)?;
            m.set(b, a, bit)?;
        }
    }

    Ok(m)
}

// Draws both format copies and the dark module.
fn draw_format(
    m: &mut Bitmap,
    ecc: EccLevel,
    mask: Mask,
    test_mode: bool,
) -> Result<(), QrError> {
    let size = m.width() as i32;
    let bits = format_code(ecc, mask);
    let cell = |i: i32| {
        if test_mode {
            Cell::Light
        } else {
            Cell::from_dark(get_bit(bits, i))
        }
    };

    // First copy, wrapped around the top-left finder
    for i in 0..6 {
        m.set(8, i, cell(i))?;
    }
    m.set(8, 7, cell(6))?;
    m.set(8, 8, cell(7))?;
    m.set(7, 8, cell(8))?;
    for i in 9..15 {
        m.set(14 - i, 8, cell(i))?;
    }

    // Second copy, split between the top-right and bottom-left finders
    for i in 0..8 {
        m.set(size - 1 - i, 8, cell(i))?;
    }
    for i in 8..15 {
        m.set(8, size - 15 + i, cell(i))?;
    }

    // The dark module
    m.set(8, size - 8, if test_mode { Cell::Light } else { Cell::Dark })?;
    Ok(())
}

/// Walks the data path: column pairs from the right edge leftward, skipping
/// the vertical timing column, alternating upward and downward, visiting
/// only cells the template leaves unset.
pub fn zigzag(template: &Bitmap, mut visit: impl FnMut(u32, u32)) {
    let size = template.width() as i32;
    let mut right = size - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        for vert in 0..size {
            for j in 0..2 {
                let x = right - j;
                let upward = (right + 1) & 2 == 0;
                let y = if upward { size - 1 - vert } else { vert };
                if let Ok(false) = template.is_defined(x, y) {
                    visit(x as u32, y as u32);
                }
            }
        }
        right -= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: u8) -> Version {
        Version::new(n).unwrap()
    }

    fn template(ver: u8) -> Bitmap {
        build_template(v(ver), EccLevel::Medium, Mask::new(0).unwrap(), false).unwrap()
    }

    #[test]
    fn format_codes_keep_bch_distance() {
        let mut codes = Vec::new();
        for ecc in EccLevel::ALL {
            for msk in 0..8 {
                codes.push(format_code(ecc, Mask::new(msk).unwrap()));
            }
        }
        assert_eq!(codes.len(), 32);
        for (i, &a) in codes.iter().enumerate() {
            assert_eq!(a >> 15, 0);
            for &b in &codes[i + 1..] {
                assert!((a ^ b).count_ones() >= 7, "{a:015b} vs {b:015b}");
            }
        }
    }

    #[test]
    fn format_code_known_values() {
        // M / mask 0 reduces to the bare masking constant
        assert_eq!(format_code(EccLevel::Medium, Mask::new(0).unwrap()), 0x5412);
        // Published table entries
        assert_eq!(
            format_code(EccLevel::Low, Mask::new(7).unwrap()),
            0b110100101110110
        );
        assert_eq!(
            format_code(EccLevel::Quartile, Mask::new(2).unwrap()),
            0b011111100110001
        );
    }

    #[test]
    fn version_codes_keep_bch_distance() {
        let codes: Vec<u32> = (7..=40).map(|n| version_code(v(n))).collect();
        for (i, &a) in codes.iter().enumerate() {
            assert_eq!(a >> 18, 0);
            for &b in &codes[i + 1..] {
                assert!((a ^ b).count_ones() >= 8, "{a:018b} vs {b:018b}");
            }
        }
        // Published value for version 7
        assert_eq!(version_code(v(7)), 0b000111110010010100);
    }

    #[test]
    fn finder_corners_and_separators() {
        let t = template(1);
        // Center, ring and separator of the top-left finder
        assert_eq!(t.get(3, 3).unwrap(), Cell::Dark);
        assert_eq!(t.get(1, 1).unwrap(), Cell::Light);
        assert_eq!(t.get(0, 0).unwrap(), Cell::Dark);
        assert_eq!(t.get(7, 0).unwrap(), Cell::Light);
        assert_eq!(t.get(0, 7).unwrap(), Cell::Light);
        // Top-right and bottom-left mirrors
        assert_eq!(t.get(20, 0).unwrap(), Cell::Dark);
        assert_eq!(t.get(13, 0).unwrap(), Cell::Light);
        assert_eq!(t.get(0, 20).unwrap(), Cell::Dark);
        assert_eq!(t.get(0, 13).unwrap(), Cell::Light);
    }

    #[test]
    fn timing_alternates_between_finders() {
        let t = template(2);
        for i in 8..17 {
            assert_eq!(t.get(6, i).unwrap().is_dark(), i % 2 == 0, "col {i}");
            assert_eq!(t.get(i, 6).unwrap().is_dark(), i % 2 == 0, "row {i}");
        }
    }

    #[test]
    fn alignment_pattern_skips_finder_overlap() {
        let t = template(2);
        // Version 2 has one alignment pattern at (18, 18)
        assert_eq!(t.get(18, 18).unwrap(), Cell::Dark);
        assert_eq!(t.get(17, 17).unwrap(), Cell::Light);
        assert_eq!(t.get(16, 16).unwrap(), Cell::Dark);
        // The (6, 6) grid position collides with the finder and is skipped,
        // so the cell keeps its separator/finder value
        assert_eq!(t.get(6, 6).unwrap(), Cell::Dark);
    }

    #[test]
    fn dark_module_and_test_mode() {
        let t = template(1);
        assert_eq!(t.get(8, 13).unwrap(), Cell::Dark);
        let trial =
            build_template(v(1), EccLevel::Medium, Mask::new(3).unwrap(), true).unwrap();
        assert_eq!(trial.get(8, 13).unwrap(), Cell::Light);
        // Format positions are reserved but light
        assert_eq!(trial.get(8, 0).unwrap(), Cell::Light);
    }

    #[test]
    fn version_blocks_present_from_v7() {
        let t6 = template(6);
        let s6 = t6.width() as i32;
        assert_eq!(t6.get(s6 - 11, 0).unwrap(), Cell::Unset);
        let t7 = template(7);
        let s7 = t7.width() as i32;
        assert!(t7.get(s7 - 11, 0).unwrap().is_set());
        assert!(t7.get(0, s7 - 11).unwrap().is_set());
        // The two copies transpose onto each other
        let bits = version_code(v(7));
        for i in 0..18i32 {
            let a = s7 - 11 + i % 3;
            let b = i / 3;
            assert_eq!(t7.get(a, b).unwrap().is_dark(), get_bit(bits, i));
            assert_eq!(t7.get(b, a).unwrap().is_dark(), get_bit(bits, i));
        }
    }

    #[test]
    fn zigzag_covers_exactly_the_unset_cells() {
        for ver in [1u8, 2, 7] {
            let t = template(ver);
            let mut visited = Vec::new();
            zigzag(&t, |x, y| visited.push((x, y)));
            let mut unset = 0;
            for y in 0..t.height() as i32 {
                for x in 0..t.width() as i32 {
                    if !t.is_defined(x, y).unwrap() {
                        unset += 1;
                    }
                }
            }
            assert_eq!(visited.len(), unset, "v{ver}");
            // No duplicates and nothing in the timing column
            let mut sorted = visited.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), visited.len());
            assert!(visited.iter().all(|&(x, _)| x != 6));
        }
    }

    #[test]
    fn zigzag_starts_bottom_right_and_rises() {
        let t = template(1);
        let mut first = Vec::new();
        zigzag(&t, |x, y| {
            if first.len() < 4 {
                first.push((x, y));
            }
        });
        assert_eq!(first, vec![(20, 20), (19, 20), (20, 19), (19, 19)]);
    }
}
