//! Mask evaluation: the four ISO penalty rules, computed with the bit-plane
//! counters of [`Bitmap`].

use crate::bitmap::Bitmap;
use crate::{PENALTY_N1, PENALTY_N2, PENALTY_N3, PENALTY_N4};

// The two finder-like windows of rule 3: 1011101 with four light modules on
// one side. The leftmost module is the most significant bit.
const FINDER_WINDOWS: [u32; 2] = [0b10111010000, 0b00001011101];

/// Scores a fully drawn symbol. Lower is better; the encoder renders all
/// eight masks and keeps the minimum.
pub fn penalty_score(matrix: &Bitmap) -> u32 {
    let transposed = matrix.transpose();
    let mut score = 0;

    // Rule 1: same-color runs of length >= 5 in rows and columns
    score += run_penalty(matrix);
    score += run_penalty(&transposed);

    // Rule 2: monochrome 2x2 blocks
    for y in 0..matrix.height() as i32 {
        score += PENALTY_N2 * matrix.count_2x2_boxes(y).unwrap_or(0);
    }

    // Rule 3: finder-like windows in rows and columns
    for y in 0..matrix.height() as i32 {
        score += PENALTY_N3 * matrix.count_pattern_in_row(y, 11, &FINDER_WINDOWS).unwrap_or(0);
    }
    for y in 0..transposed.height() as i32 {
        score += PENALTY_N3 * transposed.count_pattern_in_row(y, 11, &FINDER_WINDOWS).unwrap_or(0);
    }

    // Rule 4: dark/light balance in 5% steps away from 50%
    let total = matrix.width() * matrix.height();
    let dark = matrix.popcount();
    score += PENALTY_N4 * ((20 * dark).abs_diff(10 * total) / total);

    score
}

fn run_penalty(matrix: &Bitmap) -> u32 {
    let mut score = 0;
    for y in 0..matrix.height() as i32 {
        let _ = matrix.get_runs(y, |len, _| {
            if len >= 5 {
                score += PENALTY_N1 + (len - 5);
            }
        });
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Cell;

    fn filled(size: u32, f: impl Fn(u32, u32) -> bool) -> Bitmap {
        let mut m = Bitmap::square(size);
        for y in 0..size {
            for x in 0..size {
                m.set(x as i32, y as i32, Cell::from_dark(f(x, y))).unwrap();
            }
        }
        m
    }

    #[test]
    fn checkerboard_scores_only_balance_free() {
        // Alternating cells: no runs, no boxes, no finder windows; dark count
        // of an odd board is off by one cell from half.
        let m = filled(21, |x, y| (x + y) % 2 == 0);
        assert_eq!(penalty_score(&m), 0);
    }

    #[test]
    fn solid_board_hits_rules_1_2_and_4() {
        let size = 11u32;
        let m = filled(size, |_, _| true);
        // Rule 1: one run of 11 per row and per column
        let r1 = 2 * size * (PENALTY_N1 + (size - 5));
        // Rule 2: every interior anchor
        let r2 = PENALTY_N2 * (size - 1) * (size - 1);
        // Rule 4: 100% dark is ten steps from 50%
        let r4 = PENALTY_N4 * 10;
        assert_eq!(penalty_score(&m), r1 + r2 + r4);
    }

    fn single_row(width: u32, darks: &[u32]) -> Bitmap {
        let mut m = Bitmap::new(width, 1);
        for x in 0..width {
            m.set(x as i32, 0, Cell::from_dark(darks.contains(&x))).unwrap();
        }
        m
    }

    #[test]
    fn run_rule_charges_three_plus_overflow() {
        // Runs of 5, 6 and 13 cost 3, 4 and 11; shorter runs cost nothing
        assert_eq!(run_penalty(&single_row(13, &[4, 5, 6, 7, 8])), 3);
        assert_eq!(run_penalty(&single_row(13, &[4, 5, 6, 7, 8, 9])), 4);
        assert_eq!(run_penalty(&single_row(13, &(0..13).collect::<Vec<_>>())), 11);
        assert_eq!(run_penalty(&single_row(9, &[0, 2, 4, 6, 8])), 0);
    }

    #[test]
    fn finder_window_costs_forty_per_sighting() {
        // One-row matrices keep the other rules inert, so the totals are
        // exact: 1011101 at x = 2 forms one trailing-light window.
        let with = single_row(21, &[2, 4, 5, 6, 8]);
        // R1: the 12-run of light costs 10; R3: one window; R4: 5/21 dark
        assert_eq!(penalty_score(&with), 10 + PENALTY_N3 + 50);
        // Shifting one module breaks the window and shortens the light run
        let without = single_row(21, &[2, 4, 5, 6, 9]);
        assert_eq!(penalty_score(&without), 9 + 50);
    }
}
