//! Finder and alignment pattern detection over a binarized matrix.
//!
//! Rows are scanned with run-length windows; candidates are verified by
//! vertical, horizontal and diagonal cross-checks and merged into
//! count-weighted hits. Three confirmed hits forming a near-isoceles right
//! triangle become the symbol corners.

use crate::bitmap::Bitmap;
use crate::error::QrError;

// Relative run lengths of a finder cross-section, dark-light-dark-light-dark.
const FINDER_RUNS: [f64; 5] = [1.0, 1.0, 3.0, 1.0, 1.0];

/// A detected pattern center. Merged hits average their coordinates weighted
/// by how many scan lines confirmed them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternHit {
    pub x: f64,
    pub y: f64,
    pub module_size: f64,
    pub count: u32,
}

impl PatternHit {
    // Two hits are the same pattern when both coordinate deltas stay within
    // one module and the module sizes differ by at most one (or by at most
    // the smaller size).
    fn about_equals(&self, x: f64, y: f64, module_size: f64) -> bool {
        let dm = (self.module_size - module_size).abs();
        (self.x - x).abs() <= self.module_size
            && (self.y - y).abs() <= self.module_size
            && (dm <= 1.0 || dm <= self.module_size.min(module_size))
    }

    fn merge(&mut self, x: f64, y: f64, module_size: f64) {
        let c = self.count as f64;
        self.x = (self.x * c + x) / (c + 1.0);
        self.y = (self.y * c + y) / (c + 1.0);
        self.module_size = (self.module_size * c + module_size) / (c + 1.0);
        self.count += 1;
    }
}

// Dark probe; None outside the matrix.
fn dark(bm: &Bitmap, x: i64, y: i64) -> Option<bool> {
    if x < 0 || y < 0 || x >= i64::from(bm.width()) || y >= i64::from(bm.height()) {
        return None;
    }
    Some(matches!(bm.get(x as i32, y as i32), Ok(c) if c.is_dark()))
}

// Checks five run lengths against the 1:1:3:1:1 profile. Each run may
// deviate from its expected length by at most expected / variance. Returns
// the module size.
fn check_ratio(counts: &[u32; 5], variance: f64) -> Option<f64> {
    let total: u32 = counts.iter().sum();
    if total < 7 {
        return None;
    }
    let m = f64::from(total) / 7.0;
    let allowed = m / variance;
    for (i, &c) in counts.iter().enumerate() {
        if (f64::from(c) - FINDER_RUNS[i] * m).abs() > FINDER_RUNS[i] * allowed {
            return None;
        }
    }
    Some(m)
}

// Walks the five runs of a finder cross-section along one line through a
// point known to be inside the center run. `get` maps a line offset to a
// dark probe; `start` must be dark. Outer runs are capped at `max_count`
// cells, and when `original_total` is given the five-run total may not
// deviate from it by more than 40%. Returns the center offset and the total.
fn cross_check_line(
    get: impl Fn(i64) -> Option<bool>,
    start: i64,
    max_count: u32,
    original_total: Option<u32>,
    variance: f64,
) -> Option<(f64, u32)> {
    let mut counts = [0u32; 5];

    // Center run, then light, then dark, moving toward negative offsets
    let mut i = start;
    while get(i) == Some(true) {
        counts[2] += 1;
        i -= 1;
    }
    get(i)?; // The pattern cannot touch the edge mid-run
    while get(i) == Some(false) && counts[1] <= max_count {
        counts[1] += 1;
        i -= 1;
    }
    if counts[1] > max_count {
        return None;
    }
    while get(i) == Some(true) && counts[0] <= max_count {
        counts[0] += 1;
        i -= 1;
    }
    if counts[0] == 0 || counts[0] > max_count {
        return None;
    }
    let top = i; // One before the outermost dark cell

    // The same three runs toward positive offsets
    let mut i = start + 1;
    while get(i) == Some(true) {
        counts[2] += 1;
        i += 1;
    }
    get(i)?;
    while get(i) == Some(false) && counts[3] <= max_count {
        counts[3] += 1;
        i += 1;
    }
    if counts[3] > max_count {
        return None;
    }
    while get(i) == Some(true) && counts[4] <= max_count {
        counts[4] += 1;
        i += 1;
    }
    if counts[4] == 0 || counts[4] > max_count {
        return None;
    }

    let total: u32 = counts.iter().sum();
    // Reject when this direction's total deviates from the originating
    // direction by more than 40%
    if let Some(original) = original_total {
        if 5 * total.abs_diff(original) >= 2 * original {
            return None;
        }
    }
    check_ratio(&counts, variance)?;
    // Center of the middle run, measured from the outer end
    let center_top = top + 1 + i64::from(counts[0]) + i64::from(counts[1]);
    Some((center_top as f64 + f64::from(counts[2]) / 2.0, total))
}

// Validates the diagonal through a candidate center; only the ratio is
// checked, with the tighter variance.
fn cross_check_diagonal(bm: &Bitmap, cx: i64, cy: i64, max_count: u32) -> bool {
    let get = |i: i64| dark(bm, cx + i, cy + i);
    cross_check_line(get, 0, 2 * max_count, None, 4.0 / 3.0).is_some()
}

fn verify_candidate(bm: &Bitmap, center_x: i64, y: u32, counts: &[u32; 5]) -> Option<(f64, f64, f64)> {
    let max_count = counts[2];
    let original_total: u32 = counts.iter().sum();
    let (cy, _) = cross_check_line(
        |i| dark(bm, center_x, i),
        i64::from(y),
        max_count,
        Some(original_total),
        2.0,
    )?;
    let (cx, horiz_total) = cross_check_line(
        |i| dark(bm, i, cy as i64),
        center_x,
        max_count,
        Some(original_total),
        2.0,
    )?;
    if !cross_check_diagonal(bm, cx as i64, cy as i64, max_count) {
        return None;
    }
    Some((cx, cy, f64::from(horiz_total) / 7.0))
}

// Maximal constant-color runs of one row with their start columns.
fn row_runs(bm: &Bitmap, y: u32) -> Vec<(u32, u32, bool)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let _ = bm.get_runs(y as i32, |len, value| {
        runs.push((start, len, value));
        start += len;
    });
    runs
}

fn confirmed(hits: &[PatternHit]) -> Vec<PatternHit> {
    hits.iter().filter(|h| h.count >= 2).copied().collect()
}

// True once three confirmed hits agree on module size within 5% of the
// total, the scan termination condition.
fn have_consistent_centers(hits: &[PatternHit]) -> bool {
    let sure = confirmed(hits);
    if sure.len() < 3 {
        return false;
    }
    let total: f64 = sure.iter().map(|h| h.module_size).sum();
    let mean = total / sure.len() as f64;
    sure.iter().all(|h| (h.module_size - mean).abs() <= 0.05 * total)
}

/// Locates the three finder patterns and returns them ordered top-left,
/// top-right, bottom-left (mirrored images are flipped back).
pub fn find_finder_patterns(bm: &Bitmap) -> Result<[PatternHit; 3], QrError> {
    let height = bm.height();
    let mut y_skip = (3 * height / (4 * 97)).max(3);
    let mut hits: Vec<PatternHit> = Vec::new();
    let mut has_skipped = false;

    let mut y = y_skip - 1;
    'rows: while y < height {
        let runs = row_runs(bm, y);
        for w in runs.windows(5) {
            if !w[0].2 {
                continue; // Window must start dark; runs alternate from there
            }
            let counts = [w[0].1, w[1].1, w[2].1, w[3].1, w[4].1];
            if check_ratio(&counts, 2.0).is_none() {
                continue;
            }
            // Estimated center: middle of the third run
            let center_x = i64::from(w[2].0) + i64::from(w[2].1) / 2;
            let Some((cx, cy, module)) = verify_candidate(bm, center_x, y, &counts) else {
                continue;
            };
            match hits.iter_mut().find(|h| h.about_equals(cx, cy, module)) {
                Some(hit) => hit.merge(cx, cy, module),
                None => hits.push(PatternHit {
                    x: cx,
                    y: cy,
                    module_size: module,
                    count: 1,
                }),
            }
            y_skip = 2;
            if have_consistent_centers(&hits) {
                break 'rows;
            }
            // With two confirmed corners, jump ahead roughly to where the
            // remaining one can be
            let sure = confirmed(&hits);
            if !has_skipped && sure.len() == 2 {
                let gap = (sure[0].x - sure[1].x).abs() - (sure[0].y - sure[1].y).abs();
                if gap > 2.0 * y_skip as f64 {
                    has_skipped = true;
                    y += gap as u32 / 2;
                    continue 'rows;
                }
            }
        }
        y += y_skip;
    }

    let candidates = confirmed(&hits);
    if candidates.len() < 3 {
        return Err(QrError::FinderNotFound);
    }
    let triple = select_triple(&candidates)?;
    Ok(order_triple(triple))
}

// Picks the triple whose pairwise squared distances best match a right
// isoceles triangle, filtering grossly mismatched module sizes.
fn select_triple(candidates: &[PatternHit]) -> Result<[PatternHit; 3], QrError> {
    let d2 = |a: &PatternHit, b: &PatternHit| {
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        dx * dx + dy * dy
    };
    let mut best: Option<([PatternHit; 3], f64)> = None;
    for i in 0..candidates.len() {
        for j in i + 1..candidates.len() {
            for k in j + 1..candidates.len() {
                let (p, q, r) = (&candidates[i], &candidates[j], &candidates[k]);
                let min_m = p.module_size.min(q.module_size).min(r.module_size);
                let max_m = p.module_size.max(q.module_size).max(r.module_size);
                if max_m > 1.4 * min_m {
                    continue;
                }
                let mut dists = [d2(p, q), d2(p, r), d2(q, r)];
                dists.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let [a, b, c] = dists;
                let score = (c - 2.0 * b).abs() + (c - 2.0 * a).abs();
                if best.as_ref().map_or(true, |(_, s)| score < *s) {
                    best = Some(([*p, *q, *r], score));
                }
            }
        }
    }
    best.map(|(t, _)| t).ok_or(QrError::FinderNotFound)
}

// Names the corners: the hypotenuse joins top-right and bottom-left, and a
// negative cross product means the image is mirrored, so the two are swapped.
fn order_triple(t: [PatternHit; 3]) -> [PatternHit; 3] {
    let d2 = |a: &PatternHit, b: &PatternHit| {
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        dx * dx + dy * dy
    };
    let d01 = d2(&t[0], &t[1]);
    let d02 = d2(&t[0], &t[2]);
    let d12 = d2(&t[1], &t[2]);
    let (tl, mut tr, mut bl) = if d01 >= d02 && d01 >= d12 {
        (t[2], t[0], t[1])
    } else if d02 >= d01 && d02 >= d12 {
        (t[1], t[0], t[2])
    } else {
        (t[0], t[1], t[2])
    };
    let cross = (tr.x - tl.x) * (bl.y - tl.y) - (tr.y - tl.y) * (bl.x - tl.x);
    if cross < 0.0 {
        std::mem::swap(&mut tr, &mut bl);
    }
    [tl, tr, bl]
}

/// Searches for the bottom-right alignment pattern around `(est_x, est_y)`,
/// expanding the window through 4, 8 and 16 module sizes.
pub fn find_alignment(
    bm: &Bitmap,
    est_x: f64,
    est_y: f64,
    module_size: f64,
) -> Result<PatternHit, QrError> {
    for factor in [4.0, 8.0, 16.0] {
        let half = factor * module_size / 2.0;
        let x0 = ((est_x - half).floor().max(0.0)) as i64;
        let x1 = ((est_x + half).ceil().min(f64::from(bm.width()) - 1.0)) as i64;
        let y0 = ((est_y - half).floor().max(0.0)) as i64;
        let y1 = ((est_y + half).ceil().min(f64::from(bm.height()) - 1.0)) as i64;
        if x0 >= x1 || y0 >= y1 {
            continue;
        }
        if let Some(hit) = scan_alignment_window(bm, x0, x1, y0, y1, module_size) {
            return Ok(hit);
        }
    }
    Err(QrError::AlignmentNotFound)
}

// Scans window rows middle-out for the light-dark-light column profile of
// an alignment pattern.
fn scan_alignment_window(
    bm: &Bitmap,
    x0: i64,
    x1: i64,
    y0: i64,
    y1: i64,
    module: f64,
) -> Option<PatternHit> {
    let mid_x = (x0 + x1) as f64 / 2.0;
    let mid_y = (y0 + y1) / 2;
    let mut hits: Vec<PatternHit> = Vec::new();
    let height = y1 - y0 + 1;
    for step in 0..height {
        // mid, mid+1, mid-1, mid+2, ...
        let offset = (step + 1) / 2 * if step % 2 == 1 { 1 } else { -1 };
        let y = mid_y + offset;
        if y < y0 || y > y1 {
            continue;
        }
        for (cx, dark_len) in alignment_row_candidates(bm, x0, x1, y, module) {
            let Some((cy, v_len)) = alignment_vertical_check(bm, cx, y, module) else {
                continue;
            };
            let size = (dark_len + v_len) / 2.0;
            match hits.iter_mut().find(|h| h.about_equals(cx, cy, size)) {
                Some(hit) => {
                    hit.merge(cx, cy, size);
                    if hit.count >= 2 {
                        return Some(*hit);
                    }
                }
                None => hits.push(PatternHit {
                    x: cx,
                    y: cy,
                    module_size: size,
                    count: 1,
                }),
            }
        }
    }
    // No double confirmation: fall back to the candidate nearest the
    // window center
    hits.into_iter().min_by(|a, b| {
        let da = (a.x - mid_x).abs() + (a.y - mid_y as f64).abs();
        let db = (b.x - mid_x).abs() + (b.y - mid_y as f64).abs();
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    })
}

// (center x, dark run length) of every plausible light-dark-light triple in
// the row slice.
fn alignment_row_candidates(bm: &Bitmap, x0: i64, x1: i64, y: i64, module: f64) -> Vec<(f64, f64)> {
    let fits = |len: u32| (f64::from(len) - module).abs() <= module / 2.0;
    let mut out = Vec::new();
    // Run-length encode the slice
    let mut runs: Vec<(i64, u32, bool)> = Vec::new();
    for x in x0..=x1 {
        let Some(d) = dark(bm, x, y) else { continue };
        match runs.last_mut() {
            Some((_, len, value)) if *value == d => *len += 1,
            _ => runs.push((x, 1, d)),
        }
    }
    for w in runs.windows(3) {
        let ((_, l0, d0), (start, l1, d1), (_, l2, _)) = (w[0], w[1], w[2]);
        if d0 || !d1 {
            continue;
        }
        if fits(l0) && fits(l1) && fits(l2) {
            out.push((start as f64 + f64::from(l1) / 2.0, f64::from(l1)));
        }
    }
    out
}

// Verifies the vertical light-dark-light profile through a candidate and
// returns the refined center y and the dark run length.
fn alignment_vertical_check(bm: &Bitmap, cx: f64, y: i64, module: f64) -> Option<(f64, f64)> {
    let x = cx as i64;
    if dark(bm, x, y) != Some(true) {
        return None;
    }
    let cap = (2.0 * module) as i64 + 2;
    let mut top = y;
    while dark(bm, x, top - 1) == Some(true) && y - top < cap {
        top -= 1;
    }
    let mut bottom = y;
    while dark(bm, x, bottom + 1) == Some(true) && bottom - y < cap {
        bottom += 1;
    }
    let run = (bottom - top + 1) as f64;
    if (run - module).abs() > module / 2.0 {
        return None;
    }
    // One light module on each side
    let probe = (module / 2.0).max(1.0) as i64;
    for i in 1..=probe {
        if dark(bm, x, top - i) != Some(false) || dark(bm, x, bottom + i) != Some(false) {
            return None;
        }
    }
    Some(((top + bottom) as f64 / 2.0 + 0.5, run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Cell;

    // Stamps a scaled finder pattern whose top-left module corner is (x, y)
    fn stamp_finder(bm: &mut Bitmap, x: u32, y: u32, scale: u32) {
        for dy in 0..7u32 {
            for dx in 0..7u32 {
                let chebyshev = (dx as i32 - 3).abs().max((dy as i32 - 3).abs());
                bm.fill_rect(
                    (x + dx * scale) as i32,
                    (y + dy * scale) as i32,
                    scale,
                    scale,
                    Cell::from_dark(chebyshev != 2),
                )
                .unwrap();
            }
        }
    }

    fn field(w: u32, h: u32) -> Bitmap {
        let mut m = Bitmap::new(w, h);
        m.fill_rect(0, 0, w, h, Cell::Light).unwrap();
        m
    }

    #[test]
    fn ratio_check_accepts_scaled_profiles() {
        assert!(check_ratio(&[1, 1, 3, 1, 1], 2.0).is_some());
        assert!(check_ratio(&[4, 4, 12, 4, 4], 2.0).is_some());
        assert_eq!(check_ratio(&[4, 4, 12, 4, 4], 2.0).unwrap(), 4.0);
        assert!(check_ratio(&[4, 4, 4, 4, 4], 2.0).is_none());
        assert!(check_ratio(&[1, 1, 1, 1, 1], 2.0).is_none());
    }

    #[test]
    fn hits_merge_by_weighted_average() {
        let mut hit = PatternHit { x: 10.0, y: 10.0, module_size: 4.0, count: 1 };
        assert!(hit.about_equals(12.0, 11.0, 4.5));
        hit.merge(12.0, 11.0, 4.5);
        assert_eq!(hit.count, 2);
        assert!((hit.x - 11.0).abs() < 1e-9);
        assert!((hit.module_size - 4.25).abs() < 1e-9);
        assert!(!hit.about_equals(30.0, 11.0, 4.0));
    }

    #[test]
    fn finds_three_finders_in_synthetic_symbol() {
        // 21-module layout at scale 4 with a 3-module quiet zone
        let scale = 4;
        let quiet = 3 * scale;
        let size = 21 * scale + 2 * quiet;
        let mut bm = field(size, size);
        stamp_finder(&mut bm, quiet, quiet, scale);
        stamp_finder(&mut bm, quiet + 14 * scale, quiet, scale);
        stamp_finder(&mut bm, quiet, quiet + 14 * scale, scale);
        let [tl, tr, bl] = find_finder_patterns(&bm).unwrap();
        let c = |m: u32| f64::from(quiet + m * scale) + f64::from(scale) * 3.5;
        assert!((tl.x - c(0)).abs() <= 1.0 && (tl.y - c(0)).abs() <= 1.0, "{tl:?}");
        assert!((tr.x - c(14)).abs() <= 1.0 && (tr.y - c(0)).abs() <= 1.0, "{tr:?}");
        assert!((bl.x - c(0)).abs() <= 1.0 && (bl.y - c(14)).abs() <= 1.0, "{bl:?}");
        assert!((tl.module_size - 4.0).abs() < 1.0);
    }

    #[test]
    fn mirrored_symbols_swap_back() {
        let scale = 4;
        let quiet = 3 * scale;
        let size = 21 * scale + 2 * quiet;
        let mut bm = field(size, size);
        // Finders of a mirrored symbol: TL, BL on the right edge
        stamp_finder(&mut bm, quiet + 14 * scale, quiet, scale);
        stamp_finder(&mut bm, quiet, quiet, scale);
        stamp_finder(&mut bm, quiet + 14 * scale, quiet + 14 * scale, scale);
        let [tl, tr, bl] = find_finder_patterns(&bm).unwrap();
        // The ordering still satisfies the right-hand orientation
        let cross = (tr.x - tl.x) * (bl.y - tl.y) - (tr.y - tl.y) * (bl.x - tl.x);
        assert!(cross > 0.0);
    }

    #[test]
    fn no_patterns_means_finder_not_found() {
        let bm = field(100, 100);
        assert_eq!(
            find_finder_patterns(&bm).unwrap_err(),
            QrError::FinderNotFound
        );
    }

    #[test]
    fn alignment_pattern_is_located() {
        let mut bm = field(80, 80);
        // 5x5 alignment pattern at module scale 4, centered at (40, 40)
        let scale = 4i32;
        bm.fill_rect(40 - 2 * scale, 40 - 2 * scale, 20, 20, Cell::Dark).unwrap();
        bm.fill_rect(40 - scale, 40 - scale, 12, 12, Cell::Light).unwrap();
        bm.fill_rect(40 - scale / 2, 40 - scale / 2, 4, 4, Cell::Dark).unwrap();
        let hit = find_alignment(&bm, 38.0, 41.0, 4.0).unwrap();
        assert!((hit.x - 40.0).abs() <= 2.0, "{hit:?}");
        assert!((hit.y - 40.0).abs() <= 2.0, "{hit:?}");
    }

    #[test]
    fn missing_alignment_reports_not_found() {
        let bm = field(80, 80);
        assert_eq!(
            find_alignment(&bm, 40.0, 40.0, 4.0).unwrap_err(),
            QrError::AlignmentNotFound
        );
    }
}
