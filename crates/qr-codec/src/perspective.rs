//! Perspective rectification: mapping the ideal module grid onto the
//! located quadrilateral in the image, then sampling module centers.

use crate::bitmap::{Bitmap, Cell};

/// A 3x3 homogeneous transform. `map(x, y)` applies
/// `((a x + b y + c) / w, (d x + e y + f) / w)` with `w = g x + h y + i`.
#[derive(Debug, Clone, Copy)]
pub struct Perspective {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
    g: f64,
    h: f64,
    i: f64,
}

impl Perspective {
    /// The transform taking the unit square corners (0,0), (1,0), (1,1),
    /// (0,1) to `p0..p3`. Degenerates to an affine map when the
    /// quadrilateral is a parallelogram.
    pub fn square_to_quadrilateral(
        p0: (f64, f64),
        p1: (f64, f64),
        p2: (f64, f64),
        p3: (f64, f64),
    ) -> Self {
        let d3 = (p0.0 - p1.0 + p2.0 - p3.0, p0.1 - p1.1 + p2.1 - p3.1);
        if d3.0 == 0.0 && d3.1 == 0.0 {
            return Self {
                a: p1.0 - p0.0,
                b: p2.0 - p1.0,
                c: p0.0,
                d: p1.1 - p0.1,
                e: p2.1 - p1.1,
                f: p0.1,
                g: 0.0,
                h: 0.0,
                i: 1.0,
            };
        }
        let d1 = (p1.0 - p2.0, p1.1 - p2.1);
        let d2 = (p3.0 - p2.0, p3.1 - p2.1);
        let den = d1.0 * d2.1 - d2.0 * d1.1;
        let g = (d3.0 * d2.1 - d2.0 * d3.1) / den;
        let h = (d1.0 * d3.1 - d3.0 * d1.1) / den;
        Self {
            a: p1.0 - p0.0 + g * p1.0,
            b: p3.0 - p0.0 + h * p3.0,
            c: p0.0,
            d: p1.1 - p0.1 + g * p1.1,
            e: p3.1 - p0.1 + h * p3.1,
            f: p0.1,
            g,
            h,
            i: 1.0,
        }
    }

    /// The inverse mapping, up to scale: the adjugate matrix.
    pub fn adjugate(&self) -> Self {
        Self {
            a: self.e * self.i - self.f * self.h,
            b: self.c * self.h - self.b * self.i,
            c: self.b * self.f - self.c * self.e,
            d: self.f * self.g - self.d * self.i,
            e: self.a * self.i - self.c * self.g,
            f: self.c * self.d - self.a * self.f,
            g: self.d * self.h - self.e * self.g,
            h: self.b * self.g - self.a * self.h,
            i: self.a * self.e - self.b * self.d,
        }
    }

    /// Composition `self . other`: applies `other` first.
    pub fn times(&self, other: &Perspective) -> Self {
        Self {
            a: self.a * other.a + self.b * other.d + self.c * other.g,
            b: self.a * other.b + self.b * other.e + self.c * other.h,
            c: self.a * other.c + self.b * other.f + self.c * other.i,
            d: self.d * other.a + self.e * other.d + self.f * other.g,
            e: self.d * other.b + self.e * other.e + self.f * other.h,
            f: self.d * other.c + self.e * other.f + self.f * other.i,
            g: self.g * other.a + self.h * other.d + self.i * other.g,
            h: self.g * other.b + self.h * other.e + self.i * other.h,
            i: self.g * other.c + self.h * other.f + self.i * other.i,
        }
    }

    /// The transform taking one quadrilateral to another, built through the
    /// unit square.
    pub fn quadrilateral_to_quadrilateral(
        from: [(f64, f64); 4],
        to: [(f64, f64); 4],
    ) -> Self {
        let to_square =
            Self::square_to_quadrilateral(from[0], from[1], from[2], from[3]).adjugate();
        let to_quad = Self::square_to_quadrilateral(to[0], to[1], to[2], to[3]);
        to_quad.times(&to_square)
    }

    pub fn map(&self, x: f64, y: f64) -> (f64, f64) {
        let w = self.g * x + self.h * y + self.i;
        (
            (self.a * x + self.b * y + self.c) / w,
            (self.d * x + self.e * y + self.f) / w,
        )
    }
}

/// Samples `size * size` module centers through `grid_to_image`, truncating
/// sample coordinates toward zero and clamping them into the image. The
/// result is fully drawn.
pub fn sample_grid(image: &Bitmap, grid_to_image: &Perspective, size: u32) -> Bitmap {
    let mut out = Bitmap::square(size);
    for iy in 0..size {
        for ix in 0..size {
            let (sx, sy) = grid_to_image.map(f64::from(ix) + 0.5, f64::from(iy) + 0.5);
            // Truncation toward zero, then clamping, to match on boundaries
            let px = (sx as i64).clamp(0, i64::from(image.width()) - 1);
            let py = (sy as i64).clamp(0, i64::from(image.height()) - 1);
            let dark = matches!(image.get(px as i32, py as i32), Ok(c) if c.is_dark());
            let _ = out.set(ix as i32, iy as i32, Cell::from_dark(dark));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn affine_case_maps_corners() {
        // A parallelogram triggers the affine branch
        let t = Perspective::square_to_quadrilateral(
            (2.0, 3.0),
            (12.0, 3.0),
            (14.0, 13.0),
            (4.0, 13.0),
        );
        assert!(close(t.map(0.0, 0.0), (2.0, 3.0)));
        assert!(close(t.map(1.0, 0.0), (12.0, 3.0)));
        assert!(close(t.map(1.0, 1.0), (14.0, 13.0)));
        assert!(close(t.map(0.0, 1.0), (4.0, 13.0)));
    }

    #[test]
    fn projective_case_maps_corners() {
        let t = Perspective::square_to_quadrilateral(
            (0.0, 0.0),
            (10.0, 1.0),
            (9.0, 12.0),
            (-1.0, 9.0),
        );
        assert!(close(t.map(0.0, 0.0), (0.0, 0.0)));
        assert!(close(t.map(1.0, 0.0), (10.0, 1.0)));
        assert!(close(t.map(1.0, 1.0), (9.0, 12.0)));
        assert!(close(t.map(0.0, 1.0), (-1.0, 9.0)));
    }

    #[test]
    fn adjugate_inverts_up_to_scale() {
        let t = Perspective::square_to_quadrilateral(
            (0.0, 0.0),
            (10.0, 1.0),
            (9.0, 12.0),
            (-1.0, 9.0),
        );
        let inv = t.adjugate();
        for &(x, y) in &[(0.3, 0.4), (0.9, 0.1), (0.5, 0.5)] {
            let (u, v) = t.map(x, y);
            assert!(close(inv.map(u, v), (x, y)));
        }
    }

    #[test]
    fn quad_to_quad_round_trips_corners() {
        let from = [(3.5, 3.5), (17.5, 3.5), (14.5, 14.5), (3.5, 17.5)];
        let to = [(30.0, 40.0), (140.0, 44.0), (120.0, 130.0), (28.0, 150.0)];
        let t = Perspective::quadrilateral_to_quadrilateral(from, to);
        for i in 0..4 {
            assert!(
                close(t.map(from[i].0, from[i].1), to[i]),
                "corner {i}: {:?}",
                t.map(from[i].0, from[i].1)
            );
        }
    }

    #[test]
    fn sampling_truncates_toward_zero() {
        use crate::bitmap::Cell;
        // A 2x2 image: only pixel (1, 1) dark; identity-like scale-by-one
        let mut img = Bitmap::square(2);
        img.fill_rect(0, 0, 2, 2, Cell::Light).unwrap();
        img.set(1, 1, Cell::Dark).unwrap();
        let t = Perspective::square_to_quadrilateral(
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (0.0, 2.0),
        );
        // The grid has side 2, so module centers (k + 0.5) are pre-scaled
        // into the unit square before the image transform applies.
        let scale = Perspective::square_to_quadrilateral(
            (0.0, 0.0),
            (0.5, 0.0),
            (0.5, 0.5),
            (0.0, 0.5),
        );
        let grid_to_image = t.times(&scale);
        let sampled = sample_grid(&img, &grid_to_image, 2);
        assert!(!sampled.get(0, 0).unwrap().is_dark());
        assert!(!sampled.get(1, 0).unwrap().is_dark());
        assert!(sampled.get(1, 1).unwrap().is_dark());
    }
}
