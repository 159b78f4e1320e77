// src/analysis/curve_fitter.rs
//
// Least-squares quadratic fit x = a·y² + b·y + c per lane boundary, with
// temporal persistence.
//
// Coordinate system:
//   Pixel space of the warped frame. y is the independent variable (rows grow
//   downward), x the dependent one, so near-vertical lane markings stay
//   single-valued.
//
// Numerics:
//   Power sums are accumulated in exact integer arithmetic over y shifted to
//   the smallest observed row, so the fit does not depend on the order of the
//   pixels. The normal equations are then solved on y normalized to [0, 1]
//   and the coefficients mapped back to pixel space.
//
// Persistence:
//   A lane's fit is only replaced when the frame supplied more than
//   `min_refit_pixels` pixels for it. Otherwise the previous fit is kept
//   untouched, which bridges occluded or worn markings.

use crate::types::{LaneSide, PixelSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// x = a·y² + b·y + c in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneFit {
    /// Quadratic coefficient. Negative bends the lane toward smaller x
    /// as y decreases from the vehicle's row, i.e. a left-hand curve.
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl LaneFit {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    #[inline]
    pub fn x_at(&self, y: f64) -> f64 {
        self.a * y * y + self.b * y + self.c
    }

    /// dx/dy at row `y`.
    #[inline]
    pub fn slope_at(&self, y: f64) -> f64 {
        2.0 * self.a * y + self.b
    }
}

/// Ordinary least-squares quadratic fit of x on y.
///
/// Returns None if the pixels do not span at least three distinct rows
/// (the system is singular).
pub fn fit_lane(pixels: &PixelSet) -> Option<LaneFit> {
    let (y_min, y_max) = pixels.y_range()?;
    let span = (y_max - y_min) as i128;
    if span < 2 {
        return None;
    }

    // Exact power sums over d = y - y_min.
    let mut s = [0i128; 5];
    let mut t = [0i128; 3];
    for (x, y) in pixels.iter() {
        let d = (y - y_min) as i128;
        let x = x as i128;
        let d2 = d * d;
        s[0] += 1;
        s[1] += d;
        s[2] += d2;
        s[3] += d2 * d;
        s[4] += d2 * d2;
        t[0] += x;
        t[1] += x * d;
        t[2] += x * d2;
    }

    // Normalize: u = d / span ∈ [0, 1].
    let span_f = span as f64;
    let mut su = [0f64; 5];
    let mut scale = 1.0;
    for k in 0..5 {
        su[k] = s[k] as f64 / scale;
        scale *= span_f;
    }
    let tu = [
        t[0] as f64,
        t[1] as f64 / span_f,
        t[2] as f64 / (span_f * span_f),
    ];

    //   | s4 s3 s2 | | A |   | t2 |
    //   | s3 s2 s1 | | B | = | t1 |
    //   | s2 s1 s0 | | C |   | t0 |
    let (big_a, big_b, big_c) = solve_3x3(
        [su[4], su[3], su[2], su[3], su[2], su[1], su[2], su[1], su[0]],
        [tu[2], tu[1], tu[0]],
    )?;

    // x = A·u² + B·u + C with u = (y - y0) / span
    let y0 = y_min as f64;
    let s2 = span_f * span_f;
    let a = big_a / s2;
    let b = big_b / span_f - 2.0 * big_a * y0 / s2;
    let c = big_a * y0 * y0 / s2 - big_b * y0 / span_f + big_c;

    if a.is_finite() && b.is_finite() && c.is_finite() {
        Some(LaneFit { a, b, c })
    } else {
        None
    }
}

/// Solve a 3×3 linear system Ax = b using Gaussian elimination with partial pivoting.
/// Matrix is row-major: [a00, a01, a02, a10, a11, a12, a20, a21, a22].
/// Returns None if the system is singular.
fn solve_3x3(mat: [f64; 9], rhs: [f64; 3]) -> Option<(f64, f64, f64)> {
    let mut m = [
        [mat[0], mat[1], mat[2], rhs[0]],
        [mat[3], mat[4], mat[5], rhs[1]],
        [mat[6], mat[7], mat[8], rhs[2]],
    ];

    // Singularity is judged relative to the largest entry.
    let magnitude = mat.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    if magnitude == 0.0 {
        return None;
    }
    let tolerance = magnitude * 1e-12;

    for col in 0..3 {
        let mut max_row = col;
        for row in (col + 1)..3 {
            if m[row][col].abs() > m[max_row][col].abs() {
                max_row = row;
            }
        }
        if m[max_row][col].abs() < tolerance {
            return None;
        }
        if max_row != col {
            m.swap(col, max_row);
        }

        for row in (col + 1)..3 {
            let factor = m[row][col] / m[col][col];
            for j in col..4 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let c = m[2][3] / m[2][2];
    let b = (m[1][3] - m[1][2] * c) / m[1][1];
    let a = (m[0][3] - m[0][2] * c - m[0][1] * b) / m[0][0];

    if a.is_finite() && b.is_finite() && c.is_finite() {
        Some((a, b, c))
    } else {
        None
    }
}

/// What happened to one lane's fit this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitOutcome {
    /// A new fit replaced the previous one.
    Refit,
    /// Too few pixels; the previous fit (if any) carries forward.
    InsufficientPixels,
    /// Enough pixels but degenerate geometry; the previous fit carries forward.
    Singular,
}

/// Apply the persistence rule to one lane.
///
/// `prior` is replaced only on `FitOutcome::Refit`.
pub fn update_fit(
    side: LaneSide,
    prior: &mut Option<LaneFit>,
    pixels: &PixelSet,
    min_refit_pixels: usize,
) -> FitOutcome {
    if pixels.len() <= min_refit_pixels {
        debug!(
            "  📉 {} lane: {} pixels, need more than {}, keeping previous fit",
            side.as_str(),
            pixels.len(),
            min_refit_pixels
        );
        return FitOutcome::InsufficientPixels;
    }

    match fit_lane(pixels) {
        Some(fit) => {
            debug!(
                "  📐 {} lane fit: a={:.6} b={:.4} c={:.1} ({} pixels)",
                side.as_str(),
                fit.a,
                fit.b,
                fit.c,
                pixels.len()
            );
            *prior = Some(fit);
            FitOutcome::Refit
        }
        None => {
            warn!(
                "📐 {} lane: singular fit over {} pixels, keeping previous fit",
                side.as_str(),
                pixels.len()
            );
            FitOutcome::Singular
        }
    }
}

/// Vertical range over which fitted curves are sampled for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlotDomain {
    pub min_y: f64,
    pub max_y: f64,
}

impl PlotDomain {
    /// Default [height/3, height-1], widened to the rows actually observed
    /// in either lane.
    pub fn from_pixels(height: usize, left: &PixelSet, right: &PixelSet) -> Self {
        let mut max_y = height.saturating_sub(1) as i32;
        let mut min_y = (height / 3) as i32;
        for set in [left, right] {
            if let Some((lo, hi)) = set.y_range() {
                min_y = min_y.min(lo);
                max_y = max_y.max(hi);
            }
        }
        Self {
            min_y: min_y as f64,
            max_y: max_y as f64,
        }
    }

    /// `count` evenly spaced rows from min_y to max_y inclusive.
    pub fn sample(&self, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![self.min_y],
            _ => {
                let step = (self.max_y - self.min_y) / (count - 1) as f64;
                (0..count).map(|i| self.min_y + step * i as f64).collect()
            }
        }
    }
}
