// src/analysis/curvature_estimator.rs
//
// Radius of curvature and lateral offset from a pair of lane fits.
//
// Coordinate system:
//   Fits are x = a·y² + b·y + c in warped-frame pixels. `ym` / `xm` convert
//   pixels to meters along the road and across it; both come from the
//   calibration of the perspective warp.
//
// Radius:
//   R = (1 + (2·a·y + b)²)^1.5 / |2·a| evaluated at the reference row near
//   the vehicle. Two models are available:
//
//     Metric       a_m = a·xm/ym², b_m = b·xm/ym, y = row·ym
//                  Physical radius in meters.
//
//     PixelApprox  pixel a, b with y = row·ym
//                  Reproduces the numbers of the historical desktop tool.
//                  Not a physical quantity; kept for comparisons.
//
//   A leading coefficient within `flat_epsilon` of zero is a straight road and
//   reported as `CurveRadius::Infinite`.
//
// Offset:
//   (frame_center_x − (x_left + x_right)/2) · xm at the reference row.
//   Positive: the lane midpoint lies left of the image center, so the vehicle
//   sits right of the lane center. Negative: vehicle left of center.

use super::curve_fitter::LaneFit;
use crate::types::{CalibrationConfig, CurvatureModel};
use serde::Serialize;

/// Radius of curvature, or the flat-road sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "meters", rename_all = "snake_case")]
pub enum CurveRadius {
    Finite(f64),
    Infinite,
}

impl CurveRadius {
    pub fn meters(&self) -> f64 {
        match self {
            Self::Finite(r) => *r,
            Self::Infinite => f64::INFINITY,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// The tighter of two radii.
    pub fn min(self, other: CurveRadius) -> CurveRadius {
        if other.meters() < self.meters() {
            other
        } else {
            self
        }
    }
}

/// Per-frame curvature and position estimate. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvatureResult {
    pub left_radius: CurveRadius,
    pub right_radius: CurveRadius,
    /// Signed vehicle offset from the lane center in meters.
    /// Positive = vehicle right of center.
    pub lateral_offset_m: f64,
}

impl CurvatureResult {
    pub fn min_radius(&self) -> CurveRadius {
        self.left_radius.min(self.right_radius)
    }
}

/// Radius of curvature of `fit` at the calibrated reference row.
pub fn radius_of_curvature(fit: &LaneFit, calibration: &CalibrationConfig) -> CurveRadius {
    if fit.a.abs() <= calibration.flat_epsilon {
        return CurveRadius::Infinite;
    }

    let ym = calibration.ym();
    let xm = calibration.xm();
    let y_eval = calibration.reference_row * ym;

    let scaled = match calibration.curvature_model {
        CurvatureModel::Metric => LaneFit::new(fit.a * xm / (ym * ym), fit.b * xm / ym, 0.0),
        CurvatureModel::PixelApprox => *fit,
    };

    let slope = scaled.slope_at(y_eval);
    let radius = (1.0 + slope * slope).powf(1.5) / (2.0 * scaled.a).abs();

    if radius.is_finite() {
        CurveRadius::Finite(radius)
    } else {
        CurveRadius::Infinite
    }
}

/// Vehicle offset from the lane center in meters. Positive = right of center.
pub fn lateral_offset(left: &LaneFit, right: &LaneFit, calibration: &CalibrationConfig) -> f64 {
    let row = calibration.reference_row;
    let lane_center = (left.x_at(row) + right.x_at(row)) / 2.0;
    (calibration.frame_center_x() - lane_center) * calibration.xm()
}

pub fn measure_curvature(
    left: &LaneFit,
    right: &LaneFit,
    calibration: &CalibrationConfig,
) -> CurvatureResult {
    CurvatureResult {
        left_radius: radius_of_curvature(left, calibration),
        right_radius: radius_of_curvature(right, calibration),
        lateral_offset_m: lateral_offset(left, right, calibration),
    }
}
