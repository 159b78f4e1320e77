// src/analysis/mod.rs
//
// Per-frame lane analysis.
//
// Signal flow:
//   BinaryFrame → feature_extractor → window_search → curve_fitter ─┬→ curvature_estimator
//                                                                    └→ direction_smoother
//
// Orchestrated by pipeline::LaneTracker.

pub mod curvature_estimator;
pub mod curve_fitter;
pub mod direction_smoother;
pub mod feature_extractor;
pub mod window_search;

// Re-exports for ergonomic access from the pipeline and main.rs
pub use curvature_estimator::{measure_curvature, CurvatureResult, CurveRadius};
pub use curve_fitter::{fit_lane, update_fit, FitOutcome, LaneFit, PlotDomain};
pub use direction_smoother::{classify_direction, Direction, DirectionSmoother};
pub use feature_extractor::{extract_features, FrameFeatures};
pub use window_search::{search_lanes, LaneSearch, SearchWindow};
