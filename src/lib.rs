// src/lib.rs
//
// Sliding-window lane tracking on perspective-warped binary frames.
//
//   BinaryFrame ─→ LaneTracker::process_frame(&mut TrackState) ─→ FrameReport
//                                                                  ├→ LaneKeepingOutput
//                                                                  └→ road_overlay

pub mod analysis;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod road_overlay;
pub mod types;
pub mod video_processor;

pub use analysis::{CurvatureResult, CurveRadius, Direction, FitOutcome, LaneFit, PlotDomain};
pub use error::{MissingFits, TrackerError, TrackerResult};
pub use pipeline::{FrameReport, LaneKeepingOutput, LaneTracker, TrackState, TrackerMetrics};
pub use road_overlay::{render_overlay, OverlayText};
pub use types::{BinaryFrame, CalibrationConfig, Config, CurvatureModel, LaneSide, PixelSet};
