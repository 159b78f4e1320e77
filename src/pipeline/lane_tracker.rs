// src/pipeline/lane_tracker.rs
//
// Per-frame orchestration:
//
//   extract_features → search_lanes → update_fit (left, right)
//     → measure_curvature + classify_direction → DirectionSmoother
//
// The tracker itself only holds validated configuration. All state that
// flows between frames lives in the caller's `TrackState`, so any number of
// streams can be tracked in parallel with one `LaneTracker`.

use super::metrics::TrackerMetrics;
use super::track_state::TrackState;
use crate::analysis::{
    classify_direction, extract_features, measure_curvature, search_lanes, update_fit,
    CurvatureResult, CurveRadius, Direction, FitOutcome, LaneFit, PlotDomain, SearchWindow,
};
use crate::error::TrackerResult;
use crate::types::{BinaryFrame, CalibrationConfig, Config, DirectionConfig, LaneSide, TrackerConfig};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Numeric output handed to the lane-keeping decision layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LaneKeepingOutput {
    pub left_radius: CurveRadius,
    pub right_radius: CurveRadius,
    pub lateral_offset_m: f64,
    pub direction: Direction,
}

/// One lane's part of a frame report.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LaneReport {
    /// Fit in effect after this frame (new or carried forward).
    pub fit: LaneFit,
    pub pixel_count: usize,
    pub outcome: FitOutcome,
}

/// Everything computed for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame_index: u64,
    pub left: LaneReport,
    pub right: LaneReport,
    pub left_base: i32,
    pub right_base: i32,
    pub plot_domain: PlotDomain,
    pub curvature: CurvatureResult,
    /// This frame's own classification.
    pub raw_direction: Direction,
    /// Majority over the direction history.
    pub direction: Direction,
    #[serde(skip)]
    pub windows: Vec<SearchWindow>,
}

impl FrameReport {
    pub fn output(&self) -> LaneKeepingOutput {
        LaneKeepingOutput {
            left_radius: self.curvature.left_radius,
            right_radius: self.curvature.right_radius,
            lateral_offset_m: self.curvature.lateral_offset_m,
            direction: self.direction,
        }
    }
}

pub struct LaneTracker {
    tracker: TrackerConfig,
    calibration: CalibrationConfig,
    direction: DirectionConfig,
    metrics: Option<TrackerMetrics>,
}

impl LaneTracker {
    pub fn new(config: &Config) -> TrackerResult<Self> {
        config.validate()?;
        Ok(Self {
            tracker: config.tracker.clone(),
            calibration: config.calibration.clone(),
            direction: config.direction.clone(),
            metrics: None,
        })
    }

    /// Report counters into `metrics` (shared across clones).
    pub fn with_metrics(mut self, metrics: TrackerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Fresh state for a new stream.
    pub fn new_session(&self) -> TrackState {
        info!(
            "🆕 Tracking session: {} windows, margin {}px, history {}",
            self.tracker.nwindows, self.tracker.margin, self.direction.history_len
        );
        TrackState::new(self.direction.history_len)
    }

    /// Run one frame through the pipeline and update `state`.
    ///
    /// Errors:
    /// - `InvalidFrame`: nothing in `state` changes.
    /// - `Initialization`: a lane still has no fit after this frame. Any fit
    ///   established for the other lane is kept; the direction history is
    ///   not touched.
    pub fn process_frame(
        &self,
        state: &mut TrackState,
        frame: &BinaryFrame,
    ) -> TrackerResult<FrameReport> {
        let started = Instant::now();
        self.record(|m| m.inc(&m.total_frames));

        let features = match extract_features(frame, &self.calibration, self.tracker.nwindows) {
            Ok(features) => features,
            Err(e) => {
                self.record(|m| m.inc(&m.invalid_frames));
                return Err(e);
            }
        };

        let search = search_lanes(frame, &features, &self.tracker);

        let min_pixels = self.tracker.min_refit_pixels;
        let left_outcome = update_fit(LaneSide::Left, &mut state.left_fit, &search.left, min_pixels);
        let right_outcome =
            update_fit(LaneSide::Right, &mut state.right_fit, &search.right, min_pixels);
        state.frames_processed += 1;

        self.record(|m| {
            m.record_fit(LaneSide::Left, left_outcome);
            m.record_fit(LaneSide::Right, right_outcome);
        });

        let (left_fit, right_fit) = match state.fits() {
            Ok(fits) => fits,
            Err(e) => {
                warn!(
                    "⏳ Frame {}: {} (left {} px, right {} px)",
                    state.frames_processed,
                    e,
                    search.left.len(),
                    search.right.len()
                );
                self.record(|m| m.inc(&m.initialization_failures));
                return Err(e);
            }
        };

        let plot_domain = PlotDomain::from_pixels(features.height, &search.left, &search.right);
        let raw_direction =
            classify_direction(&left_fit, &right_fit, self.direction.straight_threshold);
        let direction = state.directions.smooth(raw_direction);
        let curvature = measure_curvature(&left_fit, &right_fit, &self.calibration);

        debug!(
            "🛣️ Frame {}: R_left={:.0}m R_right={:.0}m offset={:+.2}m dir={} (raw {})",
            state.frames_processed,
            curvature.left_radius.meters(),
            curvature.right_radius.meters(),
            curvature.lateral_offset_m,
            direction.as_str(),
            raw_direction.as_str()
        );

        self.record(|m| m.set_timing(&m.frame_time_us, started.elapsed().as_micros() as u64));

        Ok(FrameReport {
            frame_index: state.frames_processed - 1,
            left: LaneReport {
                fit: left_fit,
                pixel_count: search.left.len(),
                outcome: left_outcome,
            },
            right: LaneReport {
                fit: right_fit,
                pixel_count: search.right.len(),
                outcome: right_outcome,
            },
            left_base: search.left_base,
            right_base: search.right_base,
            plot_domain,
            curvature,
            raw_direction,
            direction,
            windows: search.windows,
        })
    }

    /// Outputs from the fits and history already in `state`, without a new
    /// frame. Used when a frame is skipped (e.g. a missed deadline).
    pub fn measure(&self, state: &TrackState) -> TrackerResult<LaneKeepingOutput> {
        let (left, right) = state.fits()?;
        let curvature = measure_curvature(&left, &right, &self.calibration);
        let direction = state
            .smoothed_direction()
            .unwrap_or_else(|| classify_direction(&left, &right, self.direction.straight_threshold));
        Ok(LaneKeepingOutput {
            left_radius: curvature.left_radius,
            right_radius: curvature.right_radius,
            lateral_offset_m: curvature.lateral_offset_m,
            direction,
        })
    }

    fn record(&self, f: impl FnOnce(&TrackerMetrics)) {
        if let Some(metrics) = &self.metrics {
            f(metrics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::error::{MissingFits, TrackerError};

    fn column_frame(columns: &[usize], width: usize, height: usize) -> BinaryFrame {
        let mut frame = BinaryFrame::blank(width, height).unwrap();
        for &x in columns {
            for y in 0..height {
                frame.set(x, y, 255);
            }
        }
        frame
    }

    #[test]
    fn test_invalid_frame_leaves_state_untouched() {
        let metrics = TrackerMetrics::new();
        let tracker = LaneTracker::new(&test_config()).unwrap().with_metrics(metrics.clone());
        let mut state = tracker.new_session();

        let frame = BinaryFrame::blank(640, 480).unwrap();
        let err = tracker.process_frame(&mut state, &frame).unwrap_err();

        assert!(matches!(err, TrackerError::InvalidFrame(_)));
        assert_eq!(state.frames_processed(), 0);
        assert_eq!(metrics.summary().invalid_frames, 1);
    }

    #[test]
    fn test_empty_first_frame_is_initialization_error() {
        let tracker = LaneTracker::new(&test_config()).unwrap();
        let mut state = tracker.new_session();
        let frame = BinaryFrame::blank(1280, 720).unwrap();

        let err = tracker.process_frame(&mut state, &frame).unwrap_err();
        assert_eq!(
            err,
            TrackerError::Initialization {
                missing: MissingFits::Both
            }
        );
        assert_eq!(state.directions().history_size(), 0);
        assert!(tracker.measure(&state).is_err());
    }

    #[test]
    fn test_one_sided_warm_up_keeps_established_lane() {
        let tracker = LaneTracker::new(&test_config()).unwrap();
        let mut state = tracker.new_session();
        // Only the left lane (3 px wide) is visible.
        let frame = column_frame(&[299, 300, 301], 1280, 720);

        let err = tracker.process_frame(&mut state, &frame).unwrap_err();
        assert_eq!(
            err,
            TrackerError::Initialization {
                missing: MissingFits::Right
            }
        );
        assert!(state.left_fit().is_some());
        assert!(state.right_fit().is_none());
    }

    #[test]
    fn test_measure_after_warm_up_matches_report() {
        let tracker = LaneTracker::new(&test_config()).unwrap();
        let mut state = tracker.new_session();
        let frame = column_frame(&[299, 300, 301, 979, 980, 981], 1280, 720);

        let report = tracker.process_frame(&mut state, &frame).unwrap();
        let measured = tracker.measure(&state).unwrap();
        assert_eq!(report.output(), measured);
        assert_eq!(report.frame_index, 0);
        assert_eq!(report.windows.len(), 9);
    }
}
