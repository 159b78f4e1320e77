// src/pipeline/track_state.rs
//
// Everything one stream carries from frame to frame. Owned by the caller and
// handed to `LaneTracker::process_frame` by mutable reference; never shared
// between streams.

use crate::analysis::{Direction, DirectionSmoother, LaneFit};
use crate::error::{MissingFits, TrackerError, TrackerResult};

#[derive(Debug, Clone)]
pub struct TrackState {
    pub(crate) left_fit: Option<LaneFit>,
    pub(crate) right_fit: Option<LaneFit>,
    pub(crate) directions: DirectionSmoother,
    pub(crate) frames_processed: u64,
}

impl TrackState {
    pub fn new(history_len: usize) -> Self {
        Self {
            left_fit: None,
            right_fit: None,
            directions: DirectionSmoother::new(history_len),
            frames_processed: 0,
        }
    }

    pub fn left_fit(&self) -> Option<LaneFit> {
        self.left_fit
    }

    pub fn right_fit(&self) -> Option<LaneFit> {
        self.right_fit
    }

    /// Both fits, or `Initialization` naming the lane(s) still missing.
    pub fn fits(&self) -> TrackerResult<(LaneFit, LaneFit)> {
        match (self.left_fit, self.right_fit) {
            (Some(left), Some(right)) => Ok((left, right)),
            (left, right) => {
                let missing = MissingFits::from_flags(left.is_none(), right.is_none())
                    .unwrap_or(MissingFits::Both);
                Err(TrackerError::Initialization { missing })
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.left_fit.is_some() && self.right_fit.is_some()
    }

    pub fn directions(&self) -> &DirectionSmoother {
        &self.directions
    }

    /// Majority direction over the current history.
    pub fn smoothed_direction(&self) -> Option<Direction> {
        self.directions.majority()
    }

    /// Frames that passed validation, including those that did not refit.
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Forget all fits and history, e.g. on a scene cut.
    pub fn reset(&mut self) {
        self.left_fit = None;
        self.right_fit = None;
        self.directions.reset();
        self.frames_processed = 0;
    }
}
