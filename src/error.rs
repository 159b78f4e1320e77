// src/error.rs

use std::fmt;
use thiserror::Error;

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Which lane fits are still missing when an output is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingFits {
    Left,
    Right,
    Both,
}

impl MissingFits {
    /// None when both lanes are established.
    pub fn from_flags(left_missing: bool, right_missing: bool) -> Option<Self> {
        match (left_missing, right_missing) {
            (true, true) => Some(Self::Both),
            (true, false) => Some(Self::Left),
            (false, true) => Some(Self::Right),
            (false, false) => None,
        }
    }
}

impl fmt::Display for MissingFits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left lane"),
            Self::Right => f.write_str("right lane"),
            Self::Both => f.write_str("both lanes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    /// Frame is not a single-channel frame of the configured shape.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// No frame has yet supplied enough pixels to fit a lane.
    #[error("no lane fit established yet for {missing}; supply a warm-up frame")]
    Initialization { missing: MissingFits },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
