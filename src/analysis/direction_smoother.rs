// src/analysis/direction_smoother.rs

use super::curve_fitter::LaneFit;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Upcoming road direction as reported to the lane-keeping consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Straight,
    Left,
    Right,
}

impl Direction {
    /// Tie-break order of the majority vote, highest priority first.
    pub const PRIORITY: [Direction; 3] = [Direction::Straight, Direction::Left, Direction::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Straight => "STRAIGHT",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }

    fn rank(&self) -> usize {
        match self {
            Self::Straight => 0,
            Self::Left => 1,
            Self::Right => 2,
        }
    }
}

/// Classify one frame from the curvier of the two fits.
///
/// The lane with the larger |a| decides (the right lane on equal magnitude).
/// |a| ≤ `straight_threshold` is straight, negative a is a left curve and
/// positive a a right curve.
pub fn classify_direction(left: &LaneFit, right: &LaneFit, straight_threshold: f64) -> Direction {
    let value = if left.a.abs() > right.a.abs() {
        left.a
    } else {
        right.a
    };

    if value.abs() <= straight_threshold {
        Direction::Straight
    } else if value < 0.0 {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// Majority vote over the last `window_size` per-frame labels.
#[derive(Debug, Clone)]
pub struct DirectionSmoother {
    history: VecDeque<Direction>,
    window_size: usize,
}

impl DirectionSmoother {
    /// Create a new smoother with specified window size
    ///
    /// # Arguments
    /// * `window_size` - Number of labels kept (e.g., 10 frames)
    pub fn new(window_size: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(window_size),
            window_size: window_size.max(1),
        }
    }

    /// Record this frame's label and return the smoothed direction.
    pub fn smooth(&mut self, direction: Direction) -> Direction {
        self.history.push_back(direction);

        // Maintain window size
        while self.history.len() > self.window_size {
            self.history.pop_front();
        }

        self.majority().unwrap_or(direction)
    }

    /// Most frequent label in the window; ties go to the label that comes
    /// first in `Direction::PRIORITY`.
    pub fn majority(&self) -> Option<Direction> {
        if self.history.is_empty() {
            return None;
        }

        let mut counts = [0usize; 3];
        for d in &self.history {
            counts[d.rank()] += 1;
        }

        let mut best = Direction::PRIORITY[0];
        for candidate in Direction::PRIORITY {
            if counts[candidate.rank()] > counts[best.rank()] {
                best = candidate;
            }
        }
        Some(best)
    }

    pub fn history(&self) -> impl Iterator<Item = Direction> + '_ {
        self.history.iter().copied()
    }

    /// Get the number of frames currently in the history
    pub fn history_size(&self) -> usize {
        self.history.len()
    }

    /// Reset the smoother (e.g., when the stream changes)
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
