// src/pipeline/mod.rs

pub mod lane_tracker;
pub mod metrics;
pub mod track_state;

pub use lane_tracker::{FrameReport, LaneKeepingOutput, LaneReport, LaneTracker};
pub use metrics::{MetricsSummary, TrackerMetrics};
pub use track_state::TrackState;
