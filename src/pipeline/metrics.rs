// src/pipeline/metrics.rs
//
// Process-wide observability. Counters are atomics so one instance can be
// cloned into every concurrently running tracking session.

use crate::analysis::FitOutcome;
use crate::types::LaneSide;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct TrackerMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub invalid_frames: Arc<AtomicU64>,
    pub initialization_failures: Arc<AtomicU64>,
    pub left_refits: Arc<AtomicU64>,
    pub right_refits: Arc<AtomicU64>,
    pub left_persisted: Arc<AtomicU64>,
    pub right_persisted: Arc<AtomicU64>,
    pub singular_fits: Arc<AtomicU64>,
    pub frame_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for TrackerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            invalid_frames: Arc::new(AtomicU64::new(0)),
            initialization_failures: Arc::new(AtomicU64::new(0)),
            left_refits: Arc::new(AtomicU64::new(0)),
            right_refits: Arc::new(AtomicU64::new(0)),
            left_persisted: Arc::new(AtomicU64::new(0)),
            right_persisted: Arc::new(AtomicU64::new(0)),
            singular_fits: Arc::new(AtomicU64::new(0)),
            frame_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_timing(&self, counter: &AtomicU64, duration_us: u64) {
        counter.store(duration_us, Ordering::Relaxed);
    }

    /// Count what the persistence rule did for one lane.
    pub fn record_fit(&self, side: LaneSide, outcome: FitOutcome) {
        match (side, outcome) {
            (LaneSide::Left, FitOutcome::Refit) => self.inc(&self.left_refits),
            (LaneSide::Right, FitOutcome::Refit) => self.inc(&self.right_refits),
            (LaneSide::Left, _) => self.inc(&self.left_persisted),
            (LaneSide::Right, _) => self.inc(&self.right_persisted),
        }
        if outcome == FitOutcome::Singular {
            self.inc(&self.singular_fits);
        }
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            fps: self.fps(),
            invalid_frames: self.invalid_frames.load(Ordering::Relaxed),
            initialization_failures: self.initialization_failures.load(Ordering::Relaxed),
            left_refits: self.left_refits.load(Ordering::Relaxed),
            right_refits: self.right_refits.load(Ordering::Relaxed),
            left_persisted: self.left_persisted.load(Ordering::Relaxed),
            right_persisted: self.right_persisted.load(Ordering::Relaxed),
            singular_fits: self.singular_fits.load(Ordering::Relaxed),
            last_frame_us: self.frame_time_us.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub invalid_frames: u64,
    pub initialization_failures: u64,
    pub left_refits: u64,
    pub right_refits: u64,
    pub left_persisted: u64,
    pub right_persisted: u64,
    pub singular_fits: u64,
    pub last_frame_us: u64,
    pub elapsed_secs: f64,
}
