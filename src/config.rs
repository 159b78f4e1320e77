// src/config.rs

use crate::error::{TrackerError, TrackerResult};
use crate::types::{CalibrationConfig, Config};
use anyhow::{Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
        let config = Self::from_yaml(&contents)?;
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TrackerResult<()> {
        let t = &self.tracker;
        let c = &self.calibration;

        if t.nwindows == 0 {
            return invalid("tracker.nwindows must be at least 1");
        }
        if t.margin < 0 {
            return invalid("tracker.margin must not be negative");
        }
        if c.frame_width < 2 {
            return invalid("calibration.frame_width must be at least 2");
        }
        if t.margin as i64 > c.frame_width as i64 {
            return Err(TrackerError::InvalidConfig(format!(
                "tracker.margin ({}) exceeds calibration.frame_width ({})",
                t.margin, c.frame_width
            )));
        }
        if c.frame_height < t.nwindows {
            return Err(TrackerError::InvalidConfig(format!(
                "calibration.frame_height ({}) is smaller than tracker.nwindows ({})",
                c.frame_height, t.nwindows
            )));
        }
        for (name, value) in [
            ("road_length_m", c.road_length_m),
            ("lane_width_m", c.lane_width_m),
            ("lane_width_px", c.lane_width_px),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TrackerError::InvalidConfig(format!(
                    "calibration.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !c.reference_row.is_finite() || c.reference_row < 0.0 {
            return invalid("calibration.reference_row must be a non-negative row");
        }
        if !(c.flat_epsilon.is_finite() && c.flat_epsilon >= 0.0) {
            return invalid("calibration.flat_epsilon must be non-negative");
        }
        if self.direction.history_len == 0 {
            return invalid("direction.history_len must be at least 1");
        }
        let threshold = self.direction.straight_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return invalid("direction.straight_threshold must be non-negative");
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> TrackerResult<()> {
    Err(TrackerError::InvalidConfig(msg.to_string()))
}

impl CalibrationConfig {
    /// Meters per pixel along y.
    pub fn ym(&self) -> f64 {
        self.road_length_m / self.frame_height as f64
    }

    /// Meters per pixel along x.
    pub fn xm(&self) -> f64 {
        self.lane_width_m / self.lane_width_px
    }

    /// Assumed vehicle position: the horizontal center of the frame.
    pub fn frame_center_x(&self) -> f64 {
        self.frame_width as f64 / 2.0
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    use crate::types::{
        CurvatureModel, DirectionConfig, LoggingConfig, TrackerConfig, VideoConfig,
    };

    Config {
        tracker: TrackerConfig::default(),
        calibration: CalibrationConfig {
            frame_width: 1280,
            frame_height: 720,
            road_length_m: 30.0,
            lane_width_m: 3.7,
            lane_width_px: 700.0,
            reference_row: 700.0,
            curvature_model: CurvatureModel::Metric,
            flat_epsilon: 1e-9,
        },
        direction: DirectionConfig::default(),
        video: VideoConfig::default(),
        logging: LoggingConfig::default(),
    }
}
