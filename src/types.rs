// src/types.rs

use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub direction: DirectionConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sliding-window search and refit parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Number of horizontal bands swept from the bottom of the frame upward.
    pub nwindows: usize,
    /// Half-width of each search window in pixels.
    pub margin: i32,
    /// Minimum pixels found in a band to recenter the next band.
    pub minpix: usize,
    /// A lane's fit is replaced only when strictly more pixels than this
    /// were collected for it.
    pub min_refit_pixels: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            nwindows: 9,
            margin: 100,
            minpix: 50,
            min_refit_pixels: 1500,
        }
    }
}

/// How lane fit coefficients are turned into a radius of curvature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurvatureModel {
    /// Coefficients rescaled to meters before evaluating the radius.
    #[default]
    Metric,
    /// Pixel-space coefficients evaluated at a meter-scaled row.
    /// Matches the historical output of the desktop tool.
    PixelApprox,
}

/// Camera/warp dependent constants. There are no defaults: these must come
/// from the calibration that produced the bird's-eye frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub frame_width: usize,
    pub frame_height: usize,
    /// Length of road (meters) covered by the full frame height.
    pub road_length_m: f64,
    /// Physical lane width in meters.
    pub lane_width_m: f64,
    /// Measured lane width in pixels at the reference row.
    pub lane_width_px: f64,
    /// Row (pixels, near the vehicle) where curvature and offset are evaluated.
    pub reference_row: f64,
    #[serde(default)]
    pub curvature_model: CurvatureModel,
    /// |a| at or below this is treated as a flat road (infinite radius).
    #[serde(default = "default_flat_epsilon")]
    pub flat_epsilon: f64,
}

fn default_flat_epsilon() -> f64 {
    1e-9
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionConfig {
    /// Number of per-frame labels kept for the majority vote.
    pub history_len: usize,
    /// Leading coefficient magnitude at or below which the road is straight.
    pub straight_threshold: f64,
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            history_len: 10,
            straight_threshold: 0.00015,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Directory holding warped binary frames; each sub-directory is a stream.
    pub input_dir: String,
    pub output_dir: String,
    pub save_annotated: bool,
    pub extensions: Vec<String>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            input_dir: "frames".to_string(),
            output_dir: "output".to_string(),
            save_annotated: false,
            extensions: vec!["png".to_string(), "bmp".to_string(), "pgm".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// FRAME AND PIXEL TYPES
// ============================================================================

/// Single-channel, perspective-warped frame. Origin top-left, rows grow
/// downward; any non-zero value is an "on" pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryFrame {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl BinaryFrame {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> TrackerResult<Self> {
        if width == 0 || height == 0 {
            return Err(TrackerError::InvalidFrame(format!(
                "empty frame ({}x{})",
                width, height
            )));
        }
        if data.len() != width * height {
            return Err(TrackerError::InvalidFrame(format!(
                "expected {} bytes for a single-channel {}x{} frame, got {}",
                width * height,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// An all-zero frame.
    pub fn blank(width: usize, height: usize) -> TrackerResult<Self> {
        Self::new(width, height, vec![0u8; width * height])
    }

    /// Convert a decoded image. Only 8-bit single-channel images are accepted;
    /// colour frames mean the upstream thresholding step was skipped.
    pub fn from_image(image: image::DynamicImage) -> TrackerResult<Self> {
        match image {
            image::DynamicImage::ImageLuma8(gray) => {
                let (w, h) = gray.dimensions();
                Self::new(w as usize, h as usize, gray.into_raw())
            }
            other => Err(TrackerError::InvalidFrame(format!(
                "expected an 8-bit single-channel image, got {:?}",
                other.color()
            ))),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Row slice `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.width..(y + 1) * self.width]
    }
}

/// Integer pixel coordinates stored as parallel x/y sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelSet {
    pub xs: Vec<i32>,
    pub ys: Vec<i32>,
}

impl PixelSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    #[inline]
    pub fn push(&mut self, x: i32, y: i32) {
        self.xs.push(x);
        self.ys.push(y);
    }

    pub fn extend_from(&mut self, other: &PixelSet) {
        self.xs.extend_from_slice(&other.xs);
        self.ys.extend_from_slice(&other.ys);
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Smallest and largest y, or None when empty.
    pub fn y_range(&self) -> Option<(i32, i32)> {
        let min = self.ys.iter().copied().min()?;
        let max = self.ys.iter().copied().max()?;
        Some((min, max))
    }

    pub fn mean_x(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let sum: i64 = self.xs.iter().map(|&x| x as i64).sum();
        Some(sum as f64 / self.len() as f64)
    }
}

impl FromIterator<(i32, i32)> for PixelSet {
    fn from_iter<I: IntoIterator<Item = (i32, i32)>>(iter: I) -> Self {
        let mut set = PixelSet::new();
        for (x, y) in iter {
            set.push(x, y);
        }
        set
    }
}

/// Which boundary of the ego lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneSide {
    Left,
    Right,
}

impl LaneSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}
