// src/analysis/feature_extractor.rs
//
// Collects the coordinates of every "on" pixel of a warped binary frame.
//
// Pixels are emitted in row-major order, so `ys` is non-decreasing. The
// window search relies on this to slice a band of rows with a binary search
// instead of rescanning the whole list for every window.

use crate::error::{TrackerError, TrackerResult};
use crate::types::{BinaryFrame, CalibrationConfig, PixelSet};

/// Per-frame features shared by every search window.
#[derive(Debug, Clone)]
pub struct FrameFeatures {
    /// All non-zero pixels, row-major.
    pub pixels: PixelSet,
    /// floor(frame height / nwindows)
    pub window_height: usize,
    pub height: usize,
}

/// Scan `frame` once and return its non-zero pixels.
///
/// Fails with `InvalidFrame` when the frame does not have the calibrated
/// resolution or is too short to give every window at least one row.
pub fn extract_features(
    frame: &BinaryFrame,
    calibration: &CalibrationConfig,
    nwindows: usize,
) -> TrackerResult<FrameFeatures> {
    if frame.width() != calibration.frame_width || frame.height() != calibration.frame_height {
        return Err(TrackerError::InvalidFrame(format!(
            "frame is {}x{}, calibration expects {}x{}",
            frame.width(),
            frame.height(),
            calibration.frame_width,
            calibration.frame_height
        )));
    }

    let window_height = frame.height() / nwindows.max(1);
    if window_height == 0 {
        return Err(TrackerError::InvalidFrame(format!(
            "frame height {} cannot hold {} windows",
            frame.height(),
            nwindows
        )));
    }

    let mut pixels = PixelSet::new();
    for y in 0..frame.height() {
        for (x, &value) in frame.row(y).iter().enumerate() {
            if value != 0 {
                pixels.push(x as i32, y as i32);
            }
        }
    }

    Ok(FrameFeatures {
        pixels,
        window_height,
        height: frame.height(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn test_extracts_nonzero_row_major() {
        let mut calibration = test_config().calibration;
        calibration.frame_width = 4;
        calibration.frame_height = 3;

        let frame = BinaryFrame::new(4, 3, vec![0, 9, 0, 1, 0, 0, 0, 0, 255, 0, 0, 0]).unwrap();
        let features = extract_features(&frame, &calibration, 3).unwrap();

        assert_eq!(features.pixels.xs, vec![1, 3, 0]);
        assert_eq!(features.pixels.ys, vec![0, 0, 2]);
        assert_eq!(features.window_height, 1);
    }

    #[test]
    fn test_window_height_floors() {
        let calibration = test_config().calibration;
        let frame = BinaryFrame::blank(1280, 720).unwrap();
        let features = extract_features(&frame, &calibration, 7).unwrap();
        assert_eq!(features.window_height, 102);
        assert!(features.pixels.is_empty());
    }

    #[test]
    fn test_rejects_unexpected_resolution() {
        let calibration = test_config().calibration;
        let frame = BinaryFrame::blank(640, 360).unwrap();
        let err = extract_features(&frame, &calibration, 9).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidFrame(_)));
    }

    #[test]
    fn test_rejects_frame_shorter_than_window_count() {
        let mut calibration = test_config().calibration;
        calibration.frame_width = 8;
        calibration.frame_height = 4;
        let frame = BinaryFrame::blank(8, 4).unwrap();
        assert!(extract_features(&frame, &calibration, 9).is_err());
    }
}
