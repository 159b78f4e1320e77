// src/analysis/window_search.rs
//
// Histogram-seeded sliding-window search for the two ego-lane boundaries.
//
// Seeding:
//   The column histogram of the bottom half of the frame peaks where the lane
//   markings are nearest the vehicle. The strongest column in each half of the
//   frame becomes the starting x of the left/right window stack.
//
// Sweep:
//   `nwindows` bands are visited from the bottom of the frame to the top. Band
//   i (0 = bottom) covers rows [H - (i+1)·h, H - i·h) with h = floor(H / n);
//   the top band is stretched to row 0 so the remainder rows of a height that
//   does not divide evenly are still searched. Bands never overlap.
//
//   A window keeps its x center unless it collected at least `minpix` pixels,
//   in which case the next band is centered on their (rounded) mean x. Dashed
//   markings therefore carry the last good center across the gaps.

use super::feature_extractor::FrameFeatures;
use crate::types::{BinaryFrame, PixelSet, TrackerConfig};
use serde::Serialize;
use tracing::debug;

/// One visited band and the window centers used in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchWindow {
    /// 0 = bottom band.
    pub index: usize,
    /// First row of the band (inclusive).
    pub y_top: i32,
    /// Last row of the band (exclusive).
    pub y_bottom: i32,
    pub left_center: i32,
    pub right_center: i32,
    pub left_count: usize,
    pub right_count: usize,
}

/// Pixels collected for both lanes in one frame.
#[derive(Debug, Clone)]
pub struct LaneSearch {
    pub left: PixelSet,
    pub right: PixelSet,
    pub left_base: i32,
    pub right_base: i32,
    pub windows: Vec<SearchWindow>,
}

/// Sum of intensities per column over rows [height/2, height).
pub fn column_histogram(frame: &BinaryFrame) -> Vec<u64> {
    let mut histogram = vec![0u64; frame.width()];
    for y in frame.height() / 2..frame.height() {
        for (bin, &value) in histogram.iter_mut().zip(frame.row(y)) {
            *bin += value as u64;
        }
    }
    histogram
}

/// Left and right starting columns: the strongest column of each half.
/// The first column wins a tie.
pub fn seed_bases(histogram: &[u64]) -> (i32, i32) {
    let midpoint = histogram.len() / 2;
    let left = argmax(&histogram[..midpoint]);
    let right = argmax(&histogram[midpoint..]) + midpoint;
    (left as i32, right as i32)
}

fn argmax(values: &[u64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Rows [top, bottom) covered by band `index` (0 = bottom).
pub fn band_rows(height: usize, window_height: usize, nwindows: usize, index: usize) -> (i32, i32) {
    let bottom = height.saturating_sub(index * window_height);
    let top = if index + 1 >= nwindows {
        0
    } else {
        height.saturating_sub((index + 1) * window_height)
    };
    (top as i32, bottom as i32)
}

/// Pixels of `features` with `|x - center_x| <= margin` and `top <= y < bottom`.
///
/// `features` must be row-major (non-decreasing y).
pub fn pixels_in_window(
    features: &PixelSet,
    center_x: i32,
    margin: i32,
    top: i32,
    bottom: i32,
) -> PixelSet {
    let lo = features.ys.partition_point(|&y| y < top);
    let hi = features.ys.partition_point(|&y| y < bottom);
    let (x_min, x_max) = (center_x.saturating_sub(margin), center_x.saturating_add(margin));

    let mut found = PixelSet::new();
    for i in lo..hi {
        let x = features.xs[i];
        if x_min <= x && x <= x_max {
            found.push(x, features.ys[i]);
        }
    }
    found
}

/// Next window center: the rounded mean x when the band held at least
/// `minpix` pixels, otherwise the current center.
pub fn recenter(current: i32, band: &PixelSet, minpix: usize) -> i32 {
    if band.len() >= minpix {
        if let Some(mean) = band.mean_x() {
            return mean.round() as i32;
        }
    }
    current
}

/// Run the full seeded sweep over one frame.
pub fn search_lanes(
    frame: &BinaryFrame,
    features: &FrameFeatures,
    config: &TrackerConfig,
) -> LaneSearch {
    let histogram = column_histogram(frame);
    let (left_base, right_base) = seed_bases(&histogram);

    debug!(
        "🔎 Window seeds: left={} right={} ({} candidate pixels)",
        left_base,
        right_base,
        features.pixels.len()
    );

    let mut left_current = left_base;
    let mut right_current = right_base;
    let mut left = PixelSet::new();
    let mut right = PixelSet::new();
    let mut windows = Vec::with_capacity(config.nwindows);

    for index in 0..config.nwindows {
        let (top, bottom) = band_rows(features.height, features.window_height, config.nwindows, index);

        let good_left = pixels_in_window(&features.pixels, left_current, config.margin, top, bottom);
        let good_right =
            pixels_in_window(&features.pixels, right_current, config.margin, top, bottom);

        windows.push(SearchWindow {
            index,
            y_top: top,
            y_bottom: bottom,
            left_center: left_current,
            right_center: right_current,
            left_count: good_left.len(),
            right_count: good_right.len(),
        });

        left.extend_from(&good_left);
        right.extend_from(&good_right);

        left_current = recenter(left_current, &good_left, config.minpix);
        right_current = recenter(right_current, &good_right, config.minpix);
    }

    LaneSearch {
        left,
        right,
        left_base,
        right_base,
        windows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::feature_extractor::extract_features;
    use crate::config::test_config;

    fn frame_with(width: usize, height: usize, on: &[(usize, usize)]) -> BinaryFrame {
        let mut frame = BinaryFrame::blank(width, height).unwrap();
        for &(x, y) in on {
            frame.set(x, y, 255);
        }
        frame
    }

    #[test]
    fn test_histogram_counts_bottom_half_only() {
        let frame = frame_with(4, 4, &[(0, 0), (1, 2), (1, 3), (3, 3)]);
        assert_eq!(column_histogram(&frame), vec![0, 510, 0, 255]);
    }

    #[test]
    fn test_seed_bases_first_max_wins() {
        let hist = vec![1, 5, 5, 0, 0, 7, 2, 7];
        assert_eq!(seed_bases(&hist), (1, 5));
    }

    #[test]
    fn test_seed_bases_on_empty_histogram() {
        let hist = vec![0u64; 10];
        assert_eq!(seed_bases(&hist), (0, 5));
    }

    #[test]
    fn test_bands_cover_all_rows_without_overlap() {
        for &(height, n) in &[(720usize, 9usize), (721, 9), (100, 7), (9, 9), (50, 1)] {
            let wh = height / n;
            let mut covered = vec![0u32; height];
            let mut previous_top = height as i32;
            for i in 0..n {
                let (top, bottom) = band_rows(height, wh, n, i);
                assert_eq!(bottom, previous_top, "band {} must start where {} ended", i, i);
                assert!(top < bottom, "band {} is empty for height {}", i, height);
                for row in top..bottom {
                    covered[row as usize] += 1;
                }
                previous_top = top;
            }
            assert_eq!(previous_top, 0);
            assert!(covered.iter().all(|&c| c == 1), "height {} n {}", height, n);
        }
    }

    #[test]
    fn test_pixels_in_window_bounds_are_inclusive_in_x() {
        let pixels: PixelSet = vec![(89, 5), (90, 5), (110, 6), (111, 6), (100, 10)]
            .into_iter()
            .collect();
        let found = pixels_in_window(&pixels, 100, 10, 5, 10);
        assert_eq!(found.xs, vec![90, 110]);
        assert_eq!(found.ys, vec![5, 6]);
    }

    #[test]
    fn test_pixels_in_window_saturates_huge_margin() {
        let pixels: PixelSet = vec![(0, 1), (1279, 2)].into_iter().collect();
        let found = pixels_in_window(&pixels, i32::MAX - 5, i32::MAX, 0, 10);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_recenter_uses_rounded_mean_at_minpix() {
        let band: PixelSet = (0..50).map(|i| (if i % 2 == 0 { 200 } else { 203 }, i)).collect();
        // mean = 201.5 -> 202
        assert_eq!(recenter(150, &band, 50), 202);
    }

    #[test]
    fn test_recenter_keeps_center_below_minpix() {
        let band: PixelSet = (0..49).map(|i| (400, i)).collect();
        assert_eq!(recenter(150, &band, 50), 150);
    }

    #[test]
    fn test_sweep_follows_shifted_cluster() {
        let mut config = test_config();
        config.calibration.frame_width = 400;
        config.calibration.frame_height = 90;
        config.tracker.nwindows = 3;
        config.tracker.margin = 20;
        config.tracker.minpix = 5;

        // Bottom band: column at x=100. Middle band: column at x=115
        // (inside the first window's margin). Top band: column at x=130,
        // reachable only after recentering on the middle band.
        let mut on = Vec::new();
        for y in 60..90 {
            on.push((100, y));
            on.push((300, y));
        }
        for y in 30..60 {
            on.push((115, y));
            on.push((300, y));
        }
        for y in 0..30 {
            on.push((130, y));
            on.push((300, y));
        }
        let frame = frame_with(400, 90, &on);
        let features = extract_features(&frame, &config.calibration, 3).unwrap();
        let search = search_lanes(&frame, &features, &config.tracker);

        assert_eq!(search.left_base, 100);
        assert_eq!(search.right_base, 300);
        assert_eq!(search.windows.len(), 3);
        let centers: Vec<i32> = search.windows.iter().map(|w| w.left_center).collect();
        assert_eq!(centers, vec![100, 100, 115]);
        assert_eq!(search.left.len(), 90);
        assert_eq!(search.right.len(), 90);
        // bottom-to-top sweep order
        assert_eq!(search.left.ys.first(), Some(&60));
        assert_eq!(search.left.ys.last(), Some(&29));
    }

    #[test]
    fn test_sparse_band_does_not_recenter() {
        let mut config = test_config();
        config.calibration.frame_width = 400;
        config.calibration.frame_height = 90;
        config.tracker.nwindows = 3;
        config.tracker.margin = 20;
        config.tracker.minpix = 10;

        // Bottom band dense at x=100, middle band has only 3 pixels at x=115.
        let mut on: Vec<(usize, usize)> = (60..90).map(|y| (100, y)).collect();
        on.extend([(115, 40), (115, 41), (115, 42)]);
        let frame = frame_with(400, 90, &on);
        let features = extract_features(&frame, &config.calibration, 3).unwrap();
        let search = search_lanes(&frame, &features, &config.tracker);

        let centers: Vec<i32> = search.windows.iter().map(|w| w.left_center).collect();
        assert_eq!(centers, vec![100, 100, 100]);
        assert_eq!(search.windows[1].left_count, 3);
    }

    #[test]
    fn test_windows_outside_frame_find_nothing() {
        let pixels: PixelSet = vec![(5, 5)].into_iter().collect();
        let found = pixels_in_window(&pixels, -500, 100, 0, 10);
        assert!(found.is_empty());
    }
}
