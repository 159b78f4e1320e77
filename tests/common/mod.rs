#![allow(dead_code)]

pub mod synthetic_frame;

use lane_tracker::Config;

/// 1280x720 bird's-eye calibration used by the end-to-end tests.
pub const CONFIG_YAML: &str = r#"
tracker:
  nwindows: 9
  margin: 100
  minpix: 50
  min_refit_pixels: 1500
calibration:
  frame_width: 1280
  frame_height: 720
  road_length_m: 30.0
  lane_width_m: 3.7
  lane_width_px: 700.0
  reference_row: 700.0
direction:
  history_len: 10
  straight_threshold: 0.00015
"#;

pub fn config() -> Config {
    Config::from_yaml(CONFIG_YAML).expect("test config must parse")
}
