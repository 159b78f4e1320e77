// src/road_overlay.rs
//
// Annotated bird's-eye frame for display and logging.
//
//   ┌──────────────┬──────────────────────────────┐
//   │  INFO WIDGET │                              │
//   │   (dimmed,   │                              │
//   │  red border) │                              │
//   │      ⬆       │                              │
//   ├──────────────┘                              │
//   │        ║▓▓▓▓▓▓▓▓ lane region ▓▓▓▓▓▓▓▓║       │
//   │        ║▓▓▓▓▓▓▓▓▓ (green) ▓▓▓▓▓▓▓▓▓▓▓║       │
//   └─────────────────────────────────────────────┘
//
// The renderer is a pure function of the binary frame, the two fits, the
// plot domain and the smoothed direction. Text is not rasterized here:
// `OverlayText` carries the HUD messages so callers can log them or print
// them with whatever font stack they have.

use crate::analysis::{CurvatureResult, CurveRadius, Direction, LaneFit, PlotDomain};
use crate::types::BinaryFrame;
use image::{Rgb, RgbImage};
use serde::Serialize;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Colors used for overlay rendering (RGB).
pub mod colors {
    use image::Rgb;

    pub const MARKING: Rgb<u8> = Rgb([255, 255, 255]);
    pub const LANE_FILL: Rgb<u8> = Rgb([0, 255, 0]);
    pub const LANE_EDGE: Rgb<u8> = Rgb([255, 220, 0]);
    pub const WIDGET_BORDER: Rgb<u8> = Rgb([255, 0, 0]);
    pub const GLYPH: Rgb<u8> = Rgb([255, 255, 255]);
}

/// Widget geometry in pixels, anchored at the top-left corner.
pub mod layout {
    pub const WIDGET_WIDTH: u32 = 400;
    pub const WIDGET_HEIGHT: u32 = 430;
    pub const GLYPH_CENTER_X: i64 = 200;
    pub const GLYPH_CENTER_Y: i64 = 120;
    pub const EDGE_HALF_WIDTH: i64 = 2;
}

// ============================================================================
// HUD TEXT
// ============================================================================

/// HUD messages for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayText {
    pub lkas: String,
    /// Only present while a curve is announced.
    pub curvature: Option<String>,
    pub ldws: String,
    pub position: String,
}

impl OverlayText {
    pub fn new(curvature: &CurvatureResult, direction: Direction) -> Self {
        let lkas = match direction {
            Direction::Straight => "LKAS: Keep Straight Ahead",
            Direction::Left => "LKAS: Left Curve Ahead",
            Direction::Right => "LKAS: Right Curve Ahead",
        };

        let curvature_msg = match (direction, curvature.min_radius()) {
            (Direction::Straight, _) => None,
            (_, CurveRadius::Finite(r)) => Some(format!("Curvature = {:.0} m", r)),
            (_, CurveRadius::Infinite) => Some("Curvature = straight".to_string()),
        };

        Self {
            lkas: lkas.to_string(),
            curvature: curvature_msg,
            ldws: "LDWS: Good Lane Keeping".to_string(),
            position: format!(
                "Vehicle is {:.2}m away from center",
                curvature.lateral_offset_m
            ),
        }
    }

    pub fn lines(&self) -> Vec<&str> {
        let mut lines = vec![self.lkas.as_str()];
        if let Some(c) = &self.curvature {
            lines.push(c.as_str());
        }
        lines.push(self.ldws.as_str());
        lines.push(self.position.as_str());
        lines
    }
}

// ============================================================================
// RENDERING
// ============================================================================

/// Draw the lane region, lane edges, info widget and direction glyph.
/// Output has the same resolution as `frame`.
pub fn render_overlay(
    frame: &BinaryFrame,
    left: &LaneFit,
    right: &LaneFit,
    domain: &PlotDomain,
    direction: Direction,
) -> RgbImage {
    let (w, h) = (frame.width() as u32, frame.height() as u32);
    let mut output = RgbImage::from_fn(w, h, |x, y| {
        if frame.get(x as usize, y as usize) != 0 {
            colors::MARKING
        } else {
            Rgb([0, 0, 0])
        }
    });

    let rows = domain.sample(frame.height());

    // 1. Lane region: one horizontal span per sampled row.
    for &y in &rows {
        let row = y as i64;
        let (l, r) = (left.x_at(y) as i64, right.x_at(y) as i64);
        draw_hspan(&mut output, l.min(r), l.max(r), row, colors::LANE_FILL);
    }

    // 2. Fitted boundaries.
    for &y in &rows {
        let row = y as i64;
        for x in [left.x_at(y) as i64, right.x_at(y) as i64] {
            draw_hspan(
                &mut output,
                x - layout::EDGE_HALF_WIDTH,
                x + layout::EDGE_HALF_WIDTH,
                row,
                colors::LANE_EDGE,
            );
        }
    }

    // 3. Info widget.
    draw_widget(&mut output);

    // 4. Direction glyph.
    draw_direction_glyph(
        &mut output,
        direction,
        layout::GLYPH_CENTER_X,
        layout::GLYPH_CENTER_Y,
    );

    output
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Inclusive span [x0, x1] on `row`, clipped to the image.
fn draw_hspan(img: &mut RgbImage, x0: i64, x1: i64, row: i64, color: Rgb<u8>) {
    if row < 0 || row >= img.height() as i64 {
        return;
    }
    let lo = x0.max(0);
    let hi = x1.min(img.width() as i64 - 1);
    for x in lo..=hi {
        put(img, x, row, color);
    }
}

fn fill_rect(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    for y in y0..=y1 {
        draw_hspan(img, x0, x1, y, color);
    }
}

fn fill_triangle(img: &mut RgbImage, pts: [(f64, f64); 3], color: Rgb<u8>) {
    let edge = |a: (f64, f64), b: (f64, f64), p: (f64, f64)| {
        (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0)
    };

    let x_min = pts.iter().map(|p| p.0).fold(f64::INFINITY, f64::min).floor() as i64;
    let x_max = pts.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max).ceil() as i64;
    let y_min = pts.iter().map(|p| p.1).fold(f64::INFINITY, f64::min).floor() as i64;
    let y_max = pts.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max).ceil() as i64;

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let p = (x as f64, y as f64);
            let e0 = edge(pts[0], pts[1], p);
            let e1 = edge(pts[1], pts[2], p);
            let e2 = edge(pts[2], pts[0], p);
            let inside = (e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0) || (e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0);
            if inside {
                put(img, x, y, color);
            }
        }
    }
}

/// Halve the brightness of the widget area and frame it.
fn draw_widget(img: &mut RgbImage) {
    let ww = layout::WIDGET_WIDTH.min(img.width());
    let wh = layout::WIDGET_HEIGHT.min(img.height());
    if ww == 0 || wh == 0 {
        return;
    }

    for y in 0..wh {
        for x in 0..ww {
            let Rgb([r, g, b]) = *img.get_pixel(x, y);
            img.put_pixel(x, y, Rgb([r / 2, g / 2, b / 2]));
        }
    }

    let (right, bottom) = (ww as i64 - 1, wh as i64 - 1);
    draw_hspan(img, 0, right, 0, colors::WIDGET_BORDER);
    draw_hspan(img, 0, right, bottom, colors::WIDGET_BORDER);
    for y in 0..=bottom {
        put(img, 0, y, colors::WIDGET_BORDER);
        put(img, right, y, colors::WIDGET_BORDER);
    }
}

/// Arrow icon: straight up, or a stem turning left/right.
fn draw_direction_glyph(img: &mut RgbImage, direction: Direction, cx: i64, cy: i64) {
    let (fx, fy) = (cx as f64, cy as f64);
    match direction {
        Direction::Straight => {
            fill_rect(img, cx - 8, cy - 10, cx + 8, cy + 50, colors::GLYPH);
            fill_triangle(
                img,
                [(fx - 30.0, fy - 10.0), (fx + 30.0, fy - 10.0), (fx, fy - 50.0)],
                colors::GLYPH,
            );
        }
        Direction::Left => {
            fill_rect(img, cx - 8, cy, cx + 8, cy + 50, colors::GLYPH);
            fill_rect(img, cx - 30, cy - 8, cx + 8, cy + 8, colors::GLYPH);
            fill_triangle(
                img,
                [(fx - 30.0, fy - 30.0), (fx - 30.0, fy + 30.0), (fx - 70.0, fy)],
                colors::GLYPH,
            );
        }
        Direction::Right => {
            fill_rect(img, cx - 8, cy, cx + 8, cy + 50, colors::GLYPH);
            fill_rect(img, cx - 8, cy - 8, cx + 30, cy + 8, colors::GLYPH);
            fill_triangle(
                img,
                [(fx + 30.0, fy - 30.0), (fx + 30.0, fy + 30.0), (fx + 70.0, fy)],
                colors::GLYPH,
            );
        }
    }
}
