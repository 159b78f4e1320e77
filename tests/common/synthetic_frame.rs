use lane_tracker::BinaryFrame;

pub const WIDTH: usize = 1280;
pub const HEIGHT: usize = 720;

/// Vertical lane markings `2 * half_width + 1` pixels wide, full height.
pub fn column_frame(centers: &[usize], half_width: usize) -> BinaryFrame {
    let mut frame = BinaryFrame::blank(WIDTH, HEIGHT).expect("valid size");
    for &cx in centers {
        for x in cx - half_width..=cx + half_width {
            for y in 0..HEIGHT {
                frame.set(x, y, 255);
            }
        }
    }
    frame
}

/// Two 3-pixel-wide markings following `x = left(y)` and `x = right(y)`.
pub fn curve_frame(left: impl Fn(f64) -> f64, right: impl Fn(f64) -> f64) -> BinaryFrame {
    let mut frame = BinaryFrame::blank(WIDTH, HEIGHT).expect("valid size");
    for y in 0..HEIGHT {
        for lane in [&left as &dyn Fn(f64) -> f64, &right] {
            let cx = lane(y as f64).round() as i64;
            for x in cx - 1..=cx + 1 {
                if x >= 0 && (x as usize) < WIDTH {
                    frame.set(x as usize, y, 255);
                }
            }
        }
    }
    frame
}

/// Left marking bending 200 px to the left by the top row.
pub fn left_curve(y: f64) -> f64 {
    let t = 1.0 - y / (HEIGHT as f64 - 1.0);
    500.0 - 200.0 * t * t
}

/// Right marking bending 200 px to the right by the top row.
pub fn right_curve(y: f64) -> f64 {
    let t = 1.0 - y / (HEIGHT as f64 - 1.0);
    780.0 + 200.0 * t * t
}

pub fn straight_at(x: f64) -> impl Fn(f64) -> f64 {
    move |_| x
}

/// A handful of pixels per lane: too few to refit either side.
pub fn sparse_frame() -> BinaryFrame {
    let mut frame = BinaryFrame::blank(WIDTH, HEIGHT).expect("valid size");
    for y in 700..HEIGHT {
        frame.set(320, y, 255);
        frame.set(960, y, 255);
    }
    frame
}
