mod common;

use approx::assert_abs_diff_eq;
use common::synthetic_frame::{
    column_frame, curve_frame, left_curve, right_curve, sparse_frame, straight_at,
};
use lane_tracker::{
    CurveRadius, Direction, FitOutcome, LaneTracker, MissingFits, TrackerError, TrackerMetrics,
};

#[test]
fn straight_lane_pair_is_flat_and_centered() {
    let tracker = LaneTracker::new(&common::config()).unwrap();
    let mut state = tracker.new_session();
    let frame = column_frame(&[300, 980], 1);

    let report = tracker.process_frame(&mut state, &frame).unwrap();

    assert_eq!(report.left_base, 299);
    assert_eq!(report.right_base, 979);
    assert_eq!(report.left.outcome, FitOutcome::Refit);
    assert_eq!(report.right.outcome, FitOutcome::Refit);
    assert_eq!(report.left.pixel_count, 3 * 720);

    let (left, right) = state.fits().unwrap();
    assert_abs_diff_eq!(left.a, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(left.b, 0.0, epsilon = 1e-6);
    assert_abs_diff_eq!(left.c, 300.0, epsilon = 1e-6);
    assert_abs_diff_eq!(right.c, 980.0, epsilon = 1e-6);

    let output = report.output();
    assert_eq!(output.direction, Direction::Straight);
    assert_eq!(output.left_radius, CurveRadius::Infinite);
    assert_eq!(output.right_radius, CurveRadius::Infinite);
    assert_abs_diff_eq!(output.lateral_offset_m, 0.0, epsilon = 1e-9);
}

#[test]
fn window_count_matches_configuration() {
    let tracker = LaneTracker::new(&common::config()).unwrap();
    let mut state = tracker.new_session();
    let report = tracker
        .process_frame(&mut state, &column_frame(&[300, 980], 1))
        .unwrap();

    assert_eq!(report.windows.len(), 9);
    // bands tile the frame top to bottom with no gaps
    let mut rows: Vec<_> = report.windows.iter().map(|w| (w.y_top, w.y_bottom)).collect();
    rows.sort();
    assert_eq!(rows.first().map(|r| r.0), Some(0));
    assert_eq!(rows.last().map(|r| r.1), Some(720));
    for pair in rows.windows(2) {
        assert_eq!(pair[0].1, pair[1].0);
    }
}

#[test]
fn left_curve_is_classified_left() {
    let tracker = LaneTracker::new(&common::config()).unwrap();
    let mut state = tracker.new_session();
    let frame = curve_frame(left_curve, straight_at(980.0));

    let report = tracker.process_frame(&mut state, &frame).unwrap();

    assert!(report.left.fit.a < 0.0, "a = {}", report.left.fit.a);
    assert_eq!(report.raw_direction, Direction::Left);
    assert_eq!(report.direction, Direction::Left);

    let radius = report.curvature.left_radius.meters();
    assert!(
        (380.0..470.0).contains(&radius),
        "left radius {:.1} m out of range",
        radius
    );
    assert_eq!(report.curvature.right_radius, CurveRadius::Infinite);
}

#[test]
fn right_curve_is_classified_right() {
    let tracker = LaneTracker::new(&common::config()).unwrap();
    let mut state = tracker.new_session();
    let frame = curve_frame(straight_at(300.0), right_curve);

    let report = tracker.process_frame(&mut state, &frame).unwrap();

    assert!(report.right.fit.a > 0.0);
    assert_eq!(report.direction, Direction::Right);
    // lane center left of the frame center: vehicle sits right of center
    assert!(report.curvature.lateral_offset_m > 0.0);
}

#[test]
fn sparse_frame_keeps_previous_fits_exactly() {
    let tracker = LaneTracker::new(&common::config()).unwrap();
    let mut state = tracker.new_session();

    tracker
        .process_frame(&mut state, &curve_frame(left_curve, straight_at(980.0)))
        .unwrap();
    let before = state.fits().unwrap();

    let report = tracker.process_frame(&mut state, &sparse_frame()).unwrap();
    let after = state.fits().unwrap();

    assert_eq!(report.left.outcome, FitOutcome::InsufficientPixels);
    assert_eq!(report.right.outcome, FitOutcome::InsufficientPixels);
    assert_eq!(before.0.a.to_bits(), after.0.a.to_bits());
    assert_eq!(before.0.b.to_bits(), after.0.b.to_bits());
    assert_eq!(before.0.c.to_bits(), after.0.c.to_bits());
    assert_eq!(before.1, after.1);
    assert_eq!(report.frame_index, 1);
}

#[test]
fn sparse_first_frame_cannot_initialize() {
    let tracker = LaneTracker::new(&common::config()).unwrap();
    let mut state = tracker.new_session();

    let err = tracker.process_frame(&mut state, &sparse_frame()).unwrap_err();
    assert_eq!(
        err,
        TrackerError::Initialization {
            missing: MissingFits::Both
        }
    );

    // a later good frame initializes normally
    tracker
        .process_frame(&mut state, &column_frame(&[300, 980], 1))
        .unwrap();
    assert!(state.is_initialized());
}

#[test]
fn direction_history_is_bounded() {
    let tracker = LaneTracker::new(&common::config()).unwrap();
    let mut state = tracker.new_session();
    let frame = column_frame(&[300, 980], 1);

    for _ in 0..15 {
        tracker.process_frame(&mut state, &frame).unwrap();
    }

    assert_eq!(state.directions().history_size(), 10);
    assert_eq!(state.frames_processed(), 15);
}

#[test]
fn smoothing_outvotes_a_few_straight_frames() {
    let tracker = LaneTracker::new(&common::config()).unwrap();
    let mut state = tracker.new_session();
    let curved = curve_frame(left_curve, straight_at(980.0));
    let straight = column_frame(&[300, 980], 1);

    for _ in 0..10 {
        tracker.process_frame(&mut state, &curved).unwrap();
    }
    for _ in 0..3 {
        let report = tracker.process_frame(&mut state, &straight).unwrap();
        assert_eq!(report.raw_direction, Direction::Straight);
        assert_eq!(report.direction, Direction::Left);
    }
    // 7 left vs 3 straight in the window
    assert_eq!(tracker.measure(&state).unwrap().direction, Direction::Left);
}

#[test]
fn concurrent_sessions_match_sequential_runs() {
    let metrics = TrackerMetrics::new();
    let tracker = LaneTracker::new(&common::config())
        .unwrap()
        .with_metrics(metrics.clone());

    let left_frames = vec![curve_frame(left_curve, straight_at(980.0)); 4];
    let right_frames = vec![curve_frame(straight_at(300.0), right_curve); 4];

    let run = |frames: &[lane_tracker::BinaryFrame]| {
        let mut state = tracker.new_session();
        frames
            .iter()
            .map(|f| tracker.process_frame(&mut state, f).unwrap().output())
            .collect::<Vec<_>>()
    };

    let sequential = (run(&left_frames), run(&right_frames));
    let parallel = std::thread::scope(|s| {
        let a = s.spawn(|| run(&left_frames));
        let b = s.spawn(|| run(&right_frames));
        (a.join().unwrap(), b.join().unwrap())
    });

    assert_eq!(sequential, parallel);
    assert!(parallel.0.iter().all(|o| o.direction == Direction::Left));
    assert!(parallel.1.iter().all(|o| o.direction == Direction::Right));
    assert_eq!(metrics.summary().total_frames, 16);
}
