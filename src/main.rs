// src/main.rs

use anyhow::{Context, Result};
use lane_tracker::analysis::Direction;
use lane_tracker::road_overlay::{render_overlay, OverlayText};
use lane_tracker::video_processor::{
    FrameRecord, FrameStatus, FrameStream, ResultWriter, StreamStats, VideoProcessor,
};
use lane_tracker::{Config, LaneTracker, TrackerError, TrackerMetrics};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "LANE_TRACKER_CONFIG";
const DEFAULT_CONFIG: &str = "config.yaml";

fn main() -> Result<()> {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("🚗 Lane Tracker Starting");
    info!("✓ Configuration loaded from {}", config_path);
    info!(
        "Tracker: nwindows={}, margin={}, minpix={}, min_refit_pixels={}",
        config.tracker.nwindows,
        config.tracker.margin,
        config.tracker.minpix,
        config.tracker.min_refit_pixels
    );
    info!(
        "Calibration: {}x{}, {:.1}m / {} rows, {:.2}m / {:.0}px, model={:?}",
        config.calibration.frame_width,
        config.calibration.frame_height,
        config.calibration.road_length_m,
        config.calibration.frame_height,
        config.calibration.lane_width_m,
        config.calibration.lane_width_px,
        config.calibration.curvature_model
    );

    let metrics = TrackerMetrics::new();
    let tracker = LaneTracker::new(&config)?.with_metrics(metrics.clone());

    let processor = VideoProcessor::new(config.video.clone());
    let streams = processor.find_streams()?;
    if streams.is_empty() {
        error!("No frames found in {}", config.video.input_dir);
        return Ok(());
    }
    processor.prepare_output_dir()?;

    let results: Vec<(String, Result<StreamStats>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = streams
            .iter()
            .map(|stream| {
                let tracker = &tracker;
                let processor = &processor;
                let handle = scope.spawn(move || process_stream(tracker, processor, stream));
                (stream.name.clone(), handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(name, handle)| {
                let outcome = handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow::anyhow!("stream worker panicked")));
                (name, outcome)
            })
            .collect()
    });

    for (name, outcome) in results {
        match outcome {
            Ok(stats) => {
                info!("\n========================================");
                info!("✓ Stream {} processed", name);
                info!("  Tracked frames: {}", stats.tracked);
                info!("  ⏳ Initializing: {}", stats.initializing);
                if stats.invalid > 0 {
                    warn!("  ⚠️  Invalid frames: {}", stats.invalid);
                }
                info!(
                    "  ⬆️  Straight: {}  ⬅️  Left: {}  ➡️  Right: {}",
                    stats.straight, stats.left, stats.right
                );
                info!("========================================\n");
            }
            Err(e) => error!("Failed to process stream {}: {:#}", name, e),
        }
    }

    let summary = metrics.summary();
    info!(
        "📊 {} frames, {:.1} FPS, {} refits (L) / {} refits (R), {} singular",
        summary.total_frames,
        summary.fps,
        summary.left_refits,
        summary.right_refits,
        summary.singular_fits
    );

    let metrics_path = processor.metrics_path();
    let json = serde_json::to_string_pretty(&summary)?;
    std::fs::write(&metrics_path, json)
        .with_context(|| format!("Failed to write {}", metrics_path.display()))?;
    info!("💾 Metrics written to {}", metrics_path.display());

    Ok(())
}

fn process_stream(
    tracker: &LaneTracker,
    processor: &VideoProcessor,
    stream: &FrameStream,
) -> Result<StreamStats> {
    info!("🎬 Stream {}: {} frames", stream.name, stream.frames.len());
    let started = Instant::now();

    let mut state = tracker.new_session();
    let mut writer = ResultWriter::create(processor.results_path(stream))?;
    let mut stats = StreamStats::default();
    let mut last_direction: Option<Direction> = None;

    for (index, path) in stream.frames.iter().enumerate() {
        let frame = match processor.read_frame(path) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                stats.record(FrameStatus::Invalid, None);
                writer.write(&FrameRecord::failed(
                    &stream.name,
                    path,
                    index,
                    FrameStatus::Invalid,
                    format!("{:#}", e),
                ))?;
                continue;
            }
        };

        match tracker.process_frame(&mut state, &frame) {
            Ok(report) => {
                let text = OverlayText::new(&report.curvature, report.direction);
                if last_direction != Some(report.direction) {
                    info!(
                        "🧭 Stream {} frame {}: {}",
                        stream.name,
                        index,
                        text.lkas
                    );
                    last_direction = Some(report.direction);
                }

                if processor.saves_annotated() {
                    let annotated = render_overlay(
                        &frame,
                        &report.left.fit,
                        &report.right.fit,
                        &report.plot_domain,
                        report.direction,
                    );
                    processor.save_annotated(stream, path, &annotated)?;
                }

                stats.record(FrameStatus::Tracked, Some(report.direction));
                writer.write(&FrameRecord::tracked(&stream.name, path, index, &report, &text))?;
            }
            Err(e) => {
                let status = match e {
                    TrackerError::Initialization { .. } => FrameStatus::Initializing,
                    _ => FrameStatus::Invalid,
                };
                if status == FrameStatus::Invalid {
                    warn!("Skipping {}: {}", path.display(), e);
                }
                stats.record(status, None);
                writer.write(&FrameRecord::failed(
                    &stream.name,
                    path,
                    index,
                    status,
                    e.to_string(),
                ))?;
            }
        }
    }

    let results = writer.finish()?;
    let secs = started.elapsed().as_secs_f64();
    info!(
        "✓ Stream {} done in {:.1}s ({:.1} FPS) → {}",
        stream.name,
        secs,
        if secs > 0.0 {
            stream.frames.len() as f64 / secs
        } else {
            0.0
        },
        results.display()
    );

    Ok(stats)
}
