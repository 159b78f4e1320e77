// src/video_processor.rs
//
// Frame-sequence I/O for the CLI. Each directory under `video.input_dir`
// that holds image files is one stream; frames play back in file-name order.

use crate::analysis::Direction;
use crate::pipeline::{FrameReport, LaneKeepingOutput};
use crate::road_overlay::OverlayText;
use crate::types::{BinaryFrame, VideoConfig};
use anyhow::{Context, Result};
use image::RgbImage;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Ordered frames of one recording.
#[derive(Debug, Clone)]
pub struct FrameStream {
    pub name: String,
    pub frames: Vec<PathBuf>,
}

pub struct VideoProcessor {
    config: VideoConfig,
}

impl VideoProcessor {
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }

    pub fn find_streams(&self) -> Result<Vec<FrameStream>> {
        let root = Path::new(&self.config.input_dir);
        if !root.is_dir() {
            anyhow::bail!("Input directory {} does not exist", root.display());
        }

        let mut grouped: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if !self.has_frame_extension(path) {
                continue;
            }
            let parent = path.parent().unwrap_or(root).to_path_buf();
            grouped.entry(parent).or_default().push(path.to_path_buf());
        }

        let streams: Vec<FrameStream> = grouped
            .into_iter()
            .map(|(dir, mut frames)| {
                frames.sort();
                FrameStream {
                    name: stream_name(root, &dir),
                    frames,
                }
            })
            .collect();

        info!(
            "Found {} streams ({} frames)",
            streams.len(),
            streams.iter().map(|s| s.frames.len()).sum::<usize>()
        );
        Ok(streams)
    }

    fn has_frame_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    pub fn read_frame(&self, path: &Path) -> Result<BinaryFrame> {
        let decoded =
            image::open(path).with_context(|| format!("Failed to decode {}", path.display()))?;
        let frame = BinaryFrame::from_image(decoded)
            .with_context(|| format!("Unusable frame {}", path.display()))?;
        Ok(frame)
    }

    pub fn prepare_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.config.output_dir)
            .with_context(|| format!("Failed to create {}", self.config.output_dir))
    }

    pub fn results_path(&self, stream: &FrameStream) -> PathBuf {
        Path::new(&self.config.output_dir).join(format!("{}.jsonl", stream.name))
    }

    pub fn metrics_path(&self) -> PathBuf {
        Path::new(&self.config.output_dir).join("metrics.json")
    }

    pub fn annotated_path(&self, stream: &FrameStream, frame: &Path) -> PathBuf {
        let stem = frame
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("frame");
        Path::new(&self.config.output_dir)
            .join(&stream.name)
            .join(format!("{}_annotated.png", stem))
    }

    /// Whether annotated frames are written; callers skip rendering otherwise.
    pub fn saves_annotated(&self) -> bool {
        self.config.save_annotated
    }

    pub fn save_annotated(&self, stream: &FrameStream, frame: &Path, image: &RgbImage) -> Result<()> {
        if !self.saves_annotated() {
            return Ok(());
        }
        let path = self.annotated_path(stream, frame);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("💾 Saved {}", path.display());
        Ok(())
    }
}

/// Relative path of `dir` under `root`, flattened to one file-name-safe token.
fn stream_name(root: &Path, dir: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("_");
    if name.is_empty() {
        "root".to_string()
    } else {
        name
    }
}

// ============================================================================
// RESULTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    Tracked,
    Initializing,
    Invalid,
}

/// One line of a stream's JSONL results file.
#[derive(Debug, Serialize)]
pub struct FrameRecord<'a> {
    pub stream: &'a str,
    pub file: String,
    pub frame_index: usize,
    pub status: FrameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<LaneKeepingOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<&'a FrameReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> FrameRecord<'a> {
    pub fn tracked(
        stream: &'a str,
        file: &Path,
        frame_index: usize,
        report: &'a FrameReport,
        text: &'a OverlayText,
    ) -> Self {
        Self {
            stream,
            file: file.display().to_string(),
            frame_index,
            status: FrameStatus::Tracked,
            output: Some(report.output()),
            report: Some(report),
            overlay: Some(text.lines()),
            error: None,
        }
    }

    pub fn failed(
        stream: &'a str,
        file: &Path,
        frame_index: usize,
        status: FrameStatus,
        error: String,
    ) -> Self {
        Self {
            stream,
            file: file.display().to_string(),
            frame_index,
            status,
            output: None,
            report: None,
            overlay: None,
            error: Some(error),
        }
    }
}

/// Per-stream tally for the end-of-run log.
#[derive(Debug, Default, Clone)]
pub struct StreamStats {
    pub tracked: usize,
    pub initializing: usize,
    pub invalid: usize,
    pub left: usize,
    pub right: usize,
    pub straight: usize,
}

impl StreamStats {
    pub fn record(&mut self, status: FrameStatus, direction: Option<Direction>) {
        match status {
            FrameStatus::Tracked => self.tracked += 1,
            FrameStatus::Initializing => self.initializing += 1,
            FrameStatus::Invalid => self.invalid += 1,
        }
        match direction {
            Some(Direction::Left) => self.left += 1,
            Some(Direction::Right) => self.right += 1,
            Some(Direction::Straight) => self.straight += 1,
            None => {}
        }
    }
}

/// JSON-lines sink, one record per frame.
pub struct ResultWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl ResultWriter {
    pub fn create(path: PathBuf) -> Result<Self> {
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn write(&mut self, record: &FrameRecord<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        Ok(self.path)
    }
}
