pub mod ffmpeg;

use crate::geometry::WatermarkPlan;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub use ffmpeg::FfmpegEngine;

/// Width/height advertised by one stream of a probed container. Non-visual
/// streams leave both unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct StreamDimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Container handling for the written output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Fragmented MP4 with low-latency muxing flags, regardless of the
    /// source container.
    FragmentedMp4,
    /// Container inferred from the output path's extension.
    MatchExtension,
}

/// One unit of work submitted to the engine: overlay `overlay_asset` onto
/// `input` per `filter_graph` and write the result to `output_path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub overlay_asset: PathBuf,
    pub filter_graph: String,
    pub output_format: OutputFormat,
    pub output_path: PathBuf,
}

impl Job {
    /// Assembles the filter graph from a watermark plan: the overlay input
    /// is scaled to the planned width with its height left free to preserve
    /// aspect, then composited at the bounce position.
    pub fn new(
        input: PathBuf,
        overlay_asset: PathBuf,
        plan: &WatermarkPlan,
        output_format: OutputFormat,
        output_path: PathBuf,
    ) -> Self {
        let filter_graph = format!(
            "[1:v]scale={}:-1[wm];[0:v][wm]overlay=x='{}':y='{}'",
            plan.scale_width, plan.overlay_expr_x, plan.overlay_expr_y
        );

        Self { input, overlay_asset, filter_graph, output_format, output_path }
    }
}

/// Boundary to the external transcoding engine. Production drives the
/// ffmpeg and ffprobe binaries; tests substitute their own implementation.
pub trait Engine: Send + Sync + 'static {
    /// Queries per-stream dimensions without decoding the file. No side
    /// effects; safe to call repeatedly.
    fn probe(
        &self,
        path: &Path,
    ) -> impl Future<Output = anyhow::Result<Vec<StreamDimensions>>> + Send;

    /// Runs one overlay job to completion. Resolves on the engine's
    /// completion event and errs with the engine diagnostic otherwise.
    fn submit(&self, job: &Job) -> impl Future<Output = anyhow::Result<()>> + Send;
}
