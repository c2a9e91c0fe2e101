use std::path::PathBuf;
use thiserror::Error;

/// Per-task failure taxonomy. Every variant is fatal to its own task and
/// harmless to the process: the worker logs it and moves on to the next
/// discovered file.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("watermark asset not found at {path:?}")]
    MissingWatermarkAsset { path: PathBuf },

    #[error("failed to probe dimensions of {path:?}: {diagnostic}")]
    Probe { path: PathBuf, diagnostic: String },

    #[error("no stream of {path:?} exposes both width and height")]
    DimensionsUnavailable { path: PathBuf },

    #[error("failed to create output directory {path:?}: {diagnostic}")]
    OutputDir { path: PathBuf, diagnostic: String },

    #[error("transcode of {path:?} failed: {diagnostic}")]
    Transcode { path: PathBuf, diagnostic: String },
}
