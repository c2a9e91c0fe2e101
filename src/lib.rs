pub mod config;
pub mod controller;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod task;

use std::path::Path;
use tracing::info;

//
// Re-export
//
pub use config::Config;
pub use controller::{Controller, ControllerSettings};
pub use discovery::MediaFilter;
pub use engine::{Engine, FfmpegEngine, Job, OutputFormat, StreamDimensions};
pub use error::TaskError;
pub use geometry::{Resolution, WatermarkPlan, plan};
pub use task::{MediaTask, NamingPolicy};

async fn init_workspace(input_dir: &Path) -> std::io::Result<()> {
    // The output directory is created lazily per task; a missing input
    // directory would otherwise fail the watch subscription.
    tokio::fs::create_dir_all(input_dir).await
}

pub async fn run(config: Config) {
    let input_dir = config.input_dir();
    let output_dir = config.output_dir();
    let watermark = config.watermark_path();

    init_workspace(&input_dir)
        .await
        .expect("Failed to create input directory");

    let filter = MediaFilter::new(config.process_images);
    let naming = match config.naming.as_str() {
        "mp4" => NamingPolicy::ProcessedMp4,
        "preserve" => NamingPolicy::PreserveExtension,
        naming => panic!("Unsupported naming policy: {naming}. Use 'mp4' or 'preserve'"),
    };

    let engine = FfmpegEngine::new(
        &config.ffmpeg_bin,
        &config.ffprobe_bin,
        config.transcode_timeout_secs,
    );
    let controller = Controller::new(
        engine,
        ControllerSettings {
            watermark,
            output_dir,
            naming,
            delete_source: config.delete_source,
        },
    );

    match config.mode.as_str() {
        "sweep" => {
            let candidates = discovery::sweep(&input_dir, filter)
                .await
                .expect("Failed to list input directory");
            info!(
                count = candidates.len(),
                input = %input_dir.display(),
                "Sweep discovered candidate files"
            );
            for path in candidates {
                controller.submit(path).await;
            }
        }
        "watch" => {
            let (event_tx, event_rx) = async_channel::unbounded();
            let _watcher = discovery::watch(&input_dir, filter, event_tx)
                .expect("Failed to watch input directory");
            info!(input = %input_dir.display(), "Watching for new media files");

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Shutdown requested");
                        break;
                    }
                    added = event_rx.recv() => match added {
                        Ok(path) => controller.submit(path).await,
                        Err(_) => break,
                    }
                }
            }
        }
        mode => panic!("Unsupported discovery mode: {mode}. Use 'watch' or 'sweep'"),
    }

    // Drain whatever is still queued before exiting.
    controller.shutdown().await;
}
