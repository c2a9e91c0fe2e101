//! Engine implementation backed by the ffmpeg and ffprobe binaries.

use super::{Engine, Job, OutputFormat, StreamDimensions};
use anyhow::{Context, anyhow, bail};
use serde::Deserialize;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Drives ffprobe/ffmpeg child processes. Every invocation is silent and
/// non-interactive; when a timeout is configured a hung child is killed and
/// the job fails instead of blocking its task forever.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    ffmpeg_bin: String,
    ffprobe_bin: String,
    timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<StreamDimensions>,
}

impl FfmpegEngine {
    /// `timeout_secs = 0` disables the bound.
    pub fn new(
        ffmpeg_bin: impl Into<String>,
        ffprobe_bin: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        }
    }

    async fn run(name: &str, mut cmd: Command, timeout: Option<Duration>) -> anyhow::Result<Output> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().with_context(|| format!("failed to spawn {name}"))?;
        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| anyhow!("{name} did not finish within {}s", limit.as_secs()))??,
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{name} exited with {}: {}", output.status, stderr.trim());
        }

        Ok(output)
    }
}

impl Engine for FfmpegEngine {
    fn probe(
        &self,
        path: &Path,
    ) -> impl Future<Output = anyhow::Result<Vec<StreamDimensions>>> + Send {
        let this = self.clone();
        let path = path.to_path_buf();

        async move {
            let mut cmd = Command::new(&this.ffprobe_bin);
            cmd.args(["-v", "error", "-print_format", "json", "-show_streams"])
                .arg(&path);

            let output = Self::run("ffprobe", cmd, this.timeout).await?;
            let parsed: ProbeOutput = serde_json::from_slice(&output.stdout)
                .with_context(|| format!("unparseable ffprobe output for {path:?}"))?;

            debug!(?path, streams = parsed.streams.len(), "Probed media streams");
            Ok(parsed.streams)
        }
    }

    fn submit(&self, job: &Job) -> impl Future<Output = anyhow::Result<()>> + Send {
        let this = self.clone();
        let job = job.clone();

        async move {
            let mut cmd = Command::new(&this.ffmpeg_bin);
            cmd.args(["-v", "error", "-hide_banner", "-nostdin", "-y"])
                .arg("-i")
                .arg(&job.input)
                .arg("-i")
                .arg(&job.overlay_asset)
                .arg("-filter_complex")
                .arg(&job.filter_graph);

            if job.output_format == OutputFormat::FragmentedMp4 {
                cmd.args(["-movflags", "frag_keyframe+empty_moov", "-f", "mp4"]);
            }
            cmd.arg(&job.output_path);

            debug!(
                input = ?job.input,
                output = ?job.output_path,
                filter = %job.filter_graph,
                "Submitting transcode job"
            );
            Self::run("ffmpeg", cmd, this.timeout).await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_json_maps_streams_to_dimensions() {
        // Audio-first container: the first stream has no dimensions.
        let json = r#"{
            "streams": [
                {"index": 0, "codec_type": "audio", "sample_rate": "48000"},
                {"index": 1, "codec_type": "video", "width": 1920, "height": 1080}
            ]
        }"#;

        let parsed: ProbeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.streams.len(), 2);
        assert_eq!(parsed.streams[0], StreamDimensions { width: None, height: None });
        assert_eq!(
            parsed.streams[1],
            StreamDimensions { width: Some(1920), height: Some(1080) }
        );
    }

    #[test]
    fn probe_json_without_streams_parses_empty() {
        let parsed: ProbeOutput = serde_json::from_str("{}").unwrap();
        assert!(parsed.streams.is_empty());
    }

    #[test]
    fn zero_timeout_disables_the_bound() {
        let engine = FfmpegEngine::new("ffmpeg", "ffprobe", 0);
        assert_eq!(engine.timeout, None);

        let engine = FfmpegEngine::new("ffmpeg", "ffprobe", 900);
        assert_eq!(engine.timeout, Some(Duration::from_secs(900)));
    }
}
