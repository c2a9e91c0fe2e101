use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure that can be loaded from CLI or config file
///
/// Example configuration file content
/// # Watermark Pipeline Configuration
///
/// # Filesystem layout
/// workspace = "./data"
/// # input_dir = "./data/input"
/// # output_dir = "./data/output"
/// # watermark = "./data/watermark.png"
///
/// # Discovery: "watch" (persistent) or "sweep" (one-shot)
/// mode = "watch"
///
/// # Output naming: "mp4" (<stem>_processed.mp4) or "preserve"
/// naming = "mp4"
///
/// # Destructive cleanup of sources after a confirmed success
/// delete_source = false
///
/// # Also process image files, not only videos
/// process_images = true
///
/// # Upper bound for one engine invocation (0 = unbounded)
/// transcode_timeout_secs = 900
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Root directory holding the default input/output/watermark layout
    #[arg(short = 'w', long, default_value = ".")]
    #[serde(default = "default_workspace")]
    pub workspace: String,

    /// Directory swept or watched for new media files (default: <workspace>/input)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<String>,

    /// Directory processed files are written to (default: <workspace>/output)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,

    /// Watermark image overlaid onto every processed file (default: <workspace>/watermark.png)
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,

    /// Discovery mode: watch (persistent) or sweep (one-shot)
    #[arg(short, long, default_value = "watch")]
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Output naming policy: mp4 (<stem>_processed.mp4) or preserve (keep the source file name)
    #[arg(short, long, default_value = "mp4")]
    #[serde(default = "default_naming")]
    pub naming: String,

    /// Delete the source file after a confirmed successful transcode
    #[arg(long, default_value_t = false)]
    #[serde(default)]
    pub delete_source: bool,

    /// Process image files in addition to videos
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    #[serde(default = "default_process_images")]
    pub process_images: bool,

    /// Upper bound for one engine invocation in seconds (0 = no timeout)
    #[arg(short, long, default_value_t = 900)]
    #[serde(default = "default_transcode_timeout")]
    pub transcode_timeout_secs: u64,

    /// ffmpeg binary invoked for transcoding
    #[arg(long, default_value = "ffmpeg")]
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,

    /// ffprobe binary invoked for dimension probing
    #[arg(long, default_value = "ffprobe")]
    #[serde(default = "default_ffprobe_bin")]
    pub ffprobe_bin: String,

    /// Configuration file path (overrides all other arguments)
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            input_dir: None,
            output_dir: None,
            watermark: None,
            mode: default_mode(),
            naming: default_naming(),
            delete_source: false,
            process_images: default_process_images(),
            transcode_timeout_secs: default_transcode_timeout(),
            ffmpeg_bin: default_ffmpeg_bin(),
            ffprobe_bin: default_ffprobe_bin(),
            config: None,
        }
    }
}

impl Config {
    /// Load configuration from CLI args, optionally merging with a config file
    pub fn load() -> Result<Self> {
        // First parse CLI args
        let mut config = Config::parse();

        // If a config file is specified, load it and merge
        if let Some(config_path) = &config.config {
            let file_config = Self::from_file(Path::new(config_path))?;
            config = config.merge_with_file(file_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge with file config, CLI args take precedence
    fn merge_with_file(mut self, file_config: Config) -> Self {
        // If CLI value is default, use file value
        if self.workspace == default_workspace() {
            self.workspace = file_config.workspace;
        }
        if self.mode == default_mode() {
            self.mode = file_config.mode;
        }
        if self.naming == default_naming() {
            self.naming = file_config.naming;
        }
        if !self.delete_source {
            self.delete_source = file_config.delete_source;
        }
        if self.process_images == default_process_images() {
            self.process_images = file_config.process_images;
        }
        if self.transcode_timeout_secs == default_transcode_timeout() {
            self.transcode_timeout_secs = file_config.transcode_timeout_secs;
        }
        if self.ffmpeg_bin == default_ffmpeg_bin() {
            self.ffmpeg_bin = file_config.ffmpeg_bin;
        }
        if self.ffprobe_bin == default_ffprobe_bin() {
            self.ffprobe_bin = file_config.ffprobe_bin;
        }

        // For Option fields, CLI takes precedence if Some
        if self.input_dir.is_none() {
            self.input_dir = file_config.input_dir;
        }
        if self.output_dir.is_none() {
            self.output_dir = file_config.output_dir;
        }
        if self.watermark.is_none() {
            self.watermark = file_config.watermark;
        }

        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.mode.as_str() {
            "watch" | "sweep" => {}
            mode => {
                return Err(anyhow::anyhow!(
                    "Unsupported discovery mode: {}. Use 'watch' or 'sweep'",
                    mode
                ));
            }
        }

        match self.naming.as_str() {
            "mp4" | "preserve" => {}
            naming => {
                return Err(anyhow::anyhow!(
                    "Unsupported naming policy: {}. Use 'mp4' or 'preserve'",
                    naming
                ));
            }
        }

        if self.workspace.is_empty() {
            return Err(anyhow::anyhow!("Workspace directory cannot be empty"));
        }
        if self.ffmpeg_bin.is_empty() || self.ffprobe_bin.is_empty() {
            return Err(anyhow::anyhow!("Engine binary names cannot be empty"));
        }

        Ok(())
    }

    pub fn input_dir(&self) -> PathBuf {
        self.input_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(&self.workspace).join("input"))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(&self.workspace).join("output"))
    }

    pub fn watermark_path(&self) -> PathBuf {
        self.watermark
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Path::new(&self.workspace).join("watermark.png"))
    }
}

// Default value functions
fn default_workspace() -> String {
    ".".to_string()
}

fn default_mode() -> String {
    "watch".to_string()
}

fn default_naming() -> String {
    "mp4".to_string()
}

fn default_process_images() -> bool {
    true
}

fn default_transcode_timeout() -> u64 {
    900
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_bin() -> String {
    "ffprobe".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_derive_the_workspace_layout() {
        let config = Config::default();
        assert_eq!(config.input_dir(), PathBuf::from("./input"));
        assert_eq!(config.output_dir(), PathBuf::from("./output"));
        assert_eq!(config.watermark_path(), PathBuf::from("./watermark.png"));
        assert!(!config.delete_source);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn explicit_paths_override_the_workspace_layout() {
        let config = Config {
            workspace: "/data".to_string(),
            input_dir: Some("/mnt/incoming".to_string()),
            ..Config::default()
        };
        assert_eq!(config.input_dir(), PathBuf::from("/mnt/incoming"));
        assert_eq!(config.output_dir(), PathBuf::from("/data/output"));
    }

    #[test]
    fn validate_rejects_unknown_mode_and_naming() {
        let config = Config { mode: "poll".to_string(), ..Config::default() };
        assert!(config.validate().is_err());

        let config = Config { naming: "webm".to_string(), ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_values_fill_in_cli_defaults() {
        let file_config: Config = toml::from_str(
            r#"
            workspace = "/srv/media"
            mode = "sweep"
            naming = "preserve"
            delete_source = true
            transcode_timeout_secs = 60
            "#,
        )
        .unwrap();

        let merged = Config::default().merge_with_file(file_config);
        assert_eq!(merged.workspace, "/srv/media");
        assert_eq!(merged.mode, "sweep");
        assert_eq!(merged.naming, "preserve");
        assert!(merged.delete_source);
        assert_eq!(merged.transcode_timeout_secs, 60);
    }

    #[test]
    fn cli_values_take_precedence_over_file_values() {
        let file_config: Config = toml::from_str(r#"input_dir = "/from-file""#).unwrap();

        let cli = Config {
            input_dir: Some("/explicit".to_string()),
            ..Config::default()
        };
        let merged = cli.merge_with_file(file_config.clone());
        assert_eq!(merged.input_dir.as_deref(), Some("/explicit"));

        let merged = Config::default().merge_with_file(file_config);
        assert_eq!(merged.input_dir.as_deref(), Some("/from-file"));
    }
}
